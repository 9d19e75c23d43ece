use clap::Args;
use monseal_core::source::keyring_store;
use monseal_core::{
    Config, ContributionEvent, ContributionSource, DocumentStore, GitHubSource, Reconciler,
};

use crate::common;

const TOKEN_KEY: &str = "github_token";

#[derive(Args)]
pub struct ReconcileArgs {
    /// User identifier
    #[arg(long)]
    pub id: String,
    /// GitHub login to fetch for (defaults to the user's stored login)
    #[arg(long)]
    pub login: Option<String>,
    /// Reconcile a JSON event batch from a file instead of fetching
    #[arg(long, value_name = "FILE")]
    pub events_json: Option<std::path::PathBuf>,
}

pub fn run(args: ReconcileArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = common::open_store()?;
    let catalog = common::load_catalog(&config)?;

    let events: Vec<ContributionEvent> = match &args.events_json {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => {
            let profile = store.get_user(&args.id)?;
            let login = args
                .login
                .or_else(|| config.github.login.clone())
                .unwrap_or(profile.github_login);
            let token = github_token()?;
            GitHubSource::new().fetch_events(&login, &token)?
        }
    };

    let reconciler = Reconciler::new(store, catalog);
    let monster = reconciler.reconcile(&args.id, &events)?;
    println!("{}", serde_json::to_string_pretty(&monster)?);
    Ok(())
}

/// Keyring first, `GITHUB_TOKEN` as the fallback for CI-style use.
fn github_token() -> Result<String, Box<dyn std::error::Error>> {
    if let Some(token) = keyring_store::get(TOKEN_KEY)? {
        return Ok(token);
    }
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        if !token.is_empty() {
            return Ok(token);
        }
    }
    Err("no GitHub token; run `monseal-cli auth github login --token <TOKEN>`".into())
}
