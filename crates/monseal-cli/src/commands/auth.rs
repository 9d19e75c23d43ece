use clap::Subcommand;
use monseal_core::source::keyring_store;

const TOKEN_KEY: &str = "github_token";

#[derive(Subcommand)]
pub enum AuthAction {
    /// GitHub: login / logout / status
    Github {
        #[command(subcommand)]
        action: AuthOp,
    },
}

#[derive(Subcommand)]
pub enum AuthOp {
    /// Store a personal access token in the OS keyring
    Login {
        /// Token with `read:user` scope
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Check whether a token is stored
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let AuthAction::Github { action } = action;
    match action {
        AuthOp::Login { token } => {
            if token.is_empty() {
                return Err("token must not be empty".into());
            }
            keyring_store::set(TOKEN_KEY, &token)?;
            println!("GitHub token stored");
        }
        AuthOp::Logout => {
            keyring_store::delete(TOKEN_KEY)?;
            println!("GitHub token removed");
        }
        AuthOp::Status => {
            let stored = keyring_store::get(TOKEN_KEY)?.is_some();
            println!(
                "GitHub: {}",
                if stored { "authenticated" } else { "not authenticated" }
            );
        }
    }
    Ok(())
}
