use chrono::Utc;
use clap::Subcommand;
use monseal_core::{fetch_user_view, onboard_user, Config};

use crate::common;

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a user and assign the first monster
    Create {
        /// User identifier
        #[arg(long)]
        id: String,
        /// GitHub account login
        #[arg(long)]
        login: String,
        /// Avatar URL
        #[arg(long, default_value = "")]
        photo_url: String,
    },
    /// Show profile, current monster, and sealed history
    Show {
        /// User identifier
        id: String,
    },
}

pub fn run(action: UserAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = common::open_store()?;
    let catalog = common::load_catalog(&config)?;

    match action {
        UserAction::Create {
            id,
            login,
            photo_url,
        } => {
            let profile = onboard_user(&store, &catalog, &id, &login, &photo_url, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        UserAction::Show { id } => {
            let view = fetch_user_view(&store, &id)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }
    Ok(())
}
