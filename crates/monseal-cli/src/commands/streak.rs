use clap::Subcommand;
use monseal_core::DocumentStore;

use crate::common;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Current and maximum consecutive-activity streak
    Show {
        /// User identifier
        id: String,
    },
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = common::open_store()?;

    match action {
        StreakAction::Show { id } => {
            let profile = store.get_user(&id)?;
            println!("{}", serde_json::to_string_pretty(&profile.streak)?);
        }
    }
    Ok(())
}
