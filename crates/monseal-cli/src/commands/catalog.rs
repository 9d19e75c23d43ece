use clap::Subcommand;
use monseal_core::{Config, MonsterCatalog};

use crate::common;

#[derive(Subcommand)]
pub enum CatalogAction {
    /// All roster entries in identifier order
    List,
    /// One roster entry
    Show {
        /// Monster identifier (e.g. "001")
        id: String,
    },
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let catalog = common::load_catalog(&config)?;

    match action {
        CatalogAction::List => {
            println!("{}", serde_json::to_string_pretty(&catalog.entries())?);
        }
        CatalogAction::Show { id } => match catalog.lookup(&id) {
            Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
            None => return Err(format!("no monster with id '{id}' in the roster").into()),
        },
    }
    Ok(())
}
