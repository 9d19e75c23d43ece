//! Contribution sources -- where raw contribution events come from.

pub mod github;

pub use github::GitHubSource;

use crate::error::SourceError;
use crate::progress::ContributionEvent;

/// A provider of contribution events for an external account handle.
///
/// Sources are stateless between calls; the credential is passed in
/// explicitly so callers decide where it is stored (see
/// [`keyring_store`]).
pub trait ContributionSource: Send + Sync {
    /// Fetch the account's recent contribution events.
    fn fetch_events(
        &self,
        account_handle: &str,
        credential: &str,
    ) -> Result<Vec<ContributionEvent>, SourceError>;
}

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "monseal";

    pub fn get(key: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
