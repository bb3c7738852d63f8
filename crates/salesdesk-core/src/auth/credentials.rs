use anyhow::{Context, Result};
use keyring::Entry;

use crate::config::APP_NAME;

/// Login passwords kept in the OS keychain, keyed by phone number, for
/// `salesdesk login --remember`.
pub struct CredentialStore;

impl CredentialStore {
    fn entry(phone: &str) -> Result<Entry> {
        Entry::new(APP_NAME, phone.trim()).context("Failed to create keyring entry")
    }

    pub fn store(phone: &str, password: &str) -> Result<()> {
        Self::entry(phone)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    /// The remembered password, or `None` when nothing is stored.
    pub fn password(phone: &str) -> Result<Option<String>> {
        match Self::entry(phone)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve password from keychain"),
        }
    }

    /// Forget the remembered password. Forgetting nothing is not an error.
    pub fn forget(phone: &str) -> Result<()> {
        match Self::entry(phone)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}
