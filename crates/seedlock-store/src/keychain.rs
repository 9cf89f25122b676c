//! Platform keychain capability: a secure blob store with a device-bound key
//!
//! Uses the `keyring` crate for cross-platform access:
//! - macOS: Keychain Services
//! - Linux: GNOME Keyring / Secret Service (D-Bus)
//! - Windows: Credential Manager (DPAPI)
//!
//! The codec never depends on this; callers use it to cache small secrets
//! (a PIN) behind whatever device-bound protection the OS offers.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use seedlock_core::{SeedlockError, SeedlockResult};

/// Secure blob store with a device-bound key.
///
/// Implementations are expected to be opaque key/value stores: `get` returns
/// `Ok(None)` for absent entries, and `delete` of an absent entry succeeds.
pub trait SecureBlobStore {
    fn put(&self, name: &str, blob: &[u8]) -> SeedlockResult<()>;
    fn get(&self, name: &str) -> SeedlockResult<Option<Vec<u8>>>;
    fn delete(&self, name: &str) -> SeedlockResult<()>;
}

const SERVICE_NAME: &str = "seedlock";

/// OS keychain implementation. Blobs are base64-encoded since keychain
/// entries are string-valued on every platform.
#[derive(Debug, Clone)]
pub struct PlatformKeychain {
    service: String,
}

impl PlatformKeychain {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.into(),
        }
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> SeedlockResult<keyring::Entry> {
        keyring::Entry::new(&self.service, name)
            .map_err(|e| SeedlockError::Keychain(format!("entry creation for '{name}': {e}")))
    }
}

impl Default for PlatformKeychain {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureBlobStore for PlatformKeychain {
    fn put(&self, name: &str, blob: &[u8]) -> SeedlockResult<()> {
        self.entry(name)?
            .set_password(&BASE64.encode(blob))
            .map_err(|e| SeedlockError::Keychain(format!("store for '{name}': {e}")))?;
        tracing::debug!(name, "stored blob in platform keychain");
        Ok(())
    }

    fn get(&self, name: &str) -> SeedlockResult<Option<Vec<u8>>> {
        match self.entry(name)?.get_password() {
            Ok(encoded) => {
                let blob = BASE64.decode(encoded.as_bytes()).map_err(|e| {
                    SeedlockError::Keychain(format!("corrupt keychain entry '{name}': {e}"))
                })?;
                Ok(Some(blob))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SeedlockError::Keychain(format!("get for '{name}': {e}"))),
        }
    }

    fn delete(&self, name: &str) -> SeedlockResult<()> {
        match self.entry(name)?.delete_credential() {
            Ok(()) => {
                tracing::debug!(name, "deleted blob from platform keychain");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SeedlockError::Keychain(format!("delete for '{name}': {e}"))),
        }
    }
}

/// Well-known keychain entry names
pub mod names {
    /// The user's PIN, cached when the user opts in
    pub const PIN: &str = "wallet-pin";
}
