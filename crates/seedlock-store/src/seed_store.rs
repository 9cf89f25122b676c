//! Seed file reader/writer with write-verify-swap

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use seedlock_codec::{SeedRecord, SeedVersion};
use seedlock_core::{SeedlockError, SeedlockResult};

/// Canonical seed filename inside the data directory.
pub const SEED_FILE: &str = "seed.dat";
const SEED_TMP_FILE: &str = ".seed.dat.tmp";
const STATE_FILE: &str = "security.json";

/// Out-of-band record of how the seed file is stored.
///
/// The file format itself gives no self-describing signal of "not
/// encrypted": a raw plaintext seed and a corrupted record look the same to
/// a parser. This flag is the caller-level branch the codec cannot encode.
///
/// Updates are ordered so a crash mid-write errs toward `seed_encrypted:
/// true`: the flag flips on before an encrypted record is swapped in, and
/// off only after plaintext bytes are on disk. A torn write then fails
/// loudly as a framing or decrypt error on the next read, instead of
/// handing ciphertext to the caller as if it were the plaintext seed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SecurityState {
    pub seed_encrypted: bool,
}

/// Owns one data directory holding the seed file and its security state.
///
/// Constructed once at the application's composition root and passed down;
/// there is no ambient global instance.
#[derive(Debug, Clone)]
pub struct SeedStore {
    dir: PathBuf,
}

impl SeedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn seed_path(&self) -> PathBuf {
        self.dir.join(SEED_FILE)
    }

    /// Whether a seed file exists and is a readable regular file.
    pub fn is_provisioned(&self) -> bool {
        self.seed_path().is_file()
    }

    /// Load the security state, defaulting to "not encrypted" when the state
    /// file is absent.
    pub fn security_state(&self) -> SeedlockResult<SecurityState> {
        let path = self.dir.join(STATE_FILE);
        if !path.is_file() {
            return Ok(SecurityState::default());
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| {
            SeedlockError::MalformedFraming(format!("security state file: {e}"))
        })
    }

    /// Persist the seed, encrypted when a password is given.
    ///
    /// With a password, the serialized record goes through write-verify-swap:
    /// the temporary file is re-read, decrypted, and compared byte-for-byte
    /// against `secret` before it is allowed to replace the canonical file.
    /// A verification mismatch aborts without touching the final path.
    ///
    /// Without a password the raw secret bytes are written as-is (the
    /// product's "no PIN" mode; see [`SecurityState`]).
    pub fn write_seed(&self, secret: &[u8], password: Option<&SecretString>) -> SeedlockResult<()> {
        fs::create_dir_all(&self.dir)?;

        match password {
            None => {
                fs::write(self.seed_path(), secret)?;
                self.write_state(SecurityState {
                    seed_encrypted: false,
                })?;
                tracing::warn!(dir = %self.dir.display(), "seed written UNENCRYPTED (no password configured)");
            }
            Some(password) => {
                let record = SeedRecord::encrypt(secret, password, SeedVersion::V1)?;
                let tmp = self.dir.join(SEED_TMP_FILE);
                fs::write(&tmp, record.serialize())?;

                if let Err(e) = verify_temp(&tmp, secret, password) {
                    let _ = fs::remove_file(&tmp);
                    return Err(e);
                }

                // State flag first: see the ordering note on [`SecurityState`]
                self.write_state(SecurityState {
                    seed_encrypted: true,
                })?;
                fs::rename(&tmp, self.seed_path())?;
                tracing::info!(dir = %self.dir.display(), "encrypted seed written and verified");
            }
        }
        Ok(())
    }

    /// Load the seed. A missing or unreadable file is `NotYetProvisioned` so
    /// callers can route to onboarding; everything else is a real fault.
    pub fn read_seed(&self, password: Option<&SecretString>) -> SeedlockResult<Zeroizing<Vec<u8>>> {
        let path = self.seed_path();
        if !path.is_file() {
            return Err(SeedlockError::NotYetProvisioned);
        }
        let bytes = fs::read(&path).map_err(map_read_error)?;

        match password {
            None => Ok(Zeroizing::new(bytes)),
            Some(password) => SeedRecord::deserialize(&bytes)?.decrypt(password),
        }
    }

    /// Wallet reset: remove the seed file, any orphaned temporary file, and
    /// the security state. The only code path that ever deletes a seed.
    pub fn reset(&self) -> SeedlockResult<()> {
        for name in [SEED_FILE, SEED_TMP_FILE, STATE_FILE] {
            match fs::remove_file(self.dir.join(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(dir = %self.dir.display(), "wallet reset: seed removed");
        Ok(())
    }

    fn write_state(&self, state: SecurityState) -> SeedlockResult<()> {
        let path = self.dir.join(STATE_FILE);
        let tmp = self.dir.join(format!(".{STATE_FILE}.tmp"));
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| SeedlockError::Crypto(format!("security state encoding: {e}")))?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// An unreadable seed file routes to onboarding the same way a missing one
/// does; only genuinely unexpected failures surface as I/O errors.
fn map_read_error(e: std::io::Error) -> SeedlockError {
    match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            SeedlockError::NotYetProvisioned
        }
        _ => e.into(),
    }
}

/// Re-read a freshly written temporary record, decrypt it, and compare
/// against the source secret in constant time.
fn verify_temp(tmp: &Path, expected: &[u8], password: &SecretString) -> SeedlockResult<()> {
    let bytes = fs::read(tmp)?;
    let decrypted = SeedRecord::deserialize(&bytes)?.decrypt(password)?;
    if decrypted.ct_eq(expected).unwrap_u8() != 1 {
        return Err(SeedlockError::VerificationMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pw(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_write_read_encrypted() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        store.write_seed(b"my wallet seed", Some(&pw("123456"))).unwrap();

        let seed = store.read_seed(Some(&pw("123456"))).unwrap();
        assert_eq!(seed.as_slice(), b"my wallet seed");
        assert!(store.security_state().unwrap().seed_encrypted);
    }

    #[test]
    fn test_plaintext_fallback_writes_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        store.write_seed(b"my wallet seed", None).unwrap();

        // Exactly the raw bytes, no framing prepended
        let on_disk = fs::read(dir.path().join(SEED_FILE)).unwrap();
        assert_eq!(on_disk, b"my wallet seed");

        let seed = store.read_seed(None).unwrap();
        assert_eq!(seed.as_slice(), b"my wallet seed");
        assert!(!store.security_state().unwrap().seed_encrypted);
    }

    #[test]
    fn test_missing_file_is_not_provisioned() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        assert!(!store.is_provisioned());
        assert!(matches!(
            store.read_seed(Some(&pw("123456"))),
            Err(SeedlockError::NotYetProvisioned)
        ));
    }

    #[test]
    fn test_unreadable_maps_to_not_provisioned() {
        use std::io::{Error, ErrorKind};

        assert!(matches!(
            map_read_error(Error::from(ErrorKind::PermissionDenied)),
            SeedlockError::NotYetProvisioned
        ));
        assert!(matches!(
            map_read_error(Error::from(ErrorKind::NotFound)),
            SeedlockError::NotYetProvisioned
        ));
        // Anything else is a real fault and must stay an I/O error
        assert!(matches!(
            map_read_error(Error::from(ErrorKind::Interrupted)),
            SeedlockError::Io(_)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_seed_file_is_not_provisioned() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());
        store.write_seed(b"seed", Some(&pw("123456"))).unwrap();

        let path = dir.path().join(SEED_FILE);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read a mode-000 file, so the read may still
        // succeed; what must never happen is a raw I/O error leaking out.
        let result = store.read_seed(Some(&pw("123456")));
        assert!(!matches!(result, Err(SeedlockError::Io(_))));

        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
    }

    #[test]
    fn test_wrong_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        store.write_seed(b"seed", Some(&pw("123456"))).unwrap();

        assert!(matches!(
            store.read_seed(Some(&pw("999999"))),
            Err(SeedlockError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_temp_file_removed_after_successful_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        store.write_seed(b"seed", Some(&pw("123456"))).unwrap();

        assert!(!dir.path().join(SEED_TMP_FILE).exists());
    }

    #[test]
    fn test_crash_before_swap_leaves_original_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        store.write_seed(b"original seed", Some(&pw("123456"))).unwrap();
        let original = fs::read(dir.path().join(SEED_FILE)).unwrap();

        // Simulate a writer that crashed after the temp write but before the
        // rename: a stray temp file sits next to a valid seed file
        fs::write(dir.path().join(SEED_TMP_FILE), b"half-written garbage").unwrap();

        let after = fs::read(dir.path().join(SEED_FILE)).unwrap();
        assert_eq!(original, after, "final path must be byte-for-byte unchanged");

        let seed = store.read_seed(Some(&pw("123456"))).unwrap();
        assert_eq!(seed.as_slice(), b"original seed");

        // The next successful write replaces both
        store.write_seed(b"new seed", Some(&pw("123456"))).unwrap();
        assert_eq!(
            store.read_seed(Some(&pw("123456"))).unwrap().as_slice(),
            b"new seed"
        );
        assert!(!dir.path().join(SEED_TMP_FILE).exists());
    }

    #[test]
    fn test_state_flag_errs_toward_encrypted_on_torn_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        // A writer that flipped the flag but died before the swap leaves the
        // previous plaintext file marked as encrypted. The next read must
        // fail loudly, never hand the stale bytes out as a decrypted seed.
        store.write_seed(b"plain seed words", None).unwrap();
        store
            .write_state(SecurityState {
                seed_encrypted: true,
            })
            .unwrap();

        assert!(matches!(
            store.read_seed(Some(&pw("123456"))),
            Err(SeedlockError::MalformedFraming(_))
        ));
    }

    #[test]
    fn test_verify_temp_detects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join(SEED_TMP_FILE);

        // A valid record for different bytes than the caller intended to
        // write: the verify step must refuse to promote it
        let record = SeedRecord::encrypt(b"wrong bytes", &pw("123456"), SeedVersion::V1).unwrap();
        fs::write(&tmp, record.serialize()).unwrap();

        assert!(matches!(
            verify_temp(&tmp, b"intended bytes", &pw("123456")),
            Err(SeedlockError::VerificationMismatch)
        ));
    }

    #[test]
    fn test_corrupt_seed_file_is_framing_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.path().join(SEED_FILE), [1u8, 2, 3]).unwrap();

        assert!(matches!(
            store.read_seed(Some(&pw("123456"))),
            Err(SeedlockError::MalformedFraming(_))
        ));
    }

    #[test]
    fn test_reset_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        store.write_seed(b"seed", Some(&pw("123456"))).unwrap();
        store.reset().unwrap();

        assert!(!store.is_provisioned());
        assert!(!dir.path().join(STATE_FILE).exists());
        // Reset on an empty dir is fine too
        store.reset().unwrap();
    }

    #[test]
    fn test_rewrite_with_new_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeedStore::new(dir.path());

        store.write_seed(b"seed", Some(&pw("123456"))).unwrap();
        store.write_seed(b"seed", Some(&pw("654321"))).unwrap();

        assert!(matches!(
            store.read_seed(Some(&pw("123456"))),
            Err(SeedlockError::AuthenticationFailure)
        ));
        assert_eq!(
            store.read_seed(Some(&pw("654321"))).unwrap().as_slice(),
            b"seed"
        );
    }
}
