//! Backup blob persistence under seed-derived keys
//!
//! Backups reuse the write-verify-swap discipline of the seed writer. Keys
//! come from the wallet seed, not a password, so restoring a backup requires
//! an unlocked wallet.

use std::fs;
use std::path::{Path, PathBuf};

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use seedlock_codec::{BackupRecord, BackupVersion};
use seedlock_core::{Chain, SeedlockError, SeedlockResult};

#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
    chain: Chain,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>, chain: Chain) -> Self {
        Self {
            dir: dir.into(),
            chain,
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Encrypt `data` under seed-derived keys and persist it as `name`,
    /// verifying the temporary file round-trips before the swap.
    pub fn write(
        &self,
        name: &str,
        data: &[u8],
        seed: &[u8],
        version: BackupVersion,
    ) -> SeedlockResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let record = BackupRecord::encrypt(data, seed, version, self.chain)?;
        let path = self.path_for(name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        fs::write(&tmp, record.serialize())?;

        if let Err(e) = self.verify_temp(&tmp, data, seed) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        fs::rename(&tmp, &path)?;
        tracing::info!(name, version = ?version, "backup written and verified");
        Ok(path)
    }

    /// Load and decrypt the backup stored as `name`.
    pub fn read(&self, name: &str, seed: &[u8]) -> SeedlockResult<Zeroizing<Vec<u8>>> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(SeedlockError::NotYetProvisioned);
        }
        let bytes = fs::read(&path)?;
        BackupRecord::deserialize(&bytes)?.decrypt(seed, self.chain)
    }

    fn verify_temp(&self, tmp: &Path, expected: &[u8], seed: &[u8]) -> SeedlockResult<()> {
        let bytes = fs::read(tmp)?;
        let decrypted = BackupRecord::deserialize(&bytes)?.decrypt(seed, self.chain)?;
        if decrypted.ct_eq(expected).unwrap_u8() != 1 {
            return Err(SeedlockError::VerificationMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &[u8] = b"wallet seed bytes";

    #[test]
    fn test_backup_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::new(dir.path(), Chain::Mainnet);

        store
            .write("channels.bak", b"channel state", SEED, BackupVersion::V2)
            .unwrap();

        let restored = store.read("channels.bak", SEED).unwrap();
        assert_eq!(restored.as_slice(), b"channel state");
    }

    #[test]
    fn test_backup_missing_is_not_provisioned() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::new(dir.path(), Chain::Mainnet);

        assert!(matches!(
            store.read("channels.bak", SEED),
            Err(SeedlockError::NotYetProvisioned)
        ));
    }

    #[test]
    fn test_backup_v2_chain_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mainnet = BackupStore::new(dir.path(), Chain::Mainnet);
        let testnet = BackupStore::new(dir.path(), Chain::Testnet);

        mainnet
            .write("channels.bak", b"payload", SEED, BackupVersion::V2)
            .unwrap();

        assert!(matches!(
            testnet.read("channels.bak", SEED),
            Err(SeedlockError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_backup_wrong_seed() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::new(dir.path(), Chain::Mainnet);

        store
            .write("channels.bak", b"payload", SEED, BackupVersion::V1)
            .unwrap();

        assert!(matches!(
            store.read("channels.bak", b"other seed"),
            Err(SeedlockError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_backup_temp_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::new(dir.path(), Chain::Mainnet);

        store
            .write("channels.bak", b"payload", SEED, BackupVersion::V1)
            .unwrap();

        assert!(!dir.path().join(".channels.bak.tmp").exists());
    }
}
