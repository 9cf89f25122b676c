//! Key derivation: password → record keys (PBKDF2), seed → backup keys (HKDF)

use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use seedlock_core::{Chain, SeedlockError, SeedlockResult};

use crate::record::BackupVersion;
use crate::{KEY_SIZE, SALT_SIZE};

/// PBKDF2 iteration count for version-1 seed records.
///
/// A protocol constant, not configuration: the record framing carries no KDF
/// parameters, so decryption must re-derive with the exact same count.
pub const PBKDF2_ITERATIONS_V1: u32 = 10_000;

/// The pair of keys protecting one record: a 256-bit AES key and a 256-bit
/// HMAC key, split from a single 64-byte KDF output. Zeroized on drop.
pub struct SecretKeys {
    enc: [u8; KEY_SIZE],
    mac: [u8; KEY_SIZE],
}

impl SecretKeys {
    fn from_okm(okm: &[u8; 2 * KEY_SIZE]) -> Self {
        let mut enc = [0u8; KEY_SIZE];
        let mut mac = [0u8; KEY_SIZE];
        enc.copy_from_slice(&okm[..KEY_SIZE]);
        mac.copy_from_slice(&okm[KEY_SIZE..]);
        Self { enc, mac }
    }

    pub fn enc_key(&self) -> &[u8; KEY_SIZE] {
        &self.enc
    }

    pub fn mac_key(&self) -> &[u8; KEY_SIZE] {
        &self.mac
    }
}

impl Drop for SecretKeys {
    fn drop(&mut self) {
        self.enc.zeroize();
        self.mac.zeroize();
    }
}

impl std::fmt::Debug for SecretKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKeys")
            .field("enc", &"[REDACTED]")
            .field("mac", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh random salt for a seed record.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Derive the seed-record keys from a password and salt via PBKDF2-HMAC-SHA256.
pub fn derive_password_keys(password: &SecretString, salt: &[u8; SALT_SIZE]) -> SecretKeys {
    let mut okm = [0u8; 2 * KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        password.expose_secret().as_bytes(),
        salt,
        PBKDF2_ITERATIONS_V1,
        &mut okm,
    );
    let keys = SecretKeys::from_okm(&okm);
    okm.zeroize();
    keys
}

/// Derive the backup-record keys from the wallet seed via HKDF-SHA256.
///
/// Version 2 mixes the chain into the info string so a backup written on one
/// chain cannot be decrypted under another.
pub fn derive_backup_keys(
    seed: &[u8],
    version: BackupVersion,
    chain: Chain,
) -> SeedlockResult<SecretKeys> {
    let info: &[u8] = match (version, chain) {
        (BackupVersion::V1, _) => b"seedlock/backup/v1",
        (BackupVersion::V2, Chain::Mainnet) => b"seedlock/backup/v2/mainnet",
        (BackupVersion::V2, Chain::Testnet) => b"seedlock/backup/v2/testnet",
    };

    let hk = Hkdf::<Sha256>::new(None, seed);
    let mut okm = [0u8; 2 * KEY_SIZE];
    hk.expand(info, &mut okm)
        .map_err(|e| SeedlockError::Crypto(format!("HKDF expand failed: {e}")))?;
    let keys = SecretKeys::from_okm(&okm);
    okm.zeroize();
    Ok(keys)
}
