//! Versioned secret records: seed files and backup blobs
//!
//! The two record kinds share the `version || salt? || iv || mac || ct`
//! framing but live in independent version spaces, so the caller must know
//! which kind of file it is parsing. There is no length prefix for the
//! ciphertext: it is whatever remains after the fixed-length header.

use secrecy::SecretString;
use zeroize::Zeroizing;

use seedlock_core::{Chain, SeedlockError, SeedlockResult};

use crate::cipher::{open, seal, SealedPayload};
use crate::kdf::{derive_backup_keys, derive_password_keys, generate_salt};
use crate::{IV_SIZE, MAC_SIZE, SALT_SIZE};

const SEED_FILE_VERSION_1: u8 = 1;
const BACKUP_FILE_VERSION_1: u8 = 1;
const BACKUP_FILE_VERSION_2: u8 = 2;

/// Supported seed-record versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedVersion {
    V1,
}

/// Supported backup-record versions. V2 derives keys per-chain; that is its
/// only difference from V1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupVersion {
    V1,
    V2,
}

/// A password-encrypted wallet seed, as stored in the seed file.
#[derive(Debug, Clone)]
pub enum SeedRecord {
    V1 {
        salt: [u8; SALT_SIZE],
        payload: SealedPayload,
    },
}

impl SeedRecord {
    /// Encrypt a secret under a password with a fresh random salt and IV.
    pub fn encrypt(
        secret: &[u8],
        password: &SecretString,
        version: SeedVersion,
    ) -> SeedlockResult<Self> {
        match version {
            SeedVersion::V1 => {
                let salt = generate_salt();
                let keys = derive_password_keys(password, &salt);
                let payload = seal(&keys, secret)?;
                Ok(SeedRecord::V1 { salt, payload })
            }
        }
    }

    /// Re-derive the keys from the password and the stored salt, verify the
    /// tag, and decrypt. Wrong password and tampered record are both
    /// `AuthenticationFailure`.
    pub fn decrypt(&self, password: &SecretString) -> SeedlockResult<Zeroizing<Vec<u8>>> {
        match self {
            SeedRecord::V1 { salt, payload } => {
                let keys = derive_password_keys(password, salt);
                open(&keys, payload)
            }
        }
    }

    /// `version || salt || iv || mac || ciphertext`
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            SeedRecord::V1 { salt, payload } => {
                let mut out =
                    Vec::with_capacity(1 + SALT_SIZE + IV_SIZE + MAC_SIZE + payload.ciphertext.len());
                out.push(SEED_FILE_VERSION_1);
                out.extend_from_slice(salt);
                out.extend_from_slice(&payload.iv);
                out.extend_from_slice(&payload.mac);
                out.extend_from_slice(&payload.ciphertext);
                out
            }
        }
    }

    /// Parse a serialized seed record. Truncated headers and unknown version
    /// bytes are rejected outright.
    pub fn deserialize(bytes: &[u8]) -> SeedlockResult<Self> {
        let (version, rest) = split_version(bytes)?;
        match version {
            SEED_FILE_VERSION_1 => {
                let (salt, rest) = take_array::<SALT_SIZE>(rest, "salt")?;
                let payload = parse_payload(rest)?;
                Ok(SeedRecord::V1 { salt, payload })
            }
            other => Err(SeedlockError::MalformedFraming(format!(
                "unknown seed file version: {other}"
            ))),
        }
    }
}

/// A backup blob encrypted under seed-derived keys. No salt: the key comes
/// from the seed via HKDF, not from a password.
#[derive(Debug, Clone)]
pub enum BackupRecord {
    V1 { payload: SealedPayload },
    V2 { payload: SealedPayload },
}

impl BackupRecord {
    pub fn encrypt(
        data: &[u8],
        seed: &[u8],
        version: BackupVersion,
        chain: Chain,
    ) -> SeedlockResult<Self> {
        let keys = derive_backup_keys(seed, version, chain)?;
        let payload = seal(&keys, data)?;
        Ok(match version {
            BackupVersion::V1 => BackupRecord::V1 { payload },
            BackupVersion::V2 => BackupRecord::V2 { payload },
        })
    }

    pub fn decrypt(&self, seed: &[u8], chain: Chain) -> SeedlockResult<Zeroizing<Vec<u8>>> {
        let (version, payload) = match self {
            BackupRecord::V1 { payload } => (BackupVersion::V1, payload),
            BackupRecord::V2 { payload } => (BackupVersion::V2, payload),
        };
        let keys = derive_backup_keys(seed, version, chain)?;
        open(&keys, payload)
    }

    pub fn version(&self) -> BackupVersion {
        match self {
            BackupRecord::V1 { .. } => BackupVersion::V1,
            BackupRecord::V2 { .. } => BackupVersion::V2,
        }
    }

    /// `version || iv || mac || ciphertext`
    pub fn serialize(&self) -> Vec<u8> {
        let (version_byte, payload) = match self {
            BackupRecord::V1 { payload } => (BACKUP_FILE_VERSION_1, payload),
            BackupRecord::V2 { payload } => (BACKUP_FILE_VERSION_2, payload),
        };
        let mut out = Vec::with_capacity(1 + IV_SIZE + MAC_SIZE + payload.ciphertext.len());
        out.push(version_byte);
        out.extend_from_slice(&payload.iv);
        out.extend_from_slice(&payload.mac);
        out.extend_from_slice(&payload.ciphertext);
        out
    }

    pub fn deserialize(bytes: &[u8]) -> SeedlockResult<Self> {
        let (version, rest) = split_version(bytes)?;
        let payload = parse_payload(rest)?;
        match version {
            BACKUP_FILE_VERSION_1 => Ok(BackupRecord::V1 { payload }),
            BACKUP_FILE_VERSION_2 => Ok(BackupRecord::V2 { payload }),
            other => Err(SeedlockError::MalformedFraming(format!(
                "unknown backup file version: {other}"
            ))),
        }
    }
}

fn split_version(bytes: &[u8]) -> SeedlockResult<(u8, &[u8])> {
    match bytes.split_first() {
        Some((version, rest)) => Ok((*version, rest)),
        None => Err(SeedlockError::MalformedFraming("empty record".into())),
    }
}

fn take_array<'a, const N: usize>(bytes: &'a [u8], field: &str) -> SeedlockResult<([u8; N], &'a [u8])> {
    if bytes.len() < N {
        return Err(SeedlockError::MalformedFraming(format!(
            "truncated record: {field} needs {N} bytes, {} available",
            bytes.len()
        )));
    }
    let (head, rest) = bytes.split_at(N);
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    Ok((out, rest))
}

fn parse_payload(bytes: &[u8]) -> SeedlockResult<SealedPayload> {
    let (iv, rest) = take_array::<IV_SIZE>(bytes, "iv")?;
    let (mac, ciphertext) = take_array::<MAC_SIZE>(rest, "mac")?;
    Ok(SealedPayload {
        iv,
        mac,
        ciphertext: ciphertext.to_vec(),
    })
}
