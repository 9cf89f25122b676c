//! seedlock-codec: password-based authenticated encryption for wallet secrets
//!
//! On-disk record format (binary, all fields raw byte sequences):
//! ```text
//! [1 byte: version][salt: seed records only][16-byte IV][32-byte MAC][ciphertext = rest of file]
//! ```
//!
//! Key derivation:
//! ```text
//! Seed record v1:   PBKDF2-HMAC-SHA256(password, salt[128], 10_000) → 64 bytes
//! Backup record v1: HKDF-SHA256(seed, info="seedlock/backup/v1") → 64 bytes
//! Backup record v2: HKDF-SHA256(seed, info="seedlock/backup/v2/{chain}") → 64 bytes
//!   split: first 32 bytes = AES-256-CBC key, last 32 bytes = HMAC-SHA256 key
//! ```
//!
//! Encrypt-then-MAC: the tag covers `iv || ciphertext` and is verified in
//! constant time before any decryption is attempted.

pub mod cipher;
pub mod kdf;
pub mod record;
pub mod recovery;

pub use cipher::SealedPayload;
pub use kdf::{derive_backup_keys, derive_password_keys, generate_salt, SecretKeys};
pub use record::{BackupRecord, BackupVersion, SeedRecord, SeedVersion};
pub use recovery::{generate_mnemonic, parse_mnemonic};

/// Size of the salt in seed records
pub const SALT_SIZE: usize = 128;

/// Size of the AES-CBC initialization vector
pub const IV_SIZE: usize = 16;

/// Size of the HMAC-SHA256 authentication tag
pub const MAC_SIZE: usize = 32;

/// Size of each derived key (AES-256 and HMAC-SHA256)
pub const KEY_SIZE: usize = 32;
