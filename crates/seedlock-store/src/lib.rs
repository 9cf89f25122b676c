//! seedlock-store: durable persistence for encrypted wallet secrets
//!
//! The seed file is never mutated in place. Writers go through
//! write-verify-swap: serialize to a sibling temporary file, re-read and
//! decrypt it, compare against the source bytes, and only then rename over
//! the canonical path. A crash at any point leaves the previous record
//! intact, at worst alongside an orphaned temporary file.

pub mod backup;
pub mod keychain;
pub mod seed_store;

pub use backup::BackupStore;
pub use keychain::{PlatformKeychain, SecureBlobStore};
pub use seed_store::{SecurityState, SeedStore, SEED_FILE};
