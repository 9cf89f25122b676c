//! BIP-39 recovery phrase generation and validation
//!
//! The wallet secret persisted on disk is the mnemonic's UTF-8 bytes: the
//! phrase must be re-displayable to the user verbatim, so the words
//! themselves are what gets encrypted, not a derived key.

use bip39::Mnemonic;
use rand::RngCore;
use zeroize::Zeroizing;

use seedlock_core::{SeedlockError, SeedlockResult};

/// Generate a fresh 12-word BIP-39 mnemonic (128 bits of entropy).
pub fn generate_mnemonic() -> SeedlockResult<Zeroizing<String>> {
    let mut entropy = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| SeedlockError::Crypto(format!("BIP-39 mnemonic generation failed: {e}")))?;

    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Validate a user-supplied mnemonic and return it in normalized form
/// (single spaces, NFKD words as the wordlist spells them).
pub fn parse_mnemonic(words: &str) -> SeedlockResult<Zeroizing<String>> {
    let mnemonic: Mnemonic = words
        .trim()
        .parse()
        .map_err(|e| SeedlockError::Crypto(format!("invalid BIP-39 mnemonic: {e}")))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}
