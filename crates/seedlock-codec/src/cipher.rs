//! AES-256-CBC + HMAC-SHA256 encrypt-then-MAC over in-memory buffers

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use seedlock_core::{SeedlockError, SeedlockResult};

use crate::kdf::SecretKeys;
use crate::{IV_SIZE, MAC_SIZE};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// One encrypted payload: random IV, ciphertext, and the tag over both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub iv: [u8; IV_SIZE],
    pub mac: [u8; MAC_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under the given keys with a fresh random IV, then MAC
/// `iv || ciphertext`.
pub fn seal(keys: &SecretKeys, plaintext: &[u8]) -> SeedlockResult<SealedPayload> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(keys.enc_key().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mac = compute_mac(keys, &iv, &ciphertext)?;

    Ok(SealedPayload {
        iv,
        mac,
        ciphertext,
    })
}

/// Verify the tag in constant time, then decrypt. The whole operation fails
/// on any mismatch; no partial plaintext is ever returned.
pub fn open(keys: &SecretKeys, payload: &SealedPayload) -> SeedlockResult<Zeroizing<Vec<u8>>> {
    let expected = compute_mac(keys, &payload.iv, &payload.ciphertext)?;
    if expected.ct_eq(&payload.mac).unwrap_u8() != 1 {
        return Err(SeedlockError::AuthenticationFailure);
    }

    let plaintext = Aes256CbcDec::new(keys.enc_key().into(), (&payload.iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&payload.ciphertext)
        .map_err(|_| SeedlockError::AuthenticationFailure)?;

    Ok(Zeroizing::new(plaintext))
}

fn compute_mac(keys: &SecretKeys, iv: &[u8], ciphertext: &[u8]) -> SeedlockResult<[u8; MAC_SIZE]> {
    let mut mac = HmacSha256::new_from_slice(keys.mac_key())
        .map_err(|e| SeedlockError::Crypto(format!("HMAC key setup failed: {e}")))?;
    mac.update(iv);
    mac.update(ciphertext);
    Ok(mac.finalize().into_bytes().into())
}
