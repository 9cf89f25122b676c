use thiserror::Error;

pub type SeedlockResult<T> = Result<T, SeedlockError>;

/// Failure taxonomy for the secret codec and store.
///
/// Callers are expected to route `NotYetProvisioned` to onboarding and
/// `AuthenticationFailure` to a password re-prompt; the remaining kinds are
/// unrecoverable for a given attempt. Nothing here is retried internally.
#[derive(Debug, Error)]
pub enum SeedlockError {
    /// The expected secret file does not exist. Not a fault: the wallet has
    /// simply never been initialized on this device.
    #[error("no secret has been provisioned yet")]
    NotYetProvisioned,

    /// The file is shorter than its fixed-length header fields require, or
    /// declares a version byte outside the supported set.
    #[error("malformed secret framing: {0}")]
    MalformedFraming(String),

    /// The derived key does not reproduce a valid authentication tag. Either
    /// the password is wrong or the record was tampered with; the two are
    /// indistinguishable by design.
    #[error("authentication failed: wrong password or tampered record")]
    AuthenticationFailure,

    /// The write-verify-swap round-trip decrypted to different bytes than
    /// were given. The previous on-disk record is left untouched.
    #[error("write verification mismatch: temporary record did not round-trip")]
    VerificationMismatch,

    /// A cryptographic primitive failed an internal invariant (KDF output
    /// length, padding). Distinct from authentication failures.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The platform keychain rejected or failed an operation.
    #[error("keychain error: {0}")]
    Keychain(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
