use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("ciphertext too short")]
    CiphertextTooShort,

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed: authentication check failed")]
    Decryption,

    #[error("os randomness unavailable: {0}")]
    Random(String),
}
