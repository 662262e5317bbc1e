//! Symmetric encryption of blind votes.
//!
//! A voter encrypts its ballot list and merit list with a fresh 32-byte secret
//! key and publishes the key later in the vote reveal tx. ChaCha20-Poly1305 is
//! used with a random 12-byte nonce prepended to the ciphertext, so the same
//! key can encrypt several payloads.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};

use crate::error::CryptoError;
use crate::random::fill;

pub const SECRET_KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;

pub type SecretKey = [u8; SECRET_KEY_LENGTH];

pub fn generate_secret_key() -> Result<SecretKey, CryptoError> {
    let mut key = [0u8; SECRET_KEY_LENGTH];
    fill(&mut key)?;
    Ok(key)
}

fn cipher(key: &[u8]) -> Result<ChaCha20Poly1305, CryptoError> {
    ChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
        expected: SECRET_KEY_LENGTH,
        actual: key.len(),
    })
}

/// Returns `nonce || ciphertext || tag`.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher(key)?;
    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    fill(&mut nonce_bytes)?;
    let nonce = Nonce::from(nonce_bytes);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    let mut out = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

pub fn decrypt(encrypted: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher(key)?;
    if encrypted.len() < NONCE_LENGTH {
        return Err(CryptoError::CiphertextTooShort);
    }
    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_LENGTH);
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}
