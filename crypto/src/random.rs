//! OS randomness.

use crate::error::CryptoError;

pub(crate) fn fill(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::getrandom(buf).map_err(|e| CryptoError::Random(e.to_string()))
}

/// A random u32, used for request/response correlation nonces.
pub fn random_u32() -> Result<u32, CryptoError> {
    let mut buf = [0u8; 4];
    fill(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
