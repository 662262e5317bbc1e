//! Cryptographic primitives for the BSQ DAO.
//!
//! - **SHA-256 + RIPEMD-160** (hash160) for OP_RETURN payload hashes
//! - **ChaCha20-Poly1305** for the symmetric encryption of blind votes
//! - OS randomness for secret keys and request nonces

pub mod encryption;
pub mod error;
pub mod hash;
pub mod random;

pub use encryption::{decrypt, encrypt, generate_secret_key, SecretKey};
pub use error::CryptoError;
pub use hash::{sha256, sha256_ripemd160};
pub use random::random_u32;
