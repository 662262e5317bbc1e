//! Errors raised while decoding primitive values.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("unknown op return type byte: 0x{0:02x}")]
    UnknownOpReturnType(u8),

    #[error("unknown param: {0}")]
    UnknownParam(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}
