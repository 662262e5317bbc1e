//! OP_RETURN payload type bytes.
//!
//! Every DAO payload starts with `[type][version]`. Hash based payloads follow
//! with the 20-byte RIPEMD-160(SHA-256(payload)).

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Payload version written and accepted by this node.
pub const OP_RETURN_VERSION: u8 = 0x01;

/// Length of the payload hash.
pub const HASH_LENGTH: usize = 20;

/// `[type][version][hash]`
pub const HASH_OP_RETURN_LENGTH: usize = 2 + HASH_LENGTH;

/// Length of the symmetric key revealed in a vote reveal tx.
pub const SECRET_KEY_LENGTH: usize = 32;

/// `[type][version][blind vote list hash][secret key]`
pub const VOTE_REVEAL_OP_RETURN_LENGTH: usize = HASH_OP_RETURN_LENGTH + SECRET_KEY_LENGTH;

/// `[type][version][lock time: u16 BE]`
pub const LOCKUP_OP_RETURN_LENGTH: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpReturnType {
    Proposal,
    CompensationRequest,
    BlindVote,
    VoteReveal,
    ChangeParam,
    Lockup,
}

impl OpReturnType {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Proposal => 0x10,
            Self::CompensationRequest => 0x11,
            Self::BlindVote => 0x12,
            Self::VoteReveal => 0x13,
            Self::ChangeParam => 0x14,
            Self::Lockup => 0x15,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, TypesError> {
        match byte {
            0x10 => Ok(Self::Proposal),
            0x11 => Ok(Self::CompensationRequest),
            0x12 => Ok(Self::BlindVote),
            0x13 => Ok(Self::VoteReveal),
            0x14 => Ok(Self::ChangeParam),
            0x15 => Ok(Self::Lockup),
            other => Err(TypesError::UnknownOpReturnType(other)),
        }
    }

    /// Type of the first payload byte, if any.
    pub fn of_payload(data: &[u8]) -> Option<Self> {
        data.first().and_then(|b| Self::from_byte(*b).ok())
    }
}
