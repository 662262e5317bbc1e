//! Governance-relevant facts produced while applying blocks.

use serde::{Deserialize, Serialize};

use crate::id::TxId;
use crate::op_return::OpReturnType;
use crate::params::Param;

/// A param value voted in by the DAO, effective from `activation_height`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChangeEvent {
    pub param: Param,
    pub value: u64,
    pub activation_height: u32,
}

/// A proposal, compensation request or param change proposal was published.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalEvent {
    pub tx_id: TxId,
    pub block_height: u32,
    pub op_return_type: OpReturnType,
    pub hash: [u8; 20],
}

/// A blind vote was published with `stake` locked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindVoteEvent {
    pub tx_id: TxId,
    pub block_height: u32,
    pub hash: [u8; 20],
    pub stake: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChangeEvent {
    ParamChange(ParamChangeEvent),
    Proposal(ProposalEvent),
    BlindVote(BlindVoteEvent),
}

impl StateChangeEvent {
    pub fn height(&self) -> u32 {
        match self {
            Self::ParamChange(e) => e.activation_height,
            Self::Proposal(e) => e.block_height,
            Self::BlindVote(e) => e.block_height,
        }
    }
}
