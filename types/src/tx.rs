//! Transaction phase pipeline.
//!
//! A [`RawTx`] becomes a [`TempTx`] while the parser works on it. The temp value
//! is the only mutable phase: output types, tx type and burnt fee are filled in
//! there. Once classification is done it is frozen into a [`Tx`]. Each step is a
//! total `From` conversion and nothing flows backwards except the explicit
//! re-serialization in [`RawTx::from`] used for transmission.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::{BlockHash, TxId};
use crate::raw::{PubKeyScript, RawTx, RawTxOutput, TxInput};

/// Classification of a single output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxOutputType {
    Undefined,
    GenesisOutput,
    BsqOutput,
    BtcOutput,
    ProposalOpReturnOutput,
    CompReqOpReturnOutput,
    ChangeParamOpReturnOutput,
    IssuanceCandidateOutput,
    BlindVoteLockStakeOutput,
    BlindVoteOpReturnOutput,
    VoteRevealOpReturnOutput,
    BondLock,
    LockupOpReturnOutput,
    InvalidOutput,
}

impl TxOutputType {
    pub fn is_op_return(self) -> bool {
        matches!(
            self,
            Self::ProposalOpReturnOutput
                | Self::CompReqOpReturnOutput
                | Self::ChangeParamOpReturnOutput
                | Self::BlindVoteOpReturnOutput
                | Self::VoteRevealOpReturnOutput
                | Self::LockupOpReturnOutput
        )
    }
}

/// Classification of a whole transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    Undefined,
    Invalid,
    Genesis,
    TransferBsq,
    PayTradeFee,
    Proposal,
    CompensationRequest,
    ChangeParam,
    BlindVote,
    VoteReveal,
    Lockup,
}

impl TxType {
    /// Whether the tx burns BSQ as a governance fee.
    pub fn requires_fee(self) -> bool {
        matches!(
            self,
            Self::Proposal | Self::CompensationRequest | Self::ChangeParam | Self::BlindVote
        )
    }
}

/// Identifies an output by `(tx id, index)`.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TxOutputKey {
    pub tx_id: TxId,
    pub index: u32,
}

impl TxOutputKey {
    pub fn new(tx_id: impl Into<TxId>, index: u32) -> Self {
        Self {
            tx_id: tx_id.into(),
            index,
        }
    }
}

impl From<&TxInput> for TxOutputKey {
    fn from(input: &TxInput) -> Self {
        Self {
            tx_id: input.connected_tx_output_tx_id.clone(),
            index: input.connected_tx_output_index,
        }
    }
}

impl fmt::Display for TxOutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

/// Records which transaction input consumed an output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpentInfo {
    pub block_height: u32,
    pub tx_id: TxId,
    pub input_index: u32,
}

/// Output under classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TempTxOutput {
    pub index: u32,
    pub value: u64,
    pub tx_id: TxId,
    pub pub_key_script: Option<PubKeyScript>,
    pub address: Option<String>,
    pub op_return_data: Option<Vec<u8>>,
    pub block_height: u32,
    pub tx_output_type: TxOutputType,
}

impl TempTxOutput {
    pub fn key(&self) -> TxOutputKey {
        TxOutputKey::new(self.tx_id.clone(), self.index)
    }

    pub fn is_op_return(&self) -> bool {
        self.op_return_data.is_some()
    }
}

impl From<&RawTxOutput> for TempTxOutput {
    fn from(raw: &RawTxOutput) -> Self {
        Self {
            index: raw.index,
            value: raw.value,
            tx_id: raw.tx_id.clone(),
            pub_key_script: raw.pub_key_script.clone(),
            address: raw.address.clone(),
            op_return_data: raw.op_return_data.clone(),
            block_height: raw.block_height,
            tx_output_type: TxOutputType::Undefined,
        }
    }
}

/// Transaction under classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TempTx {
    pub id: TxId,
    pub block_height: u32,
    pub block_hash: BlockHash,
    pub time: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TempTxOutput>,
    pub tx_type: TxType,
    pub burnt_fee: u64,
}

impl From<&RawTx> for TempTx {
    fn from(raw: &RawTx) -> Self {
        Self {
            id: raw.id.clone(),
            block_height: raw.block_height,
            block_hash: raw.block_hash.clone(),
            time: raw.time,
            inputs: raw.inputs.clone(),
            outputs: raw.outputs.iter().map(TempTxOutput::from).collect(),
            tx_type: TxType::Undefined,
            burnt_fee: 0,
        }
    }
}

/// A finalized output. Its type never changes once stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub index: u32,
    pub value: u64,
    pub tx_id: TxId,
    pub pub_key_script: Option<PubKeyScript>,
    pub address: Option<String>,
    pub op_return_data: Option<Vec<u8>>,
    pub block_height: u32,
    pub tx_output_type: TxOutputType,
}

impl TxOutput {
    pub fn key(&self) -> TxOutputKey {
        TxOutputKey::new(self.tx_id.clone(), self.index)
    }
}

impl From<TempTxOutput> for TxOutput {
    fn from(temp: TempTxOutput) -> Self {
        Self {
            index: temp.index,
            value: temp.value,
            tx_id: temp.tx_id,
            pub_key_script: temp.pub_key_script,
            address: temp.address,
            op_return_data: temp.op_return_data,
            block_height: temp.block_height,
            tx_output_type: temp.tx_output_type,
        }
    }
}

/// A finalized, classified transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub id: TxId,
    pub block_height: u32,
    pub block_hash: BlockHash,
    pub time: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub tx_type: TxType,
    pub burnt_fee: u64,
}

impl Tx {
    pub fn output(&self, index: u32) -> Option<&TxOutput> {
        self.outputs.get(index as usize)
    }

    /// The OP_RETURN output, if the tx has one.
    pub fn op_return_output(&self) -> Option<&TxOutput> {
        self.outputs.iter().find(|o| o.op_return_data.is_some())
    }
}

impl From<TempTx> for Tx {
    fn from(temp: TempTx) -> Self {
        Self {
            id: temp.id,
            block_height: temp.block_height,
            block_hash: temp.block_hash,
            time: temp.time,
            inputs: temp.inputs,
            outputs: temp.outputs.into_iter().map(TxOutput::from).collect(),
            tx_type: temp.tx_type,
            burnt_fee: temp.burnt_fee,
        }
    }
}
