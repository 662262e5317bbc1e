//! Chain data as received from the base-chain client, before any classification.
//!
//! Raw values are immutable. They are produced either by the base-chain client
//! (full node) or by converting stored [`Block`]s back for transmission to lite nodes.

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::id::{BlockHash, TxId};
use crate::tx::{Tx, TxOutput};

/// Locking script of an output, as reported by the base-chain client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKeyScript {
    pub script_type: String,
    pub hex: String,
    pub addresses: Vec<String>,
}

/// Reference from a transaction input to the output it spends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub connected_tx_output_tx_id: TxId,
    pub connected_tx_output_index: u32,
    pub pub_key: Option<String>,
}

impl TxInput {
    pub fn new(tx_id: impl Into<TxId>, index: u32) -> Self {
        Self {
            connected_tx_output_tx_id: tx_id.into(),
            connected_tx_output_index: index,
            pub_key: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTxOutput {
    pub index: u32,
    /// Value in satoshi.
    pub value: u64,
    pub tx_id: TxId,
    pub pub_key_script: Option<PubKeyScript>,
    pub address: Option<String>,
    /// Payload bytes if this output is an OP_RETURN output.
    pub op_return_data: Option<Vec<u8>>,
    pub block_height: u32,
}

impl RawTxOutput {
    pub fn is_op_return(&self) -> bool {
        self.op_return_data.is_some()
    }
}

impl From<&TxOutput> for RawTxOutput {
    fn from(output: &TxOutput) -> Self {
        Self {
            index: output.index,
            value: output.value,
            tx_id: output.tx_id.clone(),
            pub_key_script: output.pub_key_script.clone(),
            address: output.address.clone(),
            op_return_data: output.op_return_data.clone(),
            block_height: output.block_height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTx {
    pub id: TxId,
    pub block_height: u32,
    pub block_hash: BlockHash,
    /// Block time, unix seconds.
    pub time: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<RawTxOutput>,
}

impl RawTx {
    /// Sum of all output values.
    pub fn output_sum(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }
}

impl From<&Tx> for RawTx {
    fn from(tx: &Tx) -> Self {
        Self {
            id: tx.id.clone(),
            block_height: tx.block_height,
            block_hash: tx.block_hash.clone(),
            time: tx.time,
            inputs: tx.inputs.clone(),
            outputs: tx.outputs.iter().map(RawTxOutput::from).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    pub height: u32,
    /// Block time, unix seconds.
    pub time: u64,
    pub hash: BlockHash,
    pub previous_block_hash: BlockHash,
    pub txs: Vec<RawTx>,
}

impl RawBlock {
    /// Strip classification from a stored block so a peer can re-parse it.
    pub fn from_block(block: &Block) -> Self {
        Self {
            height: block.height,
            time: block.time,
            hash: block.hash.clone(),
            previous_block_hash: block.previous_block_hash.clone(),
            txs: block.txs.iter().map(RawTx::from).collect(),
        }
    }
}
