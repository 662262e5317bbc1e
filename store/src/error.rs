use bsq_types::{BlockHash, Param, TxId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("block {height} is below the genesis height {genesis_height}")]
    BeforeGenesis { height: u32, genesis_height: u32 },

    #[error("block {height} does not extend chain height {chain_height}")]
    HeightNotIncreasing { height: u32, chain_height: u32 },

    #[error("block {height} does not connect: expected previous hash {expected}, got {actual}")]
    BlockNotConnecting {
        height: u32,
        expected: BlockHash,
        actual: BlockHash,
    },

    #[error("no block is open for writing")]
    NoOpenBlock,

    #[error("tx {tx_id} has height {tx_height} but the open block is {block_height}")]
    TxHeightMismatch {
        tx_id: TxId,
        tx_height: u32,
        block_height: u32,
    },

    #[error("duplicate tx: {0}")]
    DuplicateTx(TxId),

    #[error("tx {0} is not a compensation request and cannot be issued")]
    InvalidIssuance(TxId),

    #[error("{param} value {value} exceeds the maximum of {max}")]
    ParamOutOfRange { param: Param, value: u64, max: u64 },

    #[error("key not found: {0}")]
    NotFound(String),
}
