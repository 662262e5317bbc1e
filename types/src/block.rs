//! Classified block as stored by the state store.

use serde::{Deserialize, Serialize};

use crate::events::StateChangeEvent;
use crate::id::BlockHash;
use crate::raw::RawBlock;
use crate::tx::Tx;

/// A block after classification. Only BSQ-relevant txs are kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u32,
    pub time: u64,
    pub hash: BlockHash,
    pub previous_block_hash: BlockHash,
    pub txs: Vec<Tx>,
    pub state_change_events: Vec<StateChangeEvent>,
}

impl Block {
    /// An empty block carrying the header fields of `raw`.
    pub fn with_header_of(raw: &RawBlock) -> Self {
        Self {
            height: raw.height,
            time: raw.time,
            hash: raw.hash.clone(),
            previous_block_hash: raw.previous_block_hash.clone(),
            txs: Vec::new(),
            state_change_events: Vec::new(),
        }
    }
}
