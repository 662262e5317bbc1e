//! Identity of the genesis transaction.

use serde::{Deserialize, Serialize};

use crate::id::TxId;

/// The configured genesis tx. Its outputs must add up to `total_supply` exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub tx_id: TxId,
    pub block_height: u32,
    /// Total BSQ supply in satoshi.
    pub total_supply: u64,
}
