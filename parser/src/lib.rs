//! BSQ parser.
//!
//! Classifies raw base-chain transactions against the current DAO state and
//! applies the result block by block. Classification is a pure function of
//! `(raw tx, block height, state)`, so every node replaying the same blocks
//! reaches the same state.

pub mod block_parser;
pub mod error;
pub mod genesis;
mod model;
mod op_return;
pub mod tx_parser;

pub use block_parser::BlockParser;
pub use error::ParseError;
pub use genesis::find_genesis_tx;
pub use bsq_types::op_return::OP_RETURN_VERSION;
pub use tx_parser::{ParsedTx, TxParser};
