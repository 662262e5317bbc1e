//! Fundamental types for the BSQ DAO.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! raw chain data as received, the transaction phase pipeline (raw, temp, final),
//! classified blocks, governance params, cycles and state change events.

pub mod block;
pub mod cycle;
pub mod error;
pub mod events;
pub mod genesis;
pub mod id;
pub mod op_return;
pub mod params;
pub mod raw;
pub mod tx;

pub use block::Block;
pub use cycle::{Cycle, DaoPhase};
pub use error::TypesError;
pub use events::{BlindVoteEvent, ParamChangeEvent, ProposalEvent, StateChangeEvent};
pub use genesis::GenesisConfig;
pub use id::{BlockHash, TxId};
pub use op_return::OpReturnType;
pub use params::{Param, MAX_PHASE_DURATION};
pub use raw::{PubKeyScript, RawBlock, RawTx, RawTxOutput, TxInput};
pub use tx::{SpentInfo, TempTx, TempTxOutput, Tx, TxOutput, TxOutputKey, TxOutputType, TxType};
