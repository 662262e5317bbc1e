//! DAO state store.
//!
//! Append-only block history plus the derived indices every consumer reads:
//! unspent outputs, spent info, output and tx types, burnt fees, issuance
//! heights and governance cycles. Reads go through the [`DaoStateReader`]
//! trait; writes go through [`StateStore`], which admits one writer at a time
//! and notifies block listeners after each commit.

pub mod error;
pub mod listeners;
pub mod reader;
pub mod state;
pub mod store;

pub use error::StoreError;
pub use listeners::{BlockListeners, BlockSubscription};
pub use reader::DaoStateReader;
pub use state::DaoState;
pub use store::StateStore;
