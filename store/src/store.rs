//! Single-writer wrapper around [`DaoState`].

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bsq_types::{Block, GenesisConfig, ParamChangeEvent, StateChangeEvent, TxId};

use crate::error::StoreError;
use crate::listeners::{BlockListeners, BlockSubscription};
use crate::reader::DaoStateReader;
use crate::state::DaoState;

/// Shared handle to the DAO state.
///
/// Readers take a read guard and see only fully committed blocks. A block is
/// applied under the write lock as a whole; listeners run afterwards.
pub struct StateStore {
    state: RwLock<DaoState>,
    listeners: BlockListeners,
}

impl StateStore {
    pub fn new(genesis: GenesisConfig) -> Self {
        Self {
            state: RwLock::new(DaoState::new(genesis)),
            listeners: BlockListeners::new(),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, DaoState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DaoState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one block atomically.
    ///
    /// `apply` receives exclusive access and must open exactly one block. If it
    /// fails, every block it opened is removed again before the lock is
    /// released, so the failed attempt is never observable. On success the
    /// committed block is passed to every listener once.
    pub fn apply_block<E, F>(&self, apply: F) -> Result<Block, E>
    where
        F: FnOnce(&mut DaoState) -> Result<(), E>,
        E: From<StoreError>,
    {
        let block = {
            let mut state = self.write();
            let blocks_before = state.blocks().len();
            if let Err(e) = apply(&mut state) {
                while state.blocks().len() > blocks_before {
                    state.remove_last_block();
                }
                return Err(e);
            }
            if state.blocks().len() != blocks_before + 1 {
                while state.blocks().len() > blocks_before {
                    state.remove_last_block();
                }
                return Err(StoreError::NoOpenBlock.into());
            }
            match state.last_block() {
                Some(block) => block.clone(),
                None => return Err(StoreError::NoOpenBlock.into()),
            }
        };

        tracing::debug!(
            height = block.height,
            txs = block.txs.len(),
            listeners = self.listeners.len(),
            "block committed"
        );
        self.listeners.notify(&block);
        Ok(block)
    }

    /// Remove the tip block, for reorg handling.
    pub fn remove_last_block(&self) -> Option<Block> {
        let removed = self.write().remove_last_block();
        if let Some(block) = &removed {
            tracing::info!(height = block.height, hash = %block.hash, "removed tip block");
        }
        removed
    }

    /// Record a param change voted in by the DAO, attached to the tip block.
    pub fn add_param_change(&self, change: ParamChangeEvent) -> Result<(), StoreError> {
        tracing::info!(
            param = %change.param,
            value = change.value,
            activation_height = change.activation_height,
            "param change"
        );
        self.write()
            .add_state_change_event(StateChangeEvent::ParamChange(change))
    }

    pub fn add_issuance(&self, tx_id: &TxId, height: u32) -> Result<(), StoreError> {
        self.write().add_issuance(tx_id, height)
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Block) + Send + Sync + 'static,
    ) -> BlockSubscription {
        self.listeners.subscribe(listener)
    }

    pub fn chain_height(&self) -> u32 {
        self.read().chain_height()
    }
}
