//! The concrete DAO state: block history plus incrementally maintained indices.
//!
//! All mutation goes through a handful of methods that keep the indices in step
//! with the block list. [`DaoState::remove_last_block`] undoes exactly what the
//! block's application did. Writers reach a `&mut DaoState` only through
//! [`StateStore`](crate::StateStore), which serializes them.

use std::collections::HashMap;

use bsq_types::{
    Block, Cycle, DaoPhase, GenesisConfig, ParamChangeEvent, RawBlock, SpentInfo,
    StateChangeEvent, Tx, TxId, TxOutput, TxOutputKey, TxOutputType, TxType,
};

use crate::error::StoreError;
use crate::reader::DaoStateReader;

#[derive(Debug)]
pub struct DaoState {
    genesis: GenesisConfig,
    blocks: Vec<Block>,
    /// tx id -> (block index, tx index)
    tx_locations: HashMap<TxId, (usize, usize)>,
    unspent: HashMap<TxOutputKey, TxOutput>,
    spent_info: HashMap<TxOutputKey, SpentInfo>,
    tx_output_types: HashMap<TxOutputKey, TxOutputType>,
    tx_types: HashMap<TxId, TxType>,
    burnt_fees: HashMap<TxId, u64>,
    total_burnt_fee: u64,
    issuance_heights: HashMap<TxId, u32>,
    cycles: Vec<Cycle>,
    param_changes: Vec<ParamChangeEvent>,
}

impl DaoState {
    pub fn new(genesis: GenesisConfig) -> Self {
        Self {
            genesis,
            blocks: Vec::new(),
            tx_locations: HashMap::new(),
            unspent: HashMap::new(),
            spent_info: HashMap::new(),
            tx_output_types: HashMap::new(),
            tx_types: HashMap::new(),
            burnt_fees: HashMap::new(),
            total_burnt_fee: 0,
            issuance_heights: HashMap::new(),
            cycles: Vec::new(),
            param_changes: Vec::new(),
        }
    }

    /// Open a new, empty block carrying the header of `raw`.
    ///
    /// The block must be at or above genesis, above the chain tip, and must
    /// reference the tip's hash.
    pub fn start_block(&mut self, raw: &RawBlock) -> Result<(), StoreError> {
        if raw.height < self.genesis.block_height {
            return Err(StoreError::BeforeGenesis {
                height: raw.height,
                genesis_height: self.genesis.block_height,
            });
        }
        if let Some(last) = self.blocks.last() {
            if raw.height <= last.height {
                return Err(StoreError::HeightNotIncreasing {
                    height: raw.height,
                    chain_height: last.height,
                });
            }
            if raw.previous_block_hash != last.hash {
                return Err(StoreError::BlockNotConnecting {
                    height: raw.height,
                    expected: last.hash.clone(),
                    actual: raw.previous_block_hash.clone(),
                });
            }
        }

        self.blocks.push(Block::with_header_of(raw));
        self.advance_cycles(raw.height);
        Ok(())
    }

    /// Append a classified tx to the open block and update every index.
    pub fn add_tx(&mut self, tx: Tx) -> Result<(), StoreError> {
        let block_index = self.blocks.len().checked_sub(1).ok_or(StoreError::NoOpenBlock)?;
        let block_height = self.blocks[block_index].height;
        if tx.block_height != block_height {
            return Err(StoreError::TxHeightMismatch {
                tx_id: tx.id,
                tx_height: tx.block_height,
                block_height,
            });
        }
        if self.tx_locations.contains_key(&tx.id) {
            return Err(StoreError::DuplicateTx(tx.id));
        }

        for (input_index, input) in tx.inputs.iter().enumerate() {
            let key = TxOutputKey::from(input);
            if self.unspent.remove(&key).is_some() {
                self.spent_info.insert(
                    key,
                    SpentInfo {
                        block_height,
                        tx_id: tx.id.clone(),
                        input_index: input_index as u32,
                    },
                );
            }
        }

        for output in &tx.outputs {
            let key = output.key();
            self.tx_output_types.insert(key.clone(), output.tx_output_type);
            self.unspent.insert(key, output.clone());
        }

        self.tx_types.insert(tx.id.clone(), tx.tx_type);
        if tx.burnt_fee > 0 {
            self.burnt_fees.insert(tx.id.clone(), tx.burnt_fee);
            self.total_burnt_fee += tx.burnt_fee;
        }

        let block = &mut self.blocks[block_index];
        self.tx_locations
            .insert(tx.id.clone(), (block_index, block.txs.len()));
        block.txs.push(tx);
        Ok(())
    }

    /// Attach an event to the open block.
    pub fn add_state_change_event(&mut self, event: StateChangeEvent) -> Result<(), StoreError> {
        if let StateChangeEvent::ParamChange(change) = &event {
            if let Some(max) = change.param.max_value().filter(|max| change.value > *max) {
                return Err(StoreError::ParamOutOfRange {
                    param: change.param,
                    value: change.value,
                    max,
                });
            }
        }
        let block = self.blocks.last_mut().ok_or(StoreError::NoOpenBlock)?;
        if let StateChangeEvent::ParamChange(change) = &event {
            self.param_changes.push(change.clone());
        }
        block.state_change_events.push(event);
        Ok(())
    }

    /// Record that the vote result issued the compensation request `tx_id` at
    /// `height`. Its issuance candidate output becomes BSQ from then on.
    pub fn add_issuance(&mut self, tx_id: &TxId, height: u32) -> Result<(), StoreError> {
        match self.tx_types.get(tx_id) {
            Some(TxType::CompensationRequest) => {
                self.issuance_heights.insert(tx_id.clone(), height);
                Ok(())
            }
            Some(_) => Err(StoreError::InvalidIssuance(tx_id.clone())),
            None => Err(StoreError::NotFound(tx_id.to_string())),
        }
    }

    /// Remove the tip block and unwind every index change it made.
    pub fn remove_last_block(&mut self) -> Option<Block> {
        let block = self.blocks.pop()?;

        for tx in block.txs.iter().rev() {
            for output in &tx.outputs {
                let key = output.key();
                self.unspent.remove(&key);
                self.tx_output_types.remove(&key);
            }

            for (input_index, input) in tx.inputs.iter().enumerate() {
                let key = TxOutputKey::from(input);
                let spent_here = self
                    .spent_info
                    .get(&key)
                    .is_some_and(|s| s.tx_id == tx.id && s.input_index as usize == input_index);
                if !spent_here {
                    continue;
                }
                let source = block
                    .txs
                    .iter()
                    .find(|t| t.id == key.tx_id)
                    .or_else(|| self.tx(&key.tx_id))
                    .and_then(|t| t.output(key.index))
                    .cloned();
                self.spent_info.remove(&key);
                if let Some(output) = source {
                    self.unspent.insert(key, output);
                }
            }

            self.tx_types.remove(&tx.id);
            if let Some(fee) = self.burnt_fees.remove(&tx.id) {
                self.total_burnt_fee -= fee;
            }
            self.tx_locations.remove(&tx.id);
            self.issuance_heights.remove(&tx.id);
        }

        let removed_changes: Vec<&ParamChangeEvent> = block
            .state_change_events
            .iter()
            .filter_map(|e| match e {
                StateChangeEvent::ParamChange(c) => Some(c),
                _ => None,
            })
            .collect();
        if !removed_changes.is_empty() {
            self.param_changes.retain(|c| !removed_changes.contains(&c));
        }
        self.issuance_heights.retain(|_, h| *h < block.height);

        match self.blocks.last().map(|b| b.height) {
            Some(tip) => self.cycles.retain(|c| c.first_block <= tip),
            None => self.cycles.clear(),
        }

        Some(block)
    }

    /// Open cycles until `height` is covered.
    fn advance_cycles(&mut self, height: u32) {
        loop {
            let first_block = match self.cycles.last() {
                None => self.genesis.block_height,
                Some(c) if height > c.last_block() => c.last_block() + 1,
                Some(_) => break,
            };
            let cycle = self.cycle_starting_at(first_block);
            if cycle.duration() == 0 {
                tracing::warn!(first_block, "all phase durations are zero; not opening a cycle");
                break;
            }
            tracing::debug!(
                first_block,
                last_block = cycle.last_block(),
                "opened new dao cycle"
            );
            self.cycles.push(cycle);
        }
    }

    fn cycle_starting_at(&self, first_block: u32) -> Cycle {
        let phases = DaoPhase::ALL
            .iter()
            .map(|phase| {
                let duration = self.param_value(phase.duration_param(), first_block);
                (*phase, u32::try_from(duration).unwrap_or(u32::MAX))
            })
            .collect();
        Cycle::new(first_block, phases)
    }
}

impl DaoStateReader for DaoState {
    fn genesis(&self) -> &GenesisConfig {
        &self.genesis
    }

    fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn tx(&self, tx_id: &TxId) -> Option<&Tx> {
        let (block_index, tx_index) = *self.tx_locations.get(tx_id)?;
        self.blocks.get(block_index)?.txs.get(tx_index)
    }

    fn unspent_tx_output_map(&self) -> &HashMap<TxOutputKey, TxOutput> {
        &self.unspent
    }

    fn spent_info_map(&self) -> &HashMap<TxOutputKey, SpentInfo> {
        &self.spent_info
    }

    fn tx_output_type_map(&self) -> &HashMap<TxOutputKey, TxOutputType> {
        &self.tx_output_types
    }

    fn tx_type_map(&self) -> &HashMap<TxId, TxType> {
        &self.tx_types
    }

    fn burnt_fee_map(&self) -> &HashMap<TxId, u64> {
        &self.burnt_fees
    }

    fn issuance_block_height_map(&self) -> &HashMap<TxId, u32> {
        &self.issuance_heights
    }

    fn total_burnt_fee(&self) -> u64 {
        self.total_burnt_fee
    }

    fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    fn param_change_events(&self) -> &[ParamChangeEvent] {
        &self.param_changes
    }
}
