//! Read-only query surface over the DAO state.
//!
//! Implementors provide the raw indices; every query is a default method on
//! top of them, so all consumers (parser, wallet, governance, UI) see the same
//! semantics regardless of where the indices live.

use std::collections::HashMap;

use bsq_types::{
    BlindVoteEvent, Block, Cycle, DaoPhase, GenesisConfig, Param, ParamChangeEvent,
    ProposalEvent, SpentInfo, StateChangeEvent, Tx, TxId, TxInput, TxOutput, TxOutputKey,
    TxOutputType, TxType,
};

pub trait DaoStateReader {
    // ── Indices ─────────────────────────────────────────────────────────

    fn genesis(&self) -> &GenesisConfig;

    /// Blocks in strictly increasing height order.
    fn blocks(&self) -> &[Block];

    fn tx(&self, tx_id: &TxId) -> Option<&Tx>;

    fn unspent_tx_output_map(&self) -> &HashMap<TxOutputKey, TxOutput>;

    fn spent_info_map(&self) -> &HashMap<TxOutputKey, SpentInfo>;

    fn tx_output_type_map(&self) -> &HashMap<TxOutputKey, TxOutputType>;

    fn tx_type_map(&self) -> &HashMap<TxId, TxType>;

    fn burnt_fee_map(&self) -> &HashMap<TxId, u64>;

    fn issuance_block_height_map(&self) -> &HashMap<TxId, u32>;

    fn total_burnt_fee(&self) -> u64;

    fn cycles(&self) -> &[Cycle];

    /// Param changes in the order they were added.
    fn param_change_events(&self) -> &[ParamChangeEvent];

    // ── Blocks ──────────────────────────────────────────────────────────

    /// Height of the last applied block, or the genesis height before any block.
    fn chain_height(&self) -> u32 {
        self.blocks()
            .last()
            .map(|b| b.height)
            .unwrap_or(self.genesis().block_height)
    }

    fn last_block(&self) -> Option<&Block> {
        self.blocks().last()
    }

    fn block_at_height(&self, height: u32) -> Option<&Block> {
        let blocks = self.blocks();
        blocks
            .binary_search_by_key(&height, |b| b.height)
            .ok()
            .map(|i| &blocks[i])
    }

    fn block_time(&self, height: u32) -> Option<u64> {
        self.block_at_height(height).map(|b| b.time)
    }

    fn contains_block(&self, block: &Block) -> bool {
        self.block_at_height(block.height)
            .is_some_and(|b| b.hash == block.hash)
    }

    /// All blocks with `height >= from_height`.
    fn blocks_from_height(&self, from_height: u32) -> &[Block] {
        let blocks = self.blocks();
        let start = blocks.partition_point(|b| b.height < from_height);
        &blocks[start..]
    }

    // ── Transactions ────────────────────────────────────────────────────

    fn genesis_tx(&self) -> Option<&Tx> {
        self.tx(&self.genesis().tx_id)
    }

    fn contains_tx(&self, tx_id: &TxId) -> bool {
        self.tx(tx_id).is_some()
    }

    fn tx_type(&self, tx_id: &TxId) -> Option<TxType> {
        self.tx_type_map().get(tx_id).copied()
    }

    fn burnt_fee(&self, tx_id: &TxId) -> u64 {
        self.burnt_fee_map().get(tx_id).copied().unwrap_or(0)
    }

    fn has_tx_burnt_fee(&self, tx_id: &TxId) -> bool {
        self.burnt_fee(tx_id) > 0
    }

    /// Txs that burnt a fee, in chain order.
    fn fee_txs(&self) -> Vec<&Tx> {
        self.blocks()
            .iter()
            .flat_map(|b| b.txs.iter())
            .filter(|tx| tx.burnt_fee > 0)
            .collect()
    }

    fn is_issuance_tx(&self, tx_id: &TxId) -> bool {
        self.issuance_block_height_map().contains_key(tx_id)
    }

    fn issuance_block_height(&self, tx_id: &TxId) -> Option<u32> {
        self.issuance_block_height_map().get(tx_id).copied()
    }

    // ── Outputs ─────────────────────────────────────────────────────────

    fn tx_output(&self, key: &TxOutputKey) -> Option<&TxOutput> {
        self.tx(&key.tx_id)?.output(key.index)
    }

    fn connected_tx_output(&self, input: &TxInput) -> Option<&TxOutput> {
        self.tx_output(&TxOutputKey::from(input))
    }

    fn exists_tx_output(&self, key: &TxOutputKey) -> bool {
        self.tx_output_type_map().contains_key(key)
    }

    fn tx_output_type(&self, key: &TxOutputKey) -> Option<TxOutputType> {
        self.tx_output_type_map().get(key).copied()
    }

    /// Whether the output carries BSQ. An issuance candidate only does once
    /// its compensation request got issued.
    fn is_bsq_tx_output_type(&self, output: &TxOutput) -> bool {
        match output.tx_output_type {
            TxOutputType::Undefined | TxOutputType::BtcOutput | TxOutputType::InvalidOutput => {
                false
            }
            TxOutputType::IssuanceCandidateOutput => self.is_issuance_tx(&output.tx_id),
            _ => true,
        }
    }

    fn is_btc_output(&self, key: &TxOutputKey) -> bool {
        self.tx_output_type(key) == Some(TxOutputType::BtcOutput)
    }

    fn btc_tx_output(&self, key: &TxOutputKey) -> Option<&TxOutput> {
        self.unspent_tx_output(key)
            .filter(|o| o.tx_output_type == TxOutputType::BtcOutput)
    }

    /// Coin selection predicate for ordinary BTC spends: unknown outputs and
    /// outputs classified as BTC may be spent, anything colored may not.
    fn is_spendable_as_btc(&self, key: &TxOutputKey) -> bool {
        !self.exists_tx_output(key) || self.btc_tx_output(key).is_some()
    }

    fn is_unspent(&self, key: &TxOutputKey) -> bool {
        self.unspent_tx_output_map().contains_key(key)
    }

    fn unspent_tx_output(&self, key: &TxOutputKey) -> Option<&TxOutput> {
        self.unspent_tx_output_map().get(key)
    }

    /// Always true. Extension point for a future lock period.
    fn is_tx_output_mature(&self, _output: &TxOutput) -> bool {
        true
    }

    fn unspent_and_mature_tx_output(&self, key: &TxOutputKey) -> Option<&TxOutput> {
        self.unspent_tx_output(key)
            .filter(|o| self.is_tx_output_mature(o))
    }

    /// Unspent and mature, and not locked as blind vote stake.
    fn is_tx_output_spendable(&self, key: &TxOutputKey) -> bool {
        self.unspent_and_mature_tx_output(key)
            .is_some_and(|o| o.tx_output_type != TxOutputType::BlindVoteLockStakeOutput)
    }

    fn spent_info(&self, key: &TxOutputKey) -> Option<&SpentInfo> {
        self.spent_info_map().get(key)
    }

    fn unspent_blind_vote_stake_tx_outputs(&self) -> Vec<&TxOutput> {
        unspent_of_type(self, TxOutputType::BlindVoteLockStakeOutput)
    }

    fn locked_in_bond_outputs(&self) -> Vec<&TxOutput> {
        unspent_of_type(self, TxOutputType::BondLock)
    }

    fn vote_reveal_op_return_tx_outputs(&self) -> Vec<&TxOutput> {
        outputs_of_type(self, TxOutputType::VoteRevealOpReturnOutput)
    }

    fn issuance_candidate_tx_outputs(&self) -> Vec<&TxOutput> {
        outputs_of_type(self, TxOutputType::IssuanceCandidateOutput)
    }

    fn total_issued_amount_from_comp_requests(&self) -> u64 {
        self.issuance_candidate_tx_outputs()
            .into_iter()
            .filter(|o| self.is_issuance_tx(&o.tx_id))
            .map(|o| o.value)
            .sum()
    }

    // ── Events ──────────────────────────────────────────────────────────

    fn state_change_events(&self) -> Vec<&StateChangeEvent> {
        self.blocks()
            .iter()
            .flat_map(|b| b.state_change_events.iter())
            .collect()
    }

    fn proposal_events(&self) -> Vec<&ProposalEvent> {
        self.state_change_events()
            .into_iter()
            .filter_map(|e| match e {
                StateChangeEvent::Proposal(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn blind_vote_events(&self) -> Vec<&BlindVoteEvent> {
        self.state_change_events()
            .into_iter()
            .filter_map(|e| match e {
                StateChangeEvent::BlindVote(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    // ── Params and cycles ───────────────────────────────────────────────

    /// Value of `param` effective at `height`: the latest change activated at
    /// or before `height`, else the default.
    fn param_value(&self, param: Param, height: u32) -> u64 {
        self.param_change_events()
            .iter()
            .filter(|e| e.param == param && e.activation_height <= height)
            .max_by_key(|e| e.activation_height)
            .map(|e| e.value)
            .unwrap_or_else(|| param.default_value())
    }

    fn cycle_at_height(&self, height: u32) -> Option<&Cycle> {
        self.cycles().iter().rev().find(|c| c.contains(height))
    }

    fn current_cycle(&self) -> Option<&Cycle> {
        self.cycle_at_height(self.chain_height())
    }

    fn phase_at_height(&self, height: u32) -> Option<DaoPhase> {
        self.cycle_at_height(height)?.phase_at(height)
    }

    fn is_in_phase(&self, height: u32, phase: DaoPhase) -> bool {
        self.phase_at_height(height) == Some(phase)
    }
}

/// Sorted by key so results are stable across nodes.
fn sorted(mut outputs: Vec<&TxOutput>) -> Vec<&TxOutput> {
    outputs.sort_by(|a, b| {
        (a.block_height, &a.tx_id, a.index).cmp(&(b.block_height, &b.tx_id, b.index))
    });
    outputs
}

fn unspent_of_type<R: DaoStateReader + ?Sized>(state: &R, t: TxOutputType) -> Vec<&TxOutput> {
    sorted(
        state
            .unspent_tx_output_map()
            .values()
            .filter(|o| o.tx_output_type == t)
            .collect(),
    )
}

fn outputs_of_type<R: DaoStateReader + ?Sized>(state: &R, t: TxOutputType) -> Vec<&TxOutput> {
    sorted(
        state
            .tx_output_type_map()
            .iter()
            .filter(|(_, ty)| **ty == t)
            .filter_map(|(key, _)| state.tx_output(key))
            .collect(),
    )
}
