use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use proptest::prelude::*;

use bsq_store::{DaoState, DaoStateReader, StateStore, StoreError};
use bsq_types::{
    BlockHash, DaoPhase, GenesisConfig, Param, ParamChangeEvent, RawBlock, SpentInfo, Tx, TxId,
    TxInput, TxOutput, TxOutputKey, TxOutputType, TxType, MAX_PHASE_DURATION,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const GENESIS_HEIGHT: u32 = 100;

fn genesis() -> GenesisConfig {
    GenesisConfig {
        tx_id: TxId::new("genesis"),
        block_height: GENESIS_HEIGHT,
        total_supply: 10_000,
    }
}

fn hash(height: u32) -> BlockHash {
    BlockHash::new(format!("hash{height}"))
}

fn raw_block(height: u32) -> RawBlock {
    RawBlock {
        height,
        time: 1_000 + height as u64,
        hash: hash(height),
        previous_block_hash: hash(height - 1),
        txs: vec![],
    }
}

fn output(tx_id: &str, index: u32, value: u64, t: TxOutputType, height: u32) -> TxOutput {
    TxOutput {
        index,
        value,
        tx_id: TxId::new(tx_id),
        pub_key_script: None,
        address: None,
        op_return_data: None,
        block_height: height,
        tx_output_type: t,
    }
}

fn tx(
    id: &str,
    height: u32,
    inputs: Vec<TxInput>,
    outputs: Vec<(u64, TxOutputType)>,
    tx_type: TxType,
    burnt_fee: u64,
) -> Tx {
    Tx {
        id: TxId::new(id),
        block_height: height,
        block_hash: hash(height),
        time: 0,
        inputs,
        outputs: outputs
            .into_iter()
            .enumerate()
            .map(|(i, (v, t))| output(id, i as u32, v, t, height))
            .collect(),
        tx_type,
        burnt_fee,
    }
}

fn genesis_tx() -> Tx {
    tx(
        "genesis",
        GENESIS_HEIGHT,
        vec![],
        vec![
            (6_000, TxOutputType::GenesisOutput),
            (4_000, TxOutputType::GenesisOutput),
        ],
        TxType::Genesis,
        0,
    )
}

fn state_with_genesis() -> DaoState {
    let mut state = DaoState::new(genesis());
    state.start_block(&raw_block(GENESIS_HEIGHT)).unwrap();
    state.add_tx(genesis_tx()).unwrap();
    state
}

fn assert_partition(state: &DaoState) {
    for key in state.tx_output_type_map().keys() {
        let unspent = state.unspent_tx_output_map().contains_key(key);
        let spent = state.spent_info_map().contains_key(key);
        assert!(unspent ^ spent, "{key} must be in exactly one of unspent/spent");
    }
    assert_eq!(
        state.unspent_tx_output_map().len() + state.spent_info_map().len(),
        state.tx_output_type_map().len()
    );
}

// ---------------------------------------------------------------------------
// Block application
// ---------------------------------------------------------------------------

#[test]
fn genesis_outputs_are_unspent() {
    let state = state_with_genesis();
    assert_eq!(state.chain_height(), GENESIS_HEIGHT);
    assert_eq!(state.genesis_tx().map(|t| t.outputs.len()), Some(2));
    assert!(state.is_unspent(&TxOutputKey::new("genesis", 0)));
    assert!(state.is_tx_output_spendable(&TxOutputKey::new("genesis", 1)));
    assert_partition(&state);
}

#[test]
fn spending_moves_output_to_spent_info() {
    let mut state = state_with_genesis();
    state.start_block(&raw_block(101)).unwrap();
    state
        .add_tx(tx(
            "t1",
            101,
            vec![TxInput::new("genesis", 0)],
            vec![
                (5_800, TxOutputType::BsqOutput),
                (1_000, TxOutputType::BtcOutput),
            ],
            TxType::PayTradeFee,
            200,
        ))
        .unwrap();

    let spent = TxOutputKey::new("genesis", 0);
    assert!(!state.is_unspent(&spent));
    assert_eq!(
        state.spent_info(&spent),
        Some(&SpentInfo {
            block_height: 101,
            tx_id: TxId::new("t1"),
            input_index: 0
        })
    );
    assert_eq!(state.total_burnt_fee(), 200);
    assert!(state.has_tx_burnt_fee(&TxId::new("t1")));
    assert_eq!(state.fee_txs().len(), 1);
    assert_eq!(state.tx_type(&TxId::new("t1")), Some(TxType::PayTradeFee));
    assert!(state.is_btc_output(&TxOutputKey::new("t1", 1)));
    assert!(state.is_spendable_as_btc(&TxOutputKey::new("t1", 1)));
    assert!(!state.is_spendable_as_btc(&TxOutputKey::new("t1", 0)));
    assert!(state.is_spendable_as_btc(&TxOutputKey::new("unknown", 0)));
    assert_partition(&state);
}

#[test]
fn rejects_non_connecting_block() {
    let mut state = state_with_genesis();
    let mut raw = raw_block(101);
    raw.previous_block_hash = BlockHash::new("other");
    assert!(matches!(
        state.start_block(&raw),
        Err(StoreError::BlockNotConnecting { height: 101, .. })
    ));
}

#[test]
fn rejects_non_increasing_height_and_pre_genesis() {
    let mut state = state_with_genesis();
    assert!(matches!(
        state.start_block(&raw_block(GENESIS_HEIGHT)),
        Err(StoreError::HeightNotIncreasing { .. })
    ));

    let mut fresh = DaoState::new(genesis());
    assert!(matches!(
        fresh.start_block(&raw_block(50)),
        Err(StoreError::BeforeGenesis { height: 50, .. })
    ));
}

#[test]
fn rejects_duplicate_tx_and_wrong_height() {
    let mut state = state_with_genesis();
    assert_eq!(
        state.add_tx(genesis_tx()),
        Err(StoreError::DuplicateTx(TxId::new("genesis")))
    );
    let wrong = tx("t9", 999, vec![], vec![], TxType::TransferBsq, 0);
    assert!(matches!(
        state.add_tx(wrong),
        Err(StoreError::TxHeightMismatch { .. })
    ));
}

#[test]
fn blocks_from_height_and_lookup() {
    let mut state = state_with_genesis();
    for h in 101..=105 {
        state.start_block(&raw_block(h)).unwrap();
    }
    assert_eq!(state.blocks_from_height(103).len(), 3);
    assert_eq!(state.blocks_from_height(0).len(), 6);
    assert!(state.blocks_from_height(106).is_empty());
    assert_eq!(state.block_time(104), Some(1_104));
    assert_eq!(state.block_at_height(99), None);
}

// ---------------------------------------------------------------------------
// Governance indices
// ---------------------------------------------------------------------------

#[test]
fn stake_outputs_are_not_spendable() {
    let mut state = state_with_genesis();
    state.start_block(&raw_block(101)).unwrap();
    state
        .add_tx(tx(
            "vote",
            101,
            vec![TxInput::new("genesis", 1)],
            vec![
                (3_800, TxOutputType::BlindVoteLockStakeOutput),
                (0, TxOutputType::BlindVoteOpReturnOutput),
            ],
            TxType::BlindVote,
            200,
        ))
        .unwrap();

    let stake = TxOutputKey::new("vote", 0);
    assert!(state.is_unspent(&stake));
    assert!(!state.is_tx_output_spendable(&stake));
    assert_eq!(state.unspent_blind_vote_stake_tx_outputs().len(), 1);
}

#[test]
fn issuance_candidate_becomes_bsq_when_issued() {
    let mut state = state_with_genesis();
    state.start_block(&raw_block(101)).unwrap();
    state
        .add_tx(tx(
            "comp",
            101,
            vec![TxInput::new("genesis", 1)],
            vec![
                (3_800, TxOutputType::BsqOutput),
                (50_000, TxOutputType::IssuanceCandidateOutput),
                (0, TxOutputType::CompReqOpReturnOutput),
            ],
            TxType::CompensationRequest,
            200,
        ))
        .unwrap();

    let candidate = state.tx_output(&TxOutputKey::new("comp", 1)).unwrap().clone();
    assert!(!state.is_bsq_tx_output_type(&candidate));
    assert_eq!(state.total_issued_amount_from_comp_requests(), 0);

    state.start_block(&raw_block(102)).unwrap();
    state.add_issuance(&TxId::new("comp"), 102).unwrap();
    assert!(state.is_bsq_tx_output_type(&candidate));
    assert_eq!(state.issuance_candidate_tx_outputs().len(), 1);
    assert_eq!(state.total_issued_amount_from_comp_requests(), 50_000);
    assert_eq!(state.issuance_block_height(&TxId::new("comp")), Some(102));

    // the issuance is undone with the block that recorded it
    state.remove_last_block();
    assert!(!state.is_issuance_tx(&TxId::new("comp")));

    assert_eq!(
        state.add_issuance(&TxId::new("genesis"), 103),
        Err(StoreError::InvalidIssuance(TxId::new("genesis")))
    );
}

#[test]
fn param_changes_take_effect_from_activation_height() {
    let store = StateStore::new(genesis());
    store
        .apply_block(|s| s.start_block(&raw_block(GENESIS_HEIGHT)))
        .unwrap();
    store
        .add_param_change(ParamChangeEvent {
            param: Param::ProposalFee,
            value: 500,
            activation_height: 150,
        })
        .unwrap();

    let state = store.read();
    assert_eq!(state.param_value(Param::ProposalFee, 149), 200);
    assert_eq!(state.param_value(Param::ProposalFee, 150), 500);
    assert_eq!(state.param_value(Param::BlindVoteFee, 150), 200);
    assert_eq!(state.state_change_events().len(), 1);
}

#[test]
fn phase_duration_change_above_bound_is_rejected() {
    let store = StateStore::new(genesis());
    store
        .apply_block(|s| s.start_block(&raw_block(GENESIS_HEIGHT)))
        .unwrap();

    let too_long = ParamChangeEvent {
        param: Param::PhaseProposal,
        value: 5_000_000_000,
        activation_height: 101,
    };
    assert_eq!(
        store.add_param_change(too_long),
        Err(StoreError::ParamOutOfRange {
            param: Param::PhaseProposal,
            value: 5_000_000_000,
            max: MAX_PHASE_DURATION,
        })
    );
    assert!(store.read().param_change_events().is_empty());

    // unbounded params accept any value
    store
        .add_param_change(ParamChangeEvent {
            param: Param::QuorumProposal,
            value: 5_000_000_000,
            activation_height: 101,
        })
        .unwrap();
}

#[test]
fn longest_allowed_phase_opens_the_next_cycle() {
    let store = StateStore::new(genesis());
    store
        .apply_block(|s| s.start_block(&raw_block(GENESIS_HEIGHT)))
        .unwrap();
    store
        .add_param_change(ParamChangeEvent {
            param: Param::PhaseProposal,
            value: MAX_PHASE_DURATION,
            activation_height: 101,
        })
        .unwrap();

    let next = store.read().current_cycle().unwrap().last_block() + 1;
    let mut raw = raw_block(next);
    raw.previous_block_hash = hash(GENESIS_HEIGHT);
    store.apply_block(|s| s.start_block(&raw)).unwrap();

    let state = store.read();
    let cycle = state.current_cycle().unwrap();
    assert_eq!(cycle.first_block, next);
    assert_eq!(
        cycle.last_block_of_phase(DaoPhase::Proposal),
        Some(next + MAX_PHASE_DURATION as u32 - 1)
    );
    assert!(state.is_in_phase(next + 100_000, DaoPhase::Proposal));
}

#[test]
fn cycles_open_at_genesis_and_roll_over() {
    let mut state = state_with_genesis();
    let cycle = state.current_cycle().unwrap().clone();
    assert_eq!(cycle.first_block, GENESIS_HEIGHT);
    assert_eq!(state.phase_at_height(GENESIS_HEIGHT), Some(DaoPhase::Proposal));

    let next = cycle.last_block() + 1;
    let mut prev = GENESIS_HEIGHT;
    for h in [next - 1, next] {
        let mut raw = raw_block(h);
        raw.previous_block_hash = hash(prev);
        state.start_block(&raw).unwrap();
        prev = h;
    }
    assert_eq!(state.cycles().len(), 2);
    assert_eq!(state.current_cycle().map(|c| c.first_block), Some(next));
    assert!(state.is_in_phase(next, DaoPhase::Proposal));

    state.remove_last_block();
    assert_eq!(state.cycles().len(), 1);
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

#[test]
fn failed_apply_leaves_no_trace() {
    let store = StateStore::new(genesis());
    store
        .apply_block(|s| {
            s.start_block(&raw_block(GENESIS_HEIGHT))?;
            s.add_tx(genesis_tx())
        })
        .unwrap();

    let notified = Arc::new(AtomicU32::new(0));
    let n = notified.clone();
    let _sub = store.subscribe(move |b| {
        n.store(b.height, Ordering::SeqCst);
    });

    let result: Result<_, StoreError> = store.apply_block(|s| {
        s.start_block(&raw_block(101))?;
        s.add_tx(tx(
            "t1",
            101,
            vec![TxInput::new("genesis", 0)],
            vec![(6_000, TxOutputType::BsqOutput)],
            TxType::TransferBsq,
            0,
        ))?;
        Err(StoreError::NotFound("boom".into()))
    });
    assert!(result.is_err());

    let state = store.read();
    assert_eq!(state.chain_height(), GENESIS_HEIGHT);
    assert!(state.is_unspent(&TxOutputKey::new("genesis", 0)));
    assert!(!state.contains_tx(&TxId::new("t1")));
    assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[test]
fn listeners_notified_once_after_commit() {
    let store = Arc::new(StateStore::new(genesis()));
    let seen = Arc::new(AtomicU32::new(0));
    let s2 = seen.clone();
    let reader = store.clone();
    let _sub = store.subscribe(move |block| {
        // the committed block is already visible to readers
        assert_eq!(reader.chain_height(), block.height);
        s2.fetch_add(1, Ordering::SeqCst);
    });

    store
        .apply_block(|s| s.start_block(&raw_block(GENESIS_HEIGHT)))
        .unwrap();
    store
        .apply_block(|s| s.start_block(&raw_block(101)))
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn apply_without_opening_a_block_fails() {
    let store = StateStore::new(genesis());
    let result: Result<_, StoreError> = store.apply_block(|_| Ok(()));
    assert_eq!(result, Err(StoreError::NoOpenBlock));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

type Snapshot = (
    HashMap<TxOutputKey, TxOutput>,
    HashMap<TxOutputKey, SpentInfo>,
    HashMap<TxOutputKey, TxOutputType>,
    u64,
    usize,
);

fn snapshot(state: &DaoState) -> Snapshot {
    (
        state.unspent_tx_output_map().clone(),
        state.spent_info_map().clone(),
        state.tx_output_type_map().clone(),
        state.total_burnt_fee(),
        state.cycles().len(),
    )
}

proptest! {
    /// Random spend sequences keep every output in exactly one of unspent or
    /// spent, and removing each block restores the state before it.
    #[test]
    fn partition_holds_and_removal_unwinds(
        spends in prop::collection::vec((any::<prop::sample::Index>(), 1u64..50, 1usize..3), 1..12)
    ) {
        let mut state = state_with_genesis();
        let mut snapshots = vec![snapshot(&state)];

        for (i, (pick, fee, n_out)) in spends.into_iter().enumerate() {
            let height = GENESIS_HEIGHT + 1 + i as u32;
            state.start_block(&raw_block(height)).unwrap();

            let mut unspent: Vec<TxOutputKey> =
                state.unspent_tx_output_map().keys().cloned().collect();
            unspent.sort_by(|a, b| (&a.tx_id, a.index).cmp(&(&b.tx_id, b.index)));
            if !unspent.is_empty() {
                let key = pick.get(&unspent).clone();
                let id = format!("t{i}");
                let outputs = (0..n_out).map(|_| (10, TxOutputType::BsqOutput)).collect();
                state
                    .add_tx(tx(&id, height, vec![TxInput::new(key.tx_id.as_str(), key.index)], outputs, TxType::TransferBsq, fee))
                    .unwrap();
            }
            assert_partition(&state);
            snapshots.push(snapshot(&state));
        }

        snapshots.pop();
        while let Some(expected) = snapshots.pop() {
            state.remove_last_block().unwrap();
            prop_assert_eq!(&snapshot(&state), &expected);
        }
    }
}
