//! DAO params. Every consensus value is looked up by param and block height.
//!
//! Defaults apply until a [`ParamChangeEvent`](crate::events::ParamChangeEvent)
//! voted in by the DAO becomes active. Amounts are BSQ satoshi (1 BSQ = 100 sat),
//! durations are in blocks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// Upper bound for a single phase, in blocks. About two years of blocks.
pub const MAX_PHASE_DURATION: u64 = 105_120;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    /// Fee burnt by proposal, compensation request and param change txs.
    ProposalFee,
    /// Fee burnt by blind vote txs.
    BlindVoteFee,

    CompensationRequestMinAmount,
    CompensationRequestMaxAmount,

    /// Quorum as sum of stake, in sat.
    QuorumProposal,
    QuorumCompRequest,
    QuorumChangeParam,
    /// Threshold in basis points of accepted stake.
    ThresholdProposal,
    ThresholdCompRequest,
    ThresholdChangeParam,

    LockTimeMin,
    LockTimeMax,

    PhaseProposal,
    PhaseBreak1,
    PhaseBlindVote,
    PhaseBreak2,
    PhaseVoteReveal,
    PhaseBreak3,
    PhaseResult,
}

impl Param {
    pub const ALL: [Param; 19] = [
        Param::ProposalFee,
        Param::BlindVoteFee,
        Param::CompensationRequestMinAmount,
        Param::CompensationRequestMaxAmount,
        Param::QuorumProposal,
        Param::QuorumCompRequest,
        Param::QuorumChangeParam,
        Param::ThresholdProposal,
        Param::ThresholdCompRequest,
        Param::ThresholdChangeParam,
        Param::LockTimeMin,
        Param::LockTimeMax,
        Param::PhaseProposal,
        Param::PhaseBreak1,
        Param::PhaseBlindVote,
        Param::PhaseBreak2,
        Param::PhaseVoteReveal,
        Param::PhaseBreak3,
        Param::PhaseResult,
    ];

    pub fn default_value(self) -> u64 {
        match self {
            Param::ProposalFee => 200,
            Param::BlindVoteFee => 200,
            Param::CompensationRequestMinAmount => 1_000,
            Param::CompensationRequestMaxAmount => 10_000_000,
            Param::QuorumProposal => 10_000_000,
            Param::QuorumCompRequest => 10_000_000,
            Param::QuorumChangeParam => 10_000_000,
            Param::ThresholdProposal => 5_000,
            Param::ThresholdCompRequest => 5_000,
            Param::ThresholdChangeParam => 7_500,
            Param::LockTimeMin => 6,
            Param::LockTimeMax => 4_320,
            Param::PhaseProposal => 3_600,
            Param::PhaseBreak1 => 150,
            Param::PhaseBlindVote => 600,
            Param::PhaseBreak2 => 10,
            Param::PhaseVoteReveal => 300,
            Param::PhaseBreak3 => 10,
            Param::PhaseResult => 2,
        }
    }

    pub fn is_phase_duration(self) -> bool {
        matches!(
            self,
            Param::PhaseProposal
                | Param::PhaseBreak1
                | Param::PhaseBlindVote
                | Param::PhaseBreak2
                | Param::PhaseVoteReveal
                | Param::PhaseBreak3
                | Param::PhaseResult
        )
    }

    /// Largest value a param change may set, if the param is bounded.
    pub fn max_value(self) -> Option<u64> {
        self.is_phase_duration().then_some(MAX_PHASE_DURATION)
    }

    pub fn name(self) -> &'static str {
        match self {
            Param::ProposalFee => "PROPOSAL_FEE",
            Param::BlindVoteFee => "BLIND_VOTE_FEE",
            Param::CompensationRequestMinAmount => "COMPENSATION_REQUEST_MIN_AMOUNT",
            Param::CompensationRequestMaxAmount => "COMPENSATION_REQUEST_MAX_AMOUNT",
            Param::QuorumProposal => "QUORUM_PROPOSAL",
            Param::QuorumCompRequest => "QUORUM_COMP_REQUEST",
            Param::QuorumChangeParam => "QUORUM_CHANGE_PARAM",
            Param::ThresholdProposal => "THRESHOLD_PROPOSAL",
            Param::ThresholdCompRequest => "THRESHOLD_COMP_REQUEST",
            Param::ThresholdChangeParam => "THRESHOLD_CHANGE_PARAM",
            Param::LockTimeMin => "LOCK_TIME_MIN",
            Param::LockTimeMax => "LOCK_TIME_MAX",
            Param::PhaseProposal => "PHASE_PROPOSAL",
            Param::PhaseBreak1 => "PHASE_BREAK1",
            Param::PhaseBlindVote => "PHASE_BLIND_VOTE",
            Param::PhaseBreak2 => "PHASE_BREAK2",
            Param::PhaseVoteReveal => "PHASE_VOTE_REVEAL",
            Param::PhaseBreak3 => "PHASE_BREAK3",
            Param::PhaseResult => "PHASE_RESULT",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Param {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Param::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| TypesError::UnknownParam(s.to_string()))
    }
}
