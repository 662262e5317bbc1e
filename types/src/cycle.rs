//! Governance cycles and their phases.
//!
//! A cycle is a fixed sequence of phases measured in blocks. Durations are read
//! from params at the cycle's first block, so a param change only affects cycles
//! that start after it activates.

use serde::{Deserialize, Serialize};

use crate::params::Param;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DaoPhase {
    Proposal,
    Break1,
    BlindVote,
    Break2,
    VoteReveal,
    Break3,
    Result,
}

impl DaoPhase {
    pub const ALL: [DaoPhase; 7] = [
        DaoPhase::Proposal,
        DaoPhase::Break1,
        DaoPhase::BlindVote,
        DaoPhase::Break2,
        DaoPhase::VoteReveal,
        DaoPhase::Break3,
        DaoPhase::Result,
    ];

    /// Param holding this phase's duration.
    pub fn duration_param(self) -> Param {
        match self {
            DaoPhase::Proposal => Param::PhaseProposal,
            DaoPhase::Break1 => Param::PhaseBreak1,
            DaoPhase::BlindVote => Param::PhaseBlindVote,
            DaoPhase::Break2 => Param::PhaseBreak2,
            DaoPhase::VoteReveal => Param::PhaseVoteReveal,
            DaoPhase::Break3 => Param::PhaseBreak3,
            DaoPhase::Result => Param::PhaseResult,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub first_block: u32,
    /// `(phase, duration in blocks)` in phase order.
    pub phases: Vec<(DaoPhase, u32)>,
}

impl Cycle {
    pub fn new(first_block: u32, phases: Vec<(DaoPhase, u32)>) -> Self {
        Self {
            first_block,
            phases,
        }
    }

    pub fn duration(&self) -> u32 {
        self.phases
            .iter()
            .fold(0u32, |total, (_, d)| total.saturating_add(*d))
    }

    /// Last height covered by this cycle.
    pub fn last_block(&self) -> u32 {
        self.first_block
            .saturating_add(self.duration())
            .saturating_sub(1)
    }

    pub fn contains(&self, height: u32) -> bool {
        height >= self.first_block && height <= self.last_block()
    }

    pub fn phase_at(&self, height: u32) -> Option<DaoPhase> {
        if height < self.first_block {
            return None;
        }
        let mut start = self.first_block;
        for (phase, duration) in &self.phases {
            let end = start.saturating_add(*duration);
            if height < end {
                return Some(*phase);
            }
            start = end;
        }
        None
    }

    pub fn first_block_of_phase(&self, phase: DaoPhase) -> Option<u32> {
        let mut start = self.first_block;
        for (p, duration) in &self.phases {
            if *p == phase {
                return Some(start);
            }
            start = start.saturating_add(*duration);
        }
        None
    }

    pub fn last_block_of_phase(&self, phase: DaoPhase) -> Option<u32> {
        let duration = self.phases.iter().find(|(p, _)| *p == phase)?.1;
        let first = self.first_block_of_phase(phase)?;
        (duration > 0).then(|| first.saturating_add(duration - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle() -> Cycle {
        Cycle::new(
            100,
            vec![
                (DaoPhase::Proposal, 10),
                (DaoPhase::Break1, 2),
                (DaoPhase::BlindVote, 5),
                (DaoPhase::Break2, 0),
                (DaoPhase::VoteReveal, 5),
                (DaoPhase::Break3, 1),
                (DaoPhase::Result, 1),
            ],
        )
    }

    #[test]
    fn bounds() {
        let c = cycle();
        assert_eq!(c.duration(), 24);
        assert_eq!(c.last_block(), 123);
        assert!(c.contains(100));
        assert!(c.contains(123));
        assert!(!c.contains(124));
        assert!(!c.contains(99));
    }

    #[test]
    fn phase_lookup() {
        let c = cycle();
        assert_eq!(c.phase_at(100), Some(DaoPhase::Proposal));
        assert_eq!(c.phase_at(109), Some(DaoPhase::Proposal));
        assert_eq!(c.phase_at(110), Some(DaoPhase::Break1));
        assert_eq!(c.phase_at(112), Some(DaoPhase::BlindVote));
        // zero length break is skipped
        assert_eq!(c.phase_at(117), Some(DaoPhase::VoteReveal));
        assert_eq!(c.phase_at(123), Some(DaoPhase::Result));
        assert_eq!(c.phase_at(124), None);
        assert_eq!(c.phase_at(99), None);
    }

    #[test]
    fn phase_boundaries() {
        let c = cycle();
        assert_eq!(c.first_block_of_phase(DaoPhase::BlindVote), Some(112));
        assert_eq!(c.last_block_of_phase(DaoPhase::BlindVote), Some(116));
        assert_eq!(c.last_block_of_phase(DaoPhase::Break2), None);
    }

    #[test]
    fn oversized_phases_saturate_at_the_height_limit() {
        let c = Cycle::new(
            4_772,
            vec![
                (DaoPhase::Proposal, u32::MAX),
                (DaoPhase::Break1, 150),
                (DaoPhase::Result, 2),
            ],
        );
        assert_eq!(c.duration(), u32::MAX);
        assert_eq!(c.last_block(), u32::MAX - 1);
        assert_eq!(c.phase_at(4_772), Some(DaoPhase::Proposal));
        assert_eq!(c.phase_at(u32::MAX - 1), Some(DaoPhase::Proposal));
        assert_eq!(c.phase_at(u32::MAX), None);
        assert_eq!(c.first_block_of_phase(DaoPhase::Result), Some(u32::MAX));
    }
}
