//! OP_RETURN validators.
//!
//! Each DAO tx type carries a type specific payload in its first OP_RETURN
//! output. A validator checks the payload structure, the burnt fee against the
//! fee param at the tx's height, the governance phase and the outputs the
//! type requires. A rejection never fails the block; the tx is classified as
//! invalid instead.

mod blind_vote;
mod lockup;
mod proposal;
mod vote_reveal;

use bsq_store::DaoStateReader;
use bsq_types::{
    op_return::{HASH_LENGTH, OP_RETURN_VERSION},
    DaoPhase, OpReturnType, Param, StateChangeEvent, TxOutputType,
    TxType,
};
use thiserror::Error;

use crate::model::{OpReturnCandidate, ParsingModel};

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum Rejection {
    #[error("unknown op return type")]
    UnknownType,

    #[error("unsupported payload version {0}")]
    UnsupportedVersion(u8),

    #[error("payload length {actual}, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("burnt fee {actual} does not match {param} {expected}")]
    WrongFee {
        param: Param,
        expected: u64,
        actual: u64,
    },

    #[error("not in {expected:?} phase at height {height}")]
    WrongPhase { expected: DaoPhase, height: u32 },

    #[error("compensation request without issuance candidate output")]
    MissingIssuanceCandidate,

    #[error("blind vote without stake output")]
    MissingStake,

    #[error("vote reveal does not unlock a blind vote stake")]
    MissingStakeUnlock,

    #[error("lockup without bond output")]
    MissingBond,

    #[error("lock time {lock_time} outside [{min}, {max}]")]
    LockTimeOutOfRange { lock_time: u64, min: u64, max: u64 },
}

/// Outcome of a successful validation.
#[derive(Debug)]
pub(crate) struct Validated {
    pub(crate) tx_type: TxType,
    pub(crate) output_type: TxOutputType,
    pub(crate) event: Option<StateChangeEvent>,
}

/// Inputs shared by all validators.
pub(crate) struct Context<'a, S: ?Sized> {
    pub(crate) tx_id: &'a bsq_types::TxId,
    pub(crate) candidate: &'a OpReturnCandidate,
    pub(crate) model: &'a ParsingModel,
    pub(crate) output_values: &'a [u64],
    pub(crate) fee: u64,
    pub(crate) height: u32,
    pub(crate) state: &'a S,
}

impl<S: DaoStateReader + ?Sized> Context<'_, S> {
    fn data(&self) -> &[u8] {
        &self.candidate.data
    }

    fn check_length(&self, expected: usize) -> Result<(), Rejection> {
        let actual = self.data().len();
        if actual != expected {
            return Err(Rejection::WrongLength { expected, actual });
        }
        Ok(())
    }

    fn check_version(&self) -> Result<(), Rejection> {
        match self.data().get(1) {
            Some(&OP_RETURN_VERSION) => Ok(()),
            Some(v) => Err(Rejection::UnsupportedVersion(*v)),
            None => Err(Rejection::WrongLength {
                expected: 2,
                actual: self.data().len(),
            }),
        }
    }

    fn check_fee(&self, param: Param) -> Result<(), Rejection> {
        let expected = self.state.param_value(param, self.height);
        if self.fee != expected {
            return Err(Rejection::WrongFee {
                param,
                expected,
                actual: self.fee,
            });
        }
        Ok(())
    }

    fn check_phase(&self, expected: DaoPhase) -> Result<(), Rejection> {
        if !self.state.is_in_phase(self.height, expected) {
            return Err(Rejection::WrongPhase {
                expected,
                height: self.height,
            });
        }
        Ok(())
    }

    /// The 20-byte hash following `[type][version]`.
    fn payload_hash(&self) -> [u8; HASH_LENGTH] {
        let mut hash = [0u8; HASH_LENGTH];
        if let Some(bytes) = self.data().get(2..2 + HASH_LENGTH) {
            hash.copy_from_slice(bytes);
        }
        hash
    }
}

pub(crate) fn validate<S: DaoStateReader + ?Sized>(
    ctx: &Context<'_, S>,
) -> Result<Validated, Rejection> {
    let op_return_type = ctx.candidate.op_return_type.ok_or(Rejection::UnknownType)?;
    ctx.check_version()?;
    match op_return_type {
        OpReturnType::Proposal => proposal::validate_proposal(ctx),
        OpReturnType::CompensationRequest => proposal::validate_comp_request(ctx),
        OpReturnType::ChangeParam => proposal::validate_change_param(ctx),
        OpReturnType::BlindVote => blind_vote::validate(ctx),
        OpReturnType::VoteReveal => vote_reveal::validate(ctx),
        OpReturnType::Lockup => lockup::validate(ctx),
    }
}
