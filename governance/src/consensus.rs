//! Consensus critical encodings.
//!
//! Everything here must produce identical bytes on every node: payload
//! hashes, OP_RETURN data and the fees read from the param history.

use serde::Serialize;

use bsq_crypto::sha256_ripemd160;
use bsq_store::DaoStateReader;
use bsq_types::{
    op_return::{
        HASH_LENGTH, HASH_OP_RETURN_LENGTH, LOCKUP_OP_RETURN_LENGTH, OP_RETURN_VERSION,
        SECRET_KEY_LENGTH, VOTE_REVEAL_OP_RETURN_LENGTH,
    },
    OpReturnType, Param,
};

use crate::error::GovernanceError;

/// RIPEMD-160(SHA-256(bincode(payload))).
pub fn hash_of_payload<T: Serialize + ?Sized>(
    payload: &T,
) -> Result<[u8; HASH_LENGTH], GovernanceError> {
    let bytes = bincode::serialize(payload)?;
    Ok(sha256_ripemd160(&bytes))
}

/// `[type][version][hash]`
pub fn op_return_data(op_return_type: OpReturnType, hash: &[u8; HASH_LENGTH]) -> Vec<u8> {
    let mut data = Vec::with_capacity(HASH_OP_RETURN_LENGTH);
    data.push(op_return_type.as_byte());
    data.push(OP_RETURN_VERSION);
    data.extend_from_slice(hash);
    data
}

/// `[type][version][blind vote list hash][secret key]`
pub fn vote_reveal_op_return_data(
    blind_vote_list_hash: &[u8; HASH_LENGTH],
    secret_key: &[u8; SECRET_KEY_LENGTH],
) -> Vec<u8> {
    let mut data = op_return_data(OpReturnType::VoteReveal, blind_vote_list_hash);
    data.extend_from_slice(secret_key);
    debug_assert_eq!(data.len(), VOTE_REVEAL_OP_RETURN_LENGTH);
    data
}

/// `[type][version][lock time: u16 BE]`
pub fn lockup_op_return_data(lock_time: u16) -> Vec<u8> {
    let mut data = Vec::with_capacity(LOCKUP_OP_RETURN_LENGTH);
    data.push(OpReturnType::Lockup.as_byte());
    data.push(OP_RETURN_VERSION);
    data.extend_from_slice(&lock_time.to_be_bytes());
    data
}

pub fn proposal_fee<S: DaoStateReader + ?Sized>(state: &S, height: u32) -> u64 {
    state.param_value(Param::ProposalFee, height)
}

pub fn blind_vote_fee<S: DaoStateReader + ?Sized>(state: &S, height: u32) -> u64 {
    state.param_value(Param::BlindVoteFee, height)
}
