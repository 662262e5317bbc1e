use bsq_store::DaoStateReader;
use bsq_types::{
    op_return::HASH_OP_RETURN_LENGTH, BlindVoteEvent, DaoPhase, Param, StateChangeEvent,
    TxOutputType, TxType,
};

use super::{Context, Rejection, Validated};

/// Output 0 locks the stake; the OP_RETURN commits to the encrypted votes.
pub(super) fn validate<S: DaoStateReader + ?Sized>(
    ctx: &Context<'_, S>,
) -> Result<Validated, Rejection> {
    ctx.check_length(HASH_OP_RETURN_LENGTH)?;
    ctx.check_fee(Param::BlindVoteFee)?;
    let stake_position = ctx.model.blind_vote_stake.ok_or(Rejection::MissingStake)?;
    ctx.check_phase(DaoPhase::BlindVote)?;

    let stake = ctx.output_values.get(stake_position).copied().unwrap_or(0);
    Ok(Validated {
        tx_type: TxType::BlindVote,
        output_type: TxOutputType::BlindVoteOpReturnOutput,
        event: Some(StateChangeEvent::BlindVote(BlindVoteEvent {
            tx_id: ctx.tx_id.clone(),
            block_height: ctx.height,
            hash: ctx.payload_hash(),
            stake,
        })),
    })
}
