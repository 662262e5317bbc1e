use bsq_store::DaoStateReader;
use bsq_types::{op_return::VOTE_REVEAL_OP_RETURN_LENGTH, DaoPhase, TxOutputType, TxType};

use super::{Context, Rejection, Validated};

/// The first input must spend the voter's blind vote stake. The payload holds
/// the hash of the blind vote list and the key to decrypt the vote.
pub(super) fn validate<S: DaoStateReader + ?Sized>(
    ctx: &Context<'_, S>,
) -> Result<Validated, Rejection> {
    ctx.check_length(VOTE_REVEAL_OP_RETURN_LENGTH)?;
    if ctx.model.unlocked_stake.is_none() {
        return Err(Rejection::MissingStakeUnlock);
    }
    ctx.check_phase(DaoPhase::VoteReveal)?;
    Ok(Validated {
        tx_type: TxType::VoteReveal,
        output_type: TxOutputType::VoteRevealOpReturnOutput,
        event: None,
    })
}
