//! Proposals, compensation requests and param change proposals share one
//! payload shape and fee.

use bsq_store::DaoStateReader;
use bsq_types::{
    op_return::HASH_OP_RETURN_LENGTH, DaoPhase, OpReturnType, Param, ProposalEvent,
    StateChangeEvent, TxOutputType, TxType,
};

use super::{Context, Rejection, Validated};

fn validate_common<S: DaoStateReader + ?Sized>(
    ctx: &Context<'_, S>,
    op_return_type: OpReturnType,
) -> Result<StateChangeEvent, Rejection> {
    ctx.check_length(HASH_OP_RETURN_LENGTH)?;
    ctx.check_fee(Param::ProposalFee)?;
    ctx.check_phase(DaoPhase::Proposal)?;
    Ok(StateChangeEvent::Proposal(ProposalEvent {
        tx_id: ctx.tx_id.clone(),
        block_height: ctx.height,
        op_return_type,
        hash: ctx.payload_hash(),
    }))
}

pub(super) fn validate_proposal<S: DaoStateReader + ?Sized>(
    ctx: &Context<'_, S>,
) -> Result<Validated, Rejection> {
    let event = validate_common(ctx, OpReturnType::Proposal)?;
    Ok(Validated {
        tx_type: TxType::Proposal,
        output_type: TxOutputType::ProposalOpReturnOutput,
        event: Some(event),
    })
}

pub(super) fn validate_comp_request<S: DaoStateReader + ?Sized>(
    ctx: &Context<'_, S>,
) -> Result<Validated, Rejection> {
    let event = validate_common(ctx, OpReturnType::CompensationRequest)?;
    if ctx.model.issuance_candidate.is_none() {
        return Err(Rejection::MissingIssuanceCandidate);
    }
    Ok(Validated {
        tx_type: TxType::CompensationRequest,
        output_type: TxOutputType::CompReqOpReturnOutput,
        event: Some(event),
    })
}

pub(super) fn validate_change_param<S: DaoStateReader + ?Sized>(
    ctx: &Context<'_, S>,
) -> Result<Validated, Rejection> {
    let event = validate_common(ctx, OpReturnType::ChangeParam)?;
    Ok(Validated {
        tx_type: TxType::ChangeParam,
        output_type: TxOutputType::ChangeParamOpReturnOutput,
        event: Some(event),
    })
}
