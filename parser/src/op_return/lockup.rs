use bsq_store::DaoStateReader;
use bsq_types::{op_return::LOCKUP_OP_RETURN_LENGTH, Param, TxOutputType, TxType};

use super::{Context, Rejection, Validated};

/// `[type][version][lock time: u16 BE]`; output 0 holds the bond.
pub(super) fn validate<S: DaoStateReader + ?Sized>(
    ctx: &Context<'_, S>,
) -> Result<Validated, Rejection> {
    ctx.check_length(LOCKUP_OP_RETURN_LENGTH)?;
    if ctx.model.bond_lock.is_none() {
        return Err(Rejection::MissingBond);
    }

    let data = ctx.data();
    let lock_time = u64::from(u16::from_be_bytes([data[2], data[3]]));
    let min = ctx.state.param_value(Param::LockTimeMin, ctx.height);
    let max = ctx.state.param_value(Param::LockTimeMax, ctx.height);
    if lock_time < min || lock_time > max {
        return Err(Rejection::LockTimeOutOfRange {
            lock_time,
            min,
            max,
        });
    }

    Ok(Validated {
        tx_type: TxType::Lockup,
        output_type: TxOutputType::LockupOpReturnOutput,
        event: None,
    })
}
