//! Merit: voting weight earned through past compensation.
//!
//! Each issued compensation request can be presented as merit when voting. Its
//! weight decays linearly to zero over two years of blocks, so recent
//! contributors weigh more than early ones.

use serde::{Deserialize, Serialize};

use bsq_store::DaoStateReader;
use bsq_types::{TxId, TxOutputType};

use crate::error::GovernanceError;

/// Age-weighted merit of an issuance.
///
/// `weight = max(0, 1 - (current_height - issuance_height) / (2 * blocks_per_year))`,
/// result `round(amount * weight)` with halves rounded up. Computed in integer
/// arithmetic so every node gets the same result.
pub fn weighted_merit_amount(
    amount: i64,
    issuance_height: i64,
    current_height: i64,
    blocks_per_year: i64,
) -> Result<i64, GovernanceError> {
    if issuance_height > current_height {
        return Err(GovernanceError::InvalidArgument(format!(
            "issuance height {issuance_height} is above the current height {current_height}"
        )));
    }
    if amount < 0 {
        return Err(GovernanceError::InvalidArgument(format!(
            "amount must not be negative: {amount}"
        )));
    }
    if current_height < 0 {
        return Err(GovernanceError::InvalidArgument(format!(
            "current height must not be negative: {current_height}"
        )));
    }
    if blocks_per_year <= 0 {
        return Err(GovernanceError::InvalidArgument(format!(
            "blocks per year must be positive: {blocks_per_year}"
        )));
    }

    let age = i128::from(current_height) - i128::from(issuance_height);
    let max_age = 2 * i128::from(blocks_per_year);
    if age >= max_age {
        return Ok(0);
    }
    let remaining = max_age - age;
    let weighted = (2 * i128::from(amount) * remaining + max_age) / (2 * max_age);
    i64::try_from(weighted)
        .map_err(|_| GovernanceError::InvalidArgument(format!("merit overflow: {weighted}")))
}

/// Reference to an issued compensation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuance {
    pub tx_id: TxId,
    pub chain_height: u32,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merit {
    pub issuance: Issuance,
}

/// The merits a voter presents with a blind vote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeritList(pub Vec<Merit>);

impl MeritList {
    pub fn new(merits: Vec<Merit>) -> Self {
        Self(merits)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GovernanceError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GovernanceError> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Merit> {
        self.0.iter()
    }

    /// One merit per issued compensation request in `state`, oldest first.
    pub fn from_issuances<S: DaoStateReader + ?Sized>(state: &S) -> Self {
        let mut merits: Vec<Merit> = state
            .issuance_block_height_map()
            .iter()
            .map(|(tx_id, height)| Merit {
                issuance: Issuance {
                    tx_id: tx_id.clone(),
                    chain_height: *height,
                    amount: issued_amount(state, tx_id),
                },
            })
            .collect();
        merits.sort_by(|a, b| {
            (a.issuance.chain_height, &a.issuance.tx_id)
                .cmp(&(b.issuance.chain_height, &b.issuance.tx_id))
        });
        Self(merits)
    }
}

fn issued_amount<S: DaoStateReader + ?Sized>(state: &S, tx_id: &TxId) -> u64 {
    state
        .tx(tx_id)
        .and_then(|tx| {
            tx.outputs
                .iter()
                .find(|o| o.tx_output_type == TxOutputType::IssuanceCandidateOutput)
        })
        .map(|o| o.value)
        .unwrap_or(0)
}

/// Sum of weighted merit of `merits` at `current_height`.
///
/// Height and amount come from the state, not from the presented merit. A
/// merit whose tx was never issued, or was issued after `current_height`,
/// counts zero.
pub fn merit_stake<S: DaoStateReader + ?Sized>(
    merits: &MeritList,
    state: &S,
    current_height: u32,
    blocks_per_year: u32,
) -> Result<u64, GovernanceError> {
    let mut total: u64 = 0;
    for merit in merits.iter() {
        let tx_id = &merit.issuance.tx_id;
        let Some(height) = state.issuance_block_height(tx_id) else {
            tracing::debug!(tx_id = %tx_id, "merit references a tx that was not issued");
            continue;
        };
        if height > current_height {
            continue;
        }
        let amount = issued_amount(state, tx_id);
        let weighted = weighted_merit_amount(
            i64::try_from(amount).unwrap_or(i64::MAX),
            i64::from(height),
            i64::from(current_height),
            i64::from(blocks_per_year),
        )?;
        total = total.saturating_add(weighted.unsigned_abs());
    }
    Ok(total)
}
