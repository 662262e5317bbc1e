//! Per-tx working state of the parser. Discarded once the tx is finalized.

use bsq_types::OpReturnType;

/// The first OP_RETURN output of a tx.
#[derive(Debug, Clone)]
pub(crate) struct OpReturnCandidate {
    pub(crate) position: usize,
    pub(crate) data: Vec<u8>,
    pub(crate) op_return_type: Option<OpReturnType>,
}

#[derive(Debug, Default)]
pub(crate) struct ParsingModel {
    /// Whether any input spends a BSQ output.
    pub(crate) bsq_input_found: bool,
    /// BSQ input value not yet assigned to an output. Whatever is left at the
    /// end is the burnt fee.
    pub(crate) available_input_value: u64,
    pub(crate) op_return: Option<OpReturnCandidate>,
    /// Position of the issuance candidate output of a compensation request.
    pub(crate) issuance_candidate: Option<usize>,
    /// Position of the stake output locked by a blind vote.
    pub(crate) blind_vote_stake: Option<usize>,
    /// Position of the bond output of a lockup.
    pub(crate) bond_lock: Option<usize>,
    /// Value of the blind vote stake unlocked by the first input.
    pub(crate) unlocked_stake: Option<u64>,
    /// Once an output is assigned BTC no later output may carry BSQ.
    pub(crate) btc_output_seen: bool,
}

impl ParsingModel {
    pub(crate) fn op_return_type(&self) -> Option<OpReturnType> {
        self.op_return.as_ref().and_then(|c| c.op_return_type)
    }
}
