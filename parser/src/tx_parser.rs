//! Transaction classification.

use bsq_store::DaoStateReader;
use bsq_types::{
    GenesisConfig, OpReturnType, RawTx, StateChangeEvent, TempTx, Tx, TxOutputKey, TxOutputType,
    TxType,
};

use crate::error::ParseError;
use crate::genesis::find_genesis_tx;
use crate::model::{OpReturnCandidate, ParsingModel};
use crate::op_return::{self, Context};

/// A classified tx plus the governance event it produced, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTx {
    pub tx: Tx,
    pub event: Option<StateChangeEvent>,
}

impl ParsedTx {
    /// Only BSQ txs are stored; everything else stays `Undefined`.
    pub fn is_bsq_tx(&self) -> bool {
        self.tx.tx_type != TxType::Undefined
    }
}

#[derive(Debug, Clone)]
pub struct TxParser {
    genesis: GenesisConfig,
}

impl TxParser {
    pub fn new(genesis: GenesisConfig) -> Self {
        Self { genesis }
    }

    pub fn genesis(&self) -> &GenesisConfig {
        &self.genesis
    }

    /// Classify `raw_tx` as seen at `block_height` against `state`.
    ///
    /// Every tx gets exactly one [`TxType`] and every output exactly one
    /// [`TxOutputType`]. Only an invalid genesis tx is an error; malformed DAO
    /// payloads classify as [`TxType::Invalid`].
    pub fn classify<S: DaoStateReader + ?Sized>(
        &self,
        raw_tx: &RawTx,
        block_height: u32,
        state: &S,
    ) -> Result<ParsedTx, ParseError> {
        let genesis = find_genesis_tx(
            &self.genesis.tx_id,
            self.genesis.block_height,
            self.genesis.total_supply,
            raw_tx,
        )?;
        if let Some(temp) = genesis {
            tracing::info!(tx_id = %temp.id, height = block_height, "genesis tx found");
            return Ok(ParsedTx {
                tx: Tx::from(temp),
                event: None,
            });
        }

        let mut temp = TempTx::from(raw_tx);
        temp.block_height = block_height;
        for output in &mut temp.outputs {
            output.block_height = block_height;
        }

        let mut model = ParsingModel::default();
        process_inputs(&temp, state, &mut model);
        if !model.bsq_input_found {
            return Ok(ParsedTx {
                tx: Tx::from(temp),
                event: None,
            });
        }

        model.op_return = temp
            .outputs
            .iter()
            .enumerate()
            .find_map(|(position, o)| {
                o.op_return_data.as_ref().map(|data| OpReturnCandidate {
                    position,
                    data: data.clone(),
                    op_return_type: OpReturnType::of_payload(data),
                })
            });

        process_outputs(&mut temp, &mut model);

        let fee = model.available_input_value;
        let event = match &model.op_return {
            None => {
                temp.tx_type = if fee == 0 {
                    TxType::TransferBsq
                } else {
                    TxType::PayTradeFee
                };
                None
            }
            Some(candidate) => {
                let output_values: Vec<u64> = temp.outputs.iter().map(|o| o.value).collect();
                let ctx = Context {
                    tx_id: &temp.id,
                    candidate,
                    model: &model,
                    output_values: &output_values,
                    fee,
                    height: block_height,
                    state,
                };
                match op_return::validate(&ctx) {
                    Ok(validated) => {
                        temp.outputs[candidate.position].tx_output_type = validated.output_type;
                        temp.tx_type = validated.tx_type;
                        validated.event
                    }
                    Err(rejection) => {
                        tracing::debug!(
                            tx_id = %temp.id,
                            height = block_height,
                            reason = %rejection,
                            "invalid op return"
                        );
                        temp.outputs[candidate.position].tx_output_type =
                            TxOutputType::InvalidOutput;
                        downgrade_provisional_outputs(&mut temp);
                        temp.tx_type = TxType::Invalid;
                        None
                    }
                }
            }
        };
        temp.burnt_fee = fee;

        Ok(ParsedTx {
            tx: Tx::from(temp),
            event,
        })
    }
}

/// Sum up BSQ carried by the inputs.
fn process_inputs<S: DaoStateReader + ?Sized>(
    temp: &TempTx,
    state: &S,
    model: &mut ParsingModel,
) {
    for (position, input) in temp.inputs.iter().enumerate() {
        let key = TxOutputKey::from(input);
        let Some(connected) = state.unspent_and_mature_tx_output(&key) else {
            continue;
        };
        if !state.is_bsq_tx_output_type(connected) {
            continue;
        }
        model.bsq_input_found = true;
        model.available_input_value += connected.value;
        if position == 0 && connected.tx_output_type == TxOutputType::BlindVoteLockStakeOutput {
            model.unlocked_stake = Some(connected.value);
        }
    }
}

/// Assign BSQ while the input budget covers the output, BTC afterwards.
fn process_outputs(temp: &mut TempTx, model: &mut ParsingModel) {
    let candidate_position = model.op_return.as_ref().map(|c| c.position);
    let candidate_type = model.op_return_type();

    for (position, output) in temp.outputs.iter_mut().enumerate() {
        if output.is_op_return() {
            if Some(position) != candidate_position {
                output.tx_output_type = TxOutputType::InvalidOutput;
            }
            continue;
        }

        let covered = model.available_input_value > 0
            && model.available_input_value >= output.value
            && !model.btc_output_seen;
        if covered {
            model.available_input_value -= output.value;
            output.tx_output_type = match (position, candidate_type) {
                (0, Some(OpReturnType::BlindVote)) => {
                    model.blind_vote_stake = Some(position);
                    TxOutputType::BlindVoteLockStakeOutput
                }
                (0, Some(OpReturnType::Lockup)) => {
                    model.bond_lock = Some(position);
                    TxOutputType::BondLock
                }
                _ => TxOutputType::BsqOutput,
            };
        } else {
            model.btc_output_seen = true;
            output.tx_output_type = match (position, candidate_type) {
                (1, Some(OpReturnType::CompensationRequest)) => {
                    model.issuance_candidate = Some(position);
                    TxOutputType::IssuanceCandidateOutput
                }
                _ => TxOutputType::BtcOutput,
            };
        }
    }
}

/// Outputs typed for a governance role fall back to their plain kind when the
/// OP_RETURN turns out invalid.
fn downgrade_provisional_outputs(temp: &mut TempTx) {
    for output in &mut temp.outputs {
        output.tx_output_type = match output.tx_output_type {
            TxOutputType::BlindVoteLockStakeOutput | TxOutputType::BondLock => {
                TxOutputType::BsqOutput
            }
            TxOutputType::IssuanceCandidateOutput => TxOutputType::BtcOutput,
            other => other,
        };
    }
}
