//! Genesis tx detection.

use bsq_types::{RawTx, TempTx, TxId, TxOutputType, TxType};

use crate::error::ParseError;

/// Classify `raw_tx` as the genesis tx if it is the configured one.
///
/// Returns `Ok(None)` unless both id and height match. A matching tx whose
/// outputs do not add up to `total_supply` exactly is an error.
pub fn find_genesis_tx(
    genesis_tx_id: &TxId,
    genesis_block_height: u32,
    total_supply: u64,
    raw_tx: &RawTx,
) -> Result<Option<TempTx>, ParseError> {
    if raw_tx.id != *genesis_tx_id || raw_tx.block_height != genesis_block_height {
        return Ok(None);
    }

    let sum = raw_tx
        .outputs
        .iter()
        .fold(0u128, |acc, o| acc + u128::from(o.value));
    let total = u128::from(total_supply);
    if sum < total {
        return Err(ParseError::InvalidGenesisTx(format!(
            "not using all available inputs. Remaining input value is {} sat",
            total - sum
        )));
    }
    if sum > total {
        return Err(ParseError::InvalidGenesisTx(format!(
            "using more than available inputs. Remaining input value is {} sat",
            sum - total
        )));
    }

    let mut temp = TempTx::from(raw_tx);
    for output in &mut temp.outputs {
        output.tx_output_type = TxOutputType::GenesisOutput;
    }
    temp.tx_type = TxType::Genesis;
    Ok(Some(temp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsq_types::{RawTxOutput, TxInput};

    const GENESIS_ID: &str = "genesisTxId";
    const GENESIS_HEIGHT: u32 = 150;
    const TOTAL_SUPPLY: u64 = 250_000_000;

    fn raw_tx(id: &str, height: u32, values: &[u64]) -> RawTx {
        RawTx {
            id: TxId::new(id),
            block_height: height,
            block_hash: "hash".into(),
            time: 0,
            inputs: vec![TxInput::new("tx0", 0), TxInput::new("tx1", 1)],
            outputs: values
                .iter()
                .enumerate()
                .map(|(i, v)| RawTxOutput {
                    index: i as u32,
                    value: *v,
                    tx_id: TxId::new(id),
                    pub_key_script: None,
                    address: Some(format!("addr{i}")),
                    op_return_data: None,
                    block_height: height,
                })
                .collect(),
        }
    }

    fn find(tx: &RawTx) -> Result<Option<TempTx>, ParseError> {
        find_genesis_tx(&TxId::new(GENESIS_ID), GENESIS_HEIGHT, TOTAL_SUPPLY, tx)
    }

    #[test]
    fn wrong_id_or_height_is_not_genesis() {
        assert_eq!(find(&raw_tx("invalid", GENESIS_HEIGHT, &[TOTAL_SUPPLY])), Ok(None));
        assert_eq!(find(&raw_tx(GENESIS_ID, 200, &[TOTAL_SUPPLY])), Ok(None));
        // the output sum does not matter when the identity does not match
        assert_eq!(find(&raw_tx("invalid", 200, &[1])), Ok(None));
    }

    #[test]
    fn too_little_output_value() {
        let tx = raw_tx(GENESIS_ID, GENESIS_HEIGHT, &[TOTAL_SUPPLY - 1]);
        let err = find(&tx).unwrap_err();
        assert!(err.to_string().starts_with(
            "Genesis tx is invalid; not using all available inputs. Remaining input value is 1 sat"
        ));
    }

    #[test]
    fn too_much_output_value() {
        let tx = raw_tx(GENESIS_ID, GENESIS_HEIGHT, &[TOTAL_SUPPLY - 1, 2]);
        assert_eq!(
            find(&tx),
            Err(ParseError::InvalidGenesisTx(
                "using more than available inputs. Remaining input value is 1 sat".into()
            ))
        );
    }

    #[test]
    fn exact_supply_is_genesis() {
        let tx = raw_tx(GENESIS_ID, GENESIS_HEIGHT, &[TOTAL_SUPPLY - 1, 1]);
        let genesis = find(&tx).unwrap().unwrap();
        assert_eq!(genesis.tx_type, TxType::Genesis);
        assert_eq!(genesis.outputs.len(), 2);
        assert!(genesis
            .outputs
            .iter()
            .all(|o| o.tx_output_type == TxOutputType::GenesisOutput));
    }
}
