//! Block level parsing.

use bsq_store::{DaoState, DaoStateReader, StateStore};
use bsq_types::{Block, GenesisConfig, RawBlock};

use crate::error::ParseError;
use crate::tx_parser::TxParser;

#[derive(Debug, Clone)]
pub struct BlockParser {
    tx_parser: TxParser,
}

impl BlockParser {
    pub fn new(genesis: GenesisConfig) -> Self {
        Self {
            tx_parser: TxParser::new(genesis),
        }
    }

    pub fn tx_parser(&self) -> &TxParser {
        &self.tx_parser
    }

    /// Classify every tx of `raw` in order and write the BSQ txs into `state`.
    ///
    /// Each tx is classified against the state including the earlier txs of the
    /// same block. On error the caller is expected to discard the open block;
    /// [`BlockParser::apply`] does so.
    pub fn parse_block(&self, state: &mut DaoState, raw: &RawBlock) -> Result<(), ParseError> {
        if state
            .block_at_height(raw.height)
            .is_some_and(|b| b.hash == raw.hash)
        {
            return Err(ParseError::BlockAlreadyParsed { height: raw.height });
        }

        state.start_block(raw)?;
        for raw_tx in &raw.txs {
            let parsed = self.tx_parser.classify(raw_tx, raw.height, &*state)?;
            if !parsed.is_bsq_tx() {
                continue;
            }
            tracing::trace!(
                tx_id = %parsed.tx.id,
                tx_type = ?parsed.tx.tx_type,
                burnt_fee = parsed.tx.burnt_fee,
                "bsq tx"
            );
            state.add_tx(parsed.tx)?;
            if let Some(event) = parsed.event {
                state.add_state_change_event(event)?;
            }
        }
        Ok(())
    }

    /// Parse `raw` into `store` as one atomic commit and notify listeners.
    pub fn apply(&self, store: &StateStore, raw: &RawBlock) -> Result<Block, ParseError> {
        store.apply_block(|state| self.parse_block(state, raw))
    }
}
