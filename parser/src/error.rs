use bsq_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Genesis tx is invalid; {0}")]
    InvalidGenesisTx(String),

    #[error("block {height} was already parsed")]
    BlockAlreadyParsed { height: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}
