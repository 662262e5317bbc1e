use bsq_crypto::CryptoError;
use bsq_types::TxId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    /// A caller or configuration bug, never caused by chain data.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("no vote with blind vote tx {0}")]
    MyVoteNotFound(TxId),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<bincode::Error> for GovernanceError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
