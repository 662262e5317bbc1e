use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unsupported wire version {0}")]
    UnsupportedVersion(u16),

    #[error("frame of {size} bytes exceeds {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("cannot encode message: {0}")]
    Encode(#[source] bincode::Error),

    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
