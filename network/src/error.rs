use thiserror::Error;

use crate::connection::ConnectionId;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("channel closed")]
    ChannelClosed,

    #[error("random nonce: {0}")]
    Nonce(#[from] bsq_crypto::CryptoError),

    #[error("protocol error: {0}")]
    Protocol(#[from] bsq_protocol::ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
