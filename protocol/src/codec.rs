//! Message codec: framing and serialization for the wire protocol.
//!
//! A frame is `[length: u32 BE][version: u16 BE][bincode(NetworkEnvelope)]`,
//! where `length` counts the version and the payload.

use bsq_messages::NetworkEnvelope;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::version::{is_compatible, PROTOCOL_VERSION};
use crate::ProtocolError;

/// Maximum frame body size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16 MiB

const VERSION_LEN: usize = 2;

/// Encode a message into a complete frame, length prefix included.
pub fn encode(message: &NetworkEnvelope) -> Result<Vec<u8>, ProtocolError> {
    let payload = bincode::serialize(message).map_err(ProtocolError::Encode)?;
    let body_len = VERSION_LEN + payload.len();
    if body_len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: body_len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    let mut frame = Vec::with_capacity(4 + body_len);
    frame.extend_from_slice(&(body_len as u32).to_be_bytes());
    frame.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode a frame body (version and payload, without the length prefix).
pub fn decode(body: &[u8]) -> Result<NetworkEnvelope, ProtocolError> {
    if body.len() < VERSION_LEN {
        return Err(ProtocolError::Malformed(format!(
            "frame body of {} bytes has no version",
            body.len()
        )));
    }
    let version = u16::from_be_bytes([body[0], body[1]]);
    if !is_compatible(version) {
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    bincode::deserialize(&body[VERSION_LEN..]).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &NetworkEnvelope,
) -> Result<(), ProtocolError> {
    let frame = encode(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. Returns `None` when the peer closed the stream cleanly
/// between frames.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<NetworkEnvelope>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let body_len = u32::from_be_bytes(len_buf) as usize;
    if body_len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: body_len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    let mut body = vec![0u8; body_len];
    reader.read_exact(&mut body).await?;
    decode(&body).map(Some)
}
