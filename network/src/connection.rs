//! Connection handles.

use std::fmt;
use std::net::SocketAddr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live connection to a peer. Cheap to clone; the transport owns the socket.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    pub id: ConnectionId,
    pub peer_address: SocketAddr,
}

impl Connection {
    pub fn new(id: ConnectionId, peer_address: SocketAddr) -> Self {
        Self { id, peer_address }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.peer_address)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseConnectionReason {
    SendMsgFailure,
    SendMsgTimeout,
    RuleViolation,
    PeerDisconnected,
    Shutdown,
}

impl fmt::Display for CloseConnectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SendMsgFailure => "SEND_MSG_FAILURE",
            Self::SendMsgTimeout => "SEND_MSG_TIMEOUT",
            Self::RuleViolation => "RULE_VIOLATION",
            Self::PeerDisconnected => "PEER_DISCONNECTED",
            Self::Shutdown => "SHUTDOWN",
        };
        f.write_str(s)
    }
}
