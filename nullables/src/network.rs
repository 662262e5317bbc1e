//! Nullable network: record messages instead of sending them.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Mutex, PoisonError};

use bsq_messages::NetworkEnvelope;
use bsq_network::{CloseConnectionReason, Connection, ConnectionId, NetworkError, NetworkNode};

/// How [`NullNetwork::send_message`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendBehaviour {
    /// Record the message and report success.
    Succeed,
    /// Report a send failure without recording.
    Fail,
    /// Never resolve.
    Hang,
}

pub struct NullNetwork {
    behaviour: Mutex<SendBehaviour>,
    sent: Mutex<Vec<(Connection, NetworkEnvelope)>>,
    closed: Mutex<Vec<(Connection, CloseConnectionReason)>>,
}

impl NullNetwork {
    pub fn new() -> Self {
        Self::with_behaviour(SendBehaviour::Succeed)
    }

    pub fn with_behaviour(behaviour: SendBehaviour) -> Self {
        Self {
            behaviour: Mutex::new(behaviour),
            sent: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behaviour(&self, behaviour: SendBehaviour) {
        *self.behaviour.lock().unwrap_or_else(PoisonError::into_inner) = behaviour;
    }

    /// A connection to a fake loopback peer.
    pub fn connection(id: u64) -> Connection {
        let port = 20_000 + (id % 10_000) as u16;
        Connection::new(
            ConnectionId(id),
            SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
        )
    }

    /// All messages "sent" (for assertions).
    pub fn sent(&self) -> Vec<(Connection, NetworkEnvelope)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn closed(&self) -> Vec<(Connection, CloseConnectionReason)> {
        self.closed.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Clear all recorded state.
    pub fn reset(&self) {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clear();
        self.closed.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Default for NullNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkNode for NullNetwork {
    async fn send_message(
        &self,
        connection: &Connection,
        message: NetworkEnvelope,
    ) -> Result<(), NetworkError> {
        let behaviour = *self.behaviour.lock().unwrap_or_else(PoisonError::into_inner);
        match behaviour {
            SendBehaviour::Succeed => {
                self.sent
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((connection.clone(), message));
                Ok(())
            }
            SendBehaviour::Fail => Err(NetworkError::SendFailed(format!(
                "null network refused {} to {connection}",
                message.name()
            ))),
            SendBehaviour::Hang => std::future::pending().await,
        }
    }

    async fn close_connection(&self, connection: &Connection, reason: CloseConnectionReason) {
        self.closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((connection.clone(), reason));
    }
}
