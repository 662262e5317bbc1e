//! The transport seam.

use std::future::Future;

use bsq_messages::NetworkEnvelope;

use crate::connection::{CloseConnectionReason, Connection};
use crate::error::NetworkError;

/// Sends messages to and closes connections with peers.
///
/// [`TcpNetworkNode`](crate::TcpNetworkNode) is the production transport;
/// tests use an in-memory double.
pub trait NetworkNode: Send + Sync + 'static {
    /// Resolves once the message has been written to the connection.
    fn send_message(
        &self,
        connection: &Connection,
        message: NetworkEnvelope,
    ) -> impl Future<Output = Result<(), NetworkError>> + Send;

    fn close_connection(
        &self,
        connection: &Connection,
        reason: CloseConnectionReason,
    ) -> impl Future<Output = ()> + Send;
}

/// What the transport reports to the node.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    Connected(Connection),
    Message {
        connection: Connection,
        message: NetworkEnvelope,
    },
    Disconnected(Connection),
}
