//! TCP transport.
//!
//! Each connection is split: the write half sits in a shared map and is used
//! by [`NetworkNode::send_message`]; the read half is owned by a task that
//! decodes frames and forwards them as [`NetworkEvent`]s.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use bsq_messages::NetworkEnvelope;
use bsq_protocol::{read_frame, write_frame};

use crate::connection::{CloseConnectionReason, Connection, ConnectionId};
use crate::error::NetworkError;
use crate::node::{NetworkEvent, NetworkNode};

/// Timeout for the initial TCP connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type Writers = Arc<RwLock<HashMap<ConnectionId, Arc<Mutex<OwnedWriteHalf>>>>>;
type Readers = Arc<std::sync::Mutex<HashMap<ConnectionId, JoinHandle<()>>>>;

pub struct TcpNetworkNode {
    writers: Writers,
    readers: Readers,
    next_id: AtomicU64,
    events: mpsc::Sender<NetworkEvent>,
}

impl TcpNetworkNode {
    pub fn new(events: mpsc::Sender<NetworkEvent>) -> Arc<Self> {
        Arc::new(Self {
            writers: Arc::new(RwLock::new(HashMap::new())),
            readers: Arc::new(std::sync::Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            events,
        })
    }

    /// Bind `addr` and accept connections in the background. Returns the
    /// bound address and the accept task.
    pub async fn listen(
        self: &Arc<Self>,
        addr: SocketAddr,
    ) -> Result<(SocketAddr, JoinHandle<()>), NetworkError> {
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, "listening for peers");

        let node = Arc::clone(self);
        let task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        node.register(stream, peer).await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                }
            }
        });
        Ok((local, task))
    }

    pub async fn connect(self: &Arc<Self>, addr: SocketAddr) -> Result<Connection, NetworkError> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| NetworkError::ConnectionFailed(format!("connection timed out to {addr}")))?
            .map_err(|e| NetworkError::ConnectionFailed(format!("TCP connect to {addr} failed: {e}")))?;
        Ok(self.register(stream, addr).await)
    }

    pub async fn connection_count(&self) -> usize {
        self.writers.read().await.len()
    }

    async fn register(&self, stream: TcpStream, peer: SocketAddr) -> Connection {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let connection = Connection::new(id, peer);
        let (read_half, write_half) = stream.into_split();

        self.writers
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(write_half)));

        // Announce before the read loop can emit messages for it.
        let _ = self
            .events
            .send(NetworkEvent::Connected(connection.clone()))
            .await;

        let task = tokio::spawn(read_loop(
            connection.clone(),
            read_half,
            self.events.clone(),
            Arc::clone(&self.writers),
            Arc::clone(&self.readers),
        ));
        self.readers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, task);

        tracing::debug!(peer = %connection, "connection registered");
        connection
    }
}

async fn read_loop(
    connection: Connection,
    reader: OwnedReadHalf,
    events: mpsc::Sender<NetworkEvent>,
    writers: Writers,
    readers: Readers,
) {
    let mut reader = BufReader::new(reader);
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(message)) => {
                let event = NetworkEvent::Message {
                    connection: connection.clone(),
                    message,
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::info!(peer = %connection, "peer disconnected (clean close)");
                break;
            }
            Err(e) => {
                tracing::warn!(peer = %connection, error = %e, "peer disconnected with error");
                break;
            }
        }
    }

    readers
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&connection.id);
    if writers.write().await.remove(&connection.id).is_some() {
        let _ = events.send(NetworkEvent::Disconnected(connection)).await;
    }
}

impl NetworkNode for TcpNetworkNode {
    async fn send_message(
        &self,
        connection: &Connection,
        message: NetworkEnvelope,
    ) -> Result<(), NetworkError> {
        let writer = self
            .writers
            .read()
            .await
            .get(&connection.id)
            .cloned()
            .ok_or(NetworkError::ConnectionClosed(connection.id))?;
        let mut writer = writer.lock().await;
        write_frame(&mut *writer, &message).await?;
        tracing::trace!(peer = %connection, message = message.name(), "sent");
        Ok(())
    }

    async fn close_connection(&self, connection: &Connection, reason: CloseConnectionReason) {
        let writer = self.writers.write().await.remove(&connection.id);
        let reader = self
            .readers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&connection.id);
        if let Some(reader) = reader {
            reader.abort();
        }
        let Some(writer) = writer else {
            return;
        };
        tracing::info!(peer = %connection, %reason, "closing connection");
        if let Err(e) = writer.lock().await.shutdown().await {
            tracing::debug!(peer = %connection, error = %e, "shutdown failed");
        }
        let _ = self
            .events
            .send(NetworkEvent::Disconnected(connection.clone()))
            .await;
    }
}
