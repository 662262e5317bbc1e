//! Full node: parses the chain and serves lite nodes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::Instrument;

use bsq_messages::{GetBlocksRequest, NetworkEnvelope, NewBlockBroadcastMessage};
use bsq_network::{
    CloseConnectionReason, Connection, ConnectionId, GetBlocksRequestHandler, HandlerOutcome,
    NetworkEvent, NetworkNode, GET_BLOCKS_TIMEOUT,
};
use bsq_store::StateStore;
use bsq_types::{Block, RawBlock};

use crate::executor::ParseExecutor;
use crate::metrics::NodeMetrics;
use crate::tracing_spans::{broadcast_span, network_recv_span};
use crate::NodeError;

pub struct FullNode<N: NetworkNode> {
    store: Arc<StateStore>,
    executor: ParseExecutor,
    network: Arc<N>,
    metrics: Arc<NodeMetrics>,
    peers: Mutex<HashMap<ConnectionId, Connection>>,
    broadcast_timeout: Duration,
}

impl<N: NetworkNode> FullNode<N> {
    pub fn new(
        store: Arc<StateStore>,
        executor: ParseExecutor,
        network: Arc<N>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            store,
            executor,
            network,
            metrics,
            peers: Mutex::new(HashMap::new()),
            broadcast_timeout: GET_BLOCKS_TIMEOUT,
        }
    }

    /// Deadline for delivering a block broadcast to one peer.
    pub fn with_broadcast_timeout(mut self, timeout: Duration) -> Self {
        self.broadcast_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Parse a block from the chain feed and push it to connected peers.
    pub async fn apply_raw_block(&self, raw: RawBlock) -> Result<Block, NodeError> {
        let block = self.executor.parse_block(raw).await?;
        self.broadcast(&block).await;
        Ok(block)
    }

    /// Parse blocks from the chain feed in order. Stops at the first failure.
    pub async fn apply_raw_blocks(&self, blocks: Vec<RawBlock>) -> Result<usize, NodeError> {
        let mut applied = 0;
        for raw in blocks {
            self.apply_raw_block(raw).await?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Answer one request. A fault closes the connection with its reason.
    pub async fn on_get_blocks_request(&self, request: GetBlocksRequest, connection: Connection) {
        let mut handler = GetBlocksRequestHandler::new(Arc::clone(&self.network));
        let outcome = {
            let state = self.store.read();
            handler.on_get_blocks_request(&request, connection, &*state)
        };
        match outcome.await {
            Ok(HandlerOutcome::Complete) => {
                self.metrics.get_blocks_served.inc();
            }
            Ok(HandlerOutcome::Fault {
                message,
                connection,
                reason,
            }) => {
                self.metrics.get_blocks_faults.inc();
                tracing::warn!(peer = %connection, %reason, "{message}");
                self.remove_peer(&connection);
                self.network.close_connection(&connection, reason).await;
            }
            Err(_) => tracing::debug!("get blocks handler stopped"),
        }
    }

    pub fn peers(&self) -> Vec<Connection> {
        let mut peers: Vec<Connection> = self
            .peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        peers.sort_by_key(|c| c.id);
        peers
    }

    pub fn add_peer(&self, connection: Connection) {
        let mut peers = self.peers.lock().unwrap_or_else(PoisonError::into_inner);
        peers.insert(connection.id, connection);
        self.metrics.peer_count.set(peers.len() as i64);
    }

    pub fn remove_peer(&self, connection: &Connection) {
        let mut peers = self.peers.lock().unwrap_or_else(PoisonError::into_inner);
        peers.remove(&connection.id);
        self.metrics.peer_count.set(peers.len() as i64);
    }

    /// Send the block to every peer at once. A peer that fails or misses the
    /// deadline is dropped and its connection closed.
    async fn broadcast(&self, block: &Block) {
        let peers = self.peers();
        if peers.is_empty() {
            return;
        }
        let message = NetworkEnvelope::NewBlockBroadcast(NewBlockBroadcastMessage {
            block: RawBlock::from_block(block),
        });
        let span = broadcast_span(block.height, peers.len());

        let mut sends = JoinSet::new();
        for peer in peers {
            let network = Arc::clone(&self.network);
            let message = message.clone();
            let timeout = self.broadcast_timeout;
            sends.spawn(
                async move {
                    let reason =
                        match tokio::time::timeout(timeout, network.send_message(&peer, message))
                            .await
                        {
                            Ok(Ok(())) => None,
                            Ok(Err(e)) => {
                                tracing::warn!(peer = %peer, error = %e, "block broadcast failed");
                                Some(CloseConnectionReason::SendMsgFailure)
                            }
                            Err(_) => {
                                tracing::warn!(peer = %peer, ?timeout, "block broadcast timed out");
                                Some(CloseConnectionReason::SendMsgTimeout)
                            }
                        };
                    (peer, reason)
                }
                .instrument(span.clone()),
            );
        }

        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((_, None)) => {}
                Ok((peer, Some(reason))) => {
                    self.remove_peer(&peer);
                    self.network.close_connection(&peer, reason).await;
                }
                Err(e) => tracing::warn!(error = %e, "broadcast task failed"),
            }
        }
    }
}

impl<N: NetworkNode> FullNode<N> {
    /// React to one transport event.
    pub async fn handle_event(self: &Arc<Self>, event: NetworkEvent) {
        match event {
            NetworkEvent::Connected(connection) => self.add_peer(connection),
            NetworkEvent::Disconnected(connection) => self.remove_peer(&connection),
            NetworkEvent::Message {
                connection,
                message,
            } => {
                let span = network_recv_span(&connection.to_string(), message.name());
                match message {
                    NetworkEnvelope::GetBlocksRequest(request) => {
                        // Serve concurrently so a slow peer does not hold up others.
                        let node = Arc::clone(self);
                        tokio::spawn(
                            async move { node.on_get_blocks_request(request, connection).await }
                                .instrument(span),
                        );
                    }
                    other => {
                        let _guard = span.enter();
                        tracing::debug!(message = other.name(), "ignoring message on full node");
                    }
                }
            }
        }
    }

    /// Apply the chain feed and serve peers until shutdown. Peers are still
    /// served after the chain feed closes.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<NetworkEvent>,
        mut chain_feed: mpsc::Receiver<RawBlock>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut feed_open = true;
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                raw = chain_feed.recv(), if feed_open => match raw {
                    Some(raw) => {
                        let height = raw.height;
                        if let Err(e) = self.apply_raw_block(raw).await {
                            tracing::error!(height, error = %e, "failed to apply block from chain feed");
                        }
                    }
                    None => {
                        tracing::info!(chain_height = self.store.chain_height(), "chain feed closed");
                        feed_open = false;
                    }
                },
            }
        }
        self.executor.stop();
        tracing::info!(chain_height = self.store.chain_height(), "full node stopped");
    }
}
