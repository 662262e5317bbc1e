//! Lite node: syncs parsed blocks from a full node and re-parses them.
//!
//! The lite node asks its full node for everything after its tip, then keeps
//! up through block broadcasts. A broadcast block that does not connect to
//! the tip triggers a new request from the tip.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, mpsc};

use bsq_messages::{NetworkEnvelope, NewBlockBroadcastMessage};
use bsq_network::{Connection, NetworkEvent, NetworkNode, PendingRequests, RequestBlocksHandler};
use bsq_store::{DaoStateReader, StateStore};
use bsq_types::RawBlock;

use crate::executor::{BatchEvent, ParseExecutor};
use crate::metrics::NodeMetrics;
use crate::NodeError;

/// Work that must run one item at a time, in arrival order.
#[derive(Debug)]
pub enum LiteWork {
    Sync(Connection),
    NewBlock(Connection, RawBlock),
}

pub struct LiteNode<N: NetworkNode> {
    store: Arc<StateStore>,
    executor: ParseExecutor,
    pending: Arc<PendingRequests>,
    requester: RequestBlocksHandler<N>,
    metrics: Arc<NodeMetrics>,
    full_node: Mutex<Option<Connection>>,
}

impl<N: NetworkNode> LiteNode<N> {
    pub fn new(
        store: Arc<StateStore>,
        executor: ParseExecutor,
        network: Arc<N>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        let pending = Arc::new(PendingRequests::new());
        let requester = RequestBlocksHandler::new(network, Arc::clone(&pending));
        Self::with_requester(store, executor, pending, requester, metrics)
    }

    pub fn with_requester(
        store: Arc<StateStore>,
        executor: ParseExecutor,
        pending: Arc<PendingRequests>,
        requester: RequestBlocksHandler<N>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            store,
            executor,
            pending,
            requester,
            metrics,
            full_node: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn pending(&self) -> &Arc<PendingRequests> {
        &self.pending
    }

    pub fn full_node(&self) -> Option<Connection> {
        self.full_node
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// First height we do not have yet.
    pub fn next_height(&self) -> u32 {
        let state = self.store.read();
        match state.last_block() {
            Some(block) => block.height + 1,
            None => state.genesis().block_height,
        }
    }

    /// Request all blocks after the tip from `connection` and parse them.
    /// Returns the number of blocks applied.
    pub async fn sync_from(&self, connection: &Connection) -> Result<usize, NodeError> {
        let from = self.next_height();
        let response = self.requester.request_blocks(connection, from).await?;
        tracing::info!(
            peer = %connection,
            from_height = from,
            received = response.blocks.len(),
            "received blocks"
        );
        self.apply_batch(response.blocks).await
    }

    async fn apply_batch(&self, blocks: Vec<RawBlock>) -> Result<usize, NodeError> {
        let next = self.next_height();
        let blocks: Vec<RawBlock> = blocks.into_iter().filter(|b| b.height >= next).collect();
        if blocks.is_empty() {
            return Ok(0);
        }
        let mut events = self.executor.parse_blocks(blocks).await?;
        while let Some(event) = events.recv().await {
            match event {
                BatchEvent::Parsed(block) => {
                    tracing::trace!(height = block.height, "synced block");
                }
                BatchEvent::Finished(result) => return result,
            }
        }
        Err(NodeError::ExecutorStopped)
    }

    /// Apply a pushed block if it extends the tip, otherwise catch up.
    pub async fn on_new_block(
        &self,
        connection: &Connection,
        message: NewBlockBroadcastMessage,
    ) -> Result<(), NodeError> {
        let raw = message.block;
        let (next, connects) = {
            let state = self.store.read();
            let next = match state.last_block() {
                Some(tip) => tip.height + 1,
                None => state.genesis().block_height,
            };
            let connects = match state.last_block() {
                Some(tip) => raw.previous_block_hash == tip.hash,
                None => raw.height == next,
            };
            (next, connects)
        };

        if raw.height < next {
            tracing::debug!(height = raw.height, "already have broadcast block");
            return Ok(());
        }
        if connects {
            self.executor.parse_block(raw).await?;
            return Ok(());
        }
        tracing::info!(
            height = raw.height,
            expected = next,
            peer = %connection,
            "broadcast block does not connect; requesting missing blocks"
        );
        self.sync_from(connection).await.map(|_| ())
    }

    pub async fn process(&self, work: LiteWork) {
        let result = match &work {
            LiteWork::Sync(connection) => self.sync_from(connection).await.map(|_| ()),
            LiteWork::NewBlock(connection, raw) => {
                self.on_new_block(
                    connection,
                    NewBlockBroadcastMessage { block: raw.clone() },
                )
                .await
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, work = %work_name(&work), "lite node work failed");
        }
    }

    /// Route a transport event. Responses are resolved right away; anything
    /// that parses goes to the sequential work queue.
    pub fn route(&self, event: NetworkEvent, work: &mpsc::UnboundedSender<LiteWork>) {
        match event {
            NetworkEvent::Connected(connection) => {
                let mut full_node = self.full_node.lock().unwrap_or_else(PoisonError::into_inner);
                if full_node.is_none() {
                    tracing::info!(peer = %connection, "syncing from full node");
                    *full_node = Some(connection.clone());
                    let _ = work.send(LiteWork::Sync(connection));
                }
                self.metrics.peer_count.inc();
            }
            NetworkEvent::Disconnected(connection) => {
                let mut full_node = self.full_node.lock().unwrap_or_else(PoisonError::into_inner);
                if full_node.as_ref().is_some_and(|c| c.id == connection.id) {
                    tracing::warn!(peer = %connection, "lost full node");
                    *full_node = None;
                }
                self.metrics.peer_count.dec();
            }
            NetworkEvent::Message {
                connection,
                message,
            } => match message {
                NetworkEnvelope::GetBlocksResponse(response) => {
                    self.pending.resolve(response);
                }
                NetworkEnvelope::NewBlockBroadcast(m) => {
                    let _ = work.send(LiteWork::NewBlock(connection, m.block));
                }
                NetworkEnvelope::GetBlocksRequest(_) => {
                    tracing::debug!(peer = %connection, "lite node does not serve blocks");
                }
            },
        }
    }

    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<NetworkEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let (work_tx, mut work_rx) = mpsc::unbounded_channel();
        let worker = {
            let node = Arc::clone(&self);
            tokio::spawn(async move {
                while let Some(work) = work_rx.recv().await {
                    node.process(work).await;
                }
            })
        };

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                event = events.recv() => match event {
                    Some(event) => self.route(event, &work_tx),
                    None => break,
                },
            }
        }
        worker.abort();
        self.executor.stop();
        tracing::info!(chain_height = self.store.chain_height(), "lite node stopped");
    }
}

fn work_name(work: &LiteWork) -> String {
    match work {
        LiteWork::Sync(c) => format!("sync from {c}"),
        LiteWork::NewBlock(c, raw) => format!("new block {} from {c}", raw.height),
    }
}
