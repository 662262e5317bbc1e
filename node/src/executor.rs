//! Sequential parse executor.
//!
//! One actor task owns the only path that writes parsed blocks to the
//! [`StateStore`]. Requests are queued and handled strictly in submission
//! order, one at a time. The parse itself runs on the blocking pool so the
//! async runtime stays responsive.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::Instrument;

use bsq_parser::BlockParser;
use bsq_store::StateStore;
use bsq_types::{Block, RawBlock};

use crate::metrics::NodeMetrics;
use crate::tracing_spans::{batch_parse_span, block_parse_span};
use crate::NodeError;

const QUEUE_CAPACITY: usize = 64;

/// Progress of a batch, in block order, closed by exactly one `Finished`.
#[derive(Debug)]
pub enum BatchEvent {
    Parsed(Block),
    /// Number of parsed blocks, or the error that stopped the batch.
    Finished(Result<usize, NodeError>),
}

enum ParseRequest {
    Block {
        raw: RawBlock,
        reply: oneshot::Sender<Result<Block, NodeError>>,
    },
    Batch {
        blocks: Vec<RawBlock>,
        events: mpsc::UnboundedSender<BatchEvent>,
    },
}

pub struct ParseExecutor {
    requests: mpsc::Sender<ParseRequest>,
    task: JoinHandle<()>,
}

impl ParseExecutor {
    pub fn spawn(
        store: Arc<StateStore>,
        parser: Arc<BlockParser>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        let (requests, rx) = mpsc::channel(QUEUE_CAPACITY);
        let task = tokio::spawn(run(rx, store, parser, metrics));
        Self { requests, task }
    }

    /// Parse one block. Resolves after it is committed or rejected.
    pub async fn parse_block(&self, raw: RawBlock) -> Result<Block, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(ParseRequest::Block { raw, reply })
            .await
            .map_err(|_| NodeError::ExecutorStopped)?;
        rx.await.map_err(|_| NodeError::ExecutorStopped)?
    }

    /// Parse `blocks` in the given order, stopping at the first error.
    pub async fn parse_blocks(
        &self,
        blocks: Vec<RawBlock>,
    ) -> Result<mpsc::UnboundedReceiver<BatchEvent>, NodeError> {
        let (events, rx) = mpsc::unbounded_channel();
        self.requests
            .send(ParseRequest::Batch { blocks, events })
            .await
            .map_err(|_| NodeError::ExecutorStopped)?;
        Ok(rx)
    }

    /// Parse `blocks` and wait for the batch to finish.
    pub async fn parse_blocks_to_end(&self, blocks: Vec<RawBlock>) -> Result<usize, NodeError> {
        let mut events = self.parse_blocks(blocks).await?;
        while let Some(event) = events.recv().await {
            if let BatchEvent::Finished(result) = event {
                return result;
            }
        }
        Err(NodeError::ExecutorStopped)
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for ParseExecutor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut requests: mpsc::Receiver<ParseRequest>,
    store: Arc<StateStore>,
    parser: Arc<BlockParser>,
    metrics: Arc<NodeMetrics>,
) {
    while let Some(request) = requests.recv().await {
        match request {
            ParseRequest::Block { raw, reply } => {
                let span = block_parse_span(raw.height);
                let result = parse_one(&store, &parser, &metrics, raw).instrument(span).await;
                let _ = reply.send(result);
            }
            ParseRequest::Batch { blocks, events } => {
                let first_height = blocks.first().map_or(0, |b| b.height);
                let span = batch_parse_span(first_height, blocks.len());
                let started = Instant::now();
                let count = blocks.len();
                let outcome = async {
                    let mut parsed = 0;
                    for raw in blocks {
                        let block = parse_one(&store, &parser, &metrics, raw).await?;
                        parsed += 1;
                        let _ = events.send(BatchEvent::Parsed(block));
                    }
                    Ok::<usize, NodeError>(parsed)
                }
                .instrument(span)
                .await;
                tracing::info!(
                    blocks = count,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ok = outcome.is_ok(),
                    "batch parse finished"
                );
                let _ = events.send(BatchEvent::Finished(outcome));
            }
        }
    }
    tracing::debug!("parse executor stopped");
}

async fn parse_one(
    store: &Arc<StateStore>,
    parser: &Arc<BlockParser>,
    metrics: &NodeMetrics,
    raw: RawBlock,
) -> Result<Block, NodeError> {
    let height = raw.height;
    let started = Instant::now();
    let task_store = Arc::clone(store);
    let task_parser = Arc::clone(parser);
    let result = tokio::task::spawn_blocking(move || task_parser.apply(&task_store, &raw))
        .await
        .map_err(|e| NodeError::ParseTask(e.to_string()))?;
    metrics
        .parse_duration_ms
        .observe(started.elapsed().as_secs_f64() * 1_000.0);

    match result {
        Ok(block) => {
            metrics.blocks_applied.inc();
            metrics.bsq_txs_applied.inc_by(block.txs.len() as u64);
            metrics.chain_height.set(i64::from(block.height));
            tracing::debug!(height, bsq_txs = block.txs.len(), "block applied");
            Ok(block)
        }
        Err(e) => {
            metrics.blocks_rejected.inc();
            tracing::warn!(height, error = %e, "block rejected");
            Err(e.into())
        }
    }
}
