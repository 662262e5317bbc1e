//! Full node side of block sync: answer one `GetBlocksRequest`.
//!
//! The timeout is armed before the response is handed to the transport. The
//! first of send success, send failure and timeout settles the request; the
//! others are dropped. A fault carries the connection and the reason the
//! caller should close it with.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use bsq_messages::{GetBlocksRequest, GetBlocksResponse, NetworkEnvelope};
use bsq_store::DaoStateReader;
use bsq_types::RawBlock;

use crate::completion::Completion;
use crate::connection::{CloseConnectionReason, Connection};
use crate::node::NetworkNode;

pub const GET_BLOCKS_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Complete,
    Fault {
        message: String,
        connection: Connection,
        reason: CloseConnectionReason,
    },
}

/// Handles one request at a time. A new request stops the one in flight.
pub struct GetBlocksRequestHandler<N: NetworkNode> {
    network: Arc<N>,
    timeout: Duration,
    completion: Option<Arc<Completion<HandlerOutcome>>>,
    task: Option<JoinHandle<()>>,
}

impl<N: NetworkNode> GetBlocksRequestHandler<N> {
    pub fn new(network: Arc<N>) -> Self {
        Self::with_timeout(network, GET_BLOCKS_TIMEOUT)
    }

    pub fn with_timeout(network: Arc<N>, timeout: Duration) -> Self {
        Self {
            network,
            timeout,
            completion: None,
            task: None,
        }
    }

    /// Send all blocks from the requested height on, echoing the nonce.
    ///
    /// The returned receiver yields exactly one outcome, or a closed channel
    /// if the handler was stopped first.
    pub fn on_get_blocks_request<S: DaoStateReader + ?Sized>(
        &mut self,
        request: &GetBlocksRequest,
        connection: Connection,
        state: &S,
    ) -> oneshot::Receiver<HandlerOutcome> {
        let blocks: Vec<RawBlock> = state
            .blocks_from_height(request.from_block_height)
            .iter()
            .map(RawBlock::from_block)
            .collect();
        let response = GetBlocksResponse {
            blocks,
            request_nonce: request.nonce,
        };
        tracing::debug!(
            peer = %connection,
            from_height = request.from_block_height,
            blocks = response.blocks.len(),
            nonce = response.request_nonce,
            "sending get blocks response"
        );

        if self.is_pending() {
            tracing::debug!(peer = %connection, "replacing unsettled get blocks response");
        }
        self.stop();

        let (completion, rx) = Completion::new();
        let completion = Arc::new(completion);
        self.completion = Some(Arc::clone(&completion));

        let network = Arc::clone(&self.network);
        let timeout = self.timeout;
        self.task = Some(tokio::spawn(async move {
            let deadline = tokio::time::sleep(timeout);
            tokio::pin!(deadline);
            let summary = response.to_string();
            let target = connection.clone();
            let send = network.send_message(&target, NetworkEnvelope::GetBlocksResponse(response));

            let outcome = tokio::select! {
                result = send => match result {
                    Ok(()) => {
                        tracing::trace!(peer = %connection, "get blocks response sent");
                        HandlerOutcome::Complete
                    }
                    Err(e) => HandlerOutcome::Fault {
                        message: format!(
                            "Sending getBlocksResponse to {connection} failed. That is expected \
                             if the peer is offline. getBlocksResponse={summary}. Error: {e}"
                        ),
                        connection,
                        reason: CloseConnectionReason::SendMsgFailure,
                    },
                },
                _ = &mut deadline => HandlerOutcome::Fault {
                    message: format!(
                        "A timeout occurred for getBlocksResponse:{summary} on connection:{connection}"
                    ),
                    connection,
                    reason: CloseConnectionReason::SendMsgTimeout,
                },
            };

            if let HandlerOutcome::Fault { message, reason, .. } = &outcome {
                tracing::debug!(%reason, "{message}");
            }
            if !completion.complete(outcome) {
                tracing::trace!("handler already stopped; outcome ignored");
            }
        }));
        rx
    }

    /// Stop the handler. A pending send is aborted and its outcome dropped.
    pub fn stop(&mut self) {
        if let Some(completion) = self.completion.take() {
            completion.cancel();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a response is in flight and not yet settled.
    pub fn is_pending(&self) -> bool {
        self.completion.as_ref().is_some_and(|c| !c.is_done())
    }
}
