//! Lite node side of block sync.
//!
//! Every request carries a fresh random nonce. Responses arrive through the
//! node's inbound loop and are routed back by that nonce; a response with an
//! unknown nonce is stale or unsolicited and gets dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use bsq_crypto::random_u32;
use bsq_messages::{GetBlocksRequest, GetBlocksResponse};

use crate::connection::Connection;
use crate::error::NetworkError;
use crate::node::NetworkNode;

pub const REQUEST_BLOCKS_TIMEOUT: Duration = Duration::from_secs(120);

/// Outstanding requests by nonce.
#[derive(Debug, Default)]
pub struct PendingRequests {
    waiting: Mutex<HashMap<u32, oneshot::Sender<GetBlocksResponse>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` if `nonce` is already waiting.
    pub fn register(&self, nonce: u32) -> Option<oneshot::Receiver<GetBlocksResponse>> {
        let mut waiting = self.waiting.lock().unwrap_or_else(PoisonError::into_inner);
        if waiting.contains_key(&nonce) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        waiting.insert(nonce, tx);
        Some(rx)
    }

    /// Hand `response` to the request with the matching nonce.
    pub fn resolve(&self, response: GetBlocksResponse) -> bool {
        let sender = self
            .waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&response.request_nonce);
        match sender {
            Some(tx) => tx.send(response).is_ok(),
            None => {
                tracing::debug!(
                    nonce = response.request_nonce,
                    "dropping get blocks response with unknown nonce"
                );
                false
            }
        }
    }

    pub fn remove(&self, nonce: u32) {
        self.waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&nonce);
    }

    pub fn len(&self) -> usize {
        self.waiting.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct RequestBlocksHandler<N: NetworkNode> {
    network: Arc<N>,
    pending: Arc<PendingRequests>,
    timeout: Duration,
}

impl<N: NetworkNode> RequestBlocksHandler<N> {
    pub fn new(network: Arc<N>, pending: Arc<PendingRequests>) -> Self {
        Self::with_timeout(network, pending, REQUEST_BLOCKS_TIMEOUT)
    }

    pub fn with_timeout(network: Arc<N>, pending: Arc<PendingRequests>, timeout: Duration) -> Self {
        Self {
            network,
            pending,
            timeout,
        }
    }

    /// Ask `connection` for all blocks from `from_block_height` on and wait
    /// for the response carrying our nonce.
    pub async fn request_blocks(
        &self,
        connection: &Connection,
        from_block_height: u32,
    ) -> Result<GetBlocksResponse, NetworkError> {
        let (nonce, rx) = loop {
            let nonce = random_u32()?;
            if let Some(rx) = self.pending.register(nonce) {
                break (nonce, rx);
            }
        };
        // Forgets the nonce on every exit, including when this future is dropped.
        let _registered = Registered {
            pending: &self.pending,
            nonce,
        };
        tracing::info!(peer = %connection, from_height = from_block_height, nonce, "requesting blocks");

        let request = GetBlocksRequest {
            from_block_height,
            nonce,
        };
        // One deadline covers both the send and the response.
        let deadline = Instant::now() + self.timeout;
        match tokio::time::timeout_at(
            deadline,
            self.network.send_message(connection, request.into()),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(NetworkError::Timeout(self.timeout)),
        }

        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(NetworkError::ChannelClosed),
            Err(_) => Err(NetworkError::Timeout(self.timeout)),
        }
    }
}

struct Registered<'a> {
    pending: &'a PendingRequests,
    nonce: u32,
}

impl Drop for Registered<'_> {
    fn drop(&mut self) {
        self.pending.remove(self.nonce);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(nonce: u32) -> GetBlocksResponse {
        GetBlocksResponse {
            blocks: vec![],
            request_nonce: nonce,
        }
    }

    #[tokio::test]
    async fn routes_by_nonce() {
        let pending = PendingRequests::new();
        let rx = pending.register(7).unwrap();
        assert!(pending.register(7).is_none());

        assert!(!pending.resolve(response(8)));
        assert!(pending.resolve(response(7)));
        assert_eq!(rx.await.unwrap().request_nonce, 7);
        assert!(pending.is_empty());

        // A late duplicate finds nobody waiting.
        assert!(!pending.resolve(response(7)));
    }
}
