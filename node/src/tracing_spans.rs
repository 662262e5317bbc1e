//! Pre-built [`tracing::Span`] constructors for common node operations.
//!
//! Consistent span names and field sets make traces easy to filter and
//! correlate.

use tracing::{info_span, Span};

/// Span covering the parse and commit of a single block.
pub fn block_parse_span(height: u32) -> Span {
    info_span!("block_parse", height)
}

/// Span covering a batch of blocks received from a full node.
pub fn batch_parse_span(first_height: u32, count: usize) -> Span {
    info_span!("batch_parse", first_height, count)
}

/// Span covering the handling of a single inbound network message.
pub fn network_recv_span(peer: &str, msg_type: &str) -> Span {
    info_span!("network_recv", peer = %peer, msg_type = %msg_type)
}

/// Span covering the broadcast of a block to connected peers.
pub fn broadcast_span(height: u32, peer_count: usize) -> Span {
    info_span!("broadcast", height, peer_count)
}
