//! P2P networking layer for BSQ block sync.
//!
//! Handles TCP connection management, message routing and the two sides of
//! the block request exchange: answering a lite node's `GetBlocksRequest`
//! on a full node, and requesting blocks from a full node on a lite node.

pub mod completion;
pub mod connection;
pub mod error;
pub mod get_blocks;
pub mod node;
pub mod request_blocks;
pub mod tcp;

pub use completion::Completion;
pub use connection::{CloseConnectionReason, Connection, ConnectionId};
pub use error::NetworkError;
pub use get_blocks::{GetBlocksRequestHandler, HandlerOutcome, GET_BLOCKS_TIMEOUT};
pub use node::{NetworkEvent, NetworkNode};
pub use request_blocks::{PendingRequests, RequestBlocksHandler, REQUEST_BLOCKS_TIMEOUT};
pub use tcp::TcpNetworkNode;
