//! Network message types for block sync between full and lite nodes.
//!
//! A lite node asks a full node for all blocks from a height on and matches
//! the response by the nonce it chose. Full nodes also push every newly
//! parsed block to the lite nodes connected to them.

use std::fmt;

use bsq_types::RawBlock;
use serde::{Deserialize, Serialize};

/// Request for all blocks at or above `from_block_height`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocksRequest {
    pub from_block_height: u32,
    /// Chosen by the requester, echoed unchanged in the response.
    pub nonce: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocksResponse {
    pub blocks: Vec<RawBlock>,
    pub request_nonce: u32,
}

impl GetBlocksResponse {
    pub fn first_height(&self) -> Option<u32> {
        self.blocks.first().map(|b| b.height)
    }

    pub fn last_height(&self) -> Option<u32> {
        self.blocks.last().map(|b| b.height)
    }
}

/// Short form for logs; the full block list can be large.
impl fmt::Display for GetBlocksResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first_height(), self.last_height()) {
            (Some(first), Some(last)) => write!(
                f,
                "GetBlocksResponse{{blocks: {} ({first}..={last}), request_nonce: {}}}",
                self.blocks.len(),
                self.request_nonce
            ),
            _ => write!(
                f,
                "GetBlocksResponse{{blocks: 0, request_nonce: {}}}",
                self.request_nonce
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlockBroadcastMessage {
    pub block: RawBlock,
}

/// Every message that travels over a sync connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEnvelope {
    GetBlocksRequest(GetBlocksRequest),
    GetBlocksResponse(GetBlocksResponse),
    NewBlockBroadcast(NewBlockBroadcastMessage),
}

impl NetworkEnvelope {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetBlocksRequest(_) => "GetBlocksRequest",
            Self::GetBlocksResponse(_) => "GetBlocksResponse",
            Self::NewBlockBroadcast(_) => "NewBlockBroadcast",
        }
    }
}

impl From<GetBlocksRequest> for NetworkEnvelope {
    fn from(m: GetBlocksRequest) -> Self {
        Self::GetBlocksRequest(m)
    }
}

impl From<GetBlocksResponse> for NetworkEnvelope {
    fn from(m: GetBlocksResponse) -> Self {
        Self::GetBlocksResponse(m)
    }
}

impl From<NewBlockBroadcastMessage> for NetworkEnvelope {
    fn from(m: NewBlockBroadcastMessage) -> Self {
        Self::NewBlockBroadcast(m)
    }
}
