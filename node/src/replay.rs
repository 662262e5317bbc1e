//! Offline chain feed: raw blocks stored as a JSON array.

use std::path::Path;

use bsq_types::RawBlock;

use crate::NodeError;

/// Load a JSON array of raw blocks in chain order.
pub fn load_raw_blocks(path: impl AsRef<Path>) -> Result<Vec<RawBlock>, NodeError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    parse_raw_blocks(&content).map_err(|e| NodeError::Replay(format!("{}: {e}", path.display())))
}

pub fn parse_raw_blocks(json: &str) -> Result<Vec<RawBlock>, NodeError> {
    serde_json::from_str(json).map_err(|e| NodeError::Replay(e.to_string()))
}

/// Write `blocks` so [`load_raw_blocks`] can read them back.
pub fn save_raw_blocks(path: impl AsRef<Path>, blocks: &[RawBlock]) -> Result<(), NodeError> {
    let json =
        serde_json::to_string_pretty(blocks).map_err(|e| NodeError::Replay(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}
