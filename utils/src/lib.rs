//! Shared utilities for the BSQ DAO.

pub mod format;
pub mod logging;

pub use format::{format_block_duration, format_bsq};
pub use logging::init_tracing;
