//! BSQ DAO node: full and lite operation on top of the parser and state store.
//!
//! A full node parses the chain feed through the [`ParseExecutor`] and serves
//! lite nodes with `GetBlocksResponse`s. A lite node asks a full node for the
//! blocks after its tip and re-parses them locally.

pub mod config;
pub mod error;
pub mod executor;
pub mod full_node;
pub mod lite_node;
pub mod logging;
pub mod metrics;
pub mod metrics_server;
pub mod replay;
pub mod shutdown;
pub mod tracing_spans;

pub use config::{GenesisSettings, NodeConfig, NodeMode};
pub use error::NodeError;
pub use executor::{BatchEvent, ParseExecutor};
pub use full_node::FullNode;
pub use lite_node::{LiteNode, LiteWork};
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use replay::{load_raw_blocks, parse_raw_blocks, save_raw_blocks};
pub use shutdown::ShutdownController;
