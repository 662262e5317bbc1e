//! Node configuration with TOML file support.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use bsq_types::{GenesisConfig, TxId};

use crate::NodeError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeMode {
    /// Parses blocks from the chain feed and serves lite nodes.
    #[default]
    Full,
    /// Syncs parsed blocks from a full node.
    Lite,
}

/// Identity of the genesis tx and the BSQ it creates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisSettings {
    #[serde(default = "default_genesis_tx_id")]
    pub tx_id: String,
    #[serde(default = "default_genesis_height")]
    pub block_height: u32,
    /// In satoshi.
    #[serde(default = "default_genesis_total_supply")]
    pub total_supply: u64,
}

impl Default for GenesisSettings {
    fn default() -> Self {
        Self {
            tx_id: default_genesis_tx_id(),
            block_height: default_genesis_height(),
            total_supply: default_genesis_total_supply(),
        }
    }
}

impl From<&GenesisSettings> for GenesisConfig {
    fn from(s: &GenesisSettings) -> Self {
        GenesisConfig {
            tx_id: TxId::new(s.tx_id.clone()),
            block_height: s.block_height,
            total_supply: s.total_supply,
        }
    }
}

/// Configuration for a BSQ node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub mode: NodeMode,

    /// Address to accept peer connections on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Peers to connect to on startup. A lite node syncs from the first one
    /// that connects.
    #[serde(default)]
    pub peers: Vec<SocketAddr>,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Used to age merit.
    #[serde(default = "default_blocks_per_year")]
    pub blocks_per_year: u32,

    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: SocketAddr,

    #[serde(default)]
    pub genesis: GenesisSettings,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_genesis_tx_id() -> String {
    "30af0050040befd8af25068cc697e418e09c2d8ebd8d411d2240591b9ec203cf".to_string()
}

fn default_genesis_height() -> u32 {
    111
}

fn default_genesis_total_supply() -> u64 {
    250_000_000
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7_860))
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./bsq_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_blocks_per_year() -> u32 {
    // 144 blocks a day
    52_560
}

fn default_metrics_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9_796))
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.blocks_per_year == 0 {
            return Err(NodeError::Config("blocks_per_year must be positive".into()));
        }
        if self.genesis.tx_id.is_empty() {
            return Err(NodeError::Config("genesis tx_id must not be empty".into()));
        }
        if !matches!(self.log_format.as_str(), "human" | "json") {
            return Err(NodeError::Config(format!(
                "unknown log_format {:?}, expected \"human\" or \"json\"",
                self.log_format
            )));
        }
        Ok(())
    }

    pub fn genesis_config(&self) -> GenesisConfig {
        GenesisConfig::from(&self.genesis)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            mode: NodeMode::default(),
            listen_addr: default_listen_addr(),
            peers: Vec::new(),
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            blocks_per_year: default_blocks_per_year(),
            enable_metrics: false,
            metrics_addr: default_metrics_addr(),
            genesis: GenesisSettings::default(),
        }
    }
}
