//! Prometheus metrics for the BSQ node.
//!
//! The [`NodeMetrics`] struct owns a dedicated [`Registry`] that the
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Blocks parsed and committed to the state.
    pub blocks_applied: IntCounter,
    /// BSQ txs contained in committed blocks.
    pub bsq_txs_applied: IntCounter,
    /// Blocks rejected by the parser or the store.
    pub blocks_rejected: IntCounter,
    /// `GetBlocksRequest`s answered successfully.
    pub get_blocks_served: IntCounter,
    /// `GetBlocksRequest`s that ended in a send failure or timeout.
    pub get_blocks_faults: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub chain_height: IntGauge,
    pub peer_count: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time to parse and commit one block, in milliseconds.
    pub parse_duration_ms: Histogram,
}

impl NodeMetrics {
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let blocks_applied = register_int_counter_with_registry!(
            Opts::new("bsq_blocks_applied_total", "Blocks committed to the DAO state"),
            registry
        )?;
        let bsq_txs_applied = register_int_counter_with_registry!(
            Opts::new("bsq_txs_applied_total", "BSQ txs in committed blocks"),
            registry
        )?;
        let blocks_rejected = register_int_counter_with_registry!(
            Opts::new("bsq_blocks_rejected_total", "Blocks rejected by parser or store"),
            registry
        )?;
        let get_blocks_served = register_int_counter_with_registry!(
            Opts::new(
                "bsq_get_blocks_served_total",
                "GetBlocksRequests answered successfully"
            ),
            registry
        )?;
        let get_blocks_faults = register_int_counter_with_registry!(
            Opts::new(
                "bsq_get_blocks_faults_total",
                "GetBlocksRequests ending in send failure or timeout"
            ),
            registry
        )?;

        let chain_height = register_int_gauge_with_registry!(
            Opts::new("bsq_chain_height", "Height of the last committed block"),
            registry
        )?;
        let peer_count = register_int_gauge_with_registry!(
            Opts::new("bsq_peer_count", "Current number of connected peers"),
            registry
        )?;

        // Exponential buckets covering 0.1 ms to ~1.6 s.
        let parse_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new("bsq_parse_duration_ms", "Block parse time in milliseconds")
                .buckets(prometheus::exponential_buckets(0.1, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            blocks_applied,
            bsq_txs_applied,
            blocks_rejected,
            get_blocks_served,
            get_blocks_faults,
            chain_height,
            peer_count,
            parse_duration_ms,
        })
    }

    /// Encode all metrics in the text exposition format.
    pub fn render(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| NodeError::Config(format!("metrics not UTF-8: {e}")))
    }
}
