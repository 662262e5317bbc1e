//! BSQ daemon: entry point for running a DAO node.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bsq_governance::{merit_stake, MeritList};
use bsq_network::TcpNetworkNode;
use bsq_node::{
    load_raw_blocks, metrics_server, FullNode, LiteNode, LogFormat, NodeConfig, NodeMetrics,
    NodeMode, ParseExecutor, ShutdownController,
};
use bsq_parser::BlockParser;
use bsq_store::{DaoStateReader, StateStore};
use bsq_utils::{format_block_duration, format_bsq};
use clap::Parser;
use tokio::sync::mpsc;

const EVENT_QUEUE: usize = 256;
const CHAIN_FEED_QUEUE: usize = 64;
/// Chain feed picked up from the data dir when `--blocks` is not given.
const DEFAULT_FEED_FILE: &str = "blocks.json";

#[derive(Parser)]
#[command(name = "bsq-daemon", about = "BSQ DAO node daemon")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars override it.
    #[arg(long, env = "BSQ_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "BSQ_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "BSQ_LOG_FORMAT")]
    log_format: Option<String>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "BSQ_ENABLE_METRICS")]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Parse the chain feed and serve lite nodes.
    Full {
        /// JSON file of raw blocks fed to the parser on startup. Defaults to
        /// `blocks.json` in the data dir if present.
        #[arg(long)]
        blocks: Option<PathBuf>,
    },
    /// Sync parsed blocks from the configured peers.
    Lite,
    /// Parse a JSON file of raw blocks offline and print the resulting state.
    Replay { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.enable_metrics |= cli.metrics;
    match &cli.command {
        Command::Full { .. } => config.mode = NodeMode::Full,
        Command::Lite => config.mode = NodeMode::Lite,
        Command::Replay { .. } => {}
    }

    let format: LogFormat = config.log_format.parse()?;
    bsq_node::init_logging(format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    let genesis = config.genesis_config();
    let store = Arc::new(StateStore::new(genesis.clone()));
    let _block_log = store.subscribe(|block| {
        tracing::info!(
            height = block.height,
            hash = %block.hash,
            bsq_txs = block.txs.len(),
            "block applied"
        );
    });
    let metrics = Arc::new(NodeMetrics::new()?);
    let executor = ParseExecutor::spawn(
        Arc::clone(&store),
        Arc::new(BlockParser::new(genesis)),
        Arc::clone(&metrics),
    );

    if config.enable_metrics {
        let addr = config.metrics_addr;
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            if let Err(e) = metrics_server::serve(addr, metrics).await {
                tracing::error!(error = %e, "metrics endpoint failed");
            }
        });
    }

    match cli.command {
        Command::Replay { file } => {
            replay(&store, &executor, &file, config.blocks_per_year).await
        }
        Command::Full { blocks } => run_full(config, store, executor, metrics, blocks).await,
        Command::Lite => run_lite(config, store, executor, metrics).await,
    }
}

async fn replay(
    store: &StateStore,
    executor: &ParseExecutor,
    file: &Path,
    blocks_per_year: u32,
) -> anyhow::Result<()> {
    let blocks = load_raw_blocks(file)?;
    let total = blocks.len();
    let applied = executor
        .parse_blocks_to_end(blocks)
        .await
        .with_context(|| format!("replaying {}", file.display()))?;

    let state = store.read();
    let bsq_txs: usize = state.blocks().iter().map(|b| b.txs.len()).sum();
    println!("blocks applied:   {applied}/{total}");
    println!("chain height:     {}", state.chain_height());
    println!("bsq txs:          {bsq_txs}");
    println!("burnt fees:       {}", format_bsq(state.total_burnt_fee()));
    println!(
        "issued:           {}",
        format_bsq(state.total_issued_amount_from_comp_requests())
    );
    let merits = MeritList::from_issuances(&*state);
    let merit = merit_stake(&merits, &*state, state.chain_height(), blocks_per_year)
        .context("weighing issuance merit")?;
    println!("issuance merit:   {} ({} issuances)", format_bsq(merit), merits.0.len());
    if let Some(cycle) = state.cycles().last() {
        println!(
            "current cycle:    {}..={} ({})",
            cycle.first_block,
            cycle.last_block(),
            format_block_duration(u64::from(cycle.duration()))
        );
    }
    Ok(())
}

async fn run_full(
    config: NodeConfig,
    store: Arc<StateStore>,
    executor: ParseExecutor,
    metrics: Arc<NodeMetrics>,
    blocks: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
    let network = TcpNetworkNode::new(events_tx);
    let (local_addr, _listener) = network.listen(config.listen_addr).await?;
    tracing::info!(addr = %local_addr, "full node listening");
    connect_peers(&network, &config).await;

    let (feed_tx, feed_rx) = mpsc::channel(CHAIN_FEED_QUEUE);
    let default_feed = config.data_dir.join(DEFAULT_FEED_FILE);
    let blocks = blocks.or_else(|| default_feed.exists().then_some(default_feed));
    if let Some(path) = blocks {
        let raw_blocks = load_raw_blocks(&path)?;
        tracing::info!(path = %path.display(), blocks = raw_blocks.len(), "feeding blocks");
        tokio::spawn(async move {
            for raw in raw_blocks {
                if feed_tx.send(raw).await.is_err() {
                    break;
                }
            }
        });
    } else {
        drop(feed_tx);
    }

    let shutdown = ShutdownController::new();
    let node = Arc::new(FullNode::new(store, executor, network, metrics));
    let running = tokio::spawn(node.run(events_rx, feed_rx, shutdown.subscribe()));

    shutdown.wait_for_signal().await;
    running.await.context("full node task")?;
    tracing::info!("bsq daemon exited cleanly");
    Ok(())
}

async fn run_lite(
    config: NodeConfig,
    store: Arc<StateStore>,
    executor: ParseExecutor,
    metrics: Arc<NodeMetrics>,
) -> anyhow::Result<()> {
    if config.peers.is_empty() {
        anyhow::bail!("a lite node needs at least one peer to sync from");
    }
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
    let network = TcpNetworkNode::new(events_tx);

    let shutdown = ShutdownController::new();
    let node = Arc::new(LiteNode::new(store, executor, Arc::clone(&network), metrics));
    let running = tokio::spawn(node.run(events_rx, shutdown.subscribe()));
    connect_peers(&network, &config).await;

    shutdown.wait_for_signal().await;
    running.await.context("lite node task")?;
    tracing::info!("bsq daemon exited cleanly");
    Ok(())
}

async fn connect_peers(network: &Arc<TcpNetworkNode>, config: &NodeConfig) {
    for peer in &config.peers {
        match network.connect(*peer).await {
            Ok(connection) => tracing::info!(peer = %connection, "connected"),
            Err(e) => tracing::warn!(peer = %peer, error = %e, "cannot connect to peer"),
        }
    }
}
