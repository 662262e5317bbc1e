use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("parse error: {0}")]
    Parse(#[from] bsq_parser::ParseError),

    #[error("store error: {0}")]
    Store(#[from] bsq_store::StoreError),

    #[error("network error: {0}")]
    Network(#[from] bsq_network::NetworkError),

    #[error("config error: {0}")]
    Config(String),

    #[error("parse executor stopped")]
    ExecutorStopped,

    #[error("parse task failed: {0}")]
    ParseTask(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("replay file error: {0}")]
    Replay(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
