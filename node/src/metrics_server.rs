//! HTTP endpoint serving `/metrics`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};

use crate::metrics::NodeMetrics;
use crate::NodeError;

pub fn router(metrics: Arc<NodeMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<Arc<NodeMetrics>>) -> (StatusCode, String) {
    match metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            tracing::warn!(error = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Serve metrics on `addr` until the task is dropped or aborted.
pub async fn serve(addr: SocketAddr, metrics: Arc<NodeMetrics>) -> Result<(), NodeError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "metrics endpoint listening");
    axum::serve(listener, router(metrics)).await?;
    Ok(())
}
