//! # HTTP API
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/blockchain` | `{chain, pendingTransactions}` |
//! | POST | `/transactions` | `{note, transaction, transactionBlock}` |
//! | POST | `/mine` | `{note, block}` |
//! | GET | `/health` | `{status, node, chainLength, pendingTransactions}` |
//! | GET | `/metrics` | Prometheus text |
//!
//! Ledger routes are also served under `/api/v1`. Failures are
//! `{"error": "<details>"}` with a 4xx status.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::{error, info};

use crate::node::LedgerNode;

pub mod error;
pub mod handlers;

pub use error::ApiError;

fn ledger_routes() -> Router<Arc<LedgerNode>> {
    Router::new()
        .route("/blockchain", get(handlers::get_blockchain))
        .route("/transactions", post(handlers::create_transaction))
        .route("/mine", post(handlers::mine))
}

/// Build the router for one node.
pub fn router(node: Arc<LedgerNode>) -> Router {
    Router::new()
        .merge(ledger_routes())
        .nest("/api/v1", ledger_routes())
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(node)
}

/// Serve the node's API on `addr` until `shutdown` resolves.
pub async fn serve<F>(node: Arc<LedgerNode>, addr: String, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(node = %node.id(), %addr, "Starting HTTP server");
    let result = axum::serve(listener, router(node))
        .with_graceful_shutdown(shutdown)
        .await;
    if let Err(e) = &result {
        error!(error = %e, "HTTP server error");
    }
    result
}
