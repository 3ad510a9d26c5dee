//! Route handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use shared_types::ChainSnapshot;

use super::error::ApiError;
use crate::node::LedgerNode;

/// Accepted shape of `amount`.
pub const AMOUNT_CONSTRAINT: &str = "amount must be a non-negative whole number";

/// Body of `POST /transactions`.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Amount to transfer.
    #[serde(deserialize_with = "whole_amount")]
    pub amount: u64,
    /// Sender identifier.
    pub sender: String,
    /// Recipient identifier.
    pub recipient: String,
}

fn whole_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value
        .as_u64()
        .ok_or_else(|| D::Error::custom(format!("{AMOUNT_CONSTRAINT}, got {value}")))
}

/// `GET /blockchain`
pub async fn get_blockchain(State(node): State<Arc<LedgerNode>>) -> Json<ChainSnapshot> {
    Json(node.get_chain())
}

/// `POST /transactions`
pub async fn create_transaction(
    State(node): State<Arc<LedgerNode>>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let receipt = node
        .create_transaction(request.amount, &request.sender, &request.recipient)
        .await?;
    Ok(Json(json!({
        "note": format!("Transaction will be added in block {}.", receipt.transaction_block),
        "transaction": receipt.transaction,
        "transactionBlock": receipt.transaction_block,
    })))
}

/// `POST /mine`
pub async fn mine(State(node): State<Arc<LedgerNode>>) -> Result<Json<Value>, ApiError> {
    let block = node.mine_block().await?;
    Ok(Json(json!({
        "note": "Block Mined Successfully",
        "block": block,
    })))
}

/// `GET /health`
pub async fn health(State(node): State<Arc<LedgerNode>>) -> Json<Value> {
    let snapshot = node.get_chain();
    Json(json!({
        "status": "ok",
        "node": node.id(),
        "chainLength": snapshot.chain_length(),
        "pendingTransactions": snapshot.pending_transactions.len(),
    }))
}

/// `GET /metrics`
pub async fn metrics() -> impl IntoResponse {
    match ledger_telemetry::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::bad_request(e.to_string()).into_response(),
    }
}
