//! Hashing utilities for blocks
//!
//! The block digest is `SHA-256(previous_hash ‖ decimal(nonce) ‖ json(block_data))`,
//! rendered as lowercase hex. Every node must produce byte-identical digests, so
//! the JSON text comes from the derived `Serialize` impls in field order.

use sha2::{Digest, Sha256};
use shared_types::BlockData;

use crate::error::Result;

/// Leading characters a block hash must carry to satisfy proof-of-work.
pub const DIFFICULTY_PREFIX: &str = "0000";

/// Compute the lowercase hex SHA-256 digest of a string.
#[inline]
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical JSON text of a block payload.
pub fn encode_block_data(block_data: &BlockData) -> Result<String> {
    Ok(serde_json::to_string(block_data)?)
}

/// Hash an already-encoded payload.
///
/// The nonce search calls this in its loop so the payload is encoded once.
#[inline]
pub fn hash_payload(previous_hash: &str, payload: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a block from its parent hash, payload and nonce.
pub fn hash_block(previous_hash: &str, block_data: &BlockData, nonce: u64) -> Result<String> {
    let payload = encode_block_data(block_data)?;
    Ok(hash_payload(previous_hash, &payload, nonce))
}

/// Proof-of-work predicate.
#[inline]
pub fn meets_difficulty(hash: &str) -> bool {
    hash.starts_with(DIFFICULTY_PREFIX)
}
