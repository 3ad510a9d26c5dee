//! Proof-of-work nonce search
//!
//! Linear scan from nonce 0; the first nonce whose digest meets
//! [`DIFFICULTY_PREFIX`](super::hashing::DIFFICULTY_PREFIX) wins, so the result
//! is the minimal valid nonce and is identical on every node.

use shared_types::BlockData;

use super::hashing::{encode_block_data, hash_payload, meets_difficulty};
use crate::error::Result;

/// Outcome of a successful nonce search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Minimal nonce meeting the difficulty predicate
    pub nonce: u64,
    /// Digest produced by that nonce
    pub hash: String,
}

/// Search for the minimal nonce over an encoded payload.
///
/// Unbounded: runs until a nonce is found. Callers on an async runtime should
/// run this on the blocking pool.
#[tracing::instrument(skip(payload), fields(payload_len = payload.len()))]
pub fn solve(previous_hash: &str, payload: &str) -> Solution {
    let mut nonce: u64 = 0;
    loop {
        let hash = hash_payload(previous_hash, payload, nonce);
        if meets_difficulty(&hash) {
            tracing::debug!(nonce, %hash, "Proof-of-work found");
            return Solution { nonce, hash };
        }
        nonce += 1;
    }
}

/// Find the minimal nonce for `block_data` on top of `previous_hash`.
pub fn proof_of_work(previous_hash: &str, block_data: &BlockData) -> Result<u64> {
    let payload = encode_block_data(block_data)?;
    Ok(solve(previous_hash, &payload).nonce)
}
