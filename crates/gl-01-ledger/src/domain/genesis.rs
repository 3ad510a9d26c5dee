//! Genesis block
//!
//! Every node seeds its chain with the same fixed block so that chains built
//! independently share a common root and can be compared position by position.

use shared_types::Block;

use super::hashing::sha256_hex;

/// Nonce carried by the genesis block.
pub const GENESIS_NONCE: u64 = 11;

/// Seed hashed to produce the genesis `previousBlockHash`.
pub const GENESIS_PREVIOUS_SEED: &str = "previousBlockHash";

/// Seed hashed to produce the genesis `hash`.
pub const GENESIS_HASH_SEED: &str = "hash";

/// Build the genesis block. Deterministic: no clock, no randomness.
pub fn genesis_block() -> Block {
    Block {
        index: 1,
        timestamp: 0,
        transactions: Vec::new(),
        nonce: GENESIS_NONCE,
        hash: sha256_hex(GENESIS_HASH_SEED),
        previous_block_hash: sha256_hex(GENESIS_PREVIOUS_SEED),
    }
}

/// Whether `block` is byte-identical to the genesis block.
pub fn is_genesis(block: &Block) -> bool {
    *block == genesis_block()
}
