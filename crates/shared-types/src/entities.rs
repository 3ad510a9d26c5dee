//! # Core Domain Entities
//!
//! Defines the ledger entities every node stores and gossips.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `BlockData`
//! - **Pool**: `Transaction`
//! - **Read model**: `ChainSnapshot`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// CLUSTER A: THE POOL
// =============================================================================

/// A value transfer between two parties.
///
/// Immutable once created. The `transaction_id` is assigned at creation time
/// and is unique across nodes; the ledger never deduplicates by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Amount transferred, in base units.
    pub amount: u64,
    /// Opaque sender identifier.
    pub sender: String,
    /// Opaque recipient identifier.
    pub recipient: String,
    /// Globally unique id assigned at creation.
    pub transaction_id: Uuid,
}

impl Transaction {
    /// Create a transaction with a freshly allocated v4 id.
    pub fn new(amount: u64, sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            amount,
            sender: sender.into(),
            recipient: recipient.into(),
            transaction_id: Uuid::new_v4(),
        }
    }
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// The hashed payload of a block.
///
/// Serialized as `{"index":..,"transactions":[..]}`; that exact JSON text is
/// fed to the block hash, so field order here is part of the hash format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    /// Index the block will occupy (1-based).
    pub index: u64,
    /// Transactions carried by the block, in pool order.
    pub transactions: Vec<Transaction>,
}

impl BlockData {
    /// Build block data for the given index.
    pub fn new(index: u64, transactions: Vec<Transaction>) -> Self {
        Self {
            index,
            transactions,
        }
    }
}

/// A block on the chain.
///
/// Created exactly once and never mutated after being appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Creation time in epoch milliseconds (0 for genesis).
    pub timestamp: i64,
    /// Transactions drained from the pending pool.
    pub transactions: Vec<Transaction>,
    /// Proof-of-work nonce.
    pub nonce: u64,
    /// Hex SHA-256 digest of this block.
    pub hash: String,
    /// Hash of the block this one extends.
    pub previous_block_hash: String,
}

impl Block {
    /// Number of transactions in the block.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Whether this block extends `parent` (hash linkage and index step).
    pub fn extends(&self, parent: &Block) -> bool {
        self.previous_block_hash == parent.hash && self.index == parent.index + 1
    }
}

// =============================================================================
// CLUSTER C: READ MODEL
// =============================================================================

/// Point-in-time copy of a node's chain and pending pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSnapshot {
    /// Full chain, genesis first.
    pub chain: Vec<Block>,
    /// Pending pool in arrival order.
    pub pending_transactions: Vec<Transaction>,
}

impl ChainSnapshot {
    /// Length of the chain, genesis included.
    pub fn chain_length(&self) -> usize {
        self.chain.len()
    }
}
