//! Error types for the ledger subsystem

use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while mutating or reading the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The chain has no blocks (never true for a ledger built with `Ledger::new`)
    #[error("Chain is empty")]
    EmptyChain,

    /// A mined block no longer extends the chain tip
    #[error("Chain tip moved while mining: expected parent {expected}, tip is now {actual}")]
    StaleTip {
        /// Hash the block was mined on top of
        expected: String,
        /// Hash of the current tip
        actual: String,
    },

    /// Block payload could not be encoded for hashing
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reasons a chain fails structural validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainValidationError {
    /// The chain carries no blocks at all
    #[error("Chain is empty")]
    Empty,

    /// First block differs from the fixed genesis block
    #[error("Genesis block mismatch")]
    GenesisMismatch,

    /// `previousBlockHash` does not match the parent hash
    #[error("Broken link at position {position}")]
    BrokenLink {
        /// Zero-based position of the offending block
        position: usize,
    },

    /// Stored `index` does not match the block's position
    #[error("Index mismatch at position {position}: stored {stored}")]
    IndexMismatch {
        /// Zero-based position of the offending block
        position: usize,
        /// Index carried by the block
        stored: u64,
    },

    /// Stored hash differs from the recomputed one
    #[error("Hash mismatch at position {position}")]
    HashMismatch {
        /// Zero-based position of the offending block
        position: usize,
    },

    /// Hash does not satisfy the proof-of-work predicate
    #[error("Insufficient proof-of-work at position {position}")]
    InsufficientWork {
        /// Zero-based position of the offending block
        position: usize,
    },

    /// Block payload could not be encoded
    #[error("Unencodable block at position {position}")]
    Unencodable {
        /// Zero-based position of the offending block
        position: usize,
    },
}
