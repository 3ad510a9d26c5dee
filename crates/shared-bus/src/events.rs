//! # Ledger Events
//!
//! Every message on the broadcast channel is one of these events, encoded as
//! `{"Event": "<NAME>", "Data": <payload>}`.

use serde::{Deserialize, Serialize};
use shared_types::{Block, Transaction};

/// Event tag for a new transaction.
pub const TRANSACTION_CREATED: &str = "TRANSACTION.CREATED";
/// Event tag for a freshly mined block.
pub const BLOCK_MINED: &str = "BLOCK.MINED";
/// Event tag for a chain request.
pub const CHAIN_REQUESTED: &str = "CHAIN.REQUESTED";
/// Event tag for a chain snapshot reply.
pub const CHAIN_PUBLISHED: &str = "CHAIN.PUBLISHED";

/// All events exchanged between nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Event", content = "Data")]
pub enum LedgerEvent {
    /// A node accepted a new transaction into its pool.
    #[serde(rename = "TRANSACTION.CREATED")]
    TransactionCreated(Transaction),

    /// A node mined a block on top of its tip.
    #[serde(rename = "BLOCK.MINED")]
    BlockMined(Block),

    /// A node asks every peer for its chain.
    #[serde(rename = "CHAIN.REQUESTED")]
    ChainRequested {
        /// Queue the reply must be delivered to.
        #[serde(rename = "replyTo")]
        reply_to: String,
    },

    /// A peer's chain and pool, sent point-to-point to a requester.
    #[serde(rename = "CHAIN.PUBLISHED")]
    ChainPublished {
        /// The peer's full chain.
        chain: Vec<Block>,
        /// The peer's pending pool.
        #[serde(rename = "pendingPool")]
        pending_pool: Vec<Transaction>,
    },
}

impl LedgerEvent {
    /// Wire tag of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransactionCreated(_) => TRANSACTION_CREATED,
            Self::BlockMined(_) => BLOCK_MINED,
            Self::ChainRequested { .. } => CHAIN_REQUESTED,
            Self::ChainPublished { .. } => CHAIN_PUBLISHED,
        }
    }

    /// Encode to the JSON wire format.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from the JSON wire format.
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}
