//! # Gossip-Ledger - Ledger Core (Subsystem 1)
//!
//! **Bounded Context:** Chain & Pending Pool
//!
//! ## Purpose
//!
//! Owns a node's chain and pending-transaction pool, and the pure rules that
//! govern them:
//! - block hashing: `SHA-256(previous_hash ‖ nonce ‖ json({index, transactions}))`
//! - proof-of-work: minimal nonce whose digest starts with `"0000"`
//! - append rules for locally mined and gossiped blocks
//! - structural validation of a peer's chain
//!
//! ## Critical Invariants
//!
//! 1. `chain[0]` is the fixed genesis block
//! 2. `chain[i].previousBlockHash == chain[i-1].hash`
//! 3. `chain[i].hash == H(chain[i-1].hash, {index: i+1, transactions}, nonce)`
//! 4. `chain[i].hash` starts with [`DIFFICULTY_PREFIX`]
//!
//! ## Module Structure
//!
//! - [`domain`]: genesis, hashing, nonce search, the [`Ledger`] aggregate, validation
//! - [`error`]: error enums

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod error;

pub use domain::*;
pub use error::{ChainValidationError, LedgerError, Result};
