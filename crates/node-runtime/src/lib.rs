//! # Node Runtime Library
//!
//! Wires a ledger, a broadcast channel and chain sync into a [`LedgerNode`]
//! and exposes it over HTTP. The `node-runtime` binary runs one or more
//! nodes against a shared in-process broker.
//!
//! - [`container`]: configuration
//! - [`node`]: the node façade and its background tasks
//! - [`api`]: axum router

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod api;
pub mod container;
pub mod node;

pub use container::NodeConfig;
pub use node::{LedgerNode, NodeError, TransactionReceipt};
