//! # Gossip-Ledger - Chain Sync (Subsystem 2)
//!
//! **Bounded Context:** Inter-node convergence
//!
//! Nodes mine independently and learn about each other only through
//! broadcast events. This crate applies those events to the local ledger and
//! decides when a peer's chain or pending pool should replace ours.
//!
//! ## Startup
//!
//! After a settle delay a node creates a reply queue, broadcasts
//! `CHAIN.REQUESTED {replyTo}`, reconciles against the first
//! `CHAIN.PUBLISHED` that comes back, and ignores its own request when it
//! loops back through the inbox.
//!
//! ## Module Structure
//!
//! - [`domain`]: reconciliation rules ([`decide`], [`synchronise_chain`])
//! - [`service`]: [`ChainSync`], the broadcast event handler
//! - [`config`]: [`SyncConfig`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod error;
pub mod service;

pub use config::SyncConfig;
pub use domain::{decide, synchronise_chain, SyncOutcome, UnchangedReason};
pub use error::SyncError;
pub use service::ChainSync;
