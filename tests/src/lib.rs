//! # Gossip-Ledger Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Multi-node flows over a shared broker
//!     ├── cluster.rs    # Fixtures: start nodes, poll for convergence
//!     ├── gossip_flows.rs
//!     └── chain_sync_flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gl-tests
//! cargo test -p gl-tests integration::chain_sync_flows
//!
//! # Benchmarks
//! cargo bench -p gl-tests
//! ```

#![allow(dead_code)]

pub mod integration;
