//! # Shared Types Crate
//!
//! This crate contains the ledger data model exchanged between nodes and
//! handed to HTTP callers.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Transaction`, `Block`, `BlockData` and
//!   `ChainSnapshot` are defined once here and serialized identically by
//!   every node, which is what makes chains from different nodes comparable.
//! - **camelCase on the wire**: field names follow the JSON shape of the
//!   event payloads (`transactionId`, `previousBlockHash`, ...).
//! - **Structural equality**: reconciliation compares blocks field-by-field,
//!   so every entity derives `PartialEq`/`Eq`.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
