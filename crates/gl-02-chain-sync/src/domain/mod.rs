//! Domain layer: pure reconciliation rules.

pub mod reconcile;

pub use reconcile::{decide, synchronise_chain, SyncOutcome, UnchangedReason};
