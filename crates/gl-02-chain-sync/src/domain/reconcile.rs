//! # Chain Reconciliation
//!
//! Decides whether a peer's chain or pending pool replaces the local one.
//!
//! # Rules
//! 1. Incoming chain not longer: keep the chain. Adopt the incoming pool only
//!    if it is strictly longer and starts with the whole local pool.
//! 2. Incoming chain longer but structurally invalid: discard.
//! 3. Incoming chain longer but not an extension of the local chain: discard.
//! 4. Otherwise adopt the incoming chain and pool.

use gl_01_ledger::{is_chain_valid, ChainValidationError, Ledger};
use shared_types::{Block, Transaction};

/// Why a reconciliation left the ledger untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnchangedReason {
    /// Incoming chain is not longer and its pool does not extend ours.
    NotLonger,
    /// Incoming chain failed validation.
    InvalidChain(ChainValidationError),
    /// Incoming chain disagrees with ours at `position`.
    Diverged {
        /// First zero-based position where the blocks differ.
        position: usize,
    },
}

/// Result of reconciling against a peer's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local chain and pool were replaced.
    ChainReplaced {
        /// New chain length.
        length: usize,
    },
    /// Only the pending pool was replaced.
    PendingPoolReplaced {
        /// New pool size.
        size: usize,
    },
    /// Nothing changed.
    Unchanged(UnchangedReason),
}

impl SyncOutcome {
    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ChainReplaced { .. } => "chain_replaced",
            Self::PendingPoolReplaced { .. } => "pool_replaced",
            Self::Unchanged(_) => "unchanged",
        }
    }

    /// Whether the ledger was modified.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }
}

/// Pure decision over local and incoming state.
pub fn decide(
    local_chain: &[Block],
    local_pool: &[Transaction],
    incoming_chain: &[Block],
    incoming_pool: &[Transaction],
) -> SyncOutcome {
    if incoming_chain.len() <= local_chain.len() {
        let extends_pool =
            local_pool.len() < incoming_pool.len() && incoming_pool.starts_with(local_pool);
        return if extends_pool {
            SyncOutcome::PendingPoolReplaced {
                size: incoming_pool.len(),
            }
        } else {
            SyncOutcome::Unchanged(UnchangedReason::NotLonger)
        };
    }

    if let Err(e) = is_chain_valid(incoming_chain) {
        return SyncOutcome::Unchanged(UnchangedReason::InvalidChain(e));
    }

    if let Some(position) = local_chain
        .iter()
        .zip(incoming_chain)
        .position(|(local, incoming)| local != incoming)
    {
        return SyncOutcome::Unchanged(UnchangedReason::Diverged { position });
    }

    SyncOutcome::ChainReplaced {
        length: incoming_chain.len(),
    }
}

/// Reconcile `ledger` against a peer's chain and pool, applying the decision.
#[tracing::instrument(
    skip_all,
    fields(
        local_len = ledger.chain().len(),
        incoming_len = incoming_chain.len(),
        incoming_pool = incoming_pool.len()
    )
)]
pub fn synchronise_chain(
    ledger: &mut Ledger,
    incoming_chain: Vec<Block>,
    incoming_pool: Vec<Transaction>,
) -> SyncOutcome {
    let outcome = decide(
        ledger.chain(),
        ledger.pending_transactions(),
        &incoming_chain,
        &incoming_pool,
    );
    match &outcome {
        SyncOutcome::ChainReplaced { .. } => ledger.replace_chain(incoming_chain, incoming_pool),
        SyncOutcome::PendingPoolReplaced { .. } => ledger.replace_pending_transactions(incoming_pool),
        SyncOutcome::Unchanged(reason) => tracing::debug!(?reason, "Peer state not adopted"),
    }
    outcome
}
