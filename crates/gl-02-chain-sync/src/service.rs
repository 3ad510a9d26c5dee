//! # Chain Sync Service
//!
//! Applies broadcast events to the local ledger and runs the chain request
//! round trip.
//!
//! | Event | Effect |
//! |-------|--------|
//! | `TRANSACTION.CREATED` | append to the pending pool |
//! | `BLOCK.MINED` | append if it extends the tip |
//! | `CHAIN.REQUESTED` | reply with chain and pool to `replyTo` |
//! | `CHAIN.PUBLISHED` | reconcile |

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use gl_01_ledger::SharedLedger;
use ledger_telemetry::metrics::{
    BLOCKS_ACCEPTED, BLOCKS_REJECTED, EVENTS_PUBLISHED, EVENTS_RECEIVED, SYNC_OUTCOMES,
};
use parking_lot::Mutex;
use shared_bus::{EventHandler, LedgerEvent, PubSub, ReplyQueue};
use shared_types::{Block, Transaction};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::domain::{synchronise_chain, SyncOutcome};
use crate::error::SyncError;

/// Event handler and chain-request driver for one node.
pub struct ChainSync {
    node_id: String,
    ledger: SharedLedger,
    pubsub: Arc<PubSub>,
    config: SyncConfig,
    /// Reply queues of this node's in-flight chain requests.
    own_requests: Mutex<HashSet<String>>,
}

impl ChainSync {
    /// Create a sync service over a ledger and an initialized channel.
    pub fn new(
        node_id: impl Into<String>,
        ledger: SharedLedger,
        pubsub: Arc<PubSub>,
        config: SyncConfig,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            ledger,
            pubsub,
            config,
            own_requests: Mutex::new(HashSet::new()),
        }
    }

    /// Node identifier used in logs and metric labels.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Publish an event; failures are logged, never returned.
    pub async fn broadcast(&self, event: LedgerEvent) {
        match self.pubsub.publish(&event).await {
            Ok(()) => EVENTS_PUBLISHED.with_label_values(&[event.name()]).inc(),
            Err(e) => warn!(node = %self.node_id, event = event.name(), error = %e, "Publish failed"),
        }
    }

    /// Announce a new transaction to every node.
    pub async fn broadcast_transaction(&self, transaction: Transaction) {
        self.broadcast(LedgerEvent::TransactionCreated(transaction))
            .await;
    }

    /// Announce a freshly mined block to every node.
    pub async fn broadcast_block(&self, block: Block) {
        self.broadcast(LedgerEvent::BlockMined(block)).await;
    }

    /// Reconcile the local ledger against a peer's chain and pool.
    pub fn synchronise_chain(&self, chain: Vec<Block>, pending_pool: Vec<Transaction>) -> SyncOutcome {
        let outcome = {
            let mut ledger = self.ledger.lock();
            let outcome = synchronise_chain(&mut ledger, chain, pending_pool);
            self.record_size(&ledger);
            outcome
        };
        SYNC_OUTCOMES.with_label_values(&[outcome.label()]).inc();
        if outcome.changed() {
            info!(node = %self.node_id, ?outcome, "Adopted peer state");
        }
        outcome
    }

    /// Ask every peer for its chain and reconcile against the first reply.
    ///
    /// Waits forever for a reply unless `reply_timeout_ms` is set.
    pub async fn request_chain(&self) -> Result<SyncOutcome, SyncError> {
        let mut replies = self.pubsub.create_reply_queue().await?;
        let reply_to = replies.name().to_string();
        self.own_requests.lock().insert(reply_to.clone());

        let result = self.await_chain_reply(&mut replies).await;
        self.own_requests.lock().remove(&reply_to);

        let (chain, pending_pool) = result?;
        Ok(self.synchronise_chain(chain, pending_pool))
    }

    async fn await_chain_reply(
        &self,
        replies: &mut ReplyQueue,
    ) -> Result<(Vec<Block>, Vec<Transaction>), SyncError> {
        self.pubsub
            .publish(&LedgerEvent::ChainRequested {
                reply_to: replies.name().to_string(),
            })
            .await?;
        EVENTS_PUBLISHED
            .with_label_values(&[shared_bus::events::CHAIN_REQUESTED])
            .inc();

        let wait = async {
            while let Some(event) = replies.next_event().await {
                match event {
                    LedgerEvent::ChainPublished {
                        chain,
                        pending_pool,
                    } => return Ok((chain, pending_pool)),
                    other => debug!(event = other.name(), "Unexpected event on reply queue"),
                }
            }
            Err(SyncError::ReplyQueueClosed)
        };

        match self.config.reply_timeout() {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| SyncError::ReplyTimeout(limit))?,
            None => wait.await,
        }
    }

    /// After the settle delay, run one chain request in the background.
    pub fn spawn_startup_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let sync = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(sync.config.settle_delay()).await;
            match sync.request_chain().await {
                Ok(outcome) => info!(node = %sync.node_id, ?outcome, "Startup sync finished"),
                Err(e) => warn!(node = %sync.node_id, error = %e, "Startup sync failed"),
            }
        })
    }

    fn on_transaction(&self, transaction: Transaction) {
        let mut ledger = self.ledger.lock();
        match ledger.add_transaction_to_pending_transactions(transaction) {
            Ok(block_index) => debug!(node = %self.node_id, block_index, "Transaction pooled"),
            Err(e) => warn!(node = %self.node_id, error = %e, "Transaction not pooled"),
        }
        self.record_size(&ledger);
    }

    fn on_block(&self, block: Block) {
        let mut ledger = self.ledger.lock();
        // Our own broadcast comes back through the inbox.
        if ledger
            .get_last_block()
            .is_ok_and(|tip| tip.hash == block.hash)
        {
            return;
        }
        if ledger.add_mined_block_to_chain(block) {
            BLOCKS_ACCEPTED.inc();
        } else {
            BLOCKS_REJECTED.inc();
        }
        self.record_size(&ledger);
    }

    async fn on_chain_request(&self, reply_to: String) {
        if self.own_requests.lock().contains(&reply_to) {
            return;
        }
        let snapshot = self.ledger.lock().snapshot();
        let reply = LedgerEvent::ChainPublished {
            chain: snapshot.chain,
            pending_pool: snapshot.pending_transactions,
        };
        match self.pubsub.reply(&reply_to, &reply).await {
            Ok(()) => EVENTS_PUBLISHED.with_label_values(&[reply.name()]).inc(),
            Err(e) => warn!(node = %self.node_id, %reply_to, error = %e, "Chain reply failed"),
        }
    }

    fn record_size(&self, ledger: &gl_01_ledger::Ledger) {
        ledger_telemetry::record_ledger_size(
            &self.node_id,
            ledger.chain().len(),
            ledger.pending_transactions().len(),
        );
    }
}

#[async_trait]
impl EventHandler for ChainSync {
    async fn handle(&self, event: LedgerEvent) {
        EVENTS_RECEIVED.with_label_values(&[event.name()]).inc();
        match event {
            LedgerEvent::TransactionCreated(transaction) => self.on_transaction(transaction),
            LedgerEvent::BlockMined(block) => self.on_block(block),
            LedgerEvent::ChainRequested { reply_to } => self.on_chain_request(reply_to).await,
            LedgerEvent::ChainPublished {
                chain,
                pending_pool,
            } => {
                self.synchronise_chain(chain, pending_pool);
            }
        }
    }
}
