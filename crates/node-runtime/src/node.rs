//! # Ledger Node
//!
//! The object HTTP handlers talk to. Owns one ledger, one broadcast channel
//! and the chain sync handler, and the background tasks that drive them.
//!
//! ## Startup Sequence
//!
//! 1. Seed the ledger with genesis
//! 2. Initialize the broadcast channel (fatal on failure)
//! 3. Subscribe the chain sync handler to the inbox
//! 4. Schedule the startup chain request

use std::sync::Arc;

use gl_01_ledger::{pow, Ledger, LedgerError, SharedLedger};
use gl_02_chain_sync::ChainSync;
use ledger_telemetry::metrics::{BLOCKS_MINED, POW_DURATION};
use parking_lot::Mutex;
use serde::Serialize;
use shared_bus::{BrokerClient, BusError, PubSub};
use shared_types::{validate_parties, Block, ChainSnapshot, Transaction, TransactionError};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::container::NodeConfig;

/// Errors surfaced by node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Broadcast channel setup or delivery failed.
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// Ledger rejected the operation.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Transaction fields are unusable.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(#[from] TransactionError),

    /// The nonce search task died.
    #[error("Mining task failed: {0}")]
    MiningTask(String),
}

/// What `create_transaction` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// The broadcast transaction.
    pub transaction: Transaction,
    /// Index of the block the transaction is expected to land in.
    pub transaction_block: u64,
}

/// A running ledger node.
pub struct LedgerNode {
    id: String,
    ledger: SharedLedger,
    sync: Arc<ChainSync>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl LedgerNode {
    /// Build and start a node on top of a broker connection.
    pub async fn start(
        config: &NodeConfig,
        broker: Arc<dyn BrokerClient>,
    ) -> Result<Arc<Self>, NodeError> {
        let ledger = Ledger::shared();
        let pubsub = Arc::new(PubSub::new(broker, config.broker.pubsub_config()));
        pubsub.init().await?;

        let id: String = pubsub.queue_name().chars().take(8).collect();
        let sync = Arc::new(ChainSync::new(
            id.clone(),
            ledger.clone(),
            pubsub.clone(),
            config.sync.clone(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let consumer = pubsub.subscribe(sync.clone()).await?;
        let startup = sync.spawn_startup_sync();
        let tasks = vec![
            supervise(&id, "inbox", consumer, shutdown_rx.clone()),
            supervise(&id, "startup-sync", startup, shutdown_rx),
        ];

        info!(node = %id, queue = %pubsub.queue_name(), "Node started");
        Ok(Arc::new(Self {
            id,
            ledger,
            sync,
            shutdown_tx,
            tasks: Mutex::new(tasks),
        }))
    }

    /// Short node identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The node's ledger.
    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    /// The node's chain sync service.
    pub fn sync(&self) -> &Arc<ChainSync> {
        &self.sync
    }

    /// Create a transaction and broadcast it.
    ///
    /// The transaction reaches the pending pool of every node, this one
    /// included, through the broadcast channel.
    pub async fn create_transaction(
        &self,
        amount: u64,
        sender: &str,
        recipient: &str,
    ) -> Result<TransactionReceipt, NodeError> {
        validate_parties(sender, recipient)?;
        let (transaction, transaction_block) = {
            let ledger = self.ledger.lock();
            let transaction = ledger.create_new_transaction(amount, sender, recipient);
            (transaction, ledger.get_last_block()?.index + 1)
        };

        self.sync.broadcast_transaction(transaction.clone()).await;
        Ok(TransactionReceipt {
            transaction,
            transaction_block,
        })
    }

    /// Mine a block over the current pending pool and broadcast it.
    ///
    /// The nonce search runs on the blocking pool without the ledger lock, so
    /// gossip keeps flowing. If a peer's block lands first the result is
    /// [`LedgerError::StaleTip`].
    pub async fn mine_block(&self) -> Result<Block, NodeError> {
        let job = self.ledger.lock().prepare_mining_job()?;
        debug!(node = %self.id, index = job.block_data.index, "Mining started");

        let timer = POW_DURATION.start_timer();
        let (job, solution) = tokio::task::spawn_blocking(move || {
            let solution = pow::solve(&job.previous_hash, &job.payload);
            (job, solution)
        })
        .await
        .map_err(|e| NodeError::MiningTask(e.to_string()))?;
        timer.observe_duration();

        let block = {
            let mut ledger = self.ledger.lock();
            let block = ledger.commit_mined_block(job, solution.nonce, solution.hash)?;
            ledger_telemetry::record_ledger_size(
                &self.id,
                ledger.chain().len(),
                ledger.pending_transactions().len(),
            );
            block
        };
        BLOCKS_MINED.inc();
        info!(node = %self.id, index = block.index, nonce = block.nonce, "Block mined");

        self.sync.broadcast_block(block.clone()).await;
        Ok(block)
    }

    /// Snapshot of the chain and pending pool.
    pub fn get_chain(&self) -> ChainSnapshot {
        self.ledger.lock().snapshot()
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        info!(node = %self.id, "Initiating shutdown...");
        self.shutdown_tx.send_replace(true);
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }
        info!(node = %self.id, "Shutdown complete");
    }
}

/// Run `task` until it ends or the shutdown signal fires.
fn supervise(
    node: &str,
    name: &'static str,
    mut task: JoinHandle<()>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let node = node.to_string();
    tokio::spawn(async move {
        tokio::select! {
            _ = &mut task => {}
            _ = shutdown.changed() => {
                task.abort();
                debug!(%node, task = name, "Shutdown signal received");
            }
        }
    })
}
