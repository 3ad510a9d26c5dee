//! The ledger aggregate: chain plus pending pool.
//!
//! All mutation of the chain and pool goes through [`Ledger`]. Callers that
//! share a ledger across tasks wrap it in [`SharedLedger`] and never hold the
//! lock across an `.await` or during a nonce search.

use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{Block, BlockData, ChainSnapshot, Transaction};

use super::genesis::genesis_block;
use super::hashing::encode_block_data;
use super::pow;
use crate::error::{LedgerError, Result};

/// Ledger shared between the event consumer, the API and the miner.
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Snapshot of everything a nonce search needs, taken under the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningJob {
    /// Hash of the tip the block will extend
    pub previous_hash: String,
    /// Payload being sealed
    pub block_data: BlockData,
    /// Canonical JSON of `block_data`
    pub payload: String,
}

/// A node's chain and pending pool.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending_transactions: Vec<Transaction>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create a ledger seeded with the genesis block.
    pub fn new() -> Self {
        Self {
            chain: vec![genesis_block()],
            pending_transactions: Vec::new(),
        }
    }

    /// Wrap a fresh ledger for sharing.
    pub fn shared() -> SharedLedger {
        Arc::new(Mutex::new(Self::new()))
    }

    /// The chain, genesis first.
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// The pending pool in arrival order.
    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    /// Owned copy of chain and pool.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            chain: self.chain.clone(),
            pending_transactions: self.pending_transactions.clone(),
        }
    }

    /// The chain tip.
    pub fn get_last_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    /// Build a block from the whole pending pool, append it and empty the pool.
    pub fn create_new_block(
        &mut self,
        nonce: u64,
        previous_block_hash: impl Into<String>,
        hash: impl Into<String>,
    ) -> Block {
        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp: chrono::Utc::now().timestamp_millis(),
            transactions: std::mem::take(&mut self.pending_transactions),
            nonce,
            hash: hash.into(),
            previous_block_hash: previous_block_hash.into(),
        };
        self.chain.push(block.clone());
        block
    }

    /// Create a transaction with a fresh id. The pool is left untouched.
    pub fn create_new_transaction(
        &self,
        amount: u64,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Transaction {
        Transaction::new(amount, sender, recipient)
    }

    /// Append a transaction to the pool.
    ///
    /// Returns the index of the block the transaction is expected to land in.
    /// Duplicates are not filtered.
    pub fn add_transaction_to_pending_transactions(&mut self, transaction: Transaction) -> Result<u64> {
        let next_index = self.get_last_block()?.index + 1;
        self.pending_transactions.push(transaction);
        Ok(next_index)
    }

    /// Accept a block mined elsewhere if it extends the tip.
    ///
    /// On success the block is appended and the pool cleared. A block that
    /// does not extend the tip is dropped and `false` is returned.
    pub fn add_mined_block_to_chain(&mut self, candidate: Block) -> bool {
        let extends_tip = match self.chain.last() {
            Some(tip) => candidate.extends(tip),
            None => false,
        };
        if !extends_tip {
            tracing::debug!(
                index = candidate.index,
                hash = %candidate.hash,
                "Discarding block that does not extend the tip"
            );
            return false;
        }
        self.chain.push(candidate);
        self.pending_transactions.clear();
        true
    }

    /// Snapshot the tip and pool for a nonce search.
    pub fn prepare_mining_job(&self) -> Result<MiningJob> {
        let last = self.get_last_block()?;
        let block_data = BlockData::new(last.index + 1, self.pending_transactions.clone());
        let payload = encode_block_data(&block_data)?;
        Ok(MiningJob {
            previous_hash: last.hash.clone(),
            block_data,
            payload,
        })
    }

    /// Append the block sealed by a finished nonce search.
    ///
    /// Fails with [`LedgerError::StaleTip`] if another block was appended while
    /// the search ran. On success the pool is emptied, exactly as peers do
    /// when they accept the same block.
    pub fn commit_mined_block(&mut self, job: MiningJob, nonce: u64, hash: String) -> Result<Block> {
        let tip = self.get_last_block()?;
        if tip.hash != job.previous_hash {
            return Err(LedgerError::StaleTip {
                expected: job.previous_hash,
                actual: tip.hash.clone(),
            });
        }

        self.pending_transactions.clear();

        let block = Block {
            index: job.block_data.index,
            timestamp: chrono::Utc::now().timestamp_millis(),
            transactions: job.block_data.transactions,
            nonce,
            hash,
            previous_block_hash: job.previous_hash,
        };
        self.chain.push(block.clone());
        Ok(block)
    }

    /// Mine a block in place, holding `&mut self` for the whole search.
    ///
    /// For single-threaded use; shared ledgers go through
    /// [`prepare_mining_job`](Self::prepare_mining_job) and
    /// [`commit_mined_block`](Self::commit_mined_block).
    pub fn mine_block(&mut self) -> Result<Block> {
        let job = self.prepare_mining_job()?;
        let solution = pow::solve(&job.previous_hash, &job.payload);
        self.commit_mined_block(job, solution.nonce, solution.hash)
    }

    /// Replace chain and pool wholesale (adopting a peer's longer chain).
    pub fn replace_chain(&mut self, chain: Vec<Block>, pending_transactions: Vec<Transaction>) {
        self.chain = chain;
        self.pending_transactions = pending_transactions;
    }

    /// Replace only the pool.
    pub fn replace_pending_transactions(&mut self, pending_transactions: Vec<Transaction>) {
        self.pending_transactions = pending_transactions;
    }
}
