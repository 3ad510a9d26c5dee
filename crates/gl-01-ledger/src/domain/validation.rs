//! Structural chain validation
//!
//! A chain is valid when it starts at the fixed genesis block and every later
//! block carries the index of its position, links to its parent, hashes to
//! its stored digest and satisfies proof-of-work.

use shared_types::{Block, BlockData};

use super::genesis::is_genesis;
use super::hashing::{hash_block, meets_difficulty};
use crate::error::ChainValidationError;

/// Validate a full chain.
pub fn is_chain_valid(chain: &[Block]) -> Result<(), ChainValidationError> {
    let genesis = chain.first().ok_or(ChainValidationError::Empty)?;
    if !is_genesis(genesis) {
        return Err(ChainValidationError::GenesisMismatch);
    }

    for (position, pair) in chain.windows(2).enumerate() {
        let (parent, block) = (&pair[0], &pair[1]);
        let position = position + 1;

        if block.previous_block_hash != parent.hash {
            return Err(ChainValidationError::BrokenLink { position });
        }

        let expected_index = position as u64 + 1;
        if block.index != expected_index {
            return Err(ChainValidationError::IndexMismatch {
                position,
                stored: block.index,
            });
        }

        let data = BlockData::new(expected_index, block.transactions.clone());
        let recomputed = hash_block(&parent.hash, &data, block.nonce)
            .map_err(|_| ChainValidationError::Unencodable { position })?;
        if recomputed != block.hash {
            return Err(ChainValidationError::HashMismatch { position });
        }

        if !meets_difficulty(&block.hash) {
            return Err(ChainValidationError::InsufficientWork { position });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::genesis::genesis_block;
    use crate::domain::ledger::Ledger;
    use shared_types::Transaction;

    fn mined_chain(blocks: usize) -> Vec<Block> {
        let mut ledger = Ledger::new();
        for i in 0..blocks {
            ledger
                .add_transaction_to_pending_transactions(Transaction::new(i as u64, "A", "B"))
                .unwrap();
            ledger.mine_block().unwrap();
        }
        ledger.chain().to_vec()
    }

    #[test]
    fn test_genesis_only_chain_is_valid() {
        assert_eq!(is_chain_valid(&[genesis_block()]), Ok(()));
    }

    #[test]
    fn test_mined_chain_is_valid() {
        assert_eq!(is_chain_valid(&mined_chain(3)), Ok(()));
    }

    #[test]
    fn test_empty_chain_is_invalid() {
        assert_eq!(is_chain_valid(&[]), Err(ChainValidationError::Empty));
    }

    #[test]
    fn test_foreign_genesis_is_invalid() {
        let mut chain = mined_chain(1);
        chain[0].timestamp = 1;
        assert_eq!(is_chain_valid(&chain), Err(ChainValidationError::GenesisMismatch));
    }

    #[test]
    fn test_broken_link_is_detected() {
        let mut chain = mined_chain(2);
        chain[2].previous_block_hash = "elsewhere".to_string();
        assert_eq!(
            is_chain_valid(&chain),
            Err(ChainValidationError::BrokenLink { position: 2 })
        );
    }

    #[test]
    fn test_stored_index_must_follow_position() {
        let mut chain = mined_chain(1);
        chain[1].index = 99;
        assert_eq!(
            is_chain_valid(&chain),
            Err(ChainValidationError::IndexMismatch {
                position: 1,
                stored: 99
            })
        );
    }

    #[test]
    fn test_index_gap_later_in_chain_is_detected() {
        let mut chain = mined_chain(3);
        chain[3].index = 3;
        assert!(matches!(
            is_chain_valid(&chain),
            Err(ChainValidationError::IndexMismatch { position: 3, .. })
        ));
    }

    #[test]
    fn test_tampered_transactions_are_detected() {
        let mut chain = mined_chain(2);
        chain[1].transactions[0].amount = 1_000_000;
        assert_eq!(
            is_chain_valid(&chain),
            Err(ChainValidationError::HashMismatch { position: 1 })
        );
    }

    #[test]
    fn test_forged_hash_without_work_is_detected() {
        let mut chain = vec![genesis_block()];
        let data = BlockData::new(2, vec![]);
        // Any nonce whose digest misses the prefix.
        let nonce = (0u64..)
            .find(|n| !meets_difficulty(&hash_block(&chain[0].hash, &data, *n).unwrap()))
            .unwrap();
        chain.push(Block {
            index: 2,
            timestamp: 1,
            transactions: vec![],
            nonce,
            hash: hash_block(&chain[0].hash, &data, nonce).unwrap(),
            previous_block_hash: chain[0].hash.clone(),
        });
        assert_eq!(
            is_chain_valid(&chain),
            Err(ChainValidationError::InsufficientWork { position: 1 })
        );
    }
}
