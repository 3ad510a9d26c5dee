//! # Gossip Flows
//!
//! Transactions and mined blocks reach every node through the fan-out
//! exchange, the originator included.

#[cfg(test)]
mod tests {
    use super::super::cluster::{eventually, Cluster};
    use gl_01_ledger::{is_chain_valid, pow, LedgerError};
    use node_runtime::NodeError;
    use shared_types::Transaction;

    #[tokio::test]
    async fn test_end_to_end_transaction_then_mine() {
        let cluster = Cluster::start(1).await;
        let node = cluster.node(0);

        let receipt = node.create_transaction(10, "A", "B").await.unwrap();
        assert_eq!(receipt.transaction_block, 2);

        eventually("transaction pooled", || {
            node.get_chain().pending_transactions == vec![receipt.transaction.clone()]
        })
        .await;

        let before = node.get_chain().chain_length();
        let block = node.mine_block().await.unwrap();

        assert_eq!(block.transactions, vec![receipt.transaction.clone()]);
        let snapshot = node.get_chain();
        assert!(snapshot.pending_transactions.is_empty());
        assert_eq!(snapshot.chain_length(), before + 1);
        assert!(is_chain_valid(&snapshot.chain).is_ok());

        cluster.shutdown().await;
    }

    #[tokio::test]
    async fn test_transaction_reaches_all_pools() {
        let cluster = Cluster::start(3).await;

        let receipt = cluster
            .node(1)
            .create_transaction(25, "alice", "bob")
            .await
            .unwrap();

        for node in &cluster.nodes {
            eventually("transaction on every node", || {
                node.get_chain().pending_transactions.contains(&receipt.transaction)
            })
            .await;
        }

        cluster.shutdown().await;
    }

    #[tokio::test]
    async fn test_mined_block_appears_on_all_nodes() {
        let cluster = Cluster::start(3).await;
        let receipt = cluster.node(0).create_transaction(5, "A", "B").await.unwrap();
        for node in &cluster.nodes {
            eventually("transaction pooled", || {
                node.get_chain().pending_transactions.len() == 1
            })
            .await;
        }

        let block = cluster.node(0).mine_block().await.unwrap();

        for node in &cluster.nodes {
            eventually("block adopted", || node.get_chain().chain_length() == 2).await;
            let snapshot = node.get_chain();
            assert_eq!(snapshot.chain[1], block);
            assert!(snapshot.pending_transactions.is_empty());
        }
        assert_eq!(block.transactions, vec![receipt.transaction]);

        cluster.shutdown().await;
    }

    #[tokio::test]
    async fn test_competing_block_loses_to_gossiped_block() {
        let cluster = Cluster::start(2).await;
        let (a, b) = (cluster.node(0).clone(), cluster.node(1).clone());

        // Each miner seals a different pool on the same tip.
        let tx_a = Transaction::new(1, "alice", "bob");
        let tx_b = Transaction::new(2, "carol", "dave");
        a.ledger()
            .lock()
            .add_transaction_to_pending_transactions(tx_a.clone())
            .unwrap();
        b.ledger()
            .lock()
            .add_transaction_to_pending_transactions(tx_b.clone())
            .unwrap();

        let job_b = b.ledger().lock().prepare_mining_job().unwrap();
        let solution_b = pow::solve(&job_b.previous_hash, &job_b.payload);

        let winner = a.mine_block().await.unwrap();
        assert_eq!(winner.transactions, vec![tx_a]);
        assert_ne!(winner.hash, solution_b.hash);

        eventually("peer accepts the winning block", || {
            b.get_chain().chain_length() == 2
        })
        .await;

        let err = b
            .ledger()
            .lock()
            .commit_mined_block(job_b, solution_b.nonce, solution_b.hash)
            .unwrap_err();
        assert!(matches!(err, LedgerError::StaleTip { .. }));

        let (chain_a, chain_b) = (a.get_chain(), b.get_chain());
        assert_eq!(chain_a.chain, chain_b.chain);
        assert_eq!(chain_b.chain[1], winner);
        assert!(chain_b.pending_transactions.is_empty());

        // The loser keeps mining on top of the winner.
        let next = b.mine_block().await.unwrap();
        assert_eq!(next.previous_block_hash, winner.hash);
        eventually("both nodes at height 3", || {
            a.get_chain().chain_length() == 3
        })
        .await;
        assert_eq!(a.get_chain().chain, b.get_chain().chain);
        assert!(is_chain_valid(&a.get_chain().chain).is_ok());

        cluster.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_mining_keeps_every_chain_valid() {
        let cluster = Cluster::start(2).await;
        let (a, b) = (cluster.node(0).clone(), cluster.node(1).clone());
        b.ledger()
            .lock()
            .add_transaction_to_pending_transactions(Transaction::new(7, "X", "Y"))
            .unwrap();

        let (first, second) = tokio::join!(a.mine_block(), b.mine_block());
        for result in [&first, &second] {
            if let Err(e) = result {
                assert!(matches!(e, NodeError::Ledger(LedgerError::StaleTip { .. })));
            }
        }
        assert!(first.is_ok() || second.is_ok());

        for node in [&a, &b] {
            let snapshot = node.get_chain();
            assert_eq!(snapshot.chain_length(), 2);
            assert!(is_chain_valid(&snapshot.chain).is_ok());
        }

        cluster.shutdown().await;
    }
}
