//! # Chain Sync Flows
//!
//! A node that starts late asks its peers for their chain and adopts the
//! longest valid one.

#[cfg(test)]
mod tests {
    use super::super::cluster::{eventually, Cluster};
    use gl_02_chain_sync::{SyncOutcome, UnchangedReason};

    #[tokio::test]
    async fn test_late_joiner_adopts_longer_chain() {
        let mut cluster = Cluster::start(1).await;
        let veteran = cluster.node(0).clone();
        veteran.mine_block().await.unwrap();
        veteran.mine_block().await.unwrap();

        let newcomer = cluster.join().await;

        eventually("newcomer caught up", || {
            newcomer.get_chain().chain_length() == 3
        })
        .await;
        assert_eq!(newcomer.get_chain().chain, veteran.get_chain().chain);

        cluster.shutdown().await;
    }

    #[tokio::test]
    async fn test_late_joiner_then_extends_shared_chain() {
        let mut cluster = Cluster::start(1).await;
        cluster.node(0).mine_block().await.unwrap();

        let newcomer = cluster.join().await;
        eventually("newcomer caught up", || {
            newcomer.get_chain().chain_length() == 2
        })
        .await;

        newcomer.mine_block().await.unwrap();
        let veteran = cluster.node(0).clone();
        eventually("veteran adopts newcomer block", || {
            veteran.get_chain().chain_length() == 3
        })
        .await;

        let tips = cluster.tips();
        assert_eq!(tips[0], tips[1]);

        cluster.shutdown().await;
    }

    #[tokio::test]
    async fn test_explicit_request_with_equal_chains_is_unchanged() {
        let cluster = Cluster::start(2).await;

        let outcome = cluster.node(1).sync().request_chain().await.unwrap();
        assert_eq!(outcome, SyncOutcome::Unchanged(UnchangedReason::NotLonger));

        cluster.shutdown().await;
    }
}
