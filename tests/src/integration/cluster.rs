//! Test fixtures for running several nodes in one process.

use std::sync::Arc;
use std::time::Duration;

use gl_02_chain_sync::SyncConfig;
use node_runtime::{LedgerNode, NodeConfig};
use shared_bus::InMemoryBroker;

/// Nodes sharing one broker.
pub struct Cluster {
    pub broker: InMemoryBroker,
    pub nodes: Vec<Arc<LedgerNode>>,
}

impl Cluster {
    /// Start `size` nodes with short sync delays.
    pub async fn start(size: usize) -> Self {
        let mut cluster = Self {
            broker: InMemoryBroker::new(),
            nodes: Vec::new(),
        };
        for _ in 0..size {
            cluster.join().await;
        }
        cluster
    }

    /// Start one more node against the same broker.
    pub async fn join(&mut self) -> Arc<LedgerNode> {
        let node = LedgerNode::start(&test_config(), Arc::new(self.broker.client()))
            .await
            .expect("node should start");
        self.nodes.push(node.clone());
        node
    }

    pub fn node(&self, i: usize) -> &Arc<LedgerNode> {
        &self.nodes[i]
    }

    /// Tip hash of every node.
    pub fn tips(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| {
                let snapshot = node.get_chain();
                snapshot.chain.last().map(|b| b.hash.clone()).unwrap_or_default()
            })
            .collect()
    }

    pub async fn shutdown(&self) {
        for node in &self.nodes {
            node.shutdown().await;
        }
    }
}

/// Node config with a fast startup sync and a bounded reply wait.
pub fn test_config() -> NodeConfig {
    NodeConfig {
        sync: SyncConfig::for_testing(),
        ..NodeConfig::default()
    }
}

/// Poll `check` until it holds, panicking after roughly five seconds.
pub async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}
