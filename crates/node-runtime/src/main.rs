//! # Gossip-Ledger Node Runtime
//!
//! Runs `GL_NODES` ledger nodes in one process. All nodes share one
//! in-memory broker and each serves its own HTTP API on consecutive ports
//! starting at `GL_HTTP_PORT`.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize logging and metrics, then report ignored overrides
//! 3. Start each node (broadcast channel, inbox, startup sync)
//! 4. Serve each node's API
//! 5. Wait for Ctrl+C, then shut everything down

use std::sync::Arc;

use anyhow::{Context, Result};
use shared_bus::InMemoryBroker;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use node_runtime::{api, LedgerNode, NodeConfig};

/// The running process: nodes plus their HTTP servers.
struct NodeRuntime {
    config: NodeConfig,
    broker: InMemoryBroker,
    nodes: Vec<Arc<LedgerNode>>,
    servers: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    fn new(config: NodeConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            broker: InMemoryBroker::new(),
            nodes: Vec::new(),
            servers: Vec::new(),
            shutdown_tx,
        }
    }

    async fn start(&mut self) -> Result<()> {
        for offset in 0..self.config.cluster.nodes {
            let node = LedgerNode::start(&self.config, Arc::new(self.broker.client()))
                .await
                .with_context(|| format!("failed to start node {offset}"))?;

            let addr = self.config.api.bind_addr(offset);
            let mut shutdown_rx = self.shutdown_tx.subscribe();
            let server_node = node.clone();
            self.servers.push(tokio::spawn(async move {
                let signal = async move {
                    let _ = shutdown_rx.changed().await;
                };
                if let Err(e) = api::serve(server_node, addr.clone(), signal).await {
                    error!(%addr, error = %e, "HTTP server stopped");
                }
            }));
            self.nodes.push(node);
        }

        info!(nodes = self.nodes.len(), "All nodes started");
        Ok(())
    }

    async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        self.shutdown_tx.send_replace(true);
        for server in self.servers {
            let _ = server.await;
        }
        for node in &self.nodes {
            node.shutdown().await;
        }
        info!("Shutdown complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, warnings) = NodeConfig::from_env();
    ledger_telemetry::init_telemetry(&config.telemetry)
        .context("failed to initialize telemetry")?;
    for warning in &warnings {
        warn!(variable = warning.name, value = %warning.value, "Ignoring unparsable environment variable");
    }

    let mut runtime = NodeRuntime::new(config);
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
