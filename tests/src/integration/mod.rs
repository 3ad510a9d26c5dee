//! Cross-node flows. Every node in a test talks to the others only through
//! the broker.

pub mod cluster;

mod chain_sync_flows;
mod gossip_flows;
