//! Node configuration container.

pub mod config;

pub use config::{ApiConfig, BrokerConfig, ClusterConfig, ConfigWarning, NodeConfig};
