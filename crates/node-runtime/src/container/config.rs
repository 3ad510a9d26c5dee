//! # Node Configuration
//!
//! Unified configuration for a node process. Every value has a default and
//! can be overridden from a `GL_*` environment variable.

use std::env;
use std::fmt;
use std::str::FromStr;

use gl_02_chain_sync::SyncConfig;
use ledger_telemetry::TelemetryConfig;
use shared_bus::{PubSubConfig, DEFAULT_EXCHANGE_NAME};

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Broker connection.
    pub broker: BrokerConfig,
    /// Chain synchronization.
    pub sync: SyncConfig,
    /// HTTP API.
    pub api: ApiConfig,
    /// In-process cluster layout.
    pub cluster: ClusterConfig,
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
}

impl NodeConfig {
    /// Defaults overridden by environment variables.
    ///
    /// Nothing is logged here because the subscriber is usually not installed
    /// yet. Unparsable values keep their default and come back as
    /// [`ConfigWarning`]s for the caller to log once telemetry is up.
    ///
    /// # Environment Variables
    ///
    /// - `GL_BROKER_URL`: broker URL (default: `memory://localhost`)
    /// - `GL_EXCHANGE`: fan-out exchange (default: `bc.msg.exchange`)
    /// - `GL_SETTLE_DELAY_MS`: delay before the startup chain request
    /// - `GL_REPLY_TIMEOUT_MS`: chain reply timeout (unset waits forever)
    /// - `GL_HTTP_HOST`, `GL_HTTP_PORT`: API bind address of the first node
    /// - `GL_NODES`: number of nodes to run in this process
    /// - `GL_LOG_LEVEL`, `GL_JSON_LOGS`: see `TelemetryConfig::from_env`
    pub fn from_env() -> (Self, Vec<ConfigWarning>) {
        let (mut config, warnings) = Self::from_lookup(|name| env::var(name).ok());
        config.telemetry = TelemetryConfig::from_env();
        (config, warnings)
    }

    /// Defaults overridden by whatever `lookup` returns for each `GL_*` name.
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<ConfigWarning>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut warnings = Vec::new();

        if let Some(url) = lookup("GL_BROKER_URL") {
            config.broker.url = url;
        }
        if let Some(exchange) = lookup("GL_EXCHANGE") {
            config.broker.exchange = exchange;
        }
        if let Some(delay) = parse_var(&lookup, "GL_SETTLE_DELAY_MS", &mut warnings) {
            config.sync.settle_delay_ms = delay;
        }
        if let Some(timeout) = parse_var(&lookup, "GL_REPLY_TIMEOUT_MS", &mut warnings) {
            config.sync.reply_timeout_ms = Some(timeout);
        }
        if let Some(host) = lookup("GL_HTTP_HOST") {
            config.api.host = host;
        }
        if let Some(port) = parse_var(&lookup, "GL_HTTP_PORT", &mut warnings) {
            config.api.port = port;
        }
        if let Some(nodes) = parse_var(&lookup, "GL_NODES", &mut warnings) {
            config.cluster.nodes = nodes;
        }

        (config, warnings)
    }
}

/// An environment override that was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// Variable name.
    pub name: &'static str,
    /// Value that failed to parse.
    pub value: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignoring unparsable {}={:?}", self.name, self.value)
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str, warnings: &mut Vec<ConfigWarning>) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warnings.push(ConfigWarning { name, value: raw });
            None
        }
    }
}

/// Broker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Broker URL.
    pub url: String,
    /// Fan-out exchange shared by all nodes.
    pub exchange: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "memory://localhost".to_string(),
            exchange: DEFAULT_EXCHANGE_NAME.to_string(),
        }
    }
}

impl BrokerConfig {
    /// Settings for the node's `PubSub`.
    pub fn pubsub_config(&self) -> PubSubConfig {
        PubSubConfig {
            broker_url: self.url.clone(),
            exchange: self.exchange.clone(),
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Bind host.
    pub host: String,
    /// Port of the first node; node `i` listens on `port + i`.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ApiConfig {
    /// Bind address of the node at `offset` in the cluster.
    pub fn bind_addr(&self, offset: u16) -> String {
        format!("{}:{}", self.host, self.port.saturating_add(offset))
    }
}

/// In-process cluster configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Nodes sharing this process and its in-memory broker.
    pub nodes: u16,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { nodes: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.broker.exchange, "bc.msg.exchange");
        assert_eq!(config.cluster.nodes, 1);
        assert_eq!(config.sync.reply_timeout_ms, None);
        assert_eq!(config.api.bind_addr(0), "127.0.0.1:3000");
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let (config, warnings) = NodeConfig::from_lookup(|name| match name {
            "GL_EXCHANGE" => Some("ex".to_string()),
            "GL_HTTP_PORT" => Some("4100".to_string()),
            "GL_NODES" => Some("3".to_string()),
            "GL_REPLY_TIMEOUT_MS" => Some("250".to_string()),
            _ => None,
        });
        assert!(warnings.is_empty());
        assert_eq!(config.broker.exchange, "ex");
        assert_eq!(config.api.port, 4100);
        assert_eq!(config.cluster.nodes, 3);
        assert_eq!(config.sync.reply_timeout_ms, Some(250));
    }

    #[test]
    fn test_unparsable_values_are_reported_not_dropped() {
        let (config, warnings) = NodeConfig::from_lookup(|name| match name {
            "GL_HTTP_PORT" => Some("eighty".to_string()),
            "GL_NODES" => Some("-1".to_string()),
            _ => None,
        });
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.cluster.nodes, 1);
        assert_eq!(
            warnings,
            vec![
                ConfigWarning {
                    name: "GL_HTTP_PORT",
                    value: "eighty".to_string()
                },
                ConfigWarning {
                    name: "GL_NODES",
                    value: "-1".to_string()
                },
            ]
        );
        assert!(warnings[0].to_string().contains("GL_HTTP_PORT"));
    }

    #[test]
    fn test_bind_addr_offsets_port() {
        let api = ApiConfig {
            host: "0.0.0.0".into(),
            port: 4000,
        };
        assert_eq!(api.bind_addr(2), "0.0.0.0:4002");
    }

    #[test]
    fn test_pubsub_config_mirrors_broker() {
        let broker = BrokerConfig {
            url: "memory://x".into(),
            exchange: "ex".into(),
        };
        let pubsub = broker.pubsub_config();
        assert_eq!(pubsub.broker_url, "memory://x");
        assert_eq!(pubsub.exchange, "ex");
    }
}
