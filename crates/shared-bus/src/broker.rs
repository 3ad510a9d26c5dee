//! # Broker Client Contract
//!
//! The operations a node needs from a message broker. A fan-out exchange
//! copies every message to each queue bound to it; publishing to the default
//! exchange `""` delivers straight to the queue named by the routing key.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Name of the default (direct-to-queue) exchange.
pub const DEFAULT_EXCHANGE: &str = "";

/// Raw message bodies delivered to a consumer.
pub type DeliveryStream = mpsc::UnboundedReceiver<Vec<u8>>;

/// Result type alias for broker operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors from broker and pub/sub operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// The broker could not be reached.
    #[error("Connection to {url} failed: {reason}")]
    ConnectionFailed {
        /// Broker URL that was dialled.
        url: String,
        /// Why the connection was refused.
        reason: String,
    },

    /// An operation ran before `connect`/`create_channel`.
    #[error("No open channel")]
    ChannelClosed,

    /// The named exchange was never declared.
    #[error("Exchange not found: {0}")]
    ExchangeNotFound(String),

    /// The named queue does not exist.
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// The queue is exclusive to another connection or already has a consumer.
    #[error("Queue locked: {0}")]
    QueueLocked(String),

    /// The queue exists with different options.
    #[error("Queue {0} redeclared with different options")]
    PreconditionFailed(String),

    /// Event could not be encoded.
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Options for declaring a queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueOptions {
    /// Survive a broker restart.
    pub durable: bool,
    /// Usable only by the declaring connection; removed when it closes.
    pub exclusive: bool,
    /// Removed once its consumer goes away.
    pub auto_delete: bool,
    /// Per-message time-to-live in milliseconds.
    pub message_ttl: Option<u64>,
}

/// Options for consuming a queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumeOptions {
    /// Messages count as acknowledged as soon as they are delivered.
    pub no_ack: bool,
}

/// A connection to a message broker.
///
/// One client per node. `connect` and `create_channel` must succeed before
/// any other call.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Open the connection.
    async fn connect(&self, url: &str) -> Result<()>;

    /// Open the channel all later operations use.
    async fn create_channel(&self) -> Result<()>;

    /// Declare a fan-out exchange. Idempotent.
    async fn create_exchange(&self, name: &str) -> Result<()>;

    /// Declare a queue. Idempotent for identical options.
    async fn create_queue(&self, name: &str, options: QueueOptions) -> Result<()>;

    /// Bind a queue to an exchange.
    async fn bind_queue_with_exchange(&self, queue: &str, exchange: &str) -> Result<()>;

    /// Publish a message body.
    async fn publish(&self, exchange: &str, routing_key: &str, body: Vec<u8>) -> Result<()>;

    /// Start consuming a queue.
    async fn establish_worker(&self, queue: &str, options: ConsumeOptions) -> Result<DeliveryStream>;
}
