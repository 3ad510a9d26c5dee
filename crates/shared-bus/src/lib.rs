//! # Shared Bus - Broadcast Channel Between Ledger Nodes
//!
//! Nodes never touch each other's state; they only exchange [`LedgerEvent`]s
//! over a message broker.
//!
//! ```text
//! ┌──────────┐  publish()   ┌──────────────────┐   inbox   ┌──────────┐
//! │  Node A  │ ───────────▶ │ bc.msg.exchange  │ ────────▶ │  Node B  │
//! │          │ ◀─────────── │    (fan-out)     │ ────────▶ │          │
//! └──────────┘    inbox     └──────────────────┘  -logs    └──────────┘
//!       ▲                                                       │
//!       └───────────── reply(replyTo) via default exchange ─────┘
//! ```
//!
//! - [`broker`]: the [`BrokerClient`] contract
//! - [`memory`]: [`InMemoryBroker`], a process-local broker
//! - [`pubsub`]: [`PubSub`], the per-node wrapper with a readiness gate
//! - [`events`]: the [`LedgerEvent`] wire format

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broker;
pub mod events;
pub mod memory;
pub mod pubsub;

// Re-export main types
pub use broker::{
    BrokerClient, BusError, ConsumeOptions, DeliveryStream, QueueOptions, DEFAULT_EXCHANGE,
};
pub use events::LedgerEvent;
pub use memory::{InMemoryBroker, InMemoryBrokerClient, MEMORY_SCHEME};
pub use pubsub::{
    EventHandler, PubSub, PubSubConfig, ReplyQueue, DEFAULT_EXCHANGE_NAME, LOG_QUEUE_SUFFIX,
    LOG_QUEUE_TTL_MS,
};
