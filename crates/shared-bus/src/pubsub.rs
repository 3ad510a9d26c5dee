//! # PubSub
//!
//! Wraps a [`BrokerClient`] into the node's broadcast channel: one shared
//! fan-out exchange, one exclusive inbox queue per node, a TTL-bounded log
//! queue, and throwaway reply queues for point-to-point answers.
//!
//! `subscribe` may be called before `init` finishes; it waits on a readiness
//! signal instead of polling.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::broker::{
    BrokerClient, ConsumeOptions, DeliveryStream, QueueOptions, Result, DEFAULT_EXCHANGE,
};
use crate::events::LedgerEvent;

/// Exchange shared by every node of a deployment.
pub const DEFAULT_EXCHANGE_NAME: &str = "bc.msg.exchange";

/// Suffix of the audit queue that keeps a copy of every broadcast.
pub const LOG_QUEUE_SUFFIX: &str = "-logs";

/// Per-message TTL of the log queue, in milliseconds.
pub const LOG_QUEUE_TTL_MS: u64 = 86_400;

/// Consumer of decoded broadcast events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event. Called sequentially, in delivery order.
    async fn handle(&self, event: LedgerEvent);
}

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubConfig {
    /// Broker URL passed to `connect`.
    pub broker_url: String,
    /// Fan-out exchange name.
    pub exchange: String,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            broker_url: "memory://localhost".to_string(),
            exchange: DEFAULT_EXCHANGE_NAME.to_string(),
        }
    }
}

/// An ephemeral, auto-deleting queue receiving point-to-point replies.
///
/// Dropping it ends the consumer, after which the broker removes the queue.
pub struct ReplyQueue {
    name: String,
    deliveries: DeliveryStream,
}

impl ReplyQueue {
    /// Queue name to hand to peers as `replyTo`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next decodable event; `None` once the queue is closed.
    pub async fn next_event(&mut self) -> Option<LedgerEvent> {
        while let Some(body) = self.deliveries.recv().await {
            match LedgerEvent::decode(&body) {
                Ok(event) => return Some(event),
                Err(e) => debug!(queue = %self.name, error = %e, "Ignoring undecodable reply"),
            }
        }
        None
    }
}

/// A node's handle on the broadcast channel.
pub struct PubSub {
    broker: Arc<dyn BrokerClient>,
    config: PubSubConfig,
    queue: String,
    ready_tx: watch::Sender<bool>,
}

impl PubSub {
    /// Create an uninitialized channel with a fresh inbox queue name.
    pub fn new(broker: Arc<dyn BrokerClient>, config: PubSubConfig) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            broker,
            config,
            queue: Uuid::new_v4().to_string(),
            ready_tx,
        }
    }

    /// This node's inbox queue.
    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    /// The shared fan-out exchange.
    pub fn exchange(&self) -> &str {
        &self.config.exchange
    }

    /// Name of the exchange's log queue.
    pub fn log_queue_name(&self) -> String {
        format!("{}{}", self.config.exchange, LOG_QUEUE_SUFFIX)
    }

    /// Whether `init` has completed.
    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    /// Declare the exchange and queues, then signal readiness.
    ///
    /// Any failure leaves the channel unready and is returned to the caller.
    pub async fn init(&self) -> Result<()> {
        let broker = &self.broker;
        let exchange = self.exchange();

        broker.connect(&self.config.broker_url).await?;
        broker.create_channel().await?;
        broker.create_exchange(exchange).await?;

        broker
            .create_queue(
                &self.queue,
                QueueOptions {
                    durable: true,
                    exclusive: true,
                    ..Default::default()
                },
            )
            .await?;
        info!(queue = %self.queue, "[*] Queue created");

        broker.bind_queue_with_exchange(&self.queue, exchange).await?;
        info!(queue = %self.queue, %exchange, "[*] Queue bound to exchange");

        let log_queue = self.log_queue_name();
        broker
            .create_queue(
                &log_queue,
                QueueOptions {
                    durable: true,
                    message_ttl: Some(LOG_QUEUE_TTL_MS),
                    ..Default::default()
                },
            )
            .await?;
        broker.bind_queue_with_exchange(&log_queue, exchange).await?;

        self.ready_tx.send_replace(true);
        Ok(())
    }

    /// Wait until `init` has completed.
    pub async fn wait_ready(&self) {
        let mut ready = self.ready_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    /// Broadcast an event to every node, this one included.
    pub async fn publish(&self, event: &LedgerEvent) -> Result<()> {
        let body = event.encode()?;
        self.broker.publish(self.exchange(), "", body).await?;
        debug!(event = event.name(), "Event published");
        Ok(())
    }

    /// Consume the inbox and feed decoded events to `handler`.
    ///
    /// Waits for readiness first. Events are handled one at a time; bodies
    /// that fail to decode are logged and skipped. The returned task ends when
    /// the broker closes the stream or the handle is aborted.
    pub async fn subscribe(&self, handler: Arc<dyn EventHandler>) -> Result<JoinHandle<()>> {
        self.wait_ready().await;
        let mut deliveries = self
            .broker
            .establish_worker(&self.queue, ConsumeOptions { no_ack: true })
            .await?;
        let queue = self.queue.clone();

        Ok(tokio::spawn(async move {
            while let Some(body) = deliveries.recv().await {
                match LedgerEvent::decode(&body) {
                    Ok(event) => handler.handle(event).await,
                    Err(e) => debug!(%queue, error = %e, "Ignoring undecodable message"),
                }
            }
            debug!(%queue, "Inbox closed");
        }))
    }

    /// Declare a fresh auto-deleting reply queue and start consuming it.
    pub async fn create_reply_queue(&self) -> Result<ReplyQueue> {
        self.wait_ready().await;
        let name = Uuid::new_v4().to_string();
        self.broker
            .create_queue(
                &name,
                QueueOptions {
                    exclusive: true,
                    auto_delete: true,
                    ..Default::default()
                },
            )
            .await?;
        let deliveries = self
            .broker
            .establish_worker(&name, ConsumeOptions { no_ack: true })
            .await?;
        Ok(ReplyQueue { name, deliveries })
    }

    /// Send an event straight to one queue through the default exchange.
    pub async fn reply(&self, reply_to: &str, event: &LedgerEvent) -> Result<()> {
        let body = event.encode()?;
        self.broker.publish(DEFAULT_EXCHANGE, reply_to, body).await?;
        debug!(event = event.name(), %reply_to, "Reply sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BusError;
    use crate::memory::InMemoryBroker;
    use parking_lot::Mutex;
    use shared_types::Transaction;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Forward(mpsc::UnboundedSender<LedgerEvent>);

    #[async_trait]
    impl EventHandler for Forward {
        async fn handle(&self, event: LedgerEvent) {
            let _ = self.0.send(event);
        }
    }

    fn pubsub(broker: &InMemoryBroker) -> PubSub {
        PubSub::new(Arc::new(broker.client()), PubSubConfig::default())
    }

    #[tokio::test]
    async fn test_init_declares_topology() {
        let broker = InMemoryBroker::new();
        let channel = pubsub(&broker);
        assert!(!channel.is_ready());

        channel.init().await.unwrap();

        assert!(channel.is_ready());
        assert!(broker.has_exchange(DEFAULT_EXCHANGE_NAME));
        assert!(broker.has_queue(channel.queue_name()));
        assert!(broker.has_queue("bc.msg.exchange-logs"));
        let bound = broker.bindings(DEFAULT_EXCHANGE_NAME);
        assert!(bound.contains(&channel.queue_name().to_string()));
        assert!(bound.contains(&channel.log_queue_name()));
    }

    #[tokio::test]
    async fn test_init_fails_on_unreachable_broker() {
        let broker = InMemoryBroker::unreachable();
        let channel = pubsub(&broker);
        let err = channel.init().await.unwrap_err();
        assert!(matches!(err, BusError::ConnectionFailed { .. }));
        assert!(!channel.is_ready());
    }

    #[tokio::test]
    async fn test_subscribe_before_init_waits_for_readiness() {
        let broker = InMemoryBroker::new();
        let channel = Arc::new(pubsub(&broker));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let subscriber = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.subscribe(Arc::new(Forward(tx))).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!subscriber.is_finished());

        channel.init().await.unwrap();
        let _consumer = subscriber.await.unwrap().unwrap();

        let tx_event = LedgerEvent::TransactionCreated(Transaction::new(1, "A", "B"));
        channel.publish(&tx_event).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), tx_event);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_nodes_in_order() {
        let broker = InMemoryBroker::new();
        let first = pubsub(&broker);
        let second = pubsub(&broker);
        first.init().await.unwrap();
        second.init().await.unwrap();

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let _h1 = first.subscribe(Arc::new(Forward(tx1))).await.unwrap();
        let _h2 = second.subscribe(Arc::new(Forward(tx2))).await.unwrap();

        let events: Vec<LedgerEvent> = (0..3)
            .map(|i| LedgerEvent::TransactionCreated(Transaction::new(i, "A", "B")))
            .collect();
        for event in &events {
            first.publish(event).await.unwrap();
        }

        for event in &events {
            assert_eq!(&rx1.recv().await.unwrap(), event);
            assert_eq!(&rx2.recv().await.unwrap(), event);
        }
    }

    #[tokio::test]
    async fn test_undecodable_messages_are_skipped() {
        let broker = InMemoryBroker::new();
        let channel = pubsub(&broker);
        channel.init().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _h = channel.subscribe(Arc::new(Forward(tx))).await.unwrap();

        let raw = broker.client();
        raw.connect("memory://raw").await.unwrap();
        raw.create_channel().await.unwrap();
        raw.publish(DEFAULT_EXCHANGE_NAME, "", b"garbage".to_vec())
            .await
            .unwrap();
        raw.publish(DEFAULT_EXCHANGE_NAME, "", br#"{"Event":"NOPE","Data":1}"#.to_vec())
            .await
            .unwrap();

        let good = LedgerEvent::ChainRequested {
            reply_to: "x".into(),
        };
        channel.publish(&good).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), good);
    }

    #[tokio::test]
    async fn test_reply_queue_round_trip() {
        let broker = InMemoryBroker::new();
        let requester = pubsub(&broker);
        let responder = pubsub(&broker);
        requester.init().await.unwrap();
        responder.init().await.unwrap();

        let mut replies = requester.create_reply_queue().await.unwrap();
        assert!(broker.has_queue(replies.name()));
        assert!(!broker.bindings(DEFAULT_EXCHANGE_NAME).contains(&replies.name().to_string()));

        let answer = LedgerEvent::ChainPublished {
            chain: vec![],
            pending_pool: vec![],
        };
        responder.reply(replies.name(), &answer).await.unwrap();
        assert_eq!(replies.next_event().await.unwrap(), answer);

        let name = replies.name().to_string();
        drop(replies);
        assert!(!broker.has_queue(&name));
    }

    #[tokio::test]
    async fn test_handler_sees_events_sequentially() {
        struct Slow(Arc<Mutex<Vec<u64>>>);

        #[async_trait]
        impl EventHandler for Slow {
            async fn handle(&self, event: LedgerEvent) {
                if let LedgerEvent::TransactionCreated(tx) = event {
                    tokio::time::sleep(Duration::from_millis(5 * (3 - tx.amount))).await;
                    self.0.lock().push(tx.amount);
                }
            }
        }

        let broker = InMemoryBroker::new();
        let channel = pubsub(&broker);
        channel.init().await.unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _h = channel.subscribe(Arc::new(Slow(seen.clone()))).await.unwrap();

        for amount in 0..3 {
            channel
                .publish(&LedgerEvent::TransactionCreated(Transaction::new(amount, "A", "B")))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }
}
