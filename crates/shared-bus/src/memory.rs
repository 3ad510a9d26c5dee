//! # In-Memory Broker
//!
//! A process-local broker implementing [`BrokerClient`]. One
//! [`InMemoryBroker`] plays the server; every node opens its own
//! [`InMemoryBrokerClient`] on it, so exclusive queues and per-connection
//! cleanup behave the way they do on a networked broker.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::broker::{
    BrokerClient, BusError, ConsumeOptions, DeliveryStream, QueueOptions, Result, DEFAULT_EXCHANGE,
};

/// URL scheme accepted by [`InMemoryBrokerClient::connect`].
pub const MEMORY_SCHEME: &str = "memory://";

struct QueueState {
    options: QueueOptions,
    owner: Option<u64>,
    backlog: VecDeque<(Instant, Vec<u8>)>,
    consumer: Option<mpsc::UnboundedSender<Vec<u8>>>,
    had_consumer: bool,
}

impl QueueState {
    fn new(options: QueueOptions, owner: Option<u64>) -> Self {
        Self {
            options,
            owner,
            backlog: VecDeque::new(),
            consumer: None,
            had_consumer: false,
        }
    }

    fn has_live_consumer(&self) -> bool {
        self.consumer.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn abandoned(&self) -> bool {
        self.options.auto_delete && self.had_consumer && !self.has_live_consumer()
    }

    fn locked_for(&self, client: u64) -> bool {
        self.owner.is_some_and(|owner| owner != client)
    }

    fn prune_expired(&mut self, now: Instant) {
        if let Some(ttl) = self.options.message_ttl {
            let ttl = Duration::from_millis(ttl);
            while self
                .backlog
                .front()
                .is_some_and(|(at, _)| now.duration_since(*at) >= ttl)
            {
                self.backlog.pop_front();
            }
        }
    }

    fn deliver(&mut self, body: Vec<u8>, now: Instant) {
        let body = match self.consumer.take() {
            Some(tx) => match tx.send(body) {
                Ok(()) => {
                    self.consumer = Some(tx);
                    return;
                }
                Err(mpsc::error::SendError(body)) => body,
            },
            None => body,
        };
        self.prune_expired(now);
        self.backlog.push_back((now, body));
    }
}

struct BrokerState {
    reachable: bool,
    exchanges: HashMap<String, BTreeSet<String>>,
    queues: HashMap<String, QueueState>,
}

impl BrokerState {
    fn remove_queues<F>(&mut self, doomed: F)
    where
        F: Fn(&QueueState) -> bool,
    {
        let names: Vec<String> = self
            .queues
            .iter()
            .filter(|(_, queue)| doomed(queue))
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            self.queues.remove(&name);
            for bound in self.exchanges.values_mut() {
                bound.remove(&name);
            }
            debug!(queue = %name, "Queue deleted");
        }
    }

    /// Drop auto-delete queues whose consumer has gone away.
    fn sweep(&mut self) {
        self.remove_queues(QueueState::abandoned);
    }
}

/// Process-local message broker shared by every node in a cluster.
#[derive(Clone)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
    next_client: Arc<AtomicU64>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    /// Create an empty, reachable broker.
    pub fn new() -> Self {
        Self::with_reachability(true)
    }

    /// Create a broker that refuses every connection.
    pub fn unreachable() -> Self {
        Self::with_reachability(false)
    }

    fn with_reachability(reachable: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState {
                reachable,
                exchanges: HashMap::new(),
                queues: HashMap::new(),
            })),
            next_client: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Open a new client connection handle (not yet connected).
    pub fn client(&self) -> InMemoryBrokerClient {
        InMemoryBrokerClient {
            id: self.next_client.fetch_add(1, Ordering::Relaxed),
            state: self.state.clone(),
            connected: AtomicBool::new(false),
            channel_open: AtomicBool::new(false),
        }
    }

    /// Whether the exchange has been declared.
    pub fn has_exchange(&self, name: &str) -> bool {
        self.state.lock().exchanges.contains_key(name)
    }

    /// Whether the queue currently exists.
    pub fn has_queue(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        state.sweep();
        state.queues.contains_key(name)
    }

    /// Number of undelivered messages waiting in a queue.
    pub fn queue_depth(&self, name: &str) -> Option<usize> {
        let mut state = self.state.lock();
        state.sweep();
        let now = Instant::now();
        state.queues.get_mut(name).map(|queue| {
            queue.prune_expired(now);
            queue.backlog.len()
        })
    }

    /// Queues bound to an exchange, sorted by name.
    pub fn bindings(&self, exchange: &str) -> Vec<String> {
        self.state
            .lock()
            .exchanges
            .get(exchange)
            .map(|bound| bound.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// One connection to an [`InMemoryBroker`].
///
/// Exclusive queues declared through this client are deleted when it drops.
pub struct InMemoryBrokerClient {
    id: u64,
    state: Arc<Mutex<BrokerState>>,
    connected: AtomicBool,
    channel_open: AtomicBool,
}

impl InMemoryBrokerClient {
    fn ensure_channel(&self) -> Result<()> {
        if self.channel_open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(BusError::ChannelClosed)
        }
    }
}

impl Drop for InMemoryBrokerClient {
    fn drop(&mut self) {
        let id = self.id;
        self.state
            .lock()
            .remove_queues(|queue| queue.owner == Some(id));
    }
}

#[async_trait]
impl BrokerClient for InMemoryBrokerClient {
    async fn connect(&self, url: &str) -> Result<()> {
        if !url.starts_with(MEMORY_SCHEME) {
            return Err(BusError::ConnectionFailed {
                url: url.to_string(),
                reason: format!("unsupported scheme, expected {MEMORY_SCHEME}"),
            });
        }
        if !self.state.lock().reachable {
            return Err(BusError::ConnectionFailed {
                url: url.to_string(),
                reason: "broker unreachable".to_string(),
            });
        }
        self.connected.store(true, Ordering::Release);
        debug!(client = self.id, %url, "Connected");
        Ok(())
    }

    async fn create_channel(&self) -> Result<()> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(BusError::ChannelClosed);
        }
        self.channel_open.store(true, Ordering::Release);
        Ok(())
    }

    async fn create_exchange(&self, name: &str) -> Result<()> {
        self.ensure_channel()?;
        self.state
            .lock()
            .exchanges
            .entry(name.to_string())
            .or_default();
        debug!(exchange = %name, "Exchange declared");
        Ok(())
    }

    async fn create_queue(&self, name: &str, options: QueueOptions) -> Result<()> {
        self.ensure_channel()?;
        let mut state = self.state.lock();
        state.sweep();
        if let Some(queue) = state.queues.get(name) {
            if queue.locked_for(self.id) {
                return Err(BusError::QueueLocked(name.to_string()));
            }
            if queue.options != options {
                return Err(BusError::PreconditionFailed(name.to_string()));
            }
            return Ok(());
        }
        let owner = options.exclusive.then_some(self.id);
        state
            .queues
            .insert(name.to_string(), QueueState::new(options, owner));
        debug!(queue = %name, "Queue declared");
        Ok(())
    }

    async fn bind_queue_with_exchange(&self, queue: &str, exchange: &str) -> Result<()> {
        self.ensure_channel()?;
        let mut state = self.state.lock();
        state.sweep();
        match state.queues.get(queue) {
            None => return Err(BusError::QueueNotFound(queue.to_string())),
            Some(q) if q.locked_for(self.id) => {
                return Err(BusError::QueueLocked(queue.to_string()))
            }
            Some(_) => {}
        }
        let bound = state
            .exchanges
            .get_mut(exchange)
            .ok_or_else(|| BusError::ExchangeNotFound(exchange.to_string()))?;
        bound.insert(queue.to_string());
        debug!(%queue, %exchange, "Queue bound");
        Ok(())
    }

    async fn publish(&self, exchange: &str, routing_key: &str, body: Vec<u8>) -> Result<()> {
        self.ensure_channel()?;
        let mut state = self.state.lock();
        state.sweep();
        let now = Instant::now();

        if exchange == DEFAULT_EXCHANGE {
            match state.queues.get_mut(routing_key) {
                Some(queue) => queue.deliver(body, now),
                None => debug!(queue = %routing_key, "Unroutable message dropped"),
            }
            return Ok(());
        }

        let targets: Vec<String> = state
            .exchanges
            .get(exchange)
            .ok_or_else(|| BusError::ExchangeNotFound(exchange.to_string()))?
            .iter()
            .cloned()
            .collect();
        for name in targets {
            if let Some(queue) = state.queues.get_mut(&name) {
                queue.deliver(body.clone(), now);
            }
        }
        Ok(())
    }

    async fn establish_worker(&self, queue: &str, options: ConsumeOptions) -> Result<DeliveryStream> {
        self.ensure_channel()?;
        let mut state = self.state.lock();
        state.sweep();
        let entry = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| BusError::QueueNotFound(queue.to_string()))?;
        if entry.locked_for(self.id) || entry.has_live_consumer() {
            return Err(BusError::QueueLocked(queue.to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        entry.prune_expired(Instant::now());
        for (_, body) in entry.backlog.drain(..) {
            // The receiver is alive in this scope.
            let _ = tx.send(body);
        }
        entry.consumer = Some(tx);
        entry.had_consumer = true;
        debug!(%queue, no_ack = options.no_ack, "Worker established");
        Ok(rx)
    }
}
