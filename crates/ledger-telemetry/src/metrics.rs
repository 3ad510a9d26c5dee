//! Prometheus metrics for ledger nodes.
//!
//! All metrics follow the naming convention: `gl_<metric>_<unit>`. Several
//! nodes may share one process, so per-node gauges carry a `node` label.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // EVENT METRICS
    // =========================================================================

    /// Events decoded from a node's inbox
    pub static ref EVENTS_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("gl_events_received_total", "Events received from the broadcast channel"),
        &["event"]
    ).expect("metric creation failed");

    /// Events handed to the broker
    pub static ref EVENTS_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("gl_events_published_total", "Events published to the broadcast channel"),
        &["event"]
    ).expect("metric creation failed");

    // =========================================================================
    // CHAIN METRICS
    // =========================================================================

    /// Blocks mined locally
    pub static ref BLOCKS_MINED: Counter = Counter::new(
        "gl_blocks_mined_total",
        "Blocks mined and committed by this process"
    ).expect("metric creation failed");

    /// Gossiped blocks appended
    pub static ref BLOCKS_ACCEPTED: Counter = Counter::new(
        "gl_blocks_accepted_total",
        "Gossiped blocks that extended the local tip"
    ).expect("metric creation failed");

    /// Gossiped blocks dropped
    pub static ref BLOCKS_REJECTED: Counter = Counter::new(
        "gl_blocks_rejected_total",
        "Gossiped blocks that did not extend the local tip"
    ).expect("metric creation failed");

    /// Reconciliation decisions
    pub static ref SYNC_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("gl_sync_outcomes_total", "Chain reconciliation outcomes"),
        &["outcome"]  // chain_replaced / pool_replaced / unchanged
    ).expect("metric creation failed");

    /// Current chain length per node
    pub static ref CHAIN_LENGTH: GaugeVec = GaugeVec::new(
        Opts::new("gl_chain_length", "Blocks on the local chain, genesis included"),
        &["node"]
    ).expect("metric creation failed");

    /// Current pending pool size per node
    pub static ref PENDING_TRANSACTIONS: GaugeVec = GaugeVec::new(
        Opts::new("gl_pending_transactions", "Transactions waiting in the pending pool"),
        &["node"]
    ).expect("metric creation failed");

    /// Nonce search duration
    pub static ref POW_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "gl_pow_duration_seconds",
            "Time spent searching for a proof-of-work nonce"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Idempotent: metrics that are already registered are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Events
        Box::new(EVENTS_RECEIVED.clone()),
        Box::new(EVENTS_PUBLISHED.clone()),
        // Chain
        Box::new(BLOCKS_MINED.clone()),
        Box::new(BLOCKS_ACCEPTED.clone()),
        Box::new(BLOCKS_REJECTED.clone()),
        Box::new(SYNC_OUTCOMES.clone()),
        Box::new(CHAIN_LENGTH.clone()),
        Box::new(PENDING_TRANSACTIONS.clone()),
        Box::new(POW_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all registered metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Publish a node's chain length and pool size.
pub fn record_ledger_size(node: &str, chain_length: usize, pending: usize) {
    CHAIN_LENGTH.with_label_values(&[node]).set(chain_length as f64);
    PENDING_TRANSACTIONS
        .with_label_values(&[node])
        .set(pending as f64);
}
