//! Error types for chain synchronization

use std::time::Duration;

use shared_bus::BusError;
use thiserror::Error;

/// Errors from a chain request round trip.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The broker refused an operation.
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// No peer answered in time.
    #[error("No chain reply within {0:?}")]
    ReplyTimeout(Duration),

    /// The reply queue closed before any reply arrived.
    #[error("Reply queue closed")]
    ReplyQueueClosed,
}
