//! # Chain Sync Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay before the startup chain request, in milliseconds.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1_000;

/// Chain synchronization configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Time to let the broker topology settle before asking peers for their chain.
    pub settle_delay_ms: u64,

    /// Give up waiting for a chain reply after this long. `None` waits forever.
    pub reply_timeout_ms: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            reply_timeout_ms: None,
        }
    }
}

impl SyncConfig {
    /// Short delays for tests.
    pub fn for_testing() -> Self {
        Self {
            settle_delay_ms: 10,
            reply_timeout_ms: Some(2_000),
        }
    }

    /// Settle delay as a `Duration`.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Reply timeout as a `Duration`.
    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_ms.map(Duration::from_millis)
    }
}
