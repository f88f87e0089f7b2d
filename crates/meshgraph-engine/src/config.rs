// crates/meshgraph-engine/src/config.rs
//
// Policy constants for syncing, subscribing, and publishing.
// Every field has a default so a partial TOML table deserializes cleanly.

use std::time::Duration;

use serde::Deserialize;

/// Tunable policy for the metagraph engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetagraphConfig {
    /// Peers whose last emission is this many blocks old or older are not
    /// polled during a sync.
    #[serde(default = "default_staleness_threshold_blocks")]
    pub staleness_threshold_blocks: u64,

    /// Interval between checks for this node's descriptor after subscribing.
    #[serde(default = "default_subscribe_poll_interval_ms")]
    pub subscribe_poll_interval_ms: u64,

    /// Interval between checks for published weights on chain.
    #[serde(default = "default_confirm_poll_interval_ms")]
    pub confirm_poll_interval_ms: u64,

    /// How long to wait for published weights to appear on chain.
    #[serde(default = "default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
}

fn default_staleness_threshold_blocks() -> u64 {
    100
}

fn default_subscribe_poll_interval_ms() -> u64 {
    1_000
}

fn default_confirm_poll_interval_ms() -> u64 {
    3_000
}

fn default_confirm_timeout_ms() -> u64 {
    12_000
}

impl Default for MetagraphConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_blocks: default_staleness_threshold_blocks(),
            subscribe_poll_interval_ms: default_subscribe_poll_interval_ms(),
            confirm_poll_interval_ms: default_confirm_poll_interval_ms(),
            confirm_timeout_ms: default_confirm_timeout_ms(),
        }
    }
}

impl MetagraphConfig {
    pub fn subscribe_poll_interval(&self) -> Duration {
        Duration::from_millis(self.subscribe_poll_interval_ms)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }
}
