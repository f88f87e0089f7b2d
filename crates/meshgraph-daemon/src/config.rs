// crates/meshgraph-daemon/src/config.rs
//
// Runtime configuration for the Meshgraph daemon.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use meshgraph_engine::MetagraphConfig;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// URL of the chain's JSON-RPC endpoint.
    #[serde(default = "default_chain_endpoint")]
    pub chain_endpoint: String,

    /// Address announced on chain for this node's endpoint.
    #[serde(default = "default_axon_ip")]
    pub axon_ip: String,

    /// Port announced on chain for this node's endpoint.
    #[serde(default = "default_axon_port")]
    pub axon_port: u16,

    /// Hex-encoded ed25519 secret. A fresh keypair is used if missing.
    #[serde(default = "default_key_path")]
    pub key_path: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between sync passes.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// How long to wait for the subscription to show up on chain.
    #[serde(default = "default_subscribe_timeout_secs")]
    pub subscribe_timeout_secs: u64,

    /// Per-request HTTP timeout for chain calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Publish a uniform weight vector after every successful sync.
    #[serde(default)]
    pub emit_uniform: bool,

    /// Engine policy (staleness threshold, poll intervals, timeouts).
    #[serde(default)]
    pub metagraph: MetagraphConfig,
}

fn default_chain_endpoint() -> String {
    "http://127.0.0.1:9933/rpc".to_string()
}

fn default_axon_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_axon_port() -> u16 {
    8091
}

fn default_key_path() -> String {
    "~/.meshgraph/hotkey.secret".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sync_interval_secs() -> u64 {
    12
}

fn default_subscribe_timeout_secs() -> u64 {
    12
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            chain_endpoint: default_chain_endpoint(),
            axon_ip: default_axon_ip(),
            axon_port: default_axon_port(),
            key_path: default_key_path(),
            log_level: default_log_level(),
            sync_interval_secs: default_sync_interval_secs(),
            subscribe_timeout_secs: default_subscribe_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            emit_uniform: false,
            metagraph: MetagraphConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: DaemonConfig = toml::from_str(contents)?;
        Ok(config)
    }
}
