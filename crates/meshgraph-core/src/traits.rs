// crates/meshgraph-core/src/traits.rs

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::MeshgraphError;
use crate::identity::PublicKey;
use crate::neuron::NeuronInfo;

/// Capability for reading from and writing to the chain.
///
/// Implemented by the daemon's JSON-RPC client and by
/// [`crate::mock::MockChainClient`]. Every method is a remote call and may
/// fail with [`MeshgraphError::Transport`].
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Open the connection to the chain endpoint.
    async fn connect(&self) -> Result<(), MeshgraphError>;

    /// Whether the connection is currently usable.
    async fn is_connected(&self) -> bool;

    /// Current block height.
    async fn current_block(&self) -> Result<u64, MeshgraphError>;

    /// Every known identity with the block of its last emission.
    async fn last_emission_data(&self) -> Result<Vec<(PublicKey, u64)>, MeshgraphError>;

    /// Block of the last emission for a single identity.
    async fn last_emission(&self, key: &PublicKey) -> Result<u64, MeshgraphError>;

    /// Stake held by `key`.
    async fn stake(&self, key: &PublicKey) -> Result<u64, MeshgraphError>;

    /// Endpoint data for `key`, or `None` if the identity is not subscribed.
    async fn neuron_info(&self, key: &PublicKey) -> Result<Option<NeuronInfo>, MeshgraphError>;

    /// Targets of `key`'s outgoing weights. Parallel to [`Self::weight_values`].
    async fn weight_keys(&self, key: &PublicKey) -> Result<Vec<PublicKey>, MeshgraphError>;

    /// Fixed-point values of `key`'s outgoing weights.
    async fn weight_values(&self, key: &PublicKey) -> Result<Vec<u32>, MeshgraphError>;

    /// Submit this node's weights.
    async fn set_weights(
        &self,
        keys: Vec<PublicKey>,
        values: Vec<u32>,
        wait_for_inclusion: bool,
    ) -> Result<(), MeshgraphError>;

    /// Announce this node's endpoint.
    async fn subscribe(&self, address: IpAddr, port: u16) -> Result<(), MeshgraphError>;

    /// Withdraw this node's endpoint.
    async fn unsubscribe(&self, timeout: Duration) -> Result<(), MeshgraphError>;
}

/// Fire-and-forget sink for numeric series.
///
/// Implementations must not panic and must not block for long; the engine
/// calls `record` from inside sync tasks.
pub trait MetricsSink: Send + Sync {
    fn record(&self, series: &str, value: f64);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _series: &str, _value: f64) {}
}
