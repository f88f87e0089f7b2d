// crates/meshgraph-engine/src/blocking.rs
//
// Synchronous wrapper around `Metagraph` for callers without an async
// runtime. Owns a current-thread Tokio runtime and blocks on each call.
// Must not be used from inside another Tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use meshgraph_core::{ChainClient, MeshgraphError, MetricsSink, NeuronDescriptor, PublicKey, Uid};

use crate::config::MetagraphConfig;
use crate::metagraph::Metagraph;
use crate::publish::PublishOutcome;
use crate::snapshot::NetworkSnapshot;
use crate::sync::SyncReport;

pub struct BlockingMetagraph {
    runtime: Runtime,
    inner: Metagraph,
}

impl BlockingMetagraph {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        metrics: Arc<dyn MetricsSink>,
        neuron: NeuronDescriptor,
        config: MetagraphConfig,
    ) -> Result<Self, MeshgraphError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| MeshgraphError::InvalidState(format!("failed to build runtime: {}", e)))?;
        Ok(Self {
            runtime,
            inner: Metagraph::new(chain, metrics, neuron, config),
        })
    }

    /// The wrapped async metagraph.
    pub fn inner(&self) -> &Metagraph {
        &self.inner
    }

    pub fn public_key(&self) -> &PublicKey {
        self.inner.public_key()
    }

    pub fn connect(&self) -> bool {
        self.runtime.block_on(self.inner.connect())
    }

    pub fn subscribe(&self, timeout: Duration) -> bool {
        self.runtime.block_on(self.inner.subscribe(timeout))
    }

    pub fn unsubscribe(&self, timeout: Duration) {
        self.runtime.block_on(self.inner.unsubscribe(timeout))
    }

    pub fn sync(&self) -> Result<SyncReport, MeshgraphError> {
        self.runtime.block_on(self.inner.sync())
    }

    pub fn publish(&self, weights: &[f64]) -> Result<PublishOutcome, MeshgraphError> {
        self.runtime.block_on(self.inner.publish(weights))
    }

    pub fn emit(&self, weights: &[f64]) -> Result<bool, MeshgraphError> {
        self.runtime.block_on(self.inner.emit(weights))
    }

    pub fn block(&self) -> Result<u64, MeshgraphError> {
        self.runtime.block_on(self.inner.block())
    }

    pub fn snapshot(&self) -> Arc<NetworkSnapshot> {
        self.runtime.block_on(self.inner.snapshot())
    }

    pub fn weights(&self) -> Vec<f64> {
        self.runtime.block_on(self.inner.weights())
    }

    pub fn uids_to_indices(&self, uids: &[Uid]) -> Result<Vec<usize>, MeshgraphError> {
        self.runtime.block_on(self.inner.uids_to_indices(uids))
    }

    pub fn uids_to_neurons(
        &self,
        uids: &[Uid],
    ) -> Result<Vec<Arc<NeuronDescriptor>>, MeshgraphError> {
        self.runtime.block_on(self.inner.uids_to_neurons(uids))
    }

    pub fn last_sync(&self) -> u64 {
        self.inner.last_sync()
    }
}
