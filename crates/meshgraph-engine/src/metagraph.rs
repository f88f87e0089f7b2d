// crates/meshgraph-engine/src/metagraph.rs
//
// Metagraph facade: lifecycle (connect/subscribe/unsubscribe), sync, weight
// emission, and read access to the current snapshot.
//
// The peer cache and identity index live for the lifetime of the facade.
// Every successful sync replaces the held snapshot with a new Arc; readers
// holding the previous Arc keep a complete, consistent view.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use meshgraph_core::{ChainClient, MeshgraphError, MetricsSink, NeuronDescriptor, PublicKey, Uid};

use crate::cache::PeerCache;
use crate::codec;
use crate::config::MetagraphConfig;
use crate::publish::{PublishOutcome, WeightPublisher};
use crate::snapshot::NetworkSnapshot;
use crate::sync::{SyncEngine, SyncReport};

/// Local view of the metagraph, kept in step with the chain.
pub struct Metagraph {
    chain: Arc<dyn ChainClient>,
    config: MetagraphConfig,
    neuron: Arc<NeuronDescriptor>,
    cache: Arc<RwLock<PeerCache>>,
    engine: SyncEngine,
    publisher: WeightPublisher,
    /// Current snapshot. Swapped whole after each sync.
    snapshot: RwLock<Arc<NetworkSnapshot>>,
    /// Serializes sync passes.
    sync_lock: Mutex<()>,
}

impl Metagraph {
    /// Create a metagraph for the node described by `neuron`.
    ///
    /// The node is seeded at dense index 0 / uid 0 and an initial snapshot
    /// (block 0, one peer) is available immediately. No chain call is made.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        metrics: Arc<dyn MetricsSink>,
        neuron: NeuronDescriptor,
        config: MetagraphConfig,
    ) -> Self {
        let cache = PeerCache::new(neuron.clone());
        let initial = NetworkSnapshot::build(&cache, 0);
        let cache = Arc::new(RwLock::new(cache));

        let engine = SyncEngine::new(
            cache.clone(),
            chain.clone(),
            metrics,
            config.staleness_threshold_blocks,
        );
        let publisher = WeightPublisher::new(
            neuron.public_key.clone(),
            config.confirm_poll_interval(),
            config.confirm_timeout(),
        );

        Self {
            chain,
            config,
            neuron: Arc::new(neuron),
            cache,
            engine,
            publisher,
            snapshot: RwLock::new(Arc::new(initial)),
            sync_lock: Mutex::new(()),
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.neuron.public_key
    }

    /// This node's own descriptor.
    pub fn neuron(&self) -> &NeuronDescriptor {
        &self.neuron
    }

    pub fn config(&self) -> &MetagraphConfig {
        &self.config
    }

    /// Connect to the chain. Returns whether the client reports a live
    /// connection afterwards.
    pub async fn connect(&self) -> bool {
        if let Err(e) = self.chain.connect().await {
            tracing::warn!("Failed to connect to chain: {}", e);
            return false;
        }
        let connected = self.chain.is_connected().await;
        tracing::info!("Chain connection established: {}", connected);
        connected
    }

    /// Announce this node's endpoint and wait until the chain lists it.
    ///
    /// Returns `false` if the announcement fails or `timeout` elapses first.
    pub async fn subscribe(&self, timeout: Duration) -> bool {
        tracing::info!(
            "Subscribing {}:{} as {}",
            self.neuron.address,
            self.neuron.port,
            self.neuron.public_key
        );
        if let Err(e) = self
            .chain
            .subscribe(self.neuron.address, self.neuron.port)
            .await
        {
            tracing::warn!("Subscription request failed: {}", e);
            return false;
        }
        self.wait_for_subscription(timeout).await
    }

    async fn wait_for_subscription(&self, timeout: Duration) -> bool {
        // No deadline if the timeout overflows the clock.
        let deadline = Instant::now().checked_add(timeout);
        let interval = self.config.subscribe_poll_interval();

        loop {
            match self.chain.neuron_info(&self.neuron.public_key).await {
                Ok(Some(_)) => {
                    tracing::info!("Subscription visible on chain");
                    return true;
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Subscription poll failed: {}", e),
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::warn!(
                            "Timeout after {:?} while waiting for subscription",
                            timeout
                        );
                        return false;
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };
            tokio::time::sleep(pause).await;
        }
    }

    /// Withdraw this node's endpoint. Best effort: failures are logged and
    /// removal is not verified.
    pub async fn unsubscribe(&self, timeout: Duration) {
        tracing::info!("Unsubscribe from chain endpoint");
        if let Err(e) = self.chain.unsubscribe(timeout).await {
            tracing::warn!("Unsubscribe failed: {}", e);
        }
    }

    /// Poll the chain, reconcile the cache, and replace the snapshot.
    ///
    /// Concurrent calls run one after another. If the pass fails before any
    /// peer is polled the previous snapshot stays in place.
    pub async fn sync(&self) -> Result<SyncReport, MeshgraphError> {
        let _guard = self.sync_lock.lock().await;

        let report = self.engine.sync_pass().await?;
        let snapshot = {
            let cache = self.cache.read().await;
            NetworkSnapshot::build(&cache, self.engine.last_sync())
        };
        tracing::debug!(
            "Snapshot rebuilt at block {} with {} peers",
            snapshot.block,
            snapshot.n
        );
        *self.snapshot.write().await = Arc::new(snapshot);

        Ok(report)
    }

    /// Publish `weights` (one entry per peer, in dense-index order) and
    /// report how the attempt ended.
    ///
    /// Fails with `LengthMismatch`, before touching the chain, if the vector
    /// does not match the current snapshot's size.
    pub async fn publish(&self, weights: &[f64]) -> Result<PublishOutcome, MeshgraphError> {
        let snapshot = self.snapshot().await;
        snapshot.check_weight_len(weights)?;
        let encoded = codec::encode(weights, &snapshot.pubkeys)?;
        Ok(self.publisher.publish(self.chain.as_ref(), encoded).await)
    }

    /// Publish `weights`; `true` only if the chain confirmed them in time.
    pub async fn emit(&self, weights: &[f64]) -> Result<bool, MeshgraphError> {
        Ok(self.publish(weights).await?.is_confirmed())
    }

    /// Current block height on chain.
    pub async fn block(&self) -> Result<u64, MeshgraphError> {
        self.chain.current_block().await
    }

    /// The current snapshot.
    pub async fn snapshot(&self) -> Arc<NetworkSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// This node's weights from the current snapshot.
    pub async fn weights(&self) -> Vec<f64> {
        self.snapshot().await.weights().to_vec()
    }

    pub async fn uids_to_indices(&self, uids: &[Uid]) -> Result<Vec<usize>, MeshgraphError> {
        self.snapshot().await.uids_to_indices(uids)
    }

    pub async fn uids_to_neurons(
        &self,
        uids: &[Uid],
    ) -> Result<Vec<Arc<NeuronDescriptor>>, MeshgraphError> {
        self.snapshot().await.uids_to_neurons(uids)
    }

    /// Block observed by the last completed sync.
    pub fn last_sync(&self) -> u64 {
        self.engine.last_sync()
    }
}
