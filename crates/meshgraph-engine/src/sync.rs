// crates/meshgraph-engine/src/sync.rs
//
// Sync engine: one pass polls the chain and reconciles the peer cache.
//
// Pass phases:
//   Idle -> PollingBlock -> FanningOut -> CacheConsistent -> Idle
//
// Only peers that emitted recently are polled. Each scheduled peer gets its
// own task; a failing task is logged and counted but never aborts the pass.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinSet;

use meshgraph_core::{ChainClient, MeshgraphError, MetricsSink, NeuronDescriptor, PublicKey};

use crate::cache::{PeerCache, PeerRecord};

/// Metrics series for the number of cached peers.
pub const PEERS_SERIES: &str = "metagraph.peers";

/// Metrics series for the number of failed peer polls in a pass.
pub const FAILED_POLLS_SERIES: &str = "metagraph.sync.failed";

/// Phase of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No pass is running.
    Idle,
    /// Querying the block height and the emission list.
    PollingBlock,
    /// Per-peer poll tasks are in flight.
    FanningOut,
    /// Every task has finished; the cache may be read.
    CacheConsistent,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Idle => write!(f, "Idle"),
            SyncPhase::PollingBlock => write!(f, "PollingBlock"),
            SyncPhase::FanningOut => write!(f, "FanningOut"),
            SyncPhase::CacheConsistent => write!(f, "CacheConsistent"),
        }
    }
}

/// Result of polling a single peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Known peer refreshed at this dense index.
    Updated(usize),
    /// New peer appended at this dense index.
    Added(usize),
    /// A query failed; the cache was not touched.
    Failed,
}

/// Summary of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Block height observed at the start of the pass.
    pub block: u64,
    /// Peers that passed the staleness filter.
    pub scheduled: usize,
    pub updated: usize,
    pub added: usize,
    pub failed: usize,
}

/// Whether a peer that last emitted at `last_emission` should be polled at
/// `current_block`. Emissions ahead of the observed block count as fresh.
pub fn is_fresh(current_block: u64, last_emission: u64, staleness_threshold: u64) -> bool {
    current_block.saturating_sub(last_emission) < staleness_threshold
}

/// Drives sync passes against a shared peer cache.
pub struct SyncEngine {
    cache: Arc<RwLock<PeerCache>>,
    chain: Arc<dyn ChainClient>,
    metrics: Arc<dyn MetricsSink>,
    staleness_threshold: u64,
    last_sync: AtomicU64,
    phase: RwLock<SyncPhase>,
}

impl SyncEngine {
    pub fn new(
        cache: Arc<RwLock<PeerCache>>,
        chain: Arc<dyn ChainClient>,
        metrics: Arc<dyn MetricsSink>,
        staleness_threshold: u64,
    ) -> Self {
        Self {
            cache,
            chain,
            metrics,
            staleness_threshold,
            last_sync: AtomicU64::new(0),
            phase: RwLock::new(SyncPhase::Idle),
        }
    }

    /// Block observed by the last completed pass (0 before the first).
    pub fn last_sync(&self) -> u64 {
        self.last_sync.load(Ordering::SeqCst)
    }

    pub async fn phase(&self) -> SyncPhase {
        *self.phase.read().await
    }

    async fn set_phase(&self, next: SyncPhase) {
        let mut phase = self.phase.write().await;
        tracing::trace!("Sync phase: {} -> {}", *phase, next);
        *phase = next;
    }

    /// Run one pass. On return the cache is consistent and may be snapshotted.
    ///
    /// Fails only if the block height or the emission list cannot be read;
    /// in that case no peer is polled and the cache is untouched.
    pub async fn sync_pass(&self) -> Result<SyncReport, MeshgraphError> {
        self.set_phase(SyncPhase::PollingBlock).await;
        let (block, emissions) = match self.poll_chain_head().await {
            Ok(head) => head,
            Err(e) => {
                self.set_phase(SyncPhase::Idle).await;
                return Err(e);
            }
        };

        let mut seen = HashSet::new();
        let scheduled: Vec<PublicKey> = emissions
            .into_iter()
            .filter(|(_, last)| is_fresh(block, *last, self.staleness_threshold))
            .filter_map(|(key, _)| seen.insert(key.clone()).then_some(key))
            .collect();

        tracing::debug!(
            "Sync at block {}: polling {} recently active peers",
            block,
            scheduled.len()
        );

        self.set_phase(SyncPhase::FanningOut).await;
        let mut report = SyncReport {
            block,
            scheduled: scheduled.len(),
            ..SyncReport::default()
        };

        let mut tasks = JoinSet::new();
        for pubkey in scheduled {
            let chain = self.chain.clone();
            let cache = self.cache.clone();
            tasks.spawn(async move { poll_and_store(chain, cache, pubkey).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(PollOutcome::Updated(_)) => report.updated += 1,
                Ok(PollOutcome::Added(_)) => report.added += 1,
                Ok(PollOutcome::Failed) => report.failed += 1,
                Err(e) => {
                    tracing::warn!("Sync: peer poll task aborted: {}", e);
                    report.failed += 1;
                }
            }
        }

        self.last_sync.store(block, Ordering::SeqCst);
        self.set_phase(SyncPhase::CacheConsistent).await;
        let n = self.cache.read().await.len();
        self.metrics.record(PEERS_SERIES, n as f64);
        self.metrics.record(FAILED_POLLS_SERIES, report.failed as f64);

        tracing::info!(
            "Sync complete at block {}: {} scheduled, {} updated, {} added, {} failed",
            report.block,
            report.scheduled,
            report.updated,
            report.added,
            report.failed
        );

        self.set_phase(SyncPhase::Idle).await;
        Ok(report)
    }

    async fn poll_chain_head(&self) -> Result<(u64, Vec<(PublicKey, u64)>), MeshgraphError> {
        let block = self.chain.current_block().await?;
        let emissions = self.chain.last_emission_data().await?;
        Ok((block, emissions))
    }
}

/// Poll one peer and write the result into the cache.
///
/// The cache write lock serializes allocation of new identities, so two
/// tasks seeing unknown peers at once can never claim the same index.
async fn poll_and_store(
    chain: Arc<dyn ChainClient>,
    cache: Arc<RwLock<PeerCache>>,
    pubkey: PublicKey,
) -> PollOutcome {
    tracing::debug!("Poll: {}", pubkey);

    let record = match poll_peer(chain.as_ref(), &pubkey).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Sync: failed to poll peer {}: {}", pubkey, e);
            return PollOutcome::Failed;
        }
    };

    let (index, is_new) = cache.write().await.upsert(&pubkey, record);

    if is_new {
        tracing::debug!("Sync: added peer {} at index {}", pubkey, index);
        PollOutcome::Added(index)
    } else {
        PollOutcome::Updated(index)
    }
}

/// Fetch every attribute of one peer.
async fn poll_peer(
    chain: &dyn ChainClient,
    pubkey: &PublicKey,
) -> Result<PeerRecord, MeshgraphError> {
    let (stake, last_emission, info, keys, values) = tokio::try_join!(
        chain.stake(pubkey),
        chain.last_emission(pubkey),
        chain.neuron_info(pubkey),
        chain.weight_keys(pubkey),
        chain.weight_values(pubkey),
    )?;

    let info = info.ok_or_else(|| {
        MeshgraphError::NotFound(format!("no neuron info on chain for {}", pubkey))
    })?;

    if keys.len() != values.len() {
        return Err(MeshgraphError::Transport(format!(
            "weight keys and values differ in length for {}: {} vs {}",
            pubkey,
            keys.len(),
            values.len()
        )));
    }

    Ok(PeerRecord {
        stake,
        last_emission,
        weights: keys.into_iter().zip(values).collect(),
        neuron: Arc::new(NeuronDescriptor::from_info(pubkey.clone(), info)),
    })
}
