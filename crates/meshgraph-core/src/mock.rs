// crates/meshgraph-core/src/mock.rs
//
// In-memory chain and metrics implementations with failure injection.
// Used by unit tests and integration tests.

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::MeshgraphError;
use crate::identity::PublicKey;
use crate::neuron::NeuronInfo;
use crate::traits::{ChainClient, MetricsSink};

/// Chain-side record of a single peer.
#[derive(Debug, Clone, Default)]
pub struct MockPeer {
    pub stake: u64,
    pub last_emission: u64,
    pub info: Option<NeuronInfo>,
    pub weight_keys: Vec<PublicKey>,
    pub weight_values: Vec<u32>,
}

impl MockPeer {
    pub fn new(stake: u64, last_emission: u64, info: NeuronInfo) -> Self {
        Self {
            stake,
            last_emission,
            info: Some(info),
            weight_keys: Vec::new(),
            weight_values: Vec::new(),
        }
    }

    pub fn with_weights(mut self, weights: Vec<(PublicKey, u32)>) -> Self {
        let (keys, values) = weights.into_iter().unzip();
        self.weight_keys = keys;
        self.weight_values = values;
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    block: u64,
    peers: BTreeMap<PublicKey, MockPeer>,
    failing: HashSet<PublicKey>,
    connected: bool,
    fail_connect: bool,
    fail_block: bool,
    fail_submission: bool,
    drop_submissions: bool,
    register_on_subscribe: bool,
}

/// In-memory chain.
///
/// Calls made on behalf of "this node" (`set_weights`, `subscribe`,
/// `unsubscribe`) act on the `own_key` passed to [`MockChainClient::new`].
#[derive(Debug)]
pub struct MockChainClient {
    own_key: PublicKey,
    state: Mutex<MockState>,
    calls: AtomicUsize,
    submissions: AtomicUsize,
}

impl MockChainClient {
    pub fn new(own_key: PublicKey) -> Self {
        Self {
            own_key,
            state: Mutex::new(MockState {
                register_on_subscribe: true,
                ..MockState::default()
            }),
            calls: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_block(&self, block: u64) {
        self.state().block = block;
    }

    /// Insert or replace a peer record.
    pub fn upsert_peer(&self, key: PublicKey, peer: MockPeer) {
        self.state().peers.insert(key, peer);
    }

    /// Replace the outgoing weights recorded for `key`.
    pub fn set_peer_weights(&self, key: &PublicKey, weights: Vec<(PublicKey, u32)>) {
        if let Some(peer) = self.state().peers.get_mut(key) {
            let (keys, values) = weights.into_iter().unzip();
            peer.weight_keys = keys;
            peer.weight_values = values;
        }
    }

    pub fn set_peer_stake(&self, key: &PublicKey, stake: u64) {
        if let Some(peer) = self.state().peers.get_mut(key) {
            peer.stake = stake;
        }
    }

    /// Make every per-peer query about `key` fail with a transport error.
    pub fn fail_peer(&self, key: PublicKey) {
        self.state().failing.insert(key);
    }

    pub fn heal_peer(&self, key: &PublicKey) {
        self.state().failing.remove(key);
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state().fail_connect = fail;
    }

    pub fn set_fail_block(&self, fail: bool) {
        self.state().fail_block = fail;
    }

    pub fn set_fail_submission(&self, fail: bool) {
        self.state().fail_submission = fail;
    }

    /// Accept submissions without ever recording them on chain.
    pub fn set_drop_submissions(&self, drop: bool) {
        self.state().drop_submissions = drop;
    }

    /// Whether `subscribe` registers this node's endpoint.
    pub fn set_register_on_subscribe(&self, register: bool) {
        self.state().register_on_subscribe = register;
    }

    /// Total number of chain calls served.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `set_weights` calls served.
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    fn peer(&self, key: &PublicKey) -> Result<MockPeer, MeshgraphError> {
        let state = self.state();
        if state.failing.contains(key) {
            return Err(MeshgraphError::Transport(format!("injected failure for {}", key)));
        }
        state
            .peers
            .get(key)
            .cloned()
            .ok_or_else(|| MeshgraphError::NotFound(format!("no peer {}", key)))
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn connect(&self) -> Result<(), MeshgraphError> {
        self.touch();
        let mut state = self.state();
        if state.fail_connect {
            return Err(MeshgraphError::Transport("connection refused".to_string()));
        }
        state.connected = true;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.touch();
        self.state().connected
    }

    async fn current_block(&self) -> Result<u64, MeshgraphError> {
        self.touch();
        let state = self.state();
        if state.fail_block {
            return Err(MeshgraphError::Transport("block query failed".to_string()));
        }
        Ok(state.block)
    }

    async fn last_emission_data(&self) -> Result<Vec<(PublicKey, u64)>, MeshgraphError> {
        self.touch();
        Ok(self
            .state()
            .peers
            .iter()
            .map(|(key, peer)| (key.clone(), peer.last_emission))
            .collect())
    }

    async fn last_emission(&self, key: &PublicKey) -> Result<u64, MeshgraphError> {
        self.touch();
        Ok(self.peer(key)?.last_emission)
    }

    async fn stake(&self, key: &PublicKey) -> Result<u64, MeshgraphError> {
        self.touch();
        Ok(self.peer(key)?.stake)
    }

    async fn neuron_info(&self, key: &PublicKey) -> Result<Option<NeuronInfo>, MeshgraphError> {
        self.touch();
        let state = self.state();
        if state.failing.contains(key) {
            return Err(MeshgraphError::Transport(format!("injected failure for {}", key)));
        }
        Ok(state.peers.get(key).and_then(|p| p.info.clone()))
    }

    async fn weight_keys(&self, key: &PublicKey) -> Result<Vec<PublicKey>, MeshgraphError> {
        self.touch();
        Ok(self.peer(key)?.weight_keys)
    }

    async fn weight_values(&self, key: &PublicKey) -> Result<Vec<u32>, MeshgraphError> {
        self.touch();
        Ok(self.peer(key)?.weight_values)
    }

    async fn set_weights(
        &self,
        keys: Vec<PublicKey>,
        values: Vec<u32>,
        _wait_for_inclusion: bool,
    ) -> Result<(), MeshgraphError> {
        self.touch();
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        if state.fail_submission {
            return Err(MeshgraphError::Submission("extrinsic rejected".to_string()));
        }
        if state.drop_submissions {
            return Ok(());
        }
        let peer = state.peers.entry(self.own_key.clone()).or_default();
        peer.weight_keys = keys;
        peer.weight_values = values;
        Ok(())
    }

    async fn subscribe(&self, address: IpAddr, port: u16) -> Result<(), MeshgraphError> {
        self.touch();
        let mut state = self.state();
        if !state.register_on_subscribe {
            return Ok(());
        }
        let block = state.block;
        let peer = state.peers.entry(self.own_key.clone()).or_default();
        peer.last_emission = block;
        peer.info = Some(NeuronInfo {
            address,
            port,
            version: env!("CARGO_PKG_VERSION").to_string(),
        });
        Ok(())
    }

    async fn unsubscribe(&self, _timeout: Duration) -> Result<(), MeshgraphError> {
        self.touch();
        if let Some(peer) = self.state().peers.get_mut(&self.own_key) {
            peer.info = None;
        }
        Ok(())
    }
}

/// Metrics sink that remembers every recorded value.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    records: Mutex<Vec<(String, f64)>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, f64)> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Most recent value recorded for `series`.
    pub fn last(&self, series: &str) -> Option<f64> {
        self.records()
            .into_iter()
            .rev()
            .find(|(name, _)| name == series)
            .map(|(_, value)| value)
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, series: &str, value: f64) {
        if let Ok(mut records) = self.records.lock() {
            records.push((series.to_string(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(b: u8) -> PublicKey {
        PublicKey::new(vec![b; 4])
    }

    fn info() -> NeuronInfo {
        NeuronInfo {
            address: "10.0.0.1".parse().unwrap(),
            port: 8091,
            version: "0.1.0".to_string(),
        }
    }

    #[tokio::test]
    async fn set_weights_lands_on_own_key() {
        let chain = MockChainClient::new(key(0));
        chain
            .set_weights(vec![key(1)], vec![42], false)
            .await
            .unwrap();
        assert_eq!(chain.weight_keys(&key(0)).await.unwrap(), vec![key(1)]);
        assert_eq!(chain.weight_values(&key(0)).await.unwrap(), vec![42]);
        assert_eq!(chain.submission_count(), 1);
    }

    #[tokio::test]
    async fn failing_peer_errors_on_every_query() {
        let chain = MockChainClient::new(key(0));
        chain.upsert_peer(key(1), MockPeer::new(10, 5, info()));
        chain.fail_peer(key(1));
        assert!(chain.stake(&key(1)).await.is_err());
        assert!(chain.neuron_info(&key(1)).await.is_err());
        chain.heal_peer(&key(1));
        assert_eq!(chain.stake(&key(1)).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn subscribe_then_unsubscribe_toggles_info() {
        let chain = MockChainClient::new(key(0));
        chain.subscribe(info().address, 8091).await.unwrap();
        assert!(chain.neuron_info(&key(0)).await.unwrap().is_some());
        chain.unsubscribe(Duration::from_secs(1)).await.unwrap();
        assert!(chain.neuron_info(&key(0)).await.unwrap().is_none());
    }

    #[test]
    fn recording_metrics_keeps_latest_value() {
        let metrics = RecordingMetrics::new();
        metrics.record("peers", 1.0);
        metrics.record("peers", 3.0);
        assert_eq!(metrics.last("peers"), Some(3.0));
        assert_eq!(metrics.last("missing"), None);
    }
}
