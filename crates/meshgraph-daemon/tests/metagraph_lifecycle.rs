// crates/meshgraph-daemon/tests/metagraph_lifecycle.rs
//
// End-to-end lifecycle tests for the metagraph the daemon drives:
// connect, subscribe, repeated sync, weight emission, unsubscribe.
//
// These tests use the public APIs of the library crates directly
// (meshgraph-engine, meshgraph-core) since the daemon is a binary crate with
// no lib.rs. The chain is the in-memory mock with failure injection.

use std::sync::Arc;
use std::time::Duration;

use meshgraph_core::mock::{MockChainClient, MockPeer, RecordingMetrics};
use meshgraph_core::{ChainClient, MeshgraphError, NeuronDescriptor, NeuronInfo, PublicKey, Uid};
use meshgraph_engine::codec::MAX_WEIGHT;
use meshgraph_engine::{Metagraph, MetagraphConfig, PublishOutcome};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn key(b: u8) -> PublicKey {
    PublicKey::new(vec![b; 32])
}

fn info(port: u16) -> NeuronInfo {
    NeuronInfo {
        address: "172.16.0.4".parse().unwrap(),
        port,
        version: "0.1.0".to_string(),
    }
}

struct Node {
    chain: Arc<MockChainClient>,
    metrics: Arc<RecordingMetrics>,
    metagraph: Metagraph,
}

fn node() -> Node {
    let chain = Arc::new(MockChainClient::new(key(0)));
    let metrics = Arc::new(RecordingMetrics::new());
    let neuron = NeuronDescriptor::new(key(0), "127.0.0.1".parse().unwrap(), 8091, "0.1.0");
    let metagraph = Metagraph::new(
        chain.clone(),
        metrics.clone(),
        neuron,
        MetagraphConfig::default(),
    );
    Node {
        chain,
        metrics,
        metagraph,
    }
}

/// Dense index of `pubkey` in `snapshot`.
fn index_of(snapshot: &meshgraph_engine::NetworkSnapshot, pubkey: &PublicKey) -> usize {
    snapshot
        .pubkeys
        .iter()
        .position(|k| k == pubkey)
        .expect("pubkey in snapshot")
}

/// Connect and subscribe, then register `peers` fresh at `block`.
async fn bootstrap(node: &Node, block: u64, peers: &[u8]) {
    assert!(node.metagraph.connect().await);
    assert!(node.metagraph.subscribe(Duration::from_secs(12)).await);
    node.chain.set_block(block);
    for &b in peers {
        node.chain
            .upsert_peer(key(b), MockPeer::new(100 * b as u64, block, info(9000 + b as u16)));
    }
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn resync_without_chain_changes_is_idempotent() {
    let node = node();
    bootstrap(&node, 50, &[1, 2, 3]).await;

    node.metagraph.sync().await.unwrap();
    let first = node.metagraph.snapshot().await;
    node.metagraph.sync().await.unwrap();
    let second = node.metagraph.snapshot().await;

    assert_eq!(*first, *second);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.n, 4);
}

#[tokio::test(start_paused = true)]
async fn uids_are_stable_across_syncs() {
    let node = node();
    bootstrap(&node, 50, &[1, 2]).await;
    node.metagraph.sync().await.unwrap();
    let before = node.metagraph.snapshot().await;

    node.chain
        .upsert_peer(key(3), MockPeer::new(300, 50, info(9003)));
    node.chain.set_peer_stake(&key(1), 999);
    node.metagraph.sync().await.unwrap();
    let after = node.metagraph.snapshot().await;

    for i in 0..before.n {
        assert_eq!(after.pubkeys[i], before.pubkeys[i]);
        assert_eq!(after.uids[i], before.uids[i]);
    }
    assert_eq!(after.n, before.n + 1);
    assert_eq!(after.uids[after.n - 1], Uid(3));
    assert_eq!(after.stake[index_of(&after, &key(1))], 999);
}

#[tokio::test(start_paused = true)]
async fn stale_peers_keep_their_last_known_state() {
    let node = node();
    bootstrap(&node, 50, &[1]).await;
    node.metagraph.sync().await.unwrap();

    // Key 1 stops emitting and changes stake; 100 blocks later it is stale.
    node.chain.set_peer_stake(&key(1), 1);
    node.chain.set_block(150);
    node.metagraph.sync().await.unwrap();

    let snapshot = node.metagraph.snapshot().await;
    assert_eq!(snapshot.block, 150);
    assert_eq!(snapshot.stake[1], 100);
}

#[tokio::test(start_paused = true)]
async fn failing_peer_is_retried_on_next_pass() {
    let node = node();
    bootstrap(&node, 50, &[1, 2]).await;
    node.chain.fail_peer(key(2));

    let report = node.metagraph.sync().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(node.metagraph.snapshot().await.n, 2);

    node.chain.heal_peer(&key(2));
    let report = node.metagraph.sync().await.unwrap();
    assert_eq!(report.failed, 0);
    assert_eq!(node.metagraph.snapshot().await.n, 3);
    assert_eq!(node.metrics.last("metagraph.peers"), Some(3.0));
}

#[tokio::test(start_paused = true)]
async fn peer_weights_show_up_as_normalized_rows() {
    let node = node();
    bootstrap(&node, 50, &[1, 2]).await;
    node.chain
        .set_peer_weights(&key(1), vec![(key(2), 1), (key(0), 3)]);
    node.metagraph.sync().await.unwrap();

    let snapshot = node.metagraph.snapshot().await;
    let row = snapshot.weights.row(index_of(&snapshot, &key(1)));
    assert_eq!(row[0], 0.75);
    assert_eq!(row[index_of(&snapshot, &key(2))], 0.25);
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn emitted_weights_round_trip_through_chain() {
    let node = node();
    bootstrap(&node, 50, &[1, 2, 3]).await;
    node.metagraph.sync().await.unwrap();

    let weights = vec![0.1, 0.2, 0.3, 0.4];
    assert!(node.metagraph.emit(&weights).await.unwrap());

    node.metagraph.sync().await.unwrap();
    let own = node.metagraph.weights().await;
    let tolerance = 2.0 / MAX_WEIGHT as f64;
    for (got, want) in own.iter().zip(&weights) {
        assert!((got - want).abs() <= tolerance, "{} vs {}", got, want);
    }
}

#[tokio::test(start_paused = true)]
async fn emission_timeout_is_reported_as_false() {
    let node = node();
    bootstrap(&node, 50, &[1]).await;
    node.metagraph.sync().await.unwrap();
    node.chain.set_drop_submissions(true);

    let start = tokio::time::Instant::now();
    assert!(!node.metagraph.emit(&[0.5, 0.5]).await.unwrap());
    assert_eq!(start.elapsed(), Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn wrong_length_emission_never_reaches_chain() {
    let node = node();
    bootstrap(&node, 50, &[1, 2, 3, 4]).await;
    node.metagraph.sync().await.unwrap();

    let calls = node.chain.call_count();
    let err = node.metagraph.publish(&[0.2, 0.3, 0.5]).await.unwrap_err();
    assert!(matches!(
        err,
        MeshgraphError::LengthMismatch {
            expected: 5,
            actual: 3
        }
    ));
    assert_eq!(node.chain.call_count(), calls);
}

#[tokio::test(start_paused = true)]
async fn rejected_submission_is_not_retried() {
    let node = node();
    bootstrap(&node, 50, &[]).await;
    node.chain.set_fail_submission(true);

    assert_eq!(
        node.metagraph.publish(&[1.0]).await.unwrap(),
        PublishOutcome::SubmissionFailed
    );
    assert_eq!(node.chain.submission_count(), 1);
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn subscribe_then_unsubscribe_round_trip() {
    let node = node();
    assert!(node.metagraph.connect().await);
    assert!(node.metagraph.subscribe(Duration::from_secs(12)).await);
    let listed = node.chain.neuron_info(&key(0)).await.unwrap().unwrap();
    assert_eq!(listed.port, 8091);

    node.metagraph.unsubscribe(Duration::from_secs(1)).await;
    assert!(node.chain.neuron_info(&key(0)).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn subscribe_times_out_when_chain_ignores_it() {
    let node = node();
    node.chain.set_register_on_subscribe(false);
    let start = tokio::time::Instant::now();
    assert!(!node.metagraph.subscribe(Duration::from_secs(3)).await);
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}
