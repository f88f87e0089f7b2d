// crates/meshgraph-engine/src/snapshot.rs
//
// Immutable point-in-time view of the metagraph, built from the peer cache
// after a sync pass reaches CacheConsistent.

use std::collections::HashMap;
use std::sync::Arc;

use meshgraph_core::{MeshgraphError, NeuronDescriptor, PublicKey, Uid};

use crate::cache::PeerCache;
use crate::codec::normalize_row;
use crate::weights::WeightMatrix;

/// Consistent network state at one block.
///
/// All per-peer vectors are indexed by dense index and have length `n`.
/// Row 0 of the weight matrix holds this node's weights. Neuron descriptors
/// are shared with the cache through `Arc`, not copied.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSnapshot {
    /// Block of the sync that produced this snapshot.
    pub block: u64,
    /// Number of peers.
    pub n: usize,
    /// Stable uid per dense index.
    pub uids: Vec<Uid>,
    /// Dense indices, `0..n`.
    pub indices: Vec<usize>,
    /// Public key per dense index.
    pub pubkeys: Vec<PublicKey>,
    /// Stake per dense index.
    pub stake: Vec<u64>,
    /// Last emission block per dense index.
    pub last_emission: Vec<u64>,
    /// Row-normalized weight matrix, n×n.
    pub weights: WeightMatrix,
    /// Endpoint descriptor per dense index.
    pub neurons: Vec<Arc<NeuronDescriptor>>,
    /// Uid -> dense index.
    index_for_uid: HashMap<Uid, usize>,
}

impl NetworkSnapshot {
    /// Build a snapshot from a consistent cache.
    ///
    /// Row `i` of the weight matrix is peer `i`'s weight list, restricted to
    /// targets the index knows about and normalized to sum to 1.0. Targets
    /// that are not (yet) known are dropped.
    ///
    /// # Panics
    /// If the cache's records and identity index disagree in length. That
    /// can only happen through a bug in the cache itself.
    pub fn build(cache: &PeerCache, block: u64) -> Self {
        let index = cache.index();
        let records = cache.records();
        let n = index.len();
        assert_eq!(
            records.len(),
            n,
            "peer cache out of step with identity index ({} records, {} identities)",
            records.len(),
            n
        );

        let rows: Vec<Vec<f64>> = records
            .iter()
            .map(|record| {
                normalize_row(
                    n,
                    record
                        .weights
                        .iter()
                        .filter_map(|(target, value)| {
                            index.index_of(target).ok().map(|j| (j, *value))
                        }),
                )
            })
            .collect();

        Self {
            block,
            n,
            uids: index.uids().to_vec(),
            indices: (0..n).collect(),
            pubkeys: index.pubkeys().to_vec(),
            stake: records.iter().map(|r| r.stake).collect(),
            last_emission: records.iter().map(|r| r.last_emission).collect(),
            weights: WeightMatrix::from_rows(rows),
            neurons: records.iter().map(|r| r.neuron.clone()).collect(),
            index_for_uid: index
                .uids()
                .iter()
                .enumerate()
                .map(|(i, uid)| (*uid, i))
                .collect(),
        }
    }

    /// This node's normalized weights (row 0).
    pub fn weights(&self) -> &[f64] {
        self.weights.row(0)
    }

    /// Normalized outgoing weights of the peer at dense index `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        self.weights.row(i)
    }

    /// Dense indices for the given uids, in the same order.
    ///
    /// Fails with `NotFound` if any uid is not part of this snapshot.
    pub fn uids_to_indices(&self, uids: &[Uid]) -> Result<Vec<usize>, MeshgraphError> {
        uids.iter()
            .map(|uid| {
                self.index_for_uid.get(uid).copied().ok_or_else(|| {
                    MeshgraphError::NotFound(format!("uid {} not in metagraph", uid))
                })
            })
            .collect()
    }

    /// Descriptors for the given uids, in the same order.
    pub fn uids_to_neurons(
        &self,
        uids: &[Uid],
    ) -> Result<Vec<Arc<NeuronDescriptor>>, MeshgraphError> {
        Ok(self
            .uids_to_indices(uids)?
            .into_iter()
            .map(|i| self.neurons[i].clone())
            .collect())
    }

    /// Fail with `LengthMismatch` unless `weights` has one entry per peer.
    pub fn check_weight_len(&self, weights: &[f64]) -> Result<(), MeshgraphError> {
        if weights.len() != self.n {
            return Err(MeshgraphError::LengthMismatch {
                expected: self.n,
                actual: weights.len(),
            });
        }
        Ok(())
    }
}
