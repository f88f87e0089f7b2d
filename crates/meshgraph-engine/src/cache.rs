// crates/meshgraph-engine/src/cache.rs
//
// Peer cache: one record per dense index, kept in lock-step with the
// identity index.

use std::sync::Arc;

use meshgraph_core::{NeuronDescriptor, PublicKey};

use crate::index::IdentityIndex;

/// Everything the engine remembers about one peer.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    /// Stake held by the peer.
    pub stake: u64,
    /// Block of the peer's last emission.
    pub last_emission: u64,
    /// Outgoing weights as reported by the chain, unnormalized.
    pub weights: Vec<(PublicKey, u32)>,
    /// Current endpoint descriptor. Shared with snapshots.
    pub neuron: Arc<NeuronDescriptor>,
}

/// Mutable store of peer records indexed by dense index.
///
/// `records[i]` always describes `index.pubkey_of(i)`. Records are only
/// appended (for new identities) or replaced wholesale (for known ones).
#[derive(Debug, Clone)]
pub struct PeerCache {
    index: IdentityIndex,
    records: Vec<PeerRecord>,
}

impl PeerCache {
    /// Create a cache seeded with the local peer at index 0, uid 0.
    ///
    /// The local peer starts with zero stake and all of its weight on
    /// itself.
    pub fn new(self_neuron: NeuronDescriptor) -> Self {
        let mut index = IdentityIndex::new();
        let self_key = self_neuron.public_key.clone();
        index.resolve_or_allocate(&self_key);
        Self {
            index,
            records: vec![PeerRecord {
                stake: 0,
                last_emission: 0,
                weights: vec![(self_key, 1)],
                neuron: Arc::new(self_neuron),
            }],
        }
    }

    /// Store `record` for `pubkey`, allocating an index for unseen keys.
    ///
    /// Returns the dense index and whether the peer was newly added.
    pub fn upsert(&mut self, pubkey: &PublicKey, record: PeerRecord) -> (usize, bool) {
        let (index, is_new) = self.index.resolve_or_allocate(pubkey);
        if is_new {
            debug_assert_eq!(index, self.records.len());
            self.records.push(record);
        } else {
            self.records[index] = record;
        }
        (index, is_new)
    }

    pub fn index(&self) -> &IdentityIndex {
        &self.index
    }

    pub fn get(&self, index: usize) -> Option<&PeerRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[PeerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgraph_core::Uid;

    fn key(b: u8) -> PublicKey {
        PublicKey::new(vec![b; 4])
    }

    fn neuron(b: u8) -> NeuronDescriptor {
        NeuronDescriptor::new(key(b), "127.0.0.1".parse().unwrap(), 8000 + b as u16, "0.1.0")
    }

    fn record(b: u8, stake: u64) -> PeerRecord {
        PeerRecord {
            stake,
            last_emission: 10,
            weights: Vec::new(),
            neuron: Arc::new(neuron(b)),
        }
    }

    #[test]
    fn seeds_self_at_index_zero() {
        let cache = PeerCache::new(neuron(0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.index().index_of(&key(0)).unwrap(), 0);
        assert_eq!(cache.index().uid_of(0), Some(Uid(0)));
        assert_eq!(cache.get(0).unwrap().weights, vec![(key(0), 1)]);
    }

    #[test]
    fn upsert_appends_new_and_replaces_known() {
        let mut cache = PeerCache::new(neuron(0));
        assert_eq!(cache.upsert(&key(1), record(1, 5)), (1, true));
        assert_eq!(cache.upsert(&key(1), record(1, 7)), (1, false));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1).unwrap().stake, 7);
    }

    #[test]
    fn self_update_keeps_index_zero() {
        let mut cache = PeerCache::new(neuron(0));
        cache.upsert(&key(1), record(1, 5));
        assert_eq!(cache.upsert(&key(0), record(0, 99)), (0, false));
        assert_eq!(cache.get(0).unwrap().stake, 99);
        assert_eq!(cache.len(), cache.index().len());
    }
}
