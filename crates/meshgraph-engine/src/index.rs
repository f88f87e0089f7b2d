// crates/meshgraph-engine/src/index.rs
//
// Identity index: the bijection between public keys, stable uids, and dense
// matrix indices.
//
// Dense indices are contiguous in [0, n) and only ever grow by append.
// Uids are handed out from a monotonic counter and never reused. Nothing is
// ever removed.

use std::collections::HashMap;

use meshgraph_core::{MeshgraphError, PublicKey, Uid};

/// Bidirectional mapping between public keys, uids, and dense indices.
///
/// All mappings are updated together inside [`IdentityIndex::resolve_or_allocate`],
/// which is the only way to grow the index.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    /// Dense index -> public key.
    pubkeys: Vec<PublicKey>,
    /// Dense index -> uid.
    uids: Vec<Uid>,
    /// Public key -> dense index.
    index_for_pubkey: HashMap<PublicKey, usize>,
    /// Uid -> dense index.
    index_for_uid: HashMap<Uid, usize>,
    /// Next uid to hand out.
    next_uid: u64,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the dense index of `pubkey`, allocating a new index and uid
    /// if it has never been seen. The flag is `true` for a fresh allocation.
    pub fn resolve_or_allocate(&mut self, pubkey: &PublicKey) -> (usize, bool) {
        if let Some(&index) = self.index_for_pubkey.get(pubkey) {
            return (index, false);
        }

        let index = self.pubkeys.len();
        let uid = Uid(self.next_uid);
        self.next_uid += 1;

        self.pubkeys.push(pubkey.clone());
        self.uids.push(uid);
        self.index_for_pubkey.insert(pubkey.clone(), index);
        self.index_for_uid.insert(uid, index);

        (index, true)
    }

    /// Dense index of a known public key.
    pub fn index_of(&self, pubkey: &PublicKey) -> Result<usize, MeshgraphError> {
        self.index_for_pubkey
            .get(pubkey)
            .copied()
            .ok_or_else(|| MeshgraphError::NotFound(format!("public key {}", pubkey)))
    }

    /// Dense index of a known uid.
    pub fn index_of_uid(&self, uid: Uid) -> Result<usize, MeshgraphError> {
        self.index_for_uid
            .get(&uid)
            .copied()
            .ok_or_else(|| MeshgraphError::NotFound(format!("uid {}", uid)))
    }

    pub fn pubkey_of(&self, index: usize) -> Option<&PublicKey> {
        self.pubkeys.get(index)
    }

    pub fn uid_of(&self, index: usize) -> Option<Uid> {
        self.uids.get(index).copied()
    }

    pub fn contains(&self, pubkey: &PublicKey) -> bool {
        self.index_for_pubkey.contains_key(pubkey)
    }

    /// Number of known identities (`n`).
    pub fn len(&self) -> usize {
        self.pubkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pubkeys.is_empty()
    }

    /// Public keys ordered by dense index.
    pub fn pubkeys(&self) -> &[PublicKey] {
        &self.pubkeys
    }

    /// Uids ordered by dense index.
    pub fn uids(&self) -> &[Uid] {
        &self.uids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(b: u8) -> PublicKey {
        PublicKey::new(vec![b; 8])
    }

    #[test]
    fn first_allocation_is_index_zero_uid_zero() {
        let mut index = IdentityIndex::new();
        assert_eq!(index.resolve_or_allocate(&key(9)), (0, true));
        assert_eq!(index.uid_of(0), Some(Uid(0)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn known_key_resolves_without_allocating() {
        let mut index = IdentityIndex::new();
        index.resolve_or_allocate(&key(1));
        index.resolve_or_allocate(&key(2));
        assert_eq!(index.resolve_or_allocate(&key(1)), (0, false));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn mappings_stay_bijective() {
        let mut index = IdentityIndex::new();
        for b in [5, 3, 5, 8, 1, 3, 9] {
            index.resolve_or_allocate(&key(b));
        }
        assert_eq!(index.len(), 5);
        for i in 0..index.len() {
            let pubkey = index.pubkey_of(i).unwrap().clone();
            assert_eq!(index.index_of(&pubkey).unwrap(), i);
            let uid = index.uid_of(i).unwrap();
            assert_eq!(index.index_of_uid(uid).unwrap(), i);
        }
        let mut uids = index.uids().to_vec();
        uids.sort();
        uids.dedup();
        assert_eq!(uids.len(), index.len());
    }

    #[test]
    fn uids_increase_with_allocation_order() {
        let mut index = IdentityIndex::new();
        for b in 0..4 {
            index.resolve_or_allocate(&key(b));
        }
        assert_eq!(index.uids(), &[Uid(0), Uid(1), Uid(2), Uid(3)]);
    }

    #[test]
    fn unknown_key_is_not_found() {
        let index = IdentityIndex::new();
        assert!(matches!(
            index.index_of(&key(4)),
            Err(MeshgraphError::NotFound(_))
        ));
        assert!(index.index_of_uid(Uid(3)).is_err());
        assert!(index.pubkey_of(0).is_none());
    }
}
