//! Deferred add/remove collection
//!
//! Staged membership container used for scene entities and background tasks.
//! Add and remove requests accumulate in pending lists and are applied in a
//! single `commit()` step at the start of the next frame. Between commits the
//! committed set is never resized, so iterating a snapshot of it while
//! issuing further requests is always safe.

use std::collections::HashMap;
use std::hash::Hash;

/// Membership phase of a key known to a [`DeferredList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PendingAdd,
    Committed,
    PendingRemove,
}

/// Keys applied by a single `commit()` step, in request order
#[derive(Debug, Default)]
pub struct CommitBatch<K> {
    /// Keys moved from pending-add to committed
    pub added: Vec<K>,
    /// Keys evicted from the committed set
    pub removed: Vec<K>,
}

impl<K> CommitBatch<K> {
    /// True when the commit applied no changes
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Staged add/remove membership list
///
/// Requests are idempotent: adding a key that is already pending or committed
/// is a no-op, as is removing a key that is not committed or already pending
/// removal.
#[derive(Debug)]
pub struct DeferredList<K: Copy + Eq + Hash> {
    committed: Vec<K>,
    pending_add: Vec<K>,
    pending_remove: Vec<K>,
    phase: HashMap<K, Phase>,
}

impl<K: Copy + Eq + Hash> Default for DeferredList<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> DeferredList<K> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            committed: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
            phase: HashMap::new(),
        }
    }

    /// Request that a key join the committed set at the next commit
    ///
    /// Returns false (and does nothing) if the key is already pending or
    /// committed.
    pub fn request_add(&mut self, key: K) -> bool {
        if self.phase.contains_key(&key) {
            return false;
        }
        self.phase.insert(key, Phase::PendingAdd);
        self.pending_add.push(key);
        true
    }

    /// Request that a committed key leave the set at the next commit
    ///
    /// Only effective for keys that are currently committed and not already
    /// pending removal.
    pub fn request_remove(&mut self, key: K) -> bool {
        match self.phase.get(&key) {
            Some(Phase::Committed) => {
                self.phase.insert(key, Phase::PendingRemove);
                self.pending_remove.push(key);
                true
            }
            _ => false,
        }
    }

    /// Apply all pending adds and removes, exactly once
    ///
    /// Returns the applied keys so the owner can fire attach/detach hooks and
    /// update any secondary indices. Must be called at a defined sync point,
    /// before the committed set is iterated for the frame.
    pub fn commit(&mut self) -> CommitBatch<K> {
        let added: Vec<K> = self.pending_add.drain(..).collect();
        let removed: Vec<K> = self.pending_remove.drain(..).collect();

        for key in &removed {
            self.phase.remove(key);
            if let Some(index) = self.committed.iter().position(|k| k == key) {
                self.committed.remove(index);
            }
        }
        for key in &added {
            self.phase.insert(*key, Phase::Committed);
            self.committed.push(*key);
        }

        CommitBatch { added, removed }
    }

    /// The committed set, in commit order
    pub fn committed(&self) -> &[K] {
        &self.committed
    }

    /// Number of committed keys
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    /// True when no keys are committed
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// True when the key is committed (pending keys are not yet members)
    pub fn contains(&self, key: K) -> bool {
        matches!(
            self.phase.get(&key),
            Some(Phase::Committed | Phase::PendingRemove)
        )
    }

    /// True when the key is waiting to join at the next commit
    pub fn is_pending(&self, key: K) -> bool {
        matches!(self.phase.get(&key), Some(Phase::PendingAdd))
    }

    /// True when the key is waiting to leave at the next commit
    pub fn is_pending_removal(&self, key: K) -> bool {
        matches!(self.phase.get(&key), Some(Phase::PendingRemove))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_deferred_until_commit() {
        let mut list = DeferredList::new();
        assert!(list.request_add(7u32));
        assert!(list.is_pending(7));
        assert!(!list.contains(7));
        assert_eq!(list.len(), 0);

        let batch = list.commit();
        assert_eq!(batch.added, vec![7]);
        assert!(list.contains(7));
        assert_eq!(list.committed(), &[7]);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut list = DeferredList::new();
        assert!(list.request_add(1u32));
        assert!(!list.request_add(1));

        let batch = list.commit();
        assert_eq!(batch.added, vec![1]);

        // Re-adding a committed key is also a no-op
        assert!(!list.request_add(1));
        assert!(list.commit().is_empty());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent_and_requires_commitment() {
        let mut list = DeferredList::new();
        list.request_add(1u32);

        // Not committed yet, so removal is ineffective
        assert!(!list.request_remove(1));
        list.commit();

        assert!(list.request_remove(1));
        assert!(!list.request_remove(1));

        let batch = list.commit();
        assert_eq!(batch.removed, vec![1]);
        assert!(!list.contains(1));
        assert!(list.is_empty());
    }

    #[test]
    fn test_committed_set_is_stable_between_commits() {
        let mut list = DeferredList::new();
        for key in 0u32..4 {
            list.request_add(key);
        }
        list.commit();

        // Issue requests mid-"iteration": the committed slice must not resize
        let before = list.committed().to_vec();
        list.request_remove(2);
        list.request_add(9);
        assert_eq!(list.committed(), before.as_slice());

        let batch = list.commit();
        assert_eq!(batch.added, vec![9]);
        assert_eq!(batch.removed, vec![2]);
        assert_eq!(list.committed(), &[0, 1, 3, 9]);
    }

    #[test]
    fn test_commit_preserves_request_order() {
        let mut list = DeferredList::new();
        list.request_add(3u32);
        list.request_add(1);
        list.request_add(2);

        let batch = list.commit();
        assert_eq!(batch.added, vec![3, 1, 2]);
        assert_eq!(list.committed(), &[3, 1, 2]);
    }
}
