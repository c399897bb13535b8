//! Bitmask tag index
//!
//! Up to 32 independent boolean tags per entity, with one membership list per
//! tag bit. Lists support O(1) insert/erase and lazy, stable depth-sorting by
//! update-order: a list is only re-sorted when its dirty flag is set, and
//! entities sharing an update-order keep their relative insertion order so
//! repeated sorts never flicker.

use bitflags::bitflags;

use super::entity::EntityKey;
use super::SceneError;

bitflags! {
    /// Fixed-width set of boolean tags
    ///
    /// Bits carry no engine-assigned meaning; applications define their own
    /// vocabulary via [`TagMask::bit`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TagMask: u32 {}
}

impl TagMask {
    /// Number of independent tags the mask can hold
    pub const WIDTH: u32 = 32;

    /// The mask with only the given bit set
    ///
    /// Exceeding the mask width is a configuration error at startup, never a
    /// runtime condition, so this surfaces it explicitly.
    pub fn bit(index: u8) -> Result<Self, SceneError> {
        if u32::from(index) >= Self::WIDTH {
            return Err(SceneError::TagOutOfRange(index));
        }
        Ok(Self::from_bits_retain(1 << index))
    }

    /// Iterator over the bit indices set in this mask
    pub fn indices(self) -> impl Iterator<Item = u8> {
        let bits = self.bits();
        (0..Self::WIDTH as u8).filter(move |i| bits & (1 << i) != 0)
    }
}

/// Membership list for a single tag bit
#[derive(Debug, Default)]
struct TagBucket {
    /// Members with their insertion sequence, used as the stable tie-breaker
    members: Vec<(EntityKey, u64)>,
    dirty: bool,
}

/// Per-bit membership lists kept consistent with entity tag masks
#[derive(Debug)]
pub struct TagIndex {
    buckets: Vec<TagBucket>,
    next_seq: u64,
    /// Cached key-only view returned by `members`/`sorted`
    view: Vec<EntityKey>,
}

impl Default for TagIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TagIndex {
    /// Create an index with one bucket per tag bit
    pub fn new() -> Self {
        Self {
            buckets: (0..TagMask::WIDTH).map(|_| TagBucket::default()).collect(),
            next_seq: 0,
            view: Vec::new(),
        }
    }

    /// Record that an entity now carries every bit in `mask`
    pub fn insert(&mut self, key: EntityKey, mask: TagMask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        for bit in mask.indices() {
            let bucket = &mut self.buckets[bit as usize];
            bucket.members.push((key, seq));
            bucket.dirty = true;
        }
    }

    /// Record that an entity no longer carries any bit in `mask`
    pub fn remove(&mut self, key: EntityKey, mask: TagMask) {
        for bit in mask.indices() {
            let bucket = &mut self.buckets[bit as usize];
            if let Some(index) = bucket.members.iter().position(|(k, _)| *k == key) {
                bucket.members.swap_remove(index);
                bucket.dirty = true;
            }
        }
    }

    /// Apply a tag mask change for an entity already in the index
    pub fn update(&mut self, key: EntityKey, old: TagMask, new: TagMask) {
        self.remove(key, old - new);
        self.insert(key, new - old);
    }

    /// Mark the lists for every bit in `mask` as needing a re-sort
    ///
    /// Called when a member's update-order changes.
    pub fn mark_dirty(&mut self, mask: TagMask) {
        for bit in mask.indices() {
            self.buckets[bit as usize].dirty = true;
        }
    }

    /// Members of a tag bit in unspecified order
    pub fn members(&mut self, bit: u8) -> Result<&[EntityKey], SceneError> {
        if u32::from(bit) >= TagMask::WIDTH {
            return Err(SceneError::TagOutOfRange(bit));
        }
        let bucket = &self.buckets[bit as usize];
        self.view.clear();
        self.view.extend(bucket.members.iter().map(|(k, _)| *k));
        Ok(&self.view)
    }

    /// Members of a tag bit, depth-sorted by update-order
    ///
    /// Re-sorts only when the list is dirty; otherwise the cached order is
    /// returned. The sort is stable: equal update-orders keep their insertion
    /// order.
    pub fn sorted<F>(&mut self, bit: u8, update_order: F) -> Result<&[EntityKey], SceneError>
    where
        F: Fn(EntityKey) -> i32,
    {
        if u32::from(bit) >= TagMask::WIDTH {
            return Err(SceneError::TagOutOfRange(bit));
        }
        let bucket = &mut self.buckets[bit as usize];
        if bucket.dirty {
            bucket
                .members
                .sort_by_key(|(key, seq)| (update_order(*key), *seq));
            bucket.dirty = false;
            log::trace!("tag bucket {} re-sorted ({} members)", bit, bucket.members.len());
        }
        self.view.clear();
        self.view.extend(bucket.members.iter().map(|(k, _)| *k));
        Ok(&self.view)
    }

    /// Number of members carrying the given bit
    pub fn count(&self, bit: u8) -> usize {
        self.buckets
            .get(bit as usize)
            .map_or(0, |b| b.members.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::collections::HashMap;

    fn keys(n: usize) -> Vec<EntityKey> {
        let mut arena: SlotMap<EntityKey, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn test_bit_out_of_range_is_an_error() {
        assert!(TagMask::bit(31).is_ok());
        assert!(matches!(TagMask::bit(32), Err(SceneError::TagOutOfRange(32))));
    }

    #[test]
    fn test_membership_follows_mask_updates() {
        let mut index = TagIndex::new();
        let k = keys(1)[0];

        index.insert(k, TagMask::bit(0).unwrap());
        assert_eq!(index.count(0), 1);
        assert_eq!(index.count(1), 0);

        // 0b01 -> 0b11: bit 1 gains the entity, bit 0 keeps it
        let old = TagMask::bit(0).unwrap();
        let new = old | TagMask::bit(1).unwrap();
        index.update(k, old, new);
        assert_eq!(index.count(0), 1);
        assert_eq!(index.count(1), 1);

        index.remove(k, new);
        assert_eq!(index.count(0), 0);
        assert_eq!(index.count(1), 0);
    }

    #[test]
    fn test_sort_is_stable_for_equal_orders() {
        let mut index = TagIndex::new();
        let ks = keys(4);
        let orders: HashMap<EntityKey, i32> =
            ks.iter().copied().zip([3, 1, 3, 2]).collect();

        for &k in &ks {
            index.insert(k, TagMask::bit(0).unwrap());
        }

        let sorted = index.sorted(0, |k| orders[&k]).unwrap().to_vec();
        // [3, 1, 3, 2] sorts to [1, 2, 3, 3] with the two 3s keeping their
        // original relative insertion order
        assert_eq!(sorted, vec![ks[1], ks[3], ks[0], ks[2]]);
    }

    #[test]
    fn test_sorted_is_cached_until_dirty() {
        let mut index = TagIndex::new();
        let ks = keys(3);
        let orders: HashMap<EntityKey, i32> =
            ks.iter().copied().zip([2, 0, 1]).collect();

        for &k in &ks {
            index.insert(k, TagMask::bit(5).unwrap());
        }

        let first = index.sorted(5, |k| orders[&k]).unwrap().to_vec();
        assert_eq!(first, vec![ks[1], ks[2], ks[0]]);

        // With the bucket clean, a conflicting order function is ignored
        let cached = index.sorted(5, |_| 0).unwrap().to_vec();
        assert_eq!(cached, first);

        // Dirtying forces a re-sort with the new orders
        index.mark_dirty(TagMask::bit(5).unwrap());
        let resorted = index.sorted(5, |k| -orders[&k]).unwrap().to_vec();
        assert_eq!(resorted, vec![ks[0], ks[2], ks[1]]);
    }
}
