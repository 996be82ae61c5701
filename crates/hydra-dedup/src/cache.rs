//! A capped, insertion-order-evicting map used as an LRU cache. No access-time
//! promotion: only
//! insertion order determines what gets evicted when the cap is hit.

use indexmap::IndexMap;
use std::hash::Hash;

pub struct OrderedCache<K, V> {
    entries: IndexMap<K, V>,
    capacity: usize,
}

impl<K, V> OrderedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Insert `key -> value`. If `key` already exists, its value is
    /// overwritten but its position is left unchanged (inserting again is
    /// not a "fresh" insertion). Evicts the oldest entry if over capacity.
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
        while self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0);
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut c: OrderedCache<u32, ()> = OrderedCache::new(3);
        c.insert(1, ());
        c.insert(2, ());
        c.insert(3, ());
        c.insert(4, ());
        assert_eq!(c.len(), 3);
        assert!(!c.contains(&1));
        assert!(c.contains(&2));
        assert!(c.contains(&4));
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut c: OrderedCache<u32, ()> = OrderedCache::new(5);
        for i in 0..100 {
            c.insert(i, ());
        }
        assert_eq!(c.len(), 5);
    }
}
