//! Sorted map over the red-black tree engine.
//!
//! The entry payload is the key followed by the value; the comparator only
//! ever sees the key part. Besides the keyed operations the map exposes a
//! first-class entry handle ([`Entry`]) whose accessors read and overwrite
//! the value in place.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

use super::engine::{NodeId, RedBlackTree, Search};

/// Handle to a map entry. Stays valid until the entry is removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Entry(pub(crate) NodeId);

struct Pair<K, V> {
    key: K,
    value: V,
}

pub struct TreeMap<K, V, F = fn(&K, &K) -> Ordering> {
    tree: RedBlackTree<Pair<K, V>>,
    compare: F,
}

impl<K: Ord, V> TreeMap<K, V> {
    /// Map ordered by `K`'s own ordering.
    pub fn new() -> Self {
        TreeMap { tree: RedBlackTree::new(), compare: K::cmp }
    }
}

impl<K: Ord, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, F: Fn(&K, &K) -> Ordering> TreeMap<K, V, F> {
    /// Map ordered by `compare`, a total order over keys. `compare` must not
    /// call back into this map.
    pub fn with_comparator(compare: F) -> Self {
        TreeMap { tree: RedBlackTree::new(), compare }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn locate(&self, key: &K) -> Search {
        let compare = &self.compare;
        self.tree.find(None, |pair| compare(key, &pair.key))
    }

    /// `KeyAlreadyExists` if an equal key is present.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        let point = match self.locate(&key) {
            Search::Found(_) => return Err(Error::KeyAlreadyExists),
            Search::Miss(point) => point,
        };
        let node = self.tree.alloc(Pair { key, value });
        let compare = &self.compare;
        if let Err(err) = self.tree.insert(point, node, |a, b| compare(&a.key, &b.key)) {
            self.tree.release(node);
            return Err(match err {
                Error::NodeAlreadyExists => Error::KeyAlreadyExists,
                other => other,
            });
        }
        Ok(())
    }

    /// Remove the entry keyed by `key` and hand back its parts.
    pub fn remove(&mut self, key: &K) -> Result<(K, V)> {
        match self.locate(key) {
            Search::Found(node) => {
                self.tree.remove(node)?;
                let pair = self.tree.release(node);
                Ok((pair.key, pair.value))
            }
            Search::Miss(_) => Err(Error::KeyNotFound),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        matches!(self.locate(key), Search::Found(_))
    }

    pub fn get(&self, key: &K) -> Result<&V> {
        self.get_entry(key).map(|entry| &self.tree.payload(entry.0).value)
    }

    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        let entry = self.get_entry(key)?;
        Ok(&mut self.tree.payload_mut(entry.0).value)
    }

    /// Overwrite the value stored under `key` in place. The previous value
    /// is dropped.
    pub fn set(&mut self, key: &K, value: V) -> Result<()> {
        *self.get_mut(key)? = value;
        Ok(())
    }

    /// Smallest stored value whose key is `>= key`.
    pub fn ceiling(&self, key: &K) -> Result<&V> {
        self.ceiling_entry(key).map(|entry| &self.tree.payload(entry.0).value)
    }

    /// Largest stored value whose key is `<= key`.
    pub fn floor(&self, key: &K) -> Result<&V> {
        self.floor_entry(key).map(|entry| &self.tree.payload(entry.0).value)
    }

    /// Smallest stored value whose key is `> key`.
    pub fn higher(&self, key: &K) -> Result<&V> {
        self.higher_entry(key).map(|entry| &self.tree.payload(entry.0).value)
    }

    /// Largest stored value whose key is `< key`.
    pub fn lower(&self, key: &K) -> Result<&V> {
        self.lower_entry(key).map(|entry| &self.tree.payload(entry.0).value)
    }

    pub fn first(&self) -> Result<&V> {
        self.first_entry().map(|entry| &self.tree.payload(entry.0).value)
    }

    pub fn last(&self) -> Result<&V> {
        self.last_entry().map(|entry| &self.tree.payload(entry.0).value)
    }

    // ---- entry handles -----------------------------------------------------

    pub fn get_entry(&self, key: &K) -> Result<Entry> {
        match self.locate(key) {
            Search::Found(node) => Ok(Entry(node)),
            Search::Miss(_) => Err(Error::KeyNotFound),
        }
    }

    fn bound_entry(&self, key: &K, candidate: Option<NodeId>, reject: Ordering) -> Result<Entry> {
        let candidate = candidate.ok_or(Error::KeyNotFound)?;
        if (self.compare)(key, &self.tree.payload(candidate).key) == reject {
            Err(Error::KeyNotFound)
        } else {
            Ok(Entry(candidate))
        }
    }

    pub fn ceiling_entry(&self, key: &K) -> Result<Entry> {
        match self.locate(key) {
            Search::Found(node) => Ok(Entry(node)),
            Search::Miss(candidate) => self.bound_entry(key, candidate, Ordering::Greater),
        }
    }

    pub fn floor_entry(&self, key: &K) -> Result<Entry> {
        match self.locate(key) {
            Search::Found(node) => Ok(Entry(node)),
            Search::Miss(candidate) => self.bound_entry(key, candidate, Ordering::Less),
        }
    }

    pub fn higher_entry(&self, key: &K) -> Result<Entry> {
        match self.locate(key) {
            Search::Found(node) => self.tree.next(node).map(Entry).map_err(|_| Error::KeyNotFound),
            Search::Miss(candidate) => self.bound_entry(key, candidate, Ordering::Greater),
        }
    }

    pub fn lower_entry(&self, key: &K) -> Result<Entry> {
        match self.locate(key) {
            Search::Found(node) => self.tree.prev(node).map(Entry).map_err(|_| Error::KeyNotFound),
            Search::Miss(candidate) => self.bound_entry(key, candidate, Ordering::Less),
        }
    }

    pub fn first_entry(&self) -> Result<Entry> {
        self.tree.first().map(Entry)
    }

    pub fn last_entry(&self) -> Result<Entry> {
        self.tree.last().map(Entry)
    }

    /// Entry with the next larger key.
    pub fn next_entry(&self, entry: Entry) -> Result<Entry> {
        self.tree.next(entry.0).map(Entry)
    }

    /// Entry with the next smaller key.
    pub fn prev_entry(&self, entry: Entry) -> Result<Entry> {
        self.tree.prev(entry.0).map(Entry)
    }

    pub fn key(&self, entry: Entry) -> Result<&K> {
        self.tree.entry(entry.0).map(|pair| &pair.key)
    }

    pub fn value(&self, entry: Entry) -> Result<&V> {
        self.tree.entry(entry.0).map(|pair| &pair.value)
    }

    pub fn value_mut(&mut self, entry: Entry) -> Result<&mut V> {
        self.tree.entry_mut(entry.0).map(|pair| &mut pair.value)
    }

    /// Overwrite the value behind `entry` in place.
    pub fn set_value(&mut self, entry: Entry, value: V) -> Result<()> {
        *self.value_mut(entry)? = value;
        Ok(())
    }

    /// Remove the entry behind a previously obtained handle. No comparator
    /// lookup happens.
    pub fn remove_entry(&mut self, entry: Entry) -> Result<(K, V)> {
        self.tree.remove(entry.0)?;
        let pair = self.tree.release(entry.0);
        Ok((pair.key, pair.value))
    }

    /// `(key, value)` pairs in comparator order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.tree.iter().map(|(_, pair)| (&pair.key, &pair.value))
    }

    /// Visit every entry with `on_destroy`, then reset the map to empty.
    pub fn invalidate(&mut self, mut on_destroy: impl FnMut(&K, &V)) {
        self.tree.clear(|pair| on_destroy(&pair.key, &pair.value));
    }

    pub fn clear(&mut self) {
        self.tree.clear(|_| ());
    }
}

impl<K: fmt::Debug, V: fmt::Debug, F: Fn(&K, &K) -> Ordering> fmt::Debug for TreeMap<K, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
impl<K, V, F: Fn(&K, &K) -> Ordering> TreeMap<K, V, F> {
    fn dbg_check(&self) {
        self.tree.dbg_check();
        let keys: Vec<&K> = self.iter().map(|(key, _)| key).collect();
        for pair in keys.windows(2) {
            assert_eq!((self.compare)(pair[0], pair[1]), Ordering::Less, "out of order");
        }
    }
}
