//! Sorted set of by-value keys.
//!
//! A thin adapter over the tree engine: the entry payload *is* the key, and
//! every lookup hands the engine a closure pairing the stored comparator
//! with the borrowed probe key, so probes are never copied into a temporary
//! entry.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

use super::engine::{RedBlackTree, Search};
use super::Item;

pub struct TreeSet<K, F = fn(&K, &K) -> Ordering> {
    tree: RedBlackTree<K>,
    compare: F,
}

impl<K: Ord> TreeSet<K> {
    /// Set ordered by `K`'s own ordering.
    pub fn new() -> Self {
        TreeSet { tree: RedBlackTree::new(), compare: K::cmp }
    }
}

impl<K: Ord> Default for TreeSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, F: Fn(&K, &K) -> Ordering> TreeSet<K, F> {
    /// Set ordered by `compare`, which must be a total order over keys.
    /// `compare` must not call back into this set.
    pub fn with_comparator(compare: F) -> Self {
        TreeSet { tree: RedBlackTree::new(), compare }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn locate(&self, key: &K) -> Search {
        let compare = &self.compare;
        self.tree.find(None, |stored| compare(key, stored))
    }

    /// `KeyAlreadyExists` if an equal key is present.
    pub fn add(&mut self, key: K) -> Result<()> {
        let point = match self.locate(&key) {
            Search::Found(_) => return Err(Error::KeyAlreadyExists),
            Search::Miss(point) => point,
        };
        let node = self.tree.alloc(key);
        let compare = &self.compare;
        if let Err(err) = self.tree.insert(point, node, |a, b| compare(a, b)) {
            // Reachable only through an inconsistent comparator.
            self.tree.release(node);
            return Err(match err {
                Error::NodeAlreadyExists => Error::KeyAlreadyExists,
                other => other,
            });
        }
        Ok(())
    }

    /// Remove the key equal to `key` and hand it back. `KeyNotFound` if
    /// absent.
    pub fn remove(&mut self, key: &K) -> Result<K> {
        match self.locate(key) {
            Search::Found(node) => {
                self.tree.remove(node)?;
                Ok(self.tree.release(node))
            }
            Search::Miss(_) => Err(Error::KeyNotFound),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        matches!(self.locate(key), Search::Found(_))
    }

    /// Borrow the stored key equal to `key` - useful when the probe merely
    /// compares equal but is not the stored representation.
    pub fn get(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => self.tree.entry(node),
            Search::Miss(_) => Err(Error::ItemNotFound),
        }
    }

    /// On a miss, the insertion point is one of the probe's two in-order
    /// neighbours; `reject` says which side disqualifies it.
    fn bound(&self, key: &K, candidate: Option<super::NodeId>, reject: Ordering) -> Result<&K> {
        let candidate = candidate.ok_or(Error::ItemNotFound)?;
        let stored = self.tree.entry(candidate)?;
        if (self.compare)(key, stored) == reject {
            Err(Error::ItemNotFound)
        } else {
            Ok(stored)
        }
    }

    /// Smallest stored key `>= key`.
    pub fn ceiling(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => self.tree.entry(node),
            Search::Miss(candidate) => self.bound(key, candidate, Ordering::Greater),
        }
    }

    /// Largest stored key `<= key`.
    pub fn floor(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => self.tree.entry(node),
            Search::Miss(candidate) => self.bound(key, candidate, Ordering::Less),
        }
    }

    /// Smallest stored key `> key`.
    pub fn higher(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => {
                let next = self.tree.next(node).map_err(|_| Error::ItemNotFound)?;
                self.tree.entry(next)
            }
            Search::Miss(candidate) => self.bound(key, candidate, Ordering::Greater),
        }
    }

    /// Largest stored key `< key`.
    pub fn lower(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => {
                let prev = self.tree.prev(node).map_err(|_| Error::ItemNotFound)?;
                self.tree.entry(prev)
            }
            Search::Miss(candidate) => self.bound(key, candidate, Ordering::Less),
        }
    }

    pub fn first(&self) -> Result<&K> {
        let id = self.tree.first()?;
        self.tree.entry(id)
    }

    pub fn last(&self) -> Result<&K> {
        let id = self.tree.last()?;
        self.tree.entry(id)
    }

    /// Handle to the entry equal to `key`.
    pub fn item(&self, key: &K) -> Result<Item> {
        match self.locate(key) {
            Search::Found(node) => Ok(Item(node)),
            Search::Miss(_) => Err(Error::ItemNotFound),
        }
    }

    pub fn key(&self, item: Item) -> Result<&K> {
        self.tree.entry(item.0)
    }

    pub fn first_item(&self) -> Result<Item> {
        self.tree.first().map(Item)
    }

    pub fn last_item(&self) -> Result<Item> {
        self.tree.last().map(Item)
    }

    /// Handle to the in-order successor of `item`.
    pub fn next(&self, item: Item) -> Result<Item> {
        self.tree.next(item.0).map(Item)
    }

    /// Handle to the in-order predecessor of `item`.
    pub fn prev(&self, item: Item) -> Result<Item> {
        self.tree.prev(item.0).map(Item)
    }

    /// Remove the entry behind a previously obtained handle. No comparator
    /// lookup happens.
    pub fn remove_item(&mut self, item: Item) -> Result<K> {
        self.tree.remove(item.0)?;
        Ok(self.tree.release(item.0))
    }

    /// Keys in comparator order.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.tree.iter().map(|(_, key)| key)
    }

    /// Visit every key with `on_destroy`, then reset the set to empty.
    pub fn invalidate(&mut self, mut on_destroy: impl FnMut(&K)) {
        self.tree.clear(|key| on_destroy(&key));
    }

    pub fn clear(&mut self) {
        self.tree.clear(|_| ());
    }
}

impl<K: fmt::Debug, F: Fn(&K, &K) -> Ordering> fmt::Debug for TreeSet<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
impl<K, F: Fn(&K, &K) -> Ordering> TreeSet<K, F> {
    fn dbg_check(&self) {
        self.tree.dbg_check();
        let mut iter = self.iter();
        if let Some(mut prev) = iter.next() {
            for key in iter {
                assert_eq!((self.compare)(prev, key), Ordering::Less, "out of order");
                prev = key;
            }
        }
    }
}
