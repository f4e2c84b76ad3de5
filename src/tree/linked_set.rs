//! Sorted set with an overlaid insertion-order ring.
//!
//! Every entry carries both a tree node and a circular-ring link. The tree
//! side answers comparator queries (`contains`, `ceiling`, ...); the ring
//! side records the order entries were put in, independent of how they sort.
//! A head pointer names the current first ring position; new entries are
//! spliced immediately before the head, which is the tail position when
//! iterating from the head.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::list::{self, Link, Ring};

use super::engine::{NodeId, RedBlackTree, Search};
use super::Item;

struct LinkedEntry<K> {
    key: K,
    link: Link,
}

pub struct LinkedTreeSet<K, F = fn(&K, &K) -> Ordering> {
    tree: RedBlackTree<LinkedEntry<K>>,
    head: Option<NodeId>,
    compare: F,
}

impl<K> Ring for RedBlackTree<LinkedEntry<K>> {
    fn link(&self, at: usize) -> &Link {
        &self.payload(NodeId(at)).link
    }

    fn link_mut(&mut self, at: usize) -> &mut Link {
        &mut self.payload_mut(NodeId(at)).link
    }
}

impl<K: Ord> LinkedTreeSet<K> {
    pub fn new() -> Self {
        LinkedTreeSet { tree: RedBlackTree::new(), head: None, compare: K::cmp }
    }
}

impl<K: Ord> Default for LinkedTreeSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, F: Fn(&K, &K) -> Ordering> LinkedTreeSet<K, F> {
    /// Set ordered by `compare`, a total order over keys. `compare` must not
    /// call back into this set.
    pub fn with_comparator(compare: F) -> Self {
        LinkedTreeSet { tree: RedBlackTree::new(), head: None, compare }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn locate(&self, key: &K) -> Search {
        let compare = &self.compare;
        self.tree.find(None, |entry| compare(key, &entry.key))
    }

    /// Tree insertion shared by every flavour of add. The new node comes
    /// back as a singleton ring; the caller splices it.
    fn add_node(&mut self, key: K) -> Result<NodeId> {
        let point = match self.locate(&key) {
            Search::Found(_) => return Err(Error::KeyAlreadyExists),
            Search::Miss(point) => point,
        };
        let node = self.tree.alloc(LinkedEntry { key, link: Link::unlinked() });
        list::init(&mut self.tree, node.0);
        let compare = &self.compare;
        if let Err(err) = self.tree.insert(point, node, |a, b| compare(&a.key, &b.key)) {
            self.tree.release(node);
            return Err(match err {
                Error::NodeAlreadyExists => Error::KeyAlreadyExists,
                other => other,
            });
        }
        Ok(node)
    }

    /// Add `key`, placing it last in insertion order.
    pub fn add(&mut self, key: K) -> Result<()> {
        let node = self.add_node(key)?;
        match self.head {
            None => self.head = Some(node),
            Some(head) => list::insert_before(&mut self.tree, head.0, node.0),
        }
        Ok(())
    }

    /// Add `key` and make it the first in insertion order.
    pub fn prepend(&mut self, key: K) -> Result<()> {
        let node = self.add_node(key)?;
        if let Some(head) = self.head {
            list::insert_before(&mut self.tree, head.0, node.0);
        }
        self.head = Some(node);
        Ok(())
    }

    /// Add `key` after the current last ring position. Equivalent ring
    /// position to [`LinkedTreeSet::add`]; spelled separately to anchor on
    /// the last item.
    pub fn append(&mut self, key: K) -> Result<()> {
        let node = self.add_node(key)?;
        match self.head {
            None => self.head = Some(node),
            Some(head) => {
                let last = list::prev(&self.tree, head.0);
                list::insert_after(&mut self.tree, last, node.0);
            }
        }
        Ok(())
    }

    /// Add `key` immediately before `item` in insertion order. When `item`
    /// is the head, the new entry becomes the head.
    pub fn insert_before(&mut self, item: Item, key: K) -> Result<()> {
        if !self.tree.contains_id(item.0) {
            return Err(Error::ItemNotFound);
        }
        let node = self.add_node(key)?;
        list::insert_before(&mut self.tree, item.0 .0, node.0);
        if self.head == Some(item.0) {
            self.head = Some(node);
        }
        Ok(())
    }

    /// Add `key` immediately after `item` in insertion order.
    pub fn insert_after(&mut self, item: Item, key: K) -> Result<()> {
        if !self.tree.contains_id(item.0) {
            return Err(Error::ItemNotFound);
        }
        let node = self.add_node(key)?;
        list::insert_after(&mut self.tree, item.0 .0, node.0);
        Ok(())
    }

    /// Detach `node` from tree and ring. The head moves to its ring
    /// successor when it was the head (or away entirely for the last entry).
    fn detach(&mut self, node: NodeId) -> Result<K> {
        self.tree.remove(node)?;
        if self.head == Some(node) {
            self.head = if self.tree.is_empty() {
                None
            } else {
                Some(NodeId(list::next(&self.tree, node.0)))
            };
        }
        list::remove(&mut self.tree, node.0);
        Ok(self.tree.release(node).key)
    }

    /// Remove the key equal to `key`. `KeyNotFound` if absent.
    pub fn remove(&mut self, key: &K) -> Result<K> {
        match self.locate(key) {
            Search::Found(node) => self.detach(node),
            Search::Miss(_) => Err(Error::KeyNotFound),
        }
    }

    /// Remove the entry behind a previously obtained handle. No comparator
    /// lookup happens.
    pub fn remove_item(&mut self, item: Item) -> Result<K> {
        if !self.tree.contains_id(item.0) {
            return Err(Error::ItemNotFound);
        }
        self.detach(item.0)
    }

    pub fn contains(&self, key: &K) -> bool {
        matches!(self.locate(key), Search::Found(_))
    }

    /// Handle to the entry equal to `key`.
    pub fn item(&self, key: &K) -> Result<Item> {
        match self.locate(key) {
            Search::Found(node) => Ok(Item(node)),
            Search::Miss(_) => Err(Error::ItemNotFound),
        }
    }

    /// Borrow the stored key equal to `key`.
    pub fn get(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => Ok(&self.tree.payload(node).key),
            Search::Miss(_) => Err(Error::ItemNotFound),
        }
    }

    fn bound(&self, key: &K, candidate: Option<NodeId>, reject: Ordering) -> Result<&K> {
        let candidate = candidate.ok_or(Error::ItemNotFound)?;
        let stored = &self.tree.entry(candidate)?.key;
        if (self.compare)(key, stored) == reject {
            Err(Error::ItemNotFound)
        } else {
            Ok(stored)
        }
    }

    /// Smallest stored key `>= key` in comparator order.
    pub fn ceiling(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => Ok(&self.tree.payload(node).key),
            Search::Miss(candidate) => self.bound(key, candidate, Ordering::Greater),
        }
    }

    /// Largest stored key `<= key` in comparator order.
    pub fn floor(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => Ok(&self.tree.payload(node).key),
            Search::Miss(candidate) => self.bound(key, candidate, Ordering::Less),
        }
    }

    /// Smallest stored key `> key` in comparator order.
    pub fn higher(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => {
                let next = self.tree.next(node).map_err(|_| Error::ItemNotFound)?;
                Ok(&self.tree.payload(next).key)
            }
            Search::Miss(candidate) => self.bound(key, candidate, Ordering::Greater),
        }
    }

    /// Largest stored key `< key` in comparator order.
    pub fn lower(&self, key: &K) -> Result<&K> {
        match self.locate(key) {
            Search::Found(node) => {
                let prev = self.tree.prev(node).map_err(|_| Error::ItemNotFound)?;
                Ok(&self.tree.payload(prev).key)
            }
            Search::Miss(candidate) => self.bound(key, candidate, Ordering::Less),
        }
    }

    // ---- insertion-order navigation ---------------------------------------

    /// First key in insertion order.
    pub fn first(&self) -> Result<&K> {
        let head = self.head.ok_or(Error::ContainerIsEmpty)?;
        Ok(&self.tree.payload(head).key)
    }

    /// Last key in insertion order.
    pub fn last(&self) -> Result<&K> {
        let head = self.head.ok_or(Error::ContainerIsEmpty)?;
        let last = list::prev(&self.tree, head.0);
        Ok(&self.tree.payload(NodeId(last)).key)
    }

    pub fn first_item(&self) -> Result<Item> {
        self.head.map(Item).ok_or(Error::ContainerIsEmpty)
    }

    pub fn last_item(&self) -> Result<Item> {
        let head = self.head.ok_or(Error::ContainerIsEmpty)?;
        Ok(Item(NodeId(list::prev(&self.tree, head.0))))
    }

    pub fn key(&self, item: Item) -> Result<&K> {
        self.tree.entry(item.0).map(|entry| &entry.key)
    }

    /// Ring successor of `item`; `EndOfSequence` when the walk would wrap
    /// back to the head.
    pub fn next(&self, item: Item) -> Result<Item> {
        if !self.tree.contains_id(item.0) {
            return Err(Error::ItemNotFound);
        }
        let next = NodeId(list::next(&self.tree, item.0 .0));
        if Some(next) == self.head {
            Err(Error::EndOfSequence)
        } else {
            Ok(Item(next))
        }
    }

    /// Ring predecessor of `item`; `EndOfSequence` when `item` is the head.
    pub fn prev(&self, item: Item) -> Result<Item> {
        if !self.tree.contains_id(item.0) {
            return Err(Error::ItemNotFound);
        }
        if Some(item.0) == self.head {
            return Err(Error::EndOfSequence);
        }
        Ok(Item(NodeId(list::prev(&self.tree, item.0 .0))))
    }

    /// Keys in insertion order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter { tree: &self.tree, head: self.head, next: self.head }
    }

    /// Visit every key with `on_destroy`, then reset the set to empty.
    pub fn invalidate(&mut self, mut on_destroy: impl FnMut(&K)) {
        self.tree.clear(|entry| on_destroy(&entry.key));
        self.head = None;
    }

    pub fn clear(&mut self) {
        self.tree.clear(|_| ());
        self.head = None;
    }
}

pub struct Iter<'a, K> {
    tree: &'a RedBlackTree<LinkedEntry<K>>,
    head: Option<NodeId>,
    next: Option<NodeId>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let entry = self.tree.payload(id);
        let next = NodeId(entry.link.next);
        self.next = if Some(next) == self.head { None } else { Some(next) };
        Some(&entry.key)
    }
}

impl<K: fmt::Debug, F: Fn(&K, &K) -> Ordering> fmt::Debug for LinkedTreeSet<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
impl<K, F: Fn(&K, &K) -> Ordering> LinkedTreeSet<K, F> {
    fn dbg_check(&self) {
        self.tree.dbg_check();
        match self.head {
            None => assert_eq!(self.len(), 0),
            Some(head) => {
                // The ring must close over exactly the tree's members, with
                // coherent next/prev pairs.
                let mut steps = 0;
                let mut at = head.0;
                loop {
                    let next = list::next(&self.tree, at);
                    assert_eq!(list::prev(&self.tree, next), at, "ring out of joint");
                    steps += 1;
                    at = next;
                    if at == head.0 {
                        break;
                    }
                    assert!(steps <= self.len(), "ring leaks past the tree members");
                }
                assert_eq!(steps, self.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_order<K: Copy, F: Fn(&K, &K) -> Ordering>(set: &LinkedTreeSet<K, F>) -> Vec<K> {
        set.iter().copied().collect()
    }

    fn sorted_order(set: &LinkedTreeSet<i32>) -> Vec<i32> {
        // Walk ceiling/higher the way a host iterates the comparator side.
        let mut keys = Vec::new();
        let mut at = match set.ceiling(&i32::MIN) {
            Ok(key) => *key,
            Err(_) => return keys,
        };
        keys.push(at);
        while let Ok(key) = set.higher(&at) {
            keys.push(*key);
            at = *key;
        }
        keys
    }

    #[test]
    fn add_places_at_the_tail() {
        let mut set = LinkedTreeSet::new();
        set.add(5).unwrap();
        set.add(1).unwrap();
        set.add(3).unwrap();
        assert_eq!(set.add(3), Err(Error::KeyAlreadyExists));

        assert_eq!(list_order(&set), vec![5, 1, 3]);
        assert_eq!(sorted_order(&set), vec![1, 3, 5]);
        assert_eq!(set.first(), Ok(&5));
        assert_eq!(set.last(), Ok(&3));
        set.dbg_check();
    }

    #[test]
    fn prepend_and_append_anchor_the_ends() {
        let mut set = LinkedTreeSet::new();
        set.prepend(3).unwrap();
        set.append(7).unwrap();
        set.prepend(1).unwrap();
        set.append(9).unwrap();
        assert_eq!(list_order(&set), vec![1, 3, 7, 9]);
        assert_eq!(sorted_order(&set), vec![1, 3, 7, 9]);

        set.prepend(5).unwrap();
        assert_eq!(list_order(&set), vec![5, 1, 3, 7, 9]);
        assert_eq!(sorted_order(&set), vec![1, 3, 5, 7, 9]);
        assert_eq!(set.first(), Ok(&5));
        assert_eq!(set.last(), Ok(&9));
        set.dbg_check();
    }

    #[test]
    fn positional_inserts_follow_the_anchor() {
        let mut set = LinkedTreeSet::new();
        set.add(10).unwrap();
        set.add(20).unwrap();

        let anchor = set.item(&20).unwrap();
        set.insert_before(anchor, 15).unwrap();
        assert_eq!(list_order(&set), vec![10, 15, 20]);

        set.insert_after(anchor, 25).unwrap();
        assert_eq!(list_order(&set), vec![10, 15, 20, 25]);

        // Inserting before the head makes the new entry the head.
        let head = set.first_item().unwrap();
        set.insert_before(head, 5).unwrap();
        assert_eq!(set.first(), Ok(&5));
        assert_eq!(list_order(&set), vec![5, 10, 15, 20, 25]);
        set.dbg_check();
    }

    #[test]
    fn remove_of_head_advances_first() {
        let mut set = LinkedTreeSet::new();
        set.add(5).unwrap();
        set.add(1).unwrap();
        set.add(3).unwrap();

        assert_eq!(set.remove(&5), Ok(5));
        assert_eq!(set.first(), Ok(&1));
        assert_eq!(list_order(&set), vec![1, 3]);

        assert_eq!(set.remove(&3), Ok(3));
        assert_eq!(set.remove(&1), Ok(1));
        assert!(set.is_empty());
        assert_eq!(set.first(), Err(Error::ContainerIsEmpty));
        assert_eq!(set.remove(&1), Err(Error::KeyNotFound));
        set.dbg_check();
    }

    #[test]
    fn ring_navigation_stops_at_the_wrap() {
        let mut set = LinkedTreeSet::new();
        for key in [4, 2, 9] {
            set.add(key).unwrap();
        }
        let first = set.first_item().unwrap();
        let second = set.next(first).unwrap();
        let third = set.next(second).unwrap();
        assert_eq!(set.key(third), Ok(&9));
        assert_eq!(set.next(third), Err(Error::EndOfSequence));

        assert_eq!(set.prev(third), Ok(second));
        assert_eq!(set.prev(second), Ok(first));
        assert_eq!(set.prev(first), Err(Error::EndOfSequence));
    }

    #[test]
    fn comparator_side_is_insertion_order_independent() {
        let mut set = LinkedTreeSet::new();
        for key in [50, 10, 40, 20, 30] {
            set.add(key).unwrap();
        }
        assert_eq!(list_order(&set), vec![50, 10, 40, 20, 30]);
        assert_eq!(sorted_order(&set), vec![10, 20, 30, 40, 50]);
        assert_eq!(set.ceiling(&25), Ok(&30));
        assert_eq!(set.floor(&25), Ok(&20));
        assert_eq!(set.get(&40), Ok(&40));
        assert!(set.contains(&20));
        assert!(!set.contains(&25));
        set.dbg_check();
    }

    #[test]
    fn remove_item_by_handle() {
        let mut set = LinkedTreeSet::new();
        for key in [6, 2, 8] {
            set.add(key).unwrap();
        }
        let item = set.first_item().unwrap();
        let second = set.next(item).unwrap();
        assert_eq!(set.remove_item(second), Ok(2));
        assert_eq!(list_order(&set), vec![6, 8]);
        assert_eq!(set.remove_item(second), Err(Error::ItemNotFound));
        set.dbg_check();
    }

    #[test]
    fn invalidate_resets_head() {
        let mut set = LinkedTreeSet::new();
        set.add(1).unwrap();
        set.add(2).unwrap();
        let mut seen = Vec::new();
        set.invalidate(|key| seen.push(*key));
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);
        assert!(set.is_empty());
        assert_eq!(set.first(), Err(Error::ContainerIsEmpty));

        set.add(3).unwrap();
        assert_eq!(set.first(), Ok(&3));
    }

    #[test]
    fn tree_and_ring_agree_under_churn() {
        use rand::prelude::*;
        use rand::rngs::SmallRng;

        let mut rng = SmallRng::seed_from_u64(99);
        let mut set = LinkedTreeSet::new();
        let mut order: Vec<i32> = Vec::new();

        for i in 0..4_000 {
            let key = rng.gen_range(0..300);
            match rng.gen_range(0..4) {
                0 => {
                    if set.add(key).is_ok() {
                        order.push(key);
                    }
                }
                1 => {
                    if set.prepend(key).is_ok() {
                        order.insert(0, key);
                    }
                }
                2 => {
                    if set.append(key).is_ok() {
                        order.push(key);
                    }
                }
                _ => {
                    if set.remove(&key).is_ok() {
                        let at = order.iter().position(|&k| k == key).unwrap();
                        order.remove(at);
                    }
                }
            }
            assert_eq!(set.len(), order.len());
            if i % 41 == 0 {
                set.dbg_check();
                assert_eq!(list_order(&set), order);
                let mut sorted = order.clone();
                sorted.sort_unstable();
                assert_eq!(sorted_order(&set), sorted);
            }
        }
    }
}
