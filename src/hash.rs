//! Open-addressed hash table with linear probing and tombstone deletion.
//!
//! All entries live in one contiguous slot array. A probe for key `k` starts
//! at `hash(k) % len` and walks forward one slot at a time, wrapping at the
//! end. Deleting marks the slot as a tombstone so later probes keep walking
//! past it; tombstones are only reclaimed by [`HashTable::rebuild`], the
//! one-pass compaction that also runs on every growth.
//!
//! Growth doubles the slot array whenever an insertion would push the
//! occupancy (live plus tombstones) up to `ceil(load_factor * len)`, so a
//! probe always terminates on an empty slot.

use std::fmt;
use std::mem;

use crate::array::Array;
use crate::error::{Error, Result};

const LOAD_FACTOR_DEFAULT: f32 = 0.75;
const LOAD_FACTOR_MAXIMUM: f32 = 1.0;

/// Handle to an occupied slot, used by the first/last/next/prev navigation.
/// Any growth or rebuild invalidates outstanding positions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Position(pub(crate) usize);

enum Slot<K, V> {
    Empty,
    /// Tombstone left behind by a removal.
    Deleted,
    Occupied { key: K, value: V },
}

impl<K, V> Default for Slot<K, V> {
    fn default() -> Self {
        Slot::Empty
    }
}

impl<K, V> Slot<K, V> {
    fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }
}

pub struct HashTable<K, V, H = fn(&K) -> usize, E = fn(&K, &K) -> bool> {
    slots: Array<Slot<K, V>>,
    count: usize,
    deleted: usize,
    load_factor: f32,
    hash_code: H,
    is_equal: E,
}

impl<K, V, H, E> HashTable<K, V, H, E>
where
    H: Fn(&K) -> usize,
    E: Fn(&K, &K) -> bool,
{
    /// A table hashing with `hash_code` and comparing keys with `is_equal`.
    ///
    /// `load_factor` is taken by absolute value and must lie in `(0, 1]`;
    /// zero selects the default of 0.75. `LoadFactorIsInvalid` otherwise.
    /// The slot array starts empty.
    ///
    /// `hash_code` must be deterministic per key, and equal keys must hash
    /// alike. Unequal keys are free to collide.
    pub fn new(load_factor: f32, hash_code: H, is_equal: E) -> Result<Self> {
        let lf = load_factor.abs();
        if !lf.is_finite() || lf > LOAD_FACTOR_MAXIMUM {
            return Err(Error::LoadFactorIsInvalid);
        }
        let lf = if lf == 0.0 { LOAD_FACTOR_DEFAULT } else { lf };
        Ok(HashTable {
            slots: Array::new(),
            count: 0,
            deleted: 0,
            load_factor: lf,
            hash_code,
            is_equal,
        })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Length of the slot array.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of tombstones currently in the slot array.
    pub fn deleted(&self) -> usize {
        self.deleted
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    fn occupancy_limit(&self, length: usize) -> usize {
        (length as f64 * self.load_factor as f64).ceil() as usize
    }

    /// Walk the probe sequence for `key`: skip tombstones, stop on the first
    /// empty slot or an occupied slot with an equal key.
    fn find_slot(&self, key: &K) -> Result<usize> {
        if self.count == 0 {
            return Err(Error::KeyNotFound);
        }
        let length = self.slots.len();
        let at = (self.hash_code)(key) % length;
        for i in 0..length {
            let index = (at + i) % length;
            match &self.slots[index] {
                Slot::Deleted => continue,
                Slot::Empty => return Err(Error::KeyNotFound),
                Slot::Occupied { key: stored, .. } => {
                    if (self.is_equal)(key, stored) {
                        return Ok(index);
                    }
                }
            }
        }
        Err(Error::KeyNotFound)
    }

    /// Probe-and-write: error on an equal occupied key (unless duplicates
    /// are ignored, as during a rebuild), write at the first empty slot.
    /// Tombstones are probed past, never overwritten; the occupancy cap
    /// guarantees an empty slot exists.
    fn insert_entry(
        &mut self,
        key: K,
        value: V,
        ignore_duplicates: bool,
    ) -> std::result::Result<(), (K, V)> {
        let length = self.slots.len();
        debug_assert!(length > 0);
        let at = (self.hash_code)(&key) % length;
        let mut target = None;
        for i in 0..length {
            let index = (at + i) % length;
            match &self.slots[index] {
                Slot::Empty => {
                    target = Some(index);
                    break;
                }
                Slot::Deleted => continue,
                Slot::Occupied { key: stored, .. } => {
                    if !ignore_duplicates && (self.is_equal)(&key, stored) {
                        return Err((key, value));
                    }
                }
            }
        }
        match target {
            Some(index) => {
                self.slots[index] = Slot::Occupied { key, value };
                Ok(())
            }
            None => unreachable!("occupancy cap left no empty slot"),
        }
    }

    /// Add a new entry. `KeyAlreadyExists` if an equal key is live (the
    /// rejected pair is dropped). `MemoryAllocationFailed` when the slot
    /// array cannot grow any further.
    ///
    /// Growth happens up front: while `ceil(lf * len)` does not exceed the
    /// occupancy after this insertion, the length doubles (saturating). A
    /// grown table is rebuilt immediately, which also clears tombstones. A
    /// growth followed by a duplicate rejection leaves the table grown.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        let used = self
            .count
            .checked_add(self.deleted)
            .and_then(|used| used.checked_add(1))
            .ok_or(Error::MemoryAllocationFailed)?;
        let current = self.slots.len();
        let mut length = current;
        while self.occupancy_limit(length) <= used {
            if length == usize::MAX {
                return Err(Error::MemoryAllocationFailed);
            }
            length = if length == 0 { 1 } else { length.saturating_mul(2) };
        }
        if current < length {
            self.slots.set_len(length);
            self.rebuild();
        }
        match self.insert_entry(key, value, false) {
            Ok(()) => {
                self.count += 1;
                Ok(())
            }
            Err(_rejected) => Err(Error::KeyAlreadyExists),
        }
    }

    /// Remove the entry for `key`, leaving a tombstone in its slot.
    pub fn remove(&mut self, key: &K) -> Result<(K, V)> {
        let index = self.find_slot(key)?;
        let slot = mem::replace(&mut self.slots[index], Slot::Deleted);
        self.count -= 1;
        self.deleted += 1;
        match slot {
            Slot::Occupied { key, value } => Ok((key, value)),
            _ => unreachable!("find returned a non-occupied slot"),
        }
    }

    /// Overwrite the value for `key` in place; the probe sequence does not
    /// change. The previous value is dropped.
    pub fn set(&mut self, key: &K, value: V) -> Result<()> {
        *self.get_mut(key)? = value;
        Ok(())
    }

    pub fn get(&self, key: &K) -> Result<&V> {
        let index = self.find_slot(key)?;
        match &self.slots[index] {
            Slot::Occupied { value, .. } => Ok(value),
            _ => unreachable!("find returned a non-occupied slot"),
        }
    }

    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        let index = self.find_slot(key)?;
        match &mut self.slots[index] {
            Slot::Occupied { value, .. } => Ok(value),
            _ => unreachable!("find returned a non-occupied slot"),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find_slot(key).is_ok()
    }

    /// Whether tombstones have piled up enough that a [`HashTable::rebuild`]
    /// would pay off: more than a tenth of the slots are tombstones and the
    /// tombstones outnumber the live entries.
    pub fn rebuild_needed(&self) -> bool {
        let limit = (self.slots.len() as f64 * 0.1).ceil() as usize;
        self.deleted > limit && self.count < self.deleted
    }

    /// One linear pass restoring every entry to its best probe position and
    /// resetting every tombstone to empty.
    ///
    /// For the occupant of slot `i` with home slot `at`: already home
    /// (`at == i`) is left alone; `at < i` re-enters through the probe-and-
    /// write path (slots before `i` are already normalized, so it lands at
    /// or after its home) and `i` is cleared; `at > i` swaps the occupant
    /// with slot `at` and re-examines what `i` received.
    pub fn rebuild(&mut self) {
        let length = self.slots.len();
        for i in 0..length {
            loop {
                let at = match &self.slots[i] {
                    Slot::Occupied { key, .. } => (self.hash_code)(key) % length,
                    _ => break,
                };
                if at == i {
                    break;
                }
                if at < i {
                    match mem::replace(&mut self.slots[i], Slot::Empty) {
                        Slot::Occupied { key, value } => {
                            let _ = self.insert_entry(key, value, true);
                        }
                        _ => unreachable!(),
                    }
                    break;
                }
                self.slots.swap(i, at);
            }
            if matches!(self.slots[i], Slot::Deleted) {
                self.slots[i] = Slot::Empty;
                self.deleted -= 1;
            }
        }
        debug_assert_eq!(self.deleted, 0, "rebuild left tombstones behind");
    }

    // ---- navigation --------------------------------------------------------

    /// Position of the first occupied slot. Positions are invalidated by any
    /// growth or rebuild.
    pub fn first(&self) -> Result<Position> {
        if self.count == 0 {
            return Err(Error::ContainerIsEmpty);
        }
        match self.slots.iter().position(Slot::is_occupied) {
            Some(index) => Ok(Position(index)),
            None => unreachable!("live count does not match the slot array"),
        }
    }

    /// Position of the last occupied slot.
    pub fn last(&self) -> Result<Position> {
        if self.count == 0 {
            return Err(Error::ContainerIsEmpty);
        }
        match self.slots.iter().rposition(Slot::is_occupied) {
            Some(index) => Ok(Position(index)),
            None => unreachable!("live count does not match the slot array"),
        }
    }

    /// Next occupied slot after `position`, skipping empties and tombstones.
    /// `ItemOutOfBounds` when `position` is not inside the slot array,
    /// `EndOfSequence` when the walk runs off the end.
    pub fn next(&self, position: Position) -> Result<Position> {
        let mut index = position.0;
        loop {
            index = self.slots.next(index)?;
            if self.slots[index].is_occupied() {
                return Ok(Position(index));
            }
        }
    }

    /// Previous occupied slot before `position`; mirror of
    /// [`HashTable::next`].
    pub fn prev(&self, position: Position) -> Result<Position> {
        let mut index = position.0;
        loop {
            index = self.slots.prev(index)?;
            if self.slots[index].is_occupied() {
                return Ok(Position(index));
            }
        }
    }

    /// Borrow the entry at `position`. `ItemOutOfBounds` outside the array,
    /// `ItemNotFound` when the slot is not occupied.
    pub fn entry(&self, position: Position) -> Result<(&K, &V)> {
        if position.0 >= self.slots.len() {
            return Err(Error::ItemOutOfBounds);
        }
        match &self.slots[position.0] {
            Slot::Occupied { key, value } => Ok((key, value)),
            _ => Err(Error::ItemNotFound),
        }
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { key, value } => Some((key, value)),
            _ => None,
        })
    }

    /// Visit every live entry with `on_destroy`, then reset the table to
    /// empty (zero slots).
    pub fn invalidate(&mut self, mut on_destroy: impl FnMut(&K, &V)) {
        self.slots.invalidate(|slot| {
            if let Slot::Occupied { key, value } = slot {
                on_destroy(&key, &value);
            }
        });
        self.count = 0;
        self.deleted = 0;
    }

    pub fn clear(&mut self) {
        self.invalidate(|_, _| ());
    }
}

impl<K, V, H, E> fmt::Debug for HashTable<K, V, H, E>
where
    K: fmt::Debug,
    V: fmt::Debug,
    H: Fn(&K) -> usize,
    E: Fn(&K, &K) -> bool,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
impl<K, V, H, E> HashTable<K, V, H, E>
where
    H: Fn(&K) -> usize,
    E: Fn(&K, &K) -> bool,
{
    fn dbg_check(&self) {
        let length = self.slots.len();
        let mut occupied = 0;
        let mut deleted = 0;
        for (i, slot) in self.slots.iter().enumerate() {
            match slot {
                Slot::Empty => {}
                Slot::Deleted => deleted += 1,
                Slot::Occupied { key, .. } => {
                    occupied += 1;
                    // The probe sequence from the key's home slot must reach
                    // slot i without passing an empty slot.
                    let at = (self.hash_code)(key) % length;
                    let mut walk = at;
                    while walk != i {
                        assert!(
                            !matches!(self.slots[walk], Slot::Empty),
                            "probe for slot {} breaks at empty slot {}",
                            i,
                            walk
                        );
                        walk = (walk + 1) % length;
                    }
                }
            }
        }
        assert_eq!(occupied, self.count, "live count out of sync");
        assert_eq!(deleted, self.deleted, "tombstone count out of sync");
        if length > 0 {
            assert!(
                self.count + self.deleted <= self.occupancy_limit(length),
                "occupancy cap violated"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::prelude::*;
    use rand::rngs::SmallRng;

    use super::*;

    fn identity(key: &u64) -> usize {
        *key as usize
    }

    fn equal(a: &u64, b: &u64) -> bool {
        a == b
    }

    fn table() -> HashTable<u64, u64> {
        HashTable::<u64, u64>::new(0.0, identity, equal).unwrap()
    }

    #[test]
    fn load_factor_validation() {
        assert!(HashTable::<u64, u64>::new(0.5, identity, equal).is_ok());
        assert!(HashTable::<u64, u64>::new(1.0, identity, equal).is_ok());
        assert!(HashTable::<u64, u64>::new(-0.5, identity, equal).is_ok());
        assert_eq!(
            HashTable::<u64, u64>::new(1.1, identity, equal).err(),
            Some(Error::LoadFactorIsInvalid)
        );
        assert_eq!(
            HashTable::<u64, u64>::new(f32::NAN, identity, equal).err(),
            Some(Error::LoadFactorIsInvalid)
        );

        let t = table();
        assert_eq!(t.load_factor(), 0.75);
        assert_eq!(t.capacity(), 0);
    }

    #[test]
    fn add_get_contains() {
        let mut t = table();
        t.add(1, 100).unwrap();
        t.add(2, 200).unwrap();
        assert_eq!(t.add(1, 111), Err(Error::KeyAlreadyExists));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(&1), Ok(&100));
        assert_eq!(t.get(&2), Ok(&200));
        assert_eq!(t.get(&3), Err(Error::KeyNotFound));
        assert!(t.contains(&1));
        assert!(!t.contains(&3));
        t.dbg_check();
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut t = table();
        t.add(5, 1).unwrap();
        let before = t.capacity();
        t.set(&5, 2).unwrap();
        assert_eq!(t.get(&5), Ok(&2));
        assert_eq!(t.capacity(), before);
        assert_eq!(t.set(&6, 0), Err(Error::KeyNotFound));
    }

    #[test]
    fn growth_under_default_load_factor() {
        // Identity hash, keys 1..=8. The array must have grown to at least 8
        // slots by the sixth insert, and lookups keep working across every
        // rebuild.
        let mut t = table();
        let mut lengths = Vec::new();
        for key in 1..=8 {
            t.add(key, key * 10).unwrap();
            lengths.push(t.capacity());
            t.dbg_check();
        }
        assert!(lengths[5] >= 8, "after 6 inserts: {:?}", lengths);
        // Growth is monotone.
        assert!(lengths.windows(2).all(|pair| pair[0] <= pair[1]));
        for key in 1..=8 {
            assert_eq!(t.get(&key), Ok(&(key * 10)));
        }
    }

    #[test]
    fn remove_leaves_tombstones_until_rebuild() {
        let mut t = table();
        for key in 0..100 {
            t.add(key, key).unwrap();
        }
        for key in (0..100).step_by(2) {
            assert_eq!(t.remove(&key), Ok((key, key)));
        }
        assert_eq!(t.len(), 50);
        assert_eq!(t.deleted(), 50);
        for key in 0..100 {
            assert_eq!(t.contains(&key), key % 2 == 1, "key {}", key);
        }
        t.dbg_check();

        // deleted == live, so the policy says no rebuild yet.
        assert!(!t.rebuild_needed());
        assert_eq!(t.remove(&1), Ok((1, 1)));
        // Now deleted (51) > live (49) and 51 > capacity/10.
        assert!(t.rebuild_needed());

        t.rebuild();
        assert_eq!(t.deleted(), 0);
        assert_eq!(t.len(), 49);
        for key in 3..100 {
            assert_eq!(t.contains(&key), key % 2 == 1, "key {}", key);
        }
        assert!(!t.rebuild_needed());
        t.dbg_check();
    }

    #[test]
    fn duplicate_rejection_after_growth_leaves_table_grown() {
        let mut t = HashTable::new(1.0, identity, equal).unwrap();
        t.add(0, 0).unwrap();
        t.add(1, 1).unwrap();
        t.add(2, 2).unwrap();
        let grown = t.capacity();
        // The occupancy check runs before the duplicate is discovered, so
        // this add grows the array and then rejects the key.
        assert_eq!(t.add(1, 9), Err(Error::KeyAlreadyExists));
        assert!(t.capacity() > grown);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(&1), Ok(&1));
        t.dbg_check();
    }

    #[test]
    fn colliding_keys_probe_linearly() {
        // Constant hash: everything collides, lookups degrade to a scan but
        // stay correct.
        let mut t = HashTable::new(0.75, |_: &u64| 7usize, equal).unwrap();
        for key in 0..20 {
            t.add(key, key * 3).unwrap();
            t.dbg_check();
        }
        for key in 0..20 {
            assert_eq!(t.get(&key), Ok(&(key * 3)));
        }
        assert_eq!(t.get(&20), Err(Error::KeyNotFound));

        for key in (0..20).step_by(3) {
            t.remove(&key).unwrap();
        }
        for key in 0..20 {
            assert_eq!(t.contains(&key), key % 3 != 0);
        }
        t.dbg_check();
        t.rebuild();
        t.dbg_check();
        for key in 0..20 {
            assert_eq!(t.contains(&key), key % 3 != 0);
        }
    }

    #[test]
    fn navigation_skips_gaps() {
        let mut t = table();
        for key in [3, 9, 14] {
            t.add(key, key).unwrap();
        }
        t.remove(&9).unwrap();

        let first = t.first().unwrap();
        let second = t.next(first).unwrap();
        assert_eq!(t.next(second), Err(Error::EndOfSequence));
        assert_eq!(t.last(), Ok(second));
        assert_eq!(t.prev(second), Ok(first));
        assert_eq!(t.prev(first), Err(Error::EndOfSequence));

        let (first_key, _) = t.entry(first).unwrap();
        let (second_key, _) = t.entry(second).unwrap();
        assert!([*first_key, *second_key] == [3, 14] || [*first_key, *second_key] == [14, 3]);

        assert_eq!(t.next(Position(t.capacity())), Err(Error::ItemOutOfBounds));
        assert_eq!(t.entry(Position(usize::MAX)), Err(Error::ItemOutOfBounds));
    }

    #[test]
    fn navigation_on_empty_table() {
        let t = table();
        assert_eq!(t.first(), Err(Error::ContainerIsEmpty));
        assert_eq!(t.last(), Err(Error::ContainerIsEmpty));
    }

    #[test]
    fn invalidate_visits_live_entries_only() {
        let mut t = table();
        for key in 0..10 {
            t.add(key, key).unwrap();
        }
        for key in 0..5 {
            t.remove(&key).unwrap();
        }
        let mut seen = Vec::new();
        t.invalidate(|key, _| seen.push(*key));
        seen.sort_unstable();
        assert_eq!(seen, vec![5, 6, 7, 8, 9]);
        assert!(t.is_empty());
        assert_eq!(t.capacity(), 0);
        assert_eq!(t.deleted(), 0);

        // Usable again after invalidate.
        t.add(1, 1).unwrap();
        assert_eq!(t.get(&1), Ok(&1));
    }

    #[test]
    fn rebuild_normalizes_adversarial_layouts() {
        // Hash everything near the end of the array so growth leaves
        // displaced runs that wrap around, then make sure rebuild's swap and
        // re-insert paths put every key on a reachable probe path.
        let mut t = HashTable::new(0.75, |key: &u64| (*key as usize) * 31 + 17, equal).unwrap();
        for key in 0..200 {
            t.add(key, key).unwrap();
        }
        for key in (0..200).step_by(2) {
            t.remove(&key).unwrap();
        }
        t.rebuild();
        t.dbg_check();
        assert_eq!(t.deleted(), 0);
        for key in 0..200 {
            assert_eq!(t.contains(&key), key % 2 == 1);
        }
    }

    fn fuzz(seed: u64, n: usize, hash: fn(&u64) -> usize) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut t = HashTable::new(0.0, hash, equal).unwrap();
        let mut oracle: HashMap<u64, u64> = HashMap::new();

        for i in 0..n {
            let key = rng.gen_range(0..400);
            match rng.gen_range(0..5) {
                0 | 1 => {
                    let value = rng.gen::<u64>();
                    match t.add(key, value) {
                        Ok(()) => assert!(oracle.insert(key, value).is_none()),
                        Err(Error::KeyAlreadyExists) => assert!(oracle.contains_key(&key)),
                        Err(other) => panic!("unexpected {:?}", other),
                    }
                }
                2 => match oracle.remove(&key) {
                    Some(value) => assert_eq!(t.remove(&key), Ok((key, value))),
                    None => assert_eq!(t.remove(&key), Err(Error::KeyNotFound)),
                },
                3 => {
                    let value = rng.gen::<u64>();
                    match oracle.get_mut(&key) {
                        Some(stored) => {
                            t.set(&key, value).unwrap();
                            *stored = value;
                        }
                        None => assert_eq!(t.set(&key, value), Err(Error::KeyNotFound)),
                    }
                }
                _ => {
                    if t.rebuild_needed() {
                        t.rebuild();
                        assert_eq!(t.deleted(), 0);
                    }
                }
            }
            assert_eq!(t.get(&key).ok(), oracle.get(&key));
            assert_eq!(t.len(), oracle.len());
            if i % 97 == 0 {
                t.dbg_check();
                let mut keys: Vec<u64> = t.iter().map(|(key, _)| *key).collect();
                keys.sort_unstable();
                let mut expected: Vec<u64> = oracle.keys().copied().collect();
                expected.sort_unstable();
                assert_eq!(keys, expected);
            }
        }
    }

    #[test]
    fn fuzz_identity_hash() {
        fuzz(22, 10_000, identity);
    }

    #[test]
    fn fuzz_constant_hash() {
        // Worst case: every key probes the same run.
        fuzz(7, 2_000, |_| 3);
    }

    #[test]
    fn fuzz_clustering_hash() {
        fuzz(13, 10_000, |key| (*key as usize / 16) * 16);
    }

    #[test]
    #[ignore]
    fn fuzz_forever() {
        for seed in 0.. {
            if seed % 10 == 0 {
                println!("seed {}", seed);
            }
            fuzz(seed, 10_000, identity);
        }
    }
}
