//! End-to-end checks of the hash table through the public surface.

use cairn::{Error, HashTable};
use smallvec::SmallVec;

fn identity(key: &u64) -> usize {
    *key as usize
}

fn equal(a: &u64, b: &u64) -> bool {
    a == b
}

#[test]
fn growth_with_trivial_hash() {
    // Default load factor, identity hash, keys 1..=8: by the sixth insert
    // the slot array holds at least 8 slots, and every key still resolves
    // to its value afterwards - the rebuild on each growth kept the probe
    // paths intact.
    let mut table = HashTable::new(0.0, identity, equal).unwrap();
    let mut capacities: SmallVec<[usize; 8]> = SmallVec::new();
    for key in 1..=8 {
        table.add(key, key * 100).unwrap();
        capacities.push(table.capacity());
    }
    assert!(capacities[5] >= 8, "capacities: {capacities:?}");
    // Growth never goes backwards.
    assert!(capacities.windows(2).all(|pair| pair[0] <= pair[1]));
    for key in 1..=8 {
        assert_eq!(table.get(&key), Ok(&(key * 100)));
        assert!(table.contains(&key));
    }
}

#[test]
fn tombstone_semantics_across_bulk_deletion() {
    let mut table = HashTable::new(0.0, identity, equal).unwrap();
    for key in 0..100 {
        table.add(key, key).unwrap();
    }
    for key in (0..100).step_by(2) {
        table.remove(&key).unwrap();
    }

    for key in 0..100 {
        assert_eq!(table.contains(&key), key % 2 == 1, "key {key}");
    }
    assert_eq!(table.len(), 50);
    assert_eq!(table.deleted(), 50);

    // The policy: rebuild wanted iff tombstones exceed a tenth of the slots
    // and outnumber the live entries.
    let threshold = (table.capacity() as f64 * 0.1).ceil() as usize;
    let expected = table.deleted() > threshold && table.deleted() > table.len();
    assert_eq!(table.rebuild_needed(), expected);
    assert!(!table.rebuild_needed(), "50 live vs 50 deleted is not enough");

    table.remove(&1).unwrap();
    assert!(table.rebuild_needed());

    table.rebuild();
    assert_eq!(table.deleted(), 0);
    assert!(!table.rebuild_needed());
    for key in 2..100 {
        assert_eq!(table.contains(&key), key % 2 == 1, "key {key}");
    }
}

#[test]
fn add_after_remove_reuses_the_key() {
    let mut table = HashTable::new(0.0, identity, equal).unwrap();
    table.add(9, 1).unwrap();
    assert_eq!(table.remove(&9), Ok((9, 1)));
    assert!(!table.contains(&9));
    table.add(9, 2).unwrap();
    assert_eq!(table.get(&9), Ok(&2));
    assert_eq!(table.len(), 1);
}

#[test]
fn values_can_be_replaced_without_moving() {
    let mut table = HashTable::new(0.0, identity, equal).unwrap();
    for key in 0..6 {
        table.add(key, 0).unwrap();
    }
    let capacity = table.capacity();
    let first = table.first().unwrap();
    for key in 0..6 {
        table.set(&key, key + 1).unwrap();
    }
    // No probe-sequence change: same capacity, same first position.
    assert_eq!(table.capacity(), capacity);
    assert_eq!(table.first(), Ok(first));
    for key in 0..6 {
        assert_eq!(table.get(&key), Ok(&(key + 1)));
    }
}

#[test]
fn navigation_covers_all_live_entries() {
    let mut table = HashTable::new(0.0, identity, equal).unwrap();
    for key in 0..20 {
        table.add(key, key).unwrap();
    }
    for key in (0..20).step_by(4) {
        table.remove(&key).unwrap();
    }

    let mut forward: Vec<u64> = Vec::new();
    let mut position = table.first().unwrap();
    loop {
        forward.push(*table.entry(position).unwrap().0);
        match table.next(position) {
            Ok(next) => position = next,
            Err(Error::EndOfSequence) => break,
            Err(other) => panic!("unexpected {other:?}"),
        }
    }

    let mut backward: Vec<u64> = Vec::new();
    let mut position = table.last().unwrap();
    loop {
        backward.push(*table.entry(position).unwrap().0);
        match table.prev(position) {
            Ok(prev) => position = prev,
            Err(Error::EndOfSequence) => break,
            Err(other) => panic!("unexpected {other:?}"),
        }
    }
    backward.reverse();

    assert_eq!(forward, backward);
    assert_eq!(forward.len(), table.len());
    let mut sorted = forward.clone();
    sorted.sort_unstable();
    let expected: Vec<u64> = (0..20).filter(|key| key % 4 != 0).collect();
    assert_eq!(sorted, expected);
}

#[test]
fn load_factor_bounds() {
    assert!(HashTable::<u64, u64, _, _>::new(0.25, identity, equal).is_ok());
    assert_eq!(
        HashTable::<u64, u64, _, _>::new(2.0, identity, equal).err(),
        Some(Error::LoadFactorIsInvalid)
    );
}

#[test]
fn one_point_zero_load_factor_still_terminates_probes() {
    let mut table = HashTable::new(1.0, |key: &u64| *key as usize, equal).unwrap();
    for key in 0..64 {
        table.add(key, key).unwrap();
    }
    for key in 0..64 {
        assert_eq!(table.get(&key), Ok(&key));
    }
    // An absent key must be rejected, not probed forever.
    assert_eq!(table.get(&64), Err(Error::KeyNotFound));
}
