//! In-memory ordered and unordered container primitives.
//!
//! Two engines do the real work:
//!
//! - [`tree::RedBlackTree`], a self-balancing ordered tree whose nodes live
//!   in an arena and are addressed by stable ids. It exposes both the
//!   low-level rotation/repair primitives and the high-level insert / remove
//!   / navigate operations.
//! - [`HashTable`], a single contiguous slot array with linear probing,
//!   tombstone deletion, load-factor driven growth and a one-pass rebuild
//!   compaction.
//!
//! The ordered containers are thin adapters over the tree engine:
//! [`TreeSet`] stores bare keys, [`TreeMap`] keys with values, and
//! [`LinkedTreeSet`] overlays a circular insertion-order ring on a sorted
//! set. All of them take caller-supplied comparison (or hashing) callbacks
//! and own their keys and values by value.
//!
//! Everything is single-threaded and allocation happens only inside the
//! containers' own arenas and slot arrays. Errors are always returned, never
//! panicked, through the crate-wide [`Error`] enumeration; failed operations
//! leave the container observably unchanged (the one documented exception is
//! a hash-table `add` whose growth survives a duplicate rejection).
//!
//! A user callback (comparator, hash, equality, or on-destroy) must not call
//! back into the container it serves; the borrow rules make that impossible
//! to do accidentally from safe code.

pub mod array;
pub mod error;
pub mod hash;
mod list;
pub mod tree;

pub use array::Array;
pub use error::{Error, Result};
pub use hash::HashTable;
pub use tree::{LinkedTreeSet, TreeMap, TreeSet};
