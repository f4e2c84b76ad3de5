//! The ordered container family: a red-black tree engine plus the thin
//! entry-layout adapters built on it - sorted set, sorted map, and a sorted
//! set overlaid with an insertion-order ring.

pub mod engine;
pub mod linked_set;
pub mod map;
pub mod set;

pub use engine::{Color, NodeId, RedBlackTree, Search};
pub use linked_set::LinkedTreeSet;
pub use map::TreeMap;
pub use set::TreeSet;

/// Handle to an entry of a [`TreeSet`] or [`LinkedTreeSet`].
///
/// Stays valid until the entry it names is removed; navigation and removal
/// through a handle skip the comparator entirely.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Item(pub(crate) NodeId);
