//! The shared error kind enumeration. Every container in this crate reports
//! failures through [`Error`]; each operation documents the subset of kinds it
//! can actually produce.

use std::fmt;

/// Error kinds shared by every container in the crate.
///
/// The `Y*`/`X*` variants are preconditions of the red-black tree's low-level
/// rotation primitives. They are never produced by the high-level container
/// surface - they exist so the rotation primitives can be tested on their own.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// The container has no entries.
    ContainerIsEmpty,
    /// An equal key is already present.
    KeyAlreadyExists,
    /// No equal key is present.
    KeyNotFound,
    /// The requested item (exact, ceiling, floor, higher or lower) does not
    /// exist.
    ItemNotFound,
    /// A node comparing equal is already attached at the insertion point.
    NodeAlreadyExists,
    /// Navigation walked off the end of the container.
    EndOfSequence,
    /// The given position does not belong to the container's slot array.
    ItemOutOfBounds,
    /// The index is not within the array's length.
    IndexOutOfBounds,
    /// A non-empty tree requires an insertion point.
    InsertionPointIsAbsent,
    /// The load factor is not within `(0, 1]`.
    LoadFactorIsInvalid,
    /// Size arithmetic saturated; the container cannot grow any further.
    MemoryAllocationFailed,

    /// `Y` has no parent to rotate through.
    YHasNoParent,
    /// Right rotation requires `Y` to be the left child of its parent.
    YIsNotLeftChildOfX,
    /// Left rotation requires `Y` to be the right child of its parent.
    YIsNotRightChildOfX,
    /// Double rotation requires `X` (the parent of `Y`) to have a parent.
    XHasNoParent,
    /// Left-right rotation requires `X` to be the left child of `Z`.
    XIsNotLeftChildOfZ,
    /// Right-left rotation requires `X` to be the right child of `Z`.
    XIsNotRightChildOfZ,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::ContainerIsEmpty => "container is empty",
            Error::KeyAlreadyExists => "key already exists",
            Error::KeyNotFound => "key not found",
            Error::ItemNotFound => "item not found",
            Error::NodeAlreadyExists => "node already exists",
            Error::EndOfSequence => "end of sequence",
            Error::ItemOutOfBounds => "item is out of bounds",
            Error::IndexOutOfBounds => "index is out of bounds",
            Error::InsertionPointIsAbsent => "insertion point is absent",
            Error::LoadFactorIsInvalid => "load factor is invalid",
            Error::MemoryAllocationFailed => "memory allocation failed",
            Error::YHasNoParent => "Y has no parent",
            Error::YIsNotLeftChildOfX => "Y is not the left child of X",
            Error::YIsNotRightChildOfX => "Y is not the right child of X",
            Error::XHasNoParent => "X has no parent",
            Error::XIsNotLeftChildOfZ => "X is not the left child of Z",
            Error::XIsNotRightChildOfZ => "X is not the right child of Z",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
