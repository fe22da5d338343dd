//! Errors shared by all keyed collections in this crate.

use derive_more::{Display, Error};

/// The key being added is already present in the collection.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("key is already present in the collection")]
pub struct DuplicateKey;

/// The requested key isn't present in the collection.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("key not found in the collection")]
pub struct KeyNotFound;

/// A positional lookup was made outside of `0..len`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("index {index} out of bounds for collection with {len} elements")]
pub struct IndexOutOfBounds {
    pub index: usize,
    pub len: usize,
}
