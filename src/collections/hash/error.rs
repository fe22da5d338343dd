use derive_more::{Display, Error, From, IsVariant, TryInto};

pub use crate::collections::error::{DuplicateKey, IndexOutOfBounds, KeyNotFound};

/// An operation that needs at least one entry was called on an empty collection.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("collection is empty")]
pub struct EmptyCollection;

/// Any of the errors a [`HashTable`](super::HashTable) can return.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error, From, TryInto, IsVariant)]
pub enum HashTableError {
    DuplicateKey(DuplicateKey),
    KeyNotFound(KeyNotFound),
    EmptyCollection(EmptyCollection),
    IndexOutOfBounds(IndexOutOfBounds),
}
