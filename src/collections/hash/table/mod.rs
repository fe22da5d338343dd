//! A module containing [`HashTable`] and associated types.
//!
//! The other types here are for iteration, providing owned and borrowed iteration over entries,
//! keys or values. Every iterator visits entries in insertion order.
//!
//! As with the standard library's maps, there is no mutable iterator over keys because mutating
//! the keys of a HashTable in place would cause a logic error.

mod hash_table;
mod iter;

pub use hash_table::*;
pub use iter::*;
