//! Hash-based collections. Currently this is only [`HashTable`], a bucket-list table which also
//! remembers insertion order.

pub mod error;
pub mod table;

#[doc(inline)]
pub use error::*;
#[doc(inline)]
pub use table::HashTable;
