//! Various general-purpose collection types.
//!
//! # Purpose
//! I wrote these types to learn about the data structures themselves, but also about ownership
//! across parallel structures: both collections here keep two views of the same data (buckets
//! and an insertion list, a tree and an index) and have to keep them in lock-step.

#[cfg(feature = "binary-tree")]
pub mod binary_tree;
pub mod error;
#[cfg(feature = "hash")]
pub mod hash;
