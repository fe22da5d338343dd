//! Ordered collections built on binary search trees. Currently this is only [`AvlTree`], a
//! self-balancing tree with a hash-backed index for direct key lookups.

pub mod avl;
pub mod error;

#[doc(inline)]
pub use avl::AvlTree;
#[doc(inline)]
pub use error::*;
