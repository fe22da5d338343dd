//! A module containing [`AvlTree`] and associated types.
//!
//! Nodes live in an arena and refer to their children by slot, which is what allows the tree's
//! index cache to point at nodes without sharing ownership of them.

mod avl_tree;
mod iter;
mod node;
mod tests;

pub use avl_tree::*;
pub use iter::*;
pub(crate) use node::*;
