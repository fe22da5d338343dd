use derive_more::{Display, Error, From, IsVariant, TryInto};

pub use crate::collections::error::{DuplicateKey, KeyNotFound};

/// A min / max key was requested from a tree without any nodes.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[display("tree is empty")]
pub struct EmptyTree;

/// Any of the errors an [`AvlTree`](super::AvlTree) can return.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error, From, TryInto, IsVariant)]
pub enum AvlTreeError {
    DuplicateKey(DuplicateKey),
    KeyNotFound(KeyNotFound),
    EmptyTree(EmptyTree),
}
