//! This crate is my attempt at writing (some key parts of) a standard library, starting with the
//! associative containers.
//!
//! # Purpose
//! This repo / crate is a learning project, with no expectation for it to be used in production.
//! The two collections here, [`HashTable`](collections::hash::HashTable) and
//! [`AvlTree`](collections::binary_tree::AvlTree), are the ones with enough moving parts to be
//! worth writing by hand: bucket rehashing with an unusual growth heuristic, and self-balancing
//! rotations that have to keep a parallel index in sync.
//!
//! # Error Handling
//! Operations that can fail because of the caller's input (adding a duplicate key, reading a
//! missing one, asking an empty collection for its first element) return [`Result`]s with small,
//! strongly typed error structs that implement [`Error`](std::error::Error). Each collection also
//! has a union enum of its errors for callers who don't care which one occurred.
//!
//! Failures that can only be caused by a bug in this crate (the tree and its index cache
//! disagreeing, for example) aren't represented as errors at all. They panic.
//!
//! # Hashing
//! Keys are hashed through a [`BuildHasher`](std::hash::BuildHasher), which defaults to
//! [`StableState`](hash::StableState) so that the same keys always land in the same buckets. The
//! [`hash`] module also provides [`hash_combine`](hash::hash_combine), for building one hash out
//! of several fields.
//!
//! # Thread Safety
//! None of the types here do any internal synchronization. They are plain owned values, so the
//! borrow checker already stops safe code from mutating one from two threads at once; anything
//! else is the caller's job.
//!
//! # Dependencies
//! This crate depends on `derive_more`, because writing `Display` and `Error` impls for every error
//! struct by hand is very repetitive, and on `log`, so that rehashes and bulk removals can be
//! traced without printing anything.
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_const_for_fn)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

pub mod collections;
pub mod hash;

pub(crate) mod util;
