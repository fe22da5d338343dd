#![warn(missing_docs)]

#[cfg(test)]
pub mod alloc;
#[cfg(test)]
pub mod hash;
pub mod option;
pub mod panic;
pub mod result;
