//! Extensions for [`Result`].

use std::error::Error;

use super::panic::InvariantViolation;

/// Extra methods for [`Result`]s whose error case has already been ruled out by the caller.
pub(crate) trait ResultExtension<T, E: Error> {
    /// The [`Result`] counterpart of
    /// [`OptionExtension::unreachable`](super::option::OptionExtension::unreachable). Panics with
    /// an [`InvariantViolation`] carrying `reason`, followed by the error that shouldn't have
    /// happened.
    ///
    /// Used where two views of a collection have to agree, such as a tree and its index cache.
    fn unreachable(self, reason: &'static str) -> T;
}

impl<T, E: Error> ResultExtension<T, E> for Result<T, E> {
    fn unreachable(self, reason: &'static str) -> T {
        match self {
            Ok(val) => val,
            Err(error) => panic!("{} ({error})", InvariantViolation(reason)),
        }
    }
}
