//! Extensions for [`Option`].

use super::panic::{InvariantViolation, Panic};

/// Extra methods for [`Option`]s that are known to be [`Some`].
pub(crate) trait OptionExtension<T> {
    /// Acts similarly to [`Option::unwrap`], but panics with an [`InvariantViolation`] carrying
    /// `reason` in the none branch. Using it states that None is impossible.
    fn unreachable(self, reason: &'static str) -> T;
}

impl<T> OptionExtension<T> for Option<T> {
    fn unreachable(self, reason: &'static str) -> T {
        match self {
            Some(val) => val,
            None => InvariantViolation(reason).panic(),
        }
    }
}
