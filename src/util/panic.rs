//! Panics for states that only a bug in this crate can produce.

use std::error::Error;

use derive_more::{Display, Error};

/// An [`Error`] that is never handed to the caller. Types implementing this represent broken
/// internal invariants, so the only sensible response is to stop.
pub trait Panic: Error {
    /// Panics with the message of the error itself.
    fn panic(&self) -> ! {
        panic!("{}", self)
    }
}

/// Two internal views of the same collection have diverged.
#[derive(Debug, Display, Error)]
#[display("internal invariant violated: {_0}")]
pub struct InvariantViolation(#[error(not(source))] pub &'static str);
impl Panic for InvariantViolation {}

/// Runs `$run`, asserting that it panics with a message containing `$expected`.
#[cfg(test)]
macro_rules! assert_panics {
    ($run:block, $expected:expr) => {
        let payload = std::panic::catch_unwind(|| $run)
            .expect_err("block was expected to panic");
        let message = payload.downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| payload.downcast_ref::<&str>().copied())
            .unwrap_or_default();
        assert!(
            message.contains($expected),
            "panic message {message:?} should mention {:?}",
            $expected
        );
    };
}

#[cfg(test)]
pub(crate) use assert_panics;
