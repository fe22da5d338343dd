//! Hashing helpers for tests that need to choose which bucket a key lands in.

use std::hash::{BuildHasher, Hash, Hasher};

/// A key whose hash is picked by the test. Equality only looks at `value`, so two keys with the
/// same `hash` collide without being equal.
#[derive(Debug, Clone)]
pub struct FixedHash<T: Eq> {
    pub hash: u64,
    pub value: T,
}

impl<T: Eq> FixedHash<T> {
    pub const fn new(hash: u64, value: T) -> FixedHash<T> {
        FixedHash { hash, value }
    }
}

impl<T: Eq> Hash for FixedHash<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl<T: Eq> PartialEq for FixedHash<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for FixedHash<T> {}

/// Reports the last `u64` written to it as the hash, so a [`FixedHash`] with hash `h` lands in
/// bucket `h % cap`.
#[derive(Debug, Default)]
pub struct PassThroughHasher(u64);

impl Hasher for PassThroughHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    fn write(&mut self, bytes: &[u8]) {
        // Only reached by keys other than FixedHash. Any spread will do.
        for byte in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(*byte);
        }
    }
}

/// Builds [`PassThroughHasher`]s.
#[derive(Debug, Default, Clone)]
pub struct PassThroughState;

impl BuildHasher for PassThroughState {
    type Hasher = PassThroughHasher;

    fn build_hasher(&self) -> Self::Hasher {
        PassThroughHasher::default()
    }
}
