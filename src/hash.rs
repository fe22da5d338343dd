//! Hash generation and combination shared by the keyed collections.
//!
//! Keys in this crate are hashed through a [`BuildHasher`], in the same way as the standard
//! library's maps. The default builder, [`StableState`], has no per-instance randomness: the same
//! key hashes the same way in every table, which is what lets a table's own hash
//! ([`HashTable::get_hash`](crate::collections::hash::HashTable::get_hash)) be compared across
//! instances.
//!
//! Compound keys can be reduced to a single hash with [`HashCombine`] or the [`combine_hashes!`]
//! macro. Combining is order-sensitive: `combine(a, b)` and `combine(b, a)` are (almost always)
//! different.

use std::hash::{BuildHasher, BuildHasherDefault, DefaultHasher, Hash};

use crate::util::panic::{InvariantViolation, Panic};

/// The default [`BuildHasher`] for this crate's collections. Deterministic: every instance builds
/// identical hashers.
pub type StableState = BuildHasherDefault<DefaultHasher>;

const GOLDEN_RATIO: u64 = 0x9e3779b9;
const MIX_MULTIPLIER: u64 = 0xe9846af9b1a615d;

/// Mixes `next` into `seed`, returning the new seed. This is the 64-bit `hash_mix` step from
/// boost's `hash_combine`.
///
/// ```
/// use simple_std::hash::hash_combine;
///
/// assert_ne!(hash_combine(1, 2), hash_combine(2, 1));
/// ```
pub const fn hash_combine(seed: u64, next: u64) -> u64 {
    let mut x = seed.wrapping_add(GOLDEN_RATIO).wrapping_add(next);
    x ^= x >> 32;
    x = x.wrapping_mul(MIX_MULTIPLIER);
    x ^= x >> 32;
    x = x.wrapping_mul(MIX_MULTIPLIER);
    x ^= x >> 28;
    x
}

/// Hashes a single `value` with the provided `builder`.
pub fn generate_hash<T: Hash + ?Sized, B: BuildHasher>(builder: &B, value: &T) -> u64 {
    builder.hash_one(value)
}

/// A running, order-sensitive combination of hashes.
///
/// A seed of 0 means nothing has been added yet: the first hash becomes the seed as-is and every
/// later hash is mixed in with [`hash_combine`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HashCombine {
    seed: u64,
}

impl HashCombine {
    /// Creates an empty combination.
    pub const fn new() -> HashCombine {
        HashCombine { seed: 0 }
    }

    /// Continues a combination from an existing hash.
    pub const fn from_seed(seed: u64) -> HashCombine {
        HashCombine { seed }
    }

    /// Hashes `value` with `builder` and mixes the result in.
    pub fn add<T: Hash + ?Sized, B: BuildHasher>(&mut self, builder: &B, value: &T) -> &mut Self {
        self.add_hash(generate_hash(builder, value))
    }

    /// Mixes an already computed hash in.
    ///
    /// # Panics
    /// Panics if mixing into a non-empty seed produces 0, which would make the combination look
    /// empty to the next step.
    pub fn add_hash(&mut self, next: u64) -> &mut Self {
        if self.seed == 0 {
            self.seed = next;
        } else {
            self.seed = hash_combine(self.seed, next);

            if self.seed == 0 {
                InvariantViolation("hash combination collided with the empty seed").panic()
            }
        }
        self
    }

    /// Returns the combined hash.
    pub const fn finish(&self) -> u64 {
        self.seed
    }
}

/// Combines the hashes of several values, in order, using the provided builder.
///
/// ```
/// use simple_std::combine_hashes;
/// use simple_std::hash::StableState;
///
/// let state = StableState::default();
/// let a = combine_hashes!(&state; 1_u32, "north");
/// let b = combine_hashes!(&state; "north", 1_u32);
/// assert_ne!(a, b);
/// ```
#[macro_export]
macro_rules! combine_hashes {
    ($builder:expr; $($value:expr),+ $(,)?) => {{
        let mut combine = $crate::hash::HashCombine::new();
        $( combine.add($builder, &$value); )+
        combine.finish()
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_hash_is_kept_verbatim() {
        let mut combine = HashCombine::new();
        combine.add_hash(42);
        assert_eq!(combine.finish(), 42, "The first hash should seed the combination unchanged.");

        combine.add_hash(7);
        assert_eq!(
            combine.finish(),
            hash_combine(42, 7),
            "Later hashes should be mixed into the seed."
        );
    }

    #[test]
    fn test_combination_is_order_sensitive() {
        let state = StableState::default();

        assert_ne!(
            combine_hashes!(&state; 1_u64, 2_u64, 3_u64),
            combine_hashes!(&state; 3_u64, 2_u64, 1_u64),
        );
        assert_eq!(
            combine_hashes!(&state; "a", 5_i32),
            combine_hashes!(&state; "a", 5_i32),
            "Combining the same fields should be deterministic."
        );
    }

    #[test]
    fn test_stable_state_is_deterministic() {
        assert_eq!(
            generate_hash(&StableState::default(), "key"),
            generate_hash(&StableState::default(), "key"),
            "Separate builders should agree on every hash."
        );
    }
}
