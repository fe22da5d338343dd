use std::borrow::Borrow;
use std::f64::consts::E;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{BuildHasher, Hash, Hasher};
use std::iter;
use std::mem;
use std::ops::ControlFlow;

use log::{debug, trace};

use super::{IntoKeys, IntoValues, Iter, IterMut, Keys, Values, ValuesMut};
use crate::collections::hash::{DuplicateKey, EmptyCollection, IndexOutOfBounds, KeyNotFound};
use crate::hash::{HashCombine, StableState};
use crate::util::option::OptionExtension;
use crate::util::result::ResultExtension;

/// The number of buckets allocated by the first insertion into a table without any.
pub const INITIAL_CAP: usize = 100;

/// A map of keys to values which relies on the keys implementing [`Hash`], storing colliding
/// entries together in bucket lists.
///
/// Alongside the buckets, the table keeps every entry in a single sequence in insertion order.
/// This sequence owns the entries (buckets refer to positions in it), so positional access with
/// [`get_at`](HashTable::get_at) is `O(1)` and iteration order is deterministic.
///
/// # Growth
/// Rather than tracking a load factor, the table tracks the size of its largest bucket. Before an
/// entry is placed, if that size exceeds `ln(cap)` the table is rehashed to `cap * e` buckets. A
/// table without buckets allocates [`INITIAL_CAP`] on its first insertion.
///
/// Keys with identical hashes can't be split up by rehashing. When a rehash leaves the largest
/// bucket as large as it was, bucket size stops driving growth and the table only grows once it
/// holds as many entries as it has buckets. A productive rehash switches the heuristic back on.
///
/// It is a logic error for keys in a HashTable to be manipulated in a way that changes their hash.
/// Because of this, HashTable's API prevents mutable access to its keys.
///
/// # Time Complexity
/// For this analysis of time complexity, variables are defined as follows:
/// - `n`: The number of entries in the HashTable.
/// - `b`: The number of buckets (the capacity).
///
/// | Method | Complexity |
/// |-|-|
/// | `len` | `O(1)` |
/// | `add` | `O(1)`**, `O(n + b)` |
/// | `get` | `O(1)`* |
/// | `get_at` | `O(1)` |
/// | `set` | `O(1)`* |
/// | `remove` | `O(n)`*, `O(1)`*** |
/// | `contains` | `O(1)`* |
/// | `clear` | `O(n)`* |
///
/// \* These functions walk the key's bucket. Buckets are kept short by the growth heuristic, but
/// a poor hasher will make them longer.
///
/// \** When the largest bucket is over the limit, `add` rehashes every entry first.
///
/// \*** Removing the most recently added entry doesn't shift any positions.
pub struct HashTable<K: Hash + Eq, V, B: BuildHasher = StableState> {
    pub(crate) buckets: Box<[Bucket]>,
    pub(crate) entries: Vec<(K, V)>,
    pub(crate) max_bucket_len: usize,
    /// Set when the last rehash didn't shrink the largest bucket.
    pub(crate) rehash_stalled: bool,
    pub(crate) hasher: B,
}

/// Positions (in insertion order) of the entries sharing a reduced hash.
pub(crate) type Bucket = Vec<usize>;

/// Where a key was found: its bucket, its slot within that bucket and its position in insertion
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Located {
    pub bucket: usize,
    pub slot: usize,
    pub position: usize,
}

impl<K: Hash + Eq, V, B: BuildHasher + Default> HashTable<K, V, B> {
    /// Creates a new HashTable with capacity 0 and the default value for `B`. Buckets will be
    /// allocated by the first insertion.
    pub fn new() -> HashTable<K, V, B> {
        HashTable::with_hasher(B::default())
    }

    /// Creates a new HashTable with `cap` buckets and the default hasher.
    pub fn with_cap(cap: usize) -> HashTable<K, V, B> {
        HashTable::with_cap_and_hasher(cap, B::default())
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> HashTable<K, V, B> {
    /// Creates a new HashTable with capacity 0 and the provided `hasher`.
    pub fn with_hasher(hasher: B) -> HashTable<K, V, B> {
        HashTable::with_cap_and_hasher(0, hasher)
    }

    /// Creates a new HashTable with `cap` buckets and the provided `hasher`.
    pub fn with_cap_and_hasher(cap: usize, hasher: B) -> HashTable<K, V, B> {
        HashTable {
            buckets: empty_buckets(cap),
            entries: Vec::new(),
            max_bucket_len: 0,
            rehash_stalled: false,
            hasher,
        }
    }

    /// Returns the number of entries in the HashTable.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the HashTable contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current number of buckets.
    pub fn cap(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the tracked size of the largest bucket, which drives rehashing.
    pub const fn max_bucket_len(&self) -> usize {
        self.max_bucket_len
    }

    /// Returns a reference to the hasher used by this table.
    pub const fn hasher(&self) -> &B {
        &self.hasher
    }

    /// Adds the provided `key`-`value` pair to the end of the HashTable, rehashing first if the
    /// largest bucket has outgrown the current capacity.
    ///
    /// Unlike the standard library's `insert`, an existing entry is never replaced: use
    /// [`set`](HashTable::set) for that.
    pub fn add(&mut self, key: K, value: V) -> Result<(), DuplicateKey> {
        if self.contains(&key) {
            return Err(DuplicateKey);
        }

        if self.should_grow() {
            self.grow();
        }

        let bucket = self.index_from_key(&key)
            .unreachable("no buckets after growing a HashTable");

        self.buckets[bucket].push(self.entries.len());
        self.entries.push((key, value));

        // Overflow remaining after a rehash is picked up by the next add.
        self.max_bucket_len = self.max_bucket_len.max(self.buckets[bucket].len());

        Ok(())
    }

    /// Replaces the value associated with `key`, returning the previous one. The entry keeps its
    /// position in insertion order and its bucket.
    pub fn set<Q>(&mut self, key: &Q, value: V) -> Result<V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let located = self.find(key).ok_or(KeyNotFound)?;
        Ok(mem::replace(&mut self.entries[located.position].1, value))
    }

    /// Returns the entry for the provided `key` as a key-value pair.
    pub fn get_entry<Q>(&self, key: &Q) -> Result<(&K, &V), KeyNotFound>
    where
        // We're introducing a new type parameter here, Q which represents a borrowed version of K
        // where equality and hashing carries over the borrow.
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let located = self.find(key).ok_or(KeyNotFound)?;
        let (k, v) = &self.entries[located.position];
        Ok((k, v))
    }

    /// Returns a reference to the value associated with the provided `key`.
    pub fn get<Q>(&self, key: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_entry(key).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value associated with the provided `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let located = self.find(key).ok_or(KeyNotFound)?;
        Ok(&mut self.entries[located.position].1)
    }

    /// Returns the entry at `index` in insertion order.
    pub fn get_at(&self, index: usize) -> Result<(&K, &V), IndexOutOfBounds> {
        match self.entries.get(index) {
            Some((k, v)) => Ok((k, v)),
            None => Err(IndexOutOfBounds { index, len: self.len() }),
        }
    }

    /// Returns true if there is a value associated with the provided `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes the entry associated with `key`, returning it.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Result<(K, V), KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let located = self.find(key).ok_or(KeyNotFound)?;
        Ok(self.remove_located(located))
    }

    /// Removes the entry associated with `key`, returning the value. An [`Ok`] result means the
    /// removal happened.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes every entry, one key at a time, starting from the most recent. The buckets are
    /// kept, so the capacity doesn't change.
    pub fn clear(&mut self) {
        let removed = self.len();

        while let Some((key, _)) = self.entries.last() {
            let located = self.locate(key);
            drop(self.remove_located(located));
        }

        debug!("cleared {removed} entries from HashTable with {} buckets", self.cap());
    }

    /// Visits every entry in insertion order until `callback` breaks. The break value, if any, is
    /// returned.
    pub fn iterate<'a, R>(
        &'a self,
        mut callback: impl FnMut(&'a K, &'a V) -> ControlFlow<R>,
    ) -> ControlFlow<R> {
        for (key, value) in self.entries.iter() {
            callback(key, value)?;
        }

        ControlFlow::Continue(())
    }

    /// Returns true if any entry matches `predicate`, stopping at the first match.
    pub fn any(&self, mut predicate: impl FnMut(&K, &V) -> bool) -> bool {
        self.iterate(|key, value| match predicate(key, value) {
            true => ControlFlow::Break(()),
            false => ControlFlow::Continue(()),
        }).is_break()
    }

    /// Calls `callback` with every entry in insertion order.
    pub fn for_each(&self, mut callback: impl FnMut(&K, &V)) {
        let _ = self.iterate(|key, value| {
            callback(key, value);
            ControlFlow::<()>::Continue(())
        });
    }

    /// Returns the first key in insertion order.
    pub fn first_key(&self) -> Result<&K, EmptyCollection> {
        self.get_at(0).map(|(k, _)| k).map_err(|_| EmptyCollection)
    }

    /// Returns the first value in insertion order.
    pub fn first_value(&self) -> Result<&V, EmptyCollection> {
        self.get_at(0).map(|(_, v)| v).map_err(|_| EmptyCollection)
    }

    /// Returns the key of the first entry matching `predicate`.
    pub fn first_key_where(&self, mut predicate: impl FnMut(&K, &V) -> bool) -> Option<&K> {
        match self.iterate(|key, value| match predicate(key, value) {
            true => ControlFlow::Break(key),
            false => ControlFlow::Continue(()),
        }) {
            ControlFlow::Break(key) => Some(key),
            ControlFlow::Continue(()) => None,
        }
    }

    /// Returns the value of the first entry matching `predicate`.
    pub fn first_value_where(&self, mut predicate: impl FnMut(&K, &V) -> bool) -> Option<&V> {
        match self.iterate(|key, value| match predicate(key, value) {
            true => ControlFlow::Break(value),
            false => ControlFlow::Continue(()),
        }) {
            ControlFlow::Break(value) => Some(value),
            ControlFlow::Continue(()) => None,
        }
    }

    /// Returns a copy of the first key matching `predicate`, or the default key if none do.
    pub fn first_or_default_key(&self, predicate: impl FnMut(&K, &V) -> bool) -> K
    where
        K: Clone + Default,
    {
        self.first_key_where(predicate).cloned().unwrap_or_default()
    }

    /// Removes every entry matching `predicate`, returning the removed entries in insertion order.
    ///
    /// Matches are all collected before anything is removed, so `predicate` never sees a
    /// partially modified table.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&K, &V) -> bool) -> Vec<(K, V)> {
        let mut marked = Vec::new();
        let mut position = 0;

        self.for_each(|key, value| {
            if predicate(key, value) {
                marked.push(position);
            }
            position += 1;
        });

        // Back to front, so that earlier positions aren't shifted by the removals.
        let mut removed = Vec::with_capacity(marked.len());
        for position in marked.into_iter().rev() {
            let located = self.locate(&self.entries[position].0);
            removed.push(self.remove_located(located));
        }
        removed.reverse();

        debug!("removed {} matching entries from HashTable", removed.len());
        removed
    }

    /// Maps every value, in insertion order, into a new sequence.
    pub fn select_from_values<R>(&self, mut selector: impl FnMut(&V) -> R) -> Vec<R> {
        let mut result = Vec::with_capacity(self.len());
        self.for_each(|_, value| result.push(selector(value)));
        result
    }

    /// Creates a new HashTable holding copies of the entries that don't match `predicate`.
    pub fn except(&self, mut predicate: impl FnMut(&K, &V) -> bool) -> HashTable<K, V, B>
    where
        K: Clone,
        V: Clone,
        B: Clone,
    {
        let mut result = HashTable::with_hasher(self.hasher.clone());

        self.for_each(|key, value| {
            if !predicate(key, value) {
                result.add(key.clone(), value.clone())
                    .unreachable("a key was duplicated while copying a HashTable");
            }
        });

        result
    }

    /// Returns copies of all keys, in insertion order.
    pub fn collect_keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.keys().cloned().collect()
    }

    /// Returns copies of all values, in insertion order.
    pub fn collect_values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.values().cloned().collect()
    }

    /// Returns a hash of the table's keys, combined in insertion order. Tables holding the same
    /// keys added in a different order will (almost always) hash differently. An empty table
    /// hashes to 0.
    pub fn get_hash(&self) -> u64 {
        let mut combine = HashCombine::new();
        self.for_each(|key, _| {
            combine.add(&self.hasher, key);
        });
        combine.finish()
    }

    /// Returns an iterator over all key-value pairs in the HashTable, as references.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.into_iter()
    }

    /// Returns an iterator over all key-value pairs in the HashTable, with mutable references to
    /// the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.into_iter()
    }

    /// Consumes self and returns an iterator over all contained keys.
    pub fn into_keys(self) -> IntoKeys<K, V> {
        IntoKeys(self.into_iter())
    }

    /// Returns an iterator over all keys in the HashTable, as references.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Consumes self and returns an iterator over all contained values.
    pub fn into_values(self) -> IntoValues<K, V> {
        IntoValues(self.into_iter())
    }

    /// Returns an iterator over all values in the HashTable, as mutable references.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut(self.iter_mut())
    }

    /// Returns an iterator over all values in the HashTable, as references.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> HashTable<K, V, B> {
    /// Determines whether the largest bucket has outgrown the natural log of the capacity (or
    /// there are no buckets at all), meaning the table should rehash before placing an entry.
    ///
    /// After a rehash that didn't help, only a full table counts.
    pub(crate) fn should_grow(&self) -> bool {
        if self.cap() == 0 || self.len() >= self.cap() {
            return true;
        }

        !self.rehash_stalled && self.max_bucket_len as f64 > (self.cap() as f64).ln()
    }

    /// Grows the HashTable by a factor of e, or to [`INITIAL_CAP`] if it has no buckets.
    pub(crate) fn grow(&mut self) {
        let new_cap = match self.cap() {
            0 => INITIAL_CAP,
            cap => (cap as f64 * E) as usize,
        };

        self.rehash(new_cap);
    }

    /// Rebuilds the buckets with `new_cap` buckets, redistributing every entry and recomputing the
    /// largest bucket size from scratch. Insertion order is unaffected.
    pub(crate) fn rehash(&mut self, new_cap: usize) {
        let old_cap = self.cap();
        let mut buckets = empty_buckets(new_cap);
        let mut max_bucket_len = 0;

        for (position, (key, _)) in self.entries.iter().enumerate() {
            // UNREACHABLE: There are entries, so the new capacity can't be 0.
            let index = reduce(self.hasher.hash_one(key), new_cap)
                .unreachable("rehashed HashTable entries into 0 buckets");

            buckets[index].push(position);
            max_bucket_len = max_bucket_len.max(buckets[index].len());
        }

        // Stalled if the largest bucket was over its limit and the new layout didn't shrink it.
        self.rehash_stalled = old_cap != 0
            && self.max_bucket_len as f64 > (old_cap as f64).ln()
            && max_bucket_len >= self.max_bucket_len;
        self.buckets = buckets;
        self.max_bucket_len = max_bucket_len;

        trace!(
            "rehashed HashTable from {old_cap} to {new_cap} buckets ({} entries, largest bucket {}{})",
            self.len(),
            self.max_bucket_len,
            if self.rehash_stalled { ", stalled" } else { "" },
        );
    }

    /// Calculates the bucket for the provided `hashable` (or None if the HashTable has no buckets).
    pub(crate) fn index_from_key<H: Hash + ?Sized>(&self, hashable: &H) -> Option<usize> {
        reduce(self.hasher.hash_one(hashable), self.cap())
    }

    /// Finds the bucket, bucket slot and insertion position of `key`, if it's present.
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<Located>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.index_from_key(key)?;

        // This is where Eq comes in: walk the bucket until an equal key turns up.
        self.buckets[bucket]
            .iter()
            .position(|&position| <K as Borrow<Q>>::borrow(&self.entries[position].0) == key)
            .map(|slot| Located {
                bucket,
                slot,
                position: self.buckets[bucket][slot],
            })
    }

    /// Finds a key that is known to be in the table.
    pub(crate) fn locate<Q>(&self, key: &Q) -> Located
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key)
            .unreachable("HashTable entry missing from its bucket")
    }

    /// Unlinks the entry at `located` from its bucket and from insertion order, returning it.
    pub(crate) fn remove_located(&mut self, located: Located) -> (K, V) {
        let bucket = &mut self.buckets[located.bucket];

        if bucket.len() == self.max_bucket_len {
            self.max_bucket_len -= 1;
        }
        bucket.remove(located.slot);

        let entry = self.entries.remove(located.position);

        // Every entry after the removed one has moved down a position. Only their buckets need
        // fixing.
        for position in located.position..self.entries.len() {
            let bucket = self.index_from_key(&self.entries[position].0)
                .unreachable("HashTable entries without buckets");
            let stored = self.buckets[bucket].iter_mut()
                .find(|stored| **stored == position + 1)
                .unreachable("shifted HashTable entry missing from its bucket");
            *stored = position;
        }

        entry
    }
}

/// Reduces a hash to a bucket index (or None when there are no buckets).
fn reduce(hash: u64, cap: usize) -> Option<usize> {
    hash.checked_rem(cap as u64).map(|i| i as usize)
}

fn empty_buckets(cap: usize) -> Box<[Bucket]> {
    iter::repeat_with(Bucket::new).take(cap).collect()
}

impl<K: Hash + Eq, V, B: BuildHasher + Default> Default for HashTable<K, V, B> {
    fn default() -> Self {
        HashTable::new()
    }
}

impl<K: Hash + Eq + Clone, V: Clone, B: BuildHasher + Clone> Clone for HashTable<K, V, B> {
    fn clone(&self) -> Self {
        HashTable {
            buckets: self.buckets.clone(),
            entries: self.entries.clone(),
            max_bucket_len: self.max_bucket_len,
            rehash_stalled: self.rehash_stalled,
            hasher: self.hasher.clone(),
        }
    }
}

impl<K: Hash + Eq, V, B: BuildHasher> Hash for HashTable<K, V, B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.get_hash());
    }
}

impl<K: Hash + Eq + Debug, V: Debug, B: BuildHasher + Debug> Debug for HashTable<K, V, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let buckets = self.buckets.iter()
            .filter(|bucket| !bucket.is_empty())
            .map(|bucket| DebugChain {
                positions: bucket,
                entries: &self.entries,
            })
            .collect::<Vec<_>>();

        f.debug_struct("HashTable")
            .field("buckets", &buckets)
            .field("len", &self.len())
            .field("cap", &self.cap())
            .field("max_bucket_len", &self.max_bucket_len)
            .field("hasher", &self.hasher)
            .finish()
    }
}

impl<K: Hash + Eq + Debug, V: Debug, B: BuildHasher> Display for HashTable<K, V, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#")?;
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Writes one bucket as a chain of entries: `(k: v) -> (k: v)`.
struct DebugChain<'a, K, V> {
    positions: &'a [usize],
    entries: &'a [(K, V)],
}

impl<K: Debug, V: Debug> Debug for DebugChain<'_, K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, &position) in self.positions.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            let (k, v) = &self.entries[position];
            write!(f, "({k:?}: {v:?})")?;
        }
        Ok(())
    }
}
