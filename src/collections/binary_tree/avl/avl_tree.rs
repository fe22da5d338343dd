use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter, Write};
use std::hash::{BuildHasher, Hash};
use std::ops::ControlFlow;

use super::{Arena, Iter, Keys, Node, NodeId, Values};
use crate::collections::binary_tree::{DuplicateKey, EmptyTree, KeyNotFound};
use crate::collections::hash::HashTable;
use crate::hash::StableState;
use crate::util::option::OptionExtension;
use crate::util::panic::{InvariantViolation, Panic};
use crate::util::result::ResultExtension;

/// A self-balancing (AVL) binary search tree, mapping ordered keys to values.
///
/// Every insertion and removal rebalances each ancestor of the affected node with rotations, so
/// the heights of any node's two subtrees never differ by more than one.
///
/// Alongside the tree, an index cache ([`HashTable`]) maps every key to its node. Lookups by key
/// go straight through the cache instead of walking the tree, and duplicate or missing keys are
/// rejected before the tree is touched. The cache keeps its own copy of each key, hence the
/// `Clone` bound.
///
/// # Time Complexity
/// For this analysis of time complexity, variables are defined as follows:
/// - `n`: The number of entries in the tree.
///
/// | Method | Complexity |
/// |-|-|
/// | `len` | `O(1)` |
/// | `insert` | `O(log n)`* |
/// | `remove` | `O(log n)`, `O(n)`** |
/// | `get` | `O(1)`* |
/// | `contains_key` | `O(1)`* |
/// | `min_key` / `max_key` | `O(log n)` |
/// | `successor` / `predecessor` | `O(log n)` |
/// | `clear` | `O(n)` |
///
/// \* Plus the cost of the index cache, see [`HashTable`].
///
/// \** Removing from the index cache shifts every later key down one position in its insertion
/// order, so removing an early key costs `O(n)`.
pub struct AvlTree<K: Ord + Hash + Clone, V, B: BuildHasher = StableState> {
    pub(crate) root: Option<NodeId>,
    pub(crate) nodes: Arena<K, V>,
    pub(crate) index: HashTable<K, NodeId, B>,
}

impl<K: Ord + Hash + Clone, V, B: BuildHasher + Default> AvlTree<K, V, B> {
    /// Creates an empty tree with the default hasher for its index cache.
    pub fn new() -> AvlTree<K, V, B> {
        AvlTree::with_hasher(B::default())
    }
}

impl<K: Ord + Hash + Clone, V, B: BuildHasher> AvlTree<K, V, B> {
    /// Creates an empty tree whose index cache uses the provided `hasher`.
    pub fn with_hasher(hasher: B) -> AvlTree<K, V, B> {
        AvlTree {
            root: None,
            nodes: Arena::new(),
            index: HashTable::with_hasher(hasher),
        }
    }

    /// Returns the number of entries, as counted by the index cache.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the tree contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of levels in the tree, 0 when empty.
    pub fn height(&self) -> usize {
        (self.nodes.height_of(self.root) + 1) as usize
    }

    /// Inserts `key` with `value` and rebalances the path back up to the root.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), DuplicateKey> {
        if self.index.contains(&key) {
            return Err(DuplicateKey);
        }

        let cached = key.clone();
        let id = self.nodes.alloc(Node::leaf(key, value));
        let root = self.insert_at(self.root, id);
        self.root = Some(root);

        self.index.add(cached, id)
            .unreachable("index cache gained the key while inserting into the tree");
        Ok(())
    }

    /// Removes `key`, rebalancing the path back up to the root, and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Ord + Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;

        let root = self.remove_at(self.root, key);
        self.root = root;

        self.index.remove(key)
            .unreachable("index cache lost the key while removing from the tree");
        Ok(self.nodes.free(id).value)
    }

    /// Returns a reference to the value for `key`, looked up through the index cache.
    pub fn get<Q>(&self, key: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Ord + Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        Ok(&self.nodes[id].value)
    }

    /// Returns a mutable reference to the value for `key`, looked up through the index cache.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Ord + Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        Ok(&mut self.nodes[id].value)
    }

    /// Returns a reference to the value for `key`, or None if it isn't present. The index cache is
    /// tried first, falling back to a walk of the tree.
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + Hash + Eq + ?Sized,
    {
        if let Ok(id) = self.index.get(key) {
            return Some(&self.nodes[*id].value);
        }

        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    /// Returns true if `key` is in the index cache, and therefore in the tree.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + Hash + Eq + ?Sized,
    {
        self.index.contains(key)
    }

    /// Returns the smallest key in the tree.
    pub fn min_key(&self) -> Result<&K, EmptyTree> {
        self.root.map(|root| &self.nodes[self.min_at(root)].key).ok_or(EmptyTree)
    }

    /// Returns the largest key in the tree.
    pub fn max_key(&self) -> Result<&K, EmptyTree> {
        self.root.map(|root| &self.nodes[self.max_at(root)].key).ok_or(EmptyTree)
    }

    /// Returns the value of the smallest key, or None for an empty tree.
    pub fn min_value(&self) -> Option<&V> {
        self.root.map(|root| &self.nodes[self.min_at(root)].value)
    }

    /// Returns the value of the largest key, or None for an empty tree.
    pub fn max_value(&self) -> Option<&V> {
        self.root.map(|root| &self.nodes[self.max_at(root)].value)
    }

    /// Returns the entry with the smallest key greater than `key`. None if `key` isn't in the tree
    /// or is already the largest.
    pub fn successor<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + Hash + Eq + ?Sized,
    {
        if !self.contains_key(key) {
            return None;
        }

        // The last node where the search went left is the successor, unless the found node has a
        // right subtree.
        let mut current = self.root;
        let mut candidate = None;
        while let Some(id) = current {
            let node = &self.nodes[id];
            match key.cmp(node.key.borrow()) {
                Ordering::Less => {
                    candidate = Some(id);
                    current = node.left;
                },
                Ordering::Greater => current = node.right,
                Ordering::Equal => {
                    if let Some(right) = node.right {
                        candidate = Some(self.min_at(right));
                    }
                    break;
                },
            }
        }

        candidate.map(|id| self.nodes[id].tuple())
    }

    /// Returns the entry with the largest key less than `key`. None if `key` isn't in the tree or
    /// is already the smallest.
    pub fn predecessor<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + Hash + Eq + ?Sized,
    {
        if !self.contains_key(key) {
            return None;
        }

        let mut current = self.root;
        let mut candidate = None;
        while let Some(id) = current {
            let node = &self.nodes[id];
            match key.cmp(node.key.borrow()) {
                Ordering::Less => current = node.left,
                Ordering::Greater => {
                    candidate = Some(id);
                    current = node.right;
                },
                Ordering::Equal => {
                    if let Some(left) = node.left {
                        candidate = Some(self.max_at(left));
                    }
                    break;
                },
            }
        }

        candidate.map(|id| self.nodes[id].tuple())
    }

    /// Destroys every node, children before parents, then clears the index cache.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            self.clear_at(root);
        }

        self.index.clear();
    }

    /// Visits every entry in ascending key order until `callback` breaks. The break value, if any,
    /// is returned.
    pub fn iterate<'a, R>(
        &'a self,
        mut callback: impl FnMut(&'a K, &'a V) -> ControlFlow<R>,
    ) -> ControlFlow<R> {
        for (key, value) in self.iter() {
            callback(key, value)?;
        }

        ControlFlow::Continue(())
    }

    /// Visits every entry in the order the keys were inserted, which is the order of the index
    /// cache.
    pub fn iterate_inserted<'a, R>(
        &'a self,
        mut callback: impl FnMut(&'a K, &'a V) -> ControlFlow<R>,
    ) -> ControlFlow<R> {
        let nodes = &self.nodes;
        self.index.iterate(move |key, id| callback(key, &nodes[*id].value))
    }

    /// Returns an iterator over all entries, in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.nodes, self.root, self.len())
    }

    /// Returns an iterator over all keys, in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Returns an iterator over all values, in ascending key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Describes every node, pre-order, with its depth, height and whether the index cache knows
    /// about it. One line per node.
    pub fn create_output(&self) -> String
    where
        K: Debug,
        V: Debug,
    {
        let mut output = String::new();
        if let Some(root) = self.root {
            self.create_output_at(root, 0, &mut output);
        }
        output
    }
}

impl<K: Ord + Hash + Clone, V, B: BuildHasher> AvlTree<K, V, B> {
    /// Links the already allocated node `new` into the subtree rooted at `subtree`, returning the
    /// new root of that subtree.
    fn insert_at(&mut self, subtree: Option<NodeId>, new: NodeId) -> NodeId {
        let Some(id) = subtree else {
            return new;
        };

        match self.nodes[new].key.cmp(&self.nodes[id].key) {
            Ordering::Less => {
                let left = self.nodes[id].left;
                let left = self.insert_at(left, new);
                self.nodes[id].left = Some(left);
            },
            Ordering::Greater => {
                let right = self.nodes[id].right;
                let right = self.insert_at(right, new);
                self.nodes[id].right = Some(right);
            },
            Ordering::Equal => InvariantViolation("duplicate key reached the tree past the index")
                .panic(),
        }

        self.nodes.update_height(id);
        self.balance(id)
    }

    /// Unlinks the node for `key` from the subtree rooted at `subtree`, returning the new root of
    /// that subtree. The unlinked node stays allocated.
    fn remove_at<Q>(&mut self, subtree: Option<NodeId>, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut id = subtree.unreachable("indexed key missing from the tree");

        match key.cmp(self.nodes[id].key.borrow()) {
            Ordering::Less => {
                let left = self.nodes[id].left;
                let left = self.remove_at(left, key);
                self.nodes[id].left = left;
            },
            Ordering::Greater => {
                let right = self.nodes[id].right;
                let right = self.remove_at(right, key);
                self.nodes[id].right = right;
            },
            Ordering::Equal => match (self.nodes[id].left, self.nodes[id].right) {
                (None, right) => return right,
                (left, None) => return left,
                (Some(left), Some(right)) => {
                    // Replace the node with its in-order successor.
                    let successor = self.min_at(right);
                    let rest = self.delete_min(right);
                    self.nodes[successor].right = rest;
                    self.nodes[successor].left = Some(left);
                    id = successor;
                },
            },
        }

        self.nodes.update_height(id);
        Some(self.balance(id))
    }

    /// Unlinks the smallest node of the subtree rooted at `id`, returning the new root of that
    /// subtree.
    fn delete_min(&mut self, id: NodeId) -> Option<NodeId> {
        let Some(left) = self.nodes[id].left else {
            return self.nodes[id].right;
        };

        let left = self.delete_min(left);
        self.nodes[id].left = left;
        self.nodes.update_height(id);
        Some(self.balance(id))
    }

    fn min_at(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    fn max_at(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.nodes[id].right {
            id = right;
        }
        id
    }

    /// Restores the AVL balance at `id` with one or two rotations, returning the new root of the
    /// subtree. Child heights must already be correct.
    fn balance(&mut self, id: NodeId) -> NodeId {
        let balance_factor = self.nodes.balance_factor(id);

        if balance_factor < -1 {
            let right = self.nodes[id].right.unreachable("right-heavy node without a right child");

            // Right-Left
            if self.nodes.balance_factor(right) > 0 {
                let right = self.rotate_right(right);
                self.nodes[id].right = Some(right);
            }
            self.rotate_left(id)
        } else if balance_factor > 1 {
            let left = self.nodes[id].left.unreachable("left-heavy node without a left child");

            // Left-Right
            if self.nodes.balance_factor(left) < 0 {
                let left = self.rotate_left(left);
                self.nodes[id].left = Some(left);
            }
            self.rotate_right(id)
        } else {
            id
        }
    }

    /// Makes the right child of `x` the root of the subtree, returning it. `x` adopts the pivot's
    /// left child.
    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let z = self.nodes[x].right.unreachable("rotated left without a right child");
        let w = self.nodes[z].left;

        self.nodes[x].right = w;
        self.nodes[z].left = Some(x);

        self.nodes.update_height(x);
        self.nodes.update_height(z);
        z
    }

    /// Makes the left child of `x` the root of the subtree, returning it. `x` adopts the pivot's
    /// right child.
    fn rotate_right(&mut self, x: NodeId) -> NodeId {
        let z = self.nodes[x].left.unreachable("rotated right without a left child");
        let w = self.nodes[z].right;

        self.nodes[x].left = w;
        self.nodes[z].right = Some(x);

        self.nodes.update_height(x);
        self.nodes.update_height(z);
        z
    }

    fn clear_at(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let (left, right) = (node.left, node.right);

        if let Some(left) = left {
            self.clear_at(left);
        }
        if let Some(right) = right {
            self.clear_at(right);
        }

        drop(self.nodes.free(id));
    }

    fn create_output_at(&self, id: NodeId, level: usize, output: &mut String)
    where
        K: Debug,
        V: Debug,
    {
        let node = &self.nodes[id];
        // Writing to a String can't fail.
        let _ = writeln!(
            output,
            "Node level {level}: Key={:?} Value={:?} Height={} Mapped={}",
            node.key,
            node.value,
            node.height,
            self.index.contains(&node.key),
        );

        if let Some(left) = node.left {
            self.create_output_at(left, level + 1, output);
        }
        if let Some(right) = node.right {
            self.create_output_at(right, level + 1, output);
        }
    }

    /// Draws the subtree at `id` sideways: left children above, right children below.
    fn fmt_branch(&self, id: Option<NodeId>) -> String
    where
        K: Debug,
        V: Debug,
    {
        match id {
            Some(id) => {
                let node = &self.nodes[id];
                format!(
                    "{}\n({:?}: {:?})\n{}",
                    self.fmt_branch(node.left)
                        .lines()
                        .map(|l| String::from("┌    ") + l)
                        .collect::<Vec<_>>()
                        .join("\n"),
                    node.key,
                    node.value,
                    self.fmt_branch(node.right)
                        .lines()
                        .map(|l| String::from("└    ") + l)
                        .collect::<Vec<_>>()
                        .join("\n"),
                )
            },
            None => String::from("-"),
        }
    }
}

impl<K: Ord + Hash + Clone, V, B: BuildHasher + Default> Default for AvlTree<K, V, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Hash + Clone, V: Clone, B: BuildHasher + Clone> Clone for AvlTree<K, V, B> {
    fn clone(&self) -> Self {
        // Slots are copied as-is, so the cloned index still points at the right nodes.
        AvlTree {
            root: self.root,
            nodes: self.nodes.clone(),
            index: self.index.clone(),
        }
    }
}

impl<K: Ord + Hash + Clone + Debug, V: Debug, B: BuildHasher> Debug for AvlTree<K, V, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvlTree")
            .field("nodes", &DebugTree(self.fmt_branch(self.root)))
            .field("len", &self.len())
            .field("height", &self.height())
            .finish()
    }
}

struct DebugTree(String);

impl Debug for DebugTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\n{}\n", self.0)
    }
}

impl<K: Ord + Hash + Clone + Debug, V: Debug, B: BuildHasher> Display for AvlTree<K, V, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
