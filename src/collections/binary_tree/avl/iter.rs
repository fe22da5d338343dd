use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::vec::IntoIter as VecIntoIter;

use super::{Arena, AvlTree, NodeId};

impl<K: Ord + Hash + Clone, V, B: BuildHasher> IntoIterator for AvlTree<K, V, B> {
    type Item = (K, V);

    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        // Work out the order up front, then take the nodes out of the arena one by one.
        let order = Iter::new(&self.nodes, self.root, self.len())
            .ids()
            .collect::<Vec<_>>();

        IntoIter {
            nodes: self.nodes,
            order: order.into_iter(),
        }
    }
}

/// An owned iterator over the entries of an [`AvlTree`], in ascending key order.
pub struct IntoIter<K, V> {
    pub(crate) nodes: Arena<K, V>,
    pub(crate) order: VecIntoIter<NodeId>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.order.next().map(|id| self.nodes.free(id).into_tuple())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.order.next_back().map(|id| self.nodes.free(id).into_tuple())
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<'a, K: Ord + Hash + Clone, V, B: BuildHasher> IntoIterator for &'a AvlTree<K, V, B> {
    type Item = (&'a K, &'a V);

    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A borrowed, in-order iterator over the entries of an [`AvlTree`].
///
/// The stack holds the path of nodes whose left subtrees have been visited but which haven't been
/// yielded themselves yet, so it never grows past the height of the tree.
pub struct Iter<'a, K, V> {
    pub(crate) nodes: &'a Arena<K, V>,
    pub(crate) stack: Vec<NodeId>,
    pub(crate) len: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(nodes: &'a Arena<K, V>, root: Option<NodeId>, len: usize) -> Iter<'a, K, V> {
        let mut iter = Iter {
            nodes,
            stack: Vec::new(),
            len,
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            self.stack.push(id);
            current = self.nodes[id].left;
        }
    }

    fn next_id(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.push_left_spine(self.nodes[id].right);
        self.len -= 1;
        Some(id)
    }

    pub(crate) fn ids(mut self) -> impl Iterator<Item = NodeId> {
        std::iter::from_fn(move || self.next_id())
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        self.next_id().map(|id| nodes[id].tuple())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

pub struct Keys<'a, K, V>(
    pub(crate) Iter<'a, K, V>
);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|e| e.0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V>(
    pub(crate) Iter<'a, K, V>
);

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|e| e.1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
