use std::ops::{Index, IndexMut};

use crate::util::option::OptionExtension;

/// The slot of a [`Node`] in its tree's [`Arena`].
pub(crate) type NodeId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    pub key: K,
    pub value: V,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    /// Edges on the longest path down to a leaf. A leaf has height 0, and an absent child counts
    /// as -1.
    pub height: i32,
}

impl<K, V> Node<K, V> {
    /// Creates a node without children. Linking it into the tree is left to the tree.
    pub const fn leaf(key: K, value: V) -> Node<K, V> {
        Node {
            key,
            value,
            left: None,
            right: None,
            height: 0,
        }
    }

    pub fn into_tuple(self) -> (K, V) {
        (self.key, self.value)
    }

    pub const fn tuple(&self) -> (&K, &V) {
        (&self.key, &self.value)
    }
}

/// Owns every node of a tree. Nodes refer to each other by slot, and freed slots are reused by
/// later allocations.
#[derive(Debug, Clone)]
pub(crate) struct Arena<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    vacant: Vec<NodeId>,
}

impl<K, V> Arena<K, V> {
    pub const fn new() -> Arena<K, V> {
        Arena {
            slots: Vec::new(),
            vacant: Vec::new(),
        }
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        match self.vacant.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            },
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            },
        }
    }

    /// Takes the node out of slot `id`, leaving the slot free for reuse.
    pub fn free(&mut self, id: NodeId) -> Node<K, V> {
        let node = self.slots.get_mut(id)
            .and_then(Option::take)
            .unreachable("freed a vacant tree node slot");

        self.vacant.push(id);
        node
    }

    /// Returns the height of an optional child, treating an absent one as -1.
    pub fn height_of(&self, id: Option<NodeId>) -> i32 {
        id.map_or(-1, |id| self[id].height)
    }

    /// Recomputes the cached height of `id` from its children's cached heights.
    pub fn update_height(&mut self, id: NodeId) {
        let node = &self[id];
        let height = self.height_of(node.left).max(self.height_of(node.right)) + 1;
        self[id].height = height;
    }

    /// Returns height(left) - height(right) for `id`.
    pub fn balance_factor(&self, id: NodeId) -> i32 {
        let node = &self[id];
        self.height_of(node.left) - self.height_of(node.right)
    }
}

impl<K, V> Index<NodeId> for Arena<K, V> {
    type Output = Node<K, V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        self.slots.get(id)
            .and_then(Option::as_ref)
            .unreachable("read from a vacant tree node slot")
    }
}

impl<K, V> IndexMut<NodeId> for Arena<K, V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        self.slots.get_mut(id)
            .and_then(Option::as_mut)
            .unreachable("wrote to a vacant tree node slot")
    }
}
