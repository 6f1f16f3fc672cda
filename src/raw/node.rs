use smallvec::SmallVec;

use crate::Key;

use super::handle::Handle;

// Low order in unit tests so splits, borrows and merges are exercised by
// trees a test can reason about; production nodes are sized for cache lines.
#[cfg(test)]
pub(crate) const ORDER: usize = 4;
#[cfg(not(test))]
pub(crate) const ORDER: usize = 64;

/// A node splits eagerly the moment it holds this many keys.
pub(crate) const MAX_KEYS: usize = ORDER - 1;
/// Minimum keys for any non-root node, leaf or internal.
pub(crate) const MIN_KEYS: usize = ORDER.div_ceil(2) - 1;

// An odd order would let a split half fall below minimum occupancy.
const _: () = assert!(ORDER % 2 == 0);

pub(crate) enum Node {
    Internal(InternalNode),
    Leaf(LeafNode),
}

/// Internal nodes hold separator keys and child handles.
///
/// `children[i]` covers keys below `keys[i]`; `children[keys.len()]` covers
/// the rest. `children.len() == keys.len() + 1` always. Keys within a node
/// are non-decreasing; equal neighbors can appear when duplicate keys
/// straddle a split.
pub(crate) struct InternalNode {
    keys: SmallVec<[Key; MAX_KEYS]>,
    children: SmallVec<[Handle; ORDER]>,
}

/// Leaf nodes hold the stored keys plus a non-owning link to the next leaf.
pub(crate) struct LeafNode {
    next: Option<Handle>,
    keys: SmallVec<[Key; MAX_KEYS]>,
}

impl Node {
    pub(crate) fn new_leaf() -> Self {
        Node::Leaf(LeafNode::new())
    }

    pub(crate) fn as_leaf(&self) -> &LeafNode {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_internal(&self) -> &InternalNode {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        match self {
            Node::Internal(internal) => internal.key_count(),
            Node::Leaf(leaf) => leaf.key_count(),
        }
    }

    /// Returns true if this node can give up a key without underflowing.
    pub(crate) fn can_lend(&self) -> bool {
        self.key_count() > MIN_KEYS
    }
}

impl InternalNode {
    pub(crate) fn new() -> Self {
        Self {
            keys: SmallVec::new(),
            children: SmallVec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> Key {
        self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Rewrites the separator at `index`.
    pub(crate) fn set_key(&mut self, index: usize, key: Key) {
        self.keys[index] = key;
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    /// Index of the child to descend into for `key`.
    ///
    /// The smallest `i` with `key < keys[i]`; a key equal to a separator
    /// routes right of it.
    #[inline]
    pub(crate) fn route(&self, key: Key) -> usize {
        self.keys.partition_point(|&k| k <= key)
    }

    /// Inserts a separator at `index` and its right child at `index + 1`.
    pub(crate) fn insert_child(&mut self, index: usize, key: Key, child: Handle) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
    }

    /// Removes the separator at `index` and its right child at `index + 1`.
    pub(crate) fn remove_child(&mut self, index: usize) -> (Key, Handle) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    pub(crate) fn push_child(&mut self, key: Key, child: Handle) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Prepends a separator and a new leftmost child.
    pub(crate) fn push_child_front(&mut self, key: Key, child: Handle) {
        self.keys.insert(0, key);
        self.children.insert(0, child);
    }

    /// Seeds a freshly created node with its leftmost child.
    pub(crate) fn push_first_child(&mut self, child: Handle) {
        debug_assert!(self.children.is_empty());
        self.children.push(child);
    }

    /// Removes the last separator together with the last child.
    pub(crate) fn pop_child(&mut self) -> Option<(Key, Handle)> {
        let key = self.keys.pop()?;
        let child = self.children.pop()?;
        Some((key, child))
    }

    /// Removes the first separator together with the first child.
    pub(crate) fn pop_child_front(&mut self) -> Option<(Key, Handle)> {
        if self.keys.is_empty() {
            return None;
        }
        let key = self.keys.remove(0);
        let child = self.children.remove(0);
        Some((key, child))
    }

    /// Splits a full node in half, promoting (moving) the median separator.
    ///
    /// Returns the median and the new right node, which takes the upper keys
    /// and their children.
    pub(crate) fn split(&mut self) -> (Key, InternalNode) {
        debug_assert_eq!(self.keys.len(), MAX_KEYS);
        let mid = MAX_KEYS / 2;

        let mut right = InternalNode::new();
        right.keys = self.keys.drain(mid + 1..).collect();
        right.children = self.children.drain(mid + 1..).collect();

        let median = self.keys.remove(mid);
        (median, right)
    }

    /// Absorbs the right sibling, pulling the parent separator down between
    /// the two key groups.
    pub(crate) fn merge_with_right(&mut self, separator: Key, mut right: InternalNode) {
        self.keys.push(separator);
        self.keys.append(&mut right.keys);
        self.children.append(&mut right.children);
    }
}

impl LeafNode {
    pub(crate) fn new() -> Self {
        Self {
            next: None,
            keys: SmallVec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> Key {
        self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    /// Sorted position for `key`; duplicates land after existing copies.
    #[inline]
    pub(crate) fn insertion_point(&self, key: Key) -> usize {
        self.keys.partition_point(|&k| k <= key)
    }

    /// Index of the first stored copy of `key`, if any.
    #[inline]
    pub(crate) fn first_occurrence(&self, key: Key) -> Option<usize> {
        let index = self.keys.partition_point(|&k| k < key);
        (index < self.keys.len() && self.keys[index] == key).then_some(index)
    }

    pub(crate) fn insert_at(&mut self, index: usize, key: Key) {
        self.keys.insert(index, key);
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Key {
        self.keys.remove(index)
    }

    pub(crate) fn push(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub(crate) fn push_front(&mut self, key: Key) {
        self.keys.insert(0, key);
    }

    pub(crate) fn pop(&mut self) -> Option<Key> {
        self.keys.pop()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Key> {
        if self.keys.is_empty() {
            return None;
        }
        Some(self.keys.remove(0))
    }

    /// Splits a full leaf in half.
    ///
    /// The new right leaf takes the upper keys and inherits this leaf's
    /// `next`; the promoted separator is a copy of its first key. The caller
    /// links this leaf to the new sibling once it is allocated.
    pub(crate) fn split(&mut self) -> (Key, LeafNode) {
        debug_assert_eq!(self.keys.len(), MAX_KEYS);
        let mid = MAX_KEYS / 2;

        let mut right = LeafNode::new();
        right.keys = self.keys.drain(mid..).collect();
        right.next = self.next;

        (right.keys[0], right)
    }

    /// Absorbs the right sibling, relinking the chain past it.
    pub(crate) fn merge_with_right(&mut self, mut right: LeafNode) {
        self.keys.append(&mut right.keys);
        self.next = right.next;
    }
}
