use smallvec::SmallVec;

use crate::Key;
use crate::error::Result;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{InternalNode, MAX_KEYS, MIN_KEYS, Node};

/// The core B+Tree implementation backing `BPlusIndex`.
///
/// All keys live in leaves; internal nodes carry routing separators only.
/// Leaves are chained through `next` in ascending key order. The root handle
/// is always valid, so an empty tree is a single empty leaf.
pub(crate) struct RawBPlusIndex {
    /// Arena storing all tree nodes.
    nodes: Arena<Node>,
    /// Handle to the root node.
    root: Handle,
    /// Total number of keys in the tree, duplicates included.
    len: usize,
}

/// Path element for tracking a root-to-leaf descent during mutations.
struct PathElement {
    /// Handle to the internal node at this level.
    node: Handle,
    /// Index of the child we descended into.
    child_index: usize,
}

/// Type alias for a path through the tree (stack of path elements).
type Path = SmallVec<[PathElement; 16]>;

impl RawBPlusIndex {
    /// Creates a new tree holding a single empty leaf.
    pub(crate) fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::new_leaf());
        Self { nodes, root, len: 0 }
    }

    /// Returns the number of keys in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree contains no keys.
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Clears all keys from the tree, leaving an empty leaf root.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::new_leaf());
        self.len = 0;
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node {
        self.nodes.get(handle)
    }

    /// Returns the leftmost leaf, the head of the ascending chain.
    pub(crate) fn first_leaf(&self) -> Handle {
        let mut current = self.root;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => current = internal.child(0),
                Node::Leaf(_) => return current,
            }
        }
    }

    /// Finds the leaf holding the first occurrence of `key`, if any.
    pub(crate) fn search(&self, key: Key) -> Option<(Handle, usize)> {
        let mut current = self.root;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => current = internal.child(internal.route(key)),
                Node::Leaf(leaf) => return leaf.first_occurrence(key).map(|index| (current, index)),
            }
        }
    }

    pub(crate) fn contains(&self, key: Key) -> bool {
        self.search(key).is_some()
    }

    /// Descends to the leaf that owns `key`, recording the internal nodes
    /// visited and the child index taken at each.
    fn descend_to_leaf(&self, key: Key) -> (Handle, Path) {
        let mut path = Path::new();
        let mut current = self.root;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => {
                    let child_index = internal.route(key);
                    path.push(PathElement { node: current, child_index });
                    current = internal.child(child_index);
                }
                Node::Leaf(_) => return (current, path),
            }
        }
    }

    /// Inserts `key`, keeping duplicates.
    ///
    /// Reserves the worst-case node count for the whole split cascade (one
    /// sibling per level plus a new root) before the first mutation, so an
    /// `OutOfMemory` failure leaves the tree untouched.
    pub(crate) fn insert(&mut self, key: Key) -> Result<()> {
        let (leaf, path) = self.descend_to_leaf(key);
        self.nodes.try_reserve(path.len() + 2)?;

        let leaf_node = self.nodes.get_mut(leaf).as_leaf_mut();
        let index = leaf_node.insertion_point(key);
        leaf_node.insert_at(index, key);
        self.len += 1;

        if leaf_node.key_count() == MAX_KEYS {
            self.split_leaf(leaf, path);
        }
        Ok(())
    }

    fn split_leaf(&mut self, leaf: Handle, mut path: Path) {
        let (separator, right) = self.nodes.get_mut(leaf).as_leaf_mut().split();
        let new_child = self.nodes.alloc(Node::Leaf(right));
        self.nodes.get_mut(leaf).as_leaf_mut().set_next(Some(new_child));
        self.propagate_split(&mut path, separator, new_child);
    }

    /// Walks the recorded path upward, inserting the promoted separator and
    /// splitting each ancestor that fills in turn.
    fn propagate_split(&mut self, path: &mut Path, mut separator: Key, mut new_child: Handle) {
        while let Some(element) = path.pop() {
            let parent = self.nodes.get_mut(element.node).as_internal_mut();
            parent.insert_child(element.child_index, separator, new_child);
            if parent.key_count() < MAX_KEYS {
                return;
            }

            let (median, right) = parent.split();
            separator = median;
            new_child = self.nodes.alloc(Node::Internal(right));
        }

        // The split reached the old root; grow the tree by one level.
        let mut new_root = InternalNode::new();
        new_root.push_first_child(self.root);
        new_root.push_child(separator, new_child);
        self.root = self.nodes.alloc(Node::Internal(new_root));
    }

    /// Removes the first stored occurrence of `key`; absence is a no-op.
    pub(crate) fn remove(&mut self, key: Key) {
        let (leaf, mut path) = self.descend_to_leaf(key);
        let leaf_node = self.nodes.get_mut(leaf).as_leaf_mut();
        let Some(index) = leaf_node.first_occurrence(key) else {
            return;
        };

        leaf_node.remove_at(index);
        self.len -= 1;
        self.repair_underflow(leaf, &mut path);
    }

    /// Restores minimum occupancy along the recorded path, borrowing where a
    /// sibling can lend and merging where none can.
    fn repair_underflow(&mut self, mut current: Handle, path: &mut Path) {
        while self.nodes.get(current).key_count() < MIN_KEYS {
            let Some(element) = path.pop() else {
                // The root is exempt; it only collapses once it has no keys.
                self.collapse_root();
                return;
            };

            if self.try_borrow(current, element.node, element.child_index) {
                return;
            }
            self.merge_with_sibling(current, element.node, element.child_index);
            current = element.node;
        }
    }

    /// Replaces an internal root left without keys by its sole child.
    fn collapse_root(&mut self) {
        if let Node::Internal(internal) = self.nodes.get(self.root) {
            if internal.key_count() == 0 {
                debug_assert_eq!(internal.child_count(), 1);
                let child = internal.child(0);
                self.nodes.free(self.root);
                self.root = child;
            }
        }
    }

    /// Borrows one key into `current` from the left sibling if it can lend,
    /// then from the right. Returns false if neither can.
    fn try_borrow(&mut self, current: Handle, parent: Handle, child_index: usize) -> bool {
        if child_index > 0 {
            let left = self.nodes.get(parent).as_internal().child(child_index - 1);
            if self.nodes.get(left).can_lend() {
                self.borrow_from_left(current, left, parent, child_index);
                return true;
            }
        }

        let parent_node = self.nodes.get(parent).as_internal();
        if child_index + 1 < parent_node.child_count() {
            let right = parent_node.child(child_index + 1);
            if self.nodes.get(right).can_lend() {
                self.borrow_from_right(current, right, parent, child_index);
                return true;
            }
        }
        false
    }

    /// Moves the left sibling's last key (leaf) or rotates it through the
    /// parent separator (internal), then rewrites the separator.
    fn borrow_from_left(&mut self, current: Handle, left: Handle, parent: Handle, child_index: usize) {
        match self.nodes.get(current) {
            Node::Leaf(_) => {
                let key = self
                    .nodes
                    .get_mut(left)
                    .as_leaf_mut()
                    .pop()
                    .expect("`RawBPlusIndex::borrow_from_left()` - left sibling is empty!");
                self.nodes.get_mut(current).as_leaf_mut().push_front(key);
                // The moved key is now the receiving side's boundary.
                self.nodes.get_mut(parent).as_internal_mut().set_key(child_index - 1, key);
            }
            Node::Internal(_) => {
                let separator = self.nodes.get(parent).as_internal().key(child_index - 1);
                let (left_key, left_child) = self
                    .nodes
                    .get_mut(left)
                    .as_internal_mut()
                    .pop_child()
                    .expect("`RawBPlusIndex::borrow_from_left()` - left sibling is empty!");
                self.nodes.get_mut(current).as_internal_mut().push_child_front(separator, left_child);
                self.nodes.get_mut(parent).as_internal_mut().set_key(child_index - 1, left_key);
            }
        }
    }

    /// Mirror of `borrow_from_left` for the right sibling.
    fn borrow_from_right(&mut self, current: Handle, right: Handle, parent: Handle, child_index: usize) {
        match self.nodes.get(current) {
            Node::Leaf(_) => {
                let key = self
                    .nodes
                    .get_mut(right)
                    .as_leaf_mut()
                    .pop_front()
                    .expect("`RawBPlusIndex::borrow_from_right()` - right sibling is empty!");
                self.nodes.get_mut(current).as_leaf_mut().push(key);
                let boundary = self.nodes.get(right).as_leaf().key(0);
                self.nodes.get_mut(parent).as_internal_mut().set_key(child_index, boundary);
            }
            Node::Internal(_) => {
                let separator = self.nodes.get(parent).as_internal().key(child_index);
                let (right_key, right_child) = self
                    .nodes
                    .get_mut(right)
                    .as_internal_mut()
                    .pop_child_front()
                    .expect("`RawBPlusIndex::borrow_from_right()` - right sibling is empty!");
                self.nodes.get_mut(current).as_internal_mut().push_child(separator, right_child);
                self.nodes.get_mut(parent).as_internal_mut().set_key(child_index, right_key);
            }
        }
    }

    /// Merges `current` with a sibling, preferring the left one. The right
    /// node of the pair is freed and the parent loses one separator and one
    /// child.
    fn merge_with_sibling(&mut self, current: Handle, parent: Handle, child_index: usize) {
        let (left, right, separator_index) = if child_index > 0 {
            let left = self.nodes.get(parent).as_internal().child(child_index - 1);
            (left, current, child_index - 1)
        } else {
            let right = self.nodes.get(parent).as_internal().child(child_index + 1);
            (current, right, child_index)
        };

        let (separator, removed) = self.nodes.get_mut(parent).as_internal_mut().remove_child(separator_index);
        debug_assert_eq!(removed, right);

        match self.nodes.take(right) {
            // Leaf merges drop the separator; the chain relink covers it.
            Node::Leaf(right_leaf) => self.nodes.get_mut(left).as_leaf_mut().merge_with_right(right_leaf),
            Node::Internal(right_internal) => {
                self.nodes.get_mut(left).as_internal_mut().merge_with_right(separator, right_internal);
            }
        }
    }
}
