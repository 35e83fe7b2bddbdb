//! [`BlockTree`]: an AVL tree of [`Block`]s keyed by `ancestor_index`, with
//! every node carrying the total sequence length of its subtree so that
//! [`BlockTree::search`] can locate the block covering a given sequence
//! position in `O(log n)`.
//!
//! Per spec.md S9 ("Tree node back-links... should be realized as indices
//! into an arena of nodes rather than owning pointers"), nodes live in a
//! flat `Vec` and are referenced by [`BlockNodeId`]. This sidesteps the
//! parent-owned-by-child / child-referenced-by-parent cycle that a
//! pointer-based AVL tree would otherwise require `Rc<RefCell<_>>` or
//! `unsafe` to express.
//!
//! Grounded on `original_source/classes/avl_node.py` and
//! `original_source/indelsim/classes/avl_tree.py`.

use crate::block::Block;
use crate::newtypes::BlockNodeId;

#[derive(Debug)]
struct BlockTreeNode {
    block: Block,
    left: Option<BlockNodeId>,
    right: Option<BlockNodeId>,
    parent: Option<BlockNodeId>,
    height: i32,
    subtree_length: u64,
}

impl BlockTreeNode {
    fn leaf(block: Block, parent: Option<BlockNodeId>) -> Self {
        let subtree_length = block.len();
        Self {
            block,
            left: None,
            right: None,
            parent,
            height: 1,
            subtree_length,
        }
    }
}

/// A balanced search tree of [`Block`]s, keyed by `ancestor_index`.
///
/// See module docs and spec.md S4.2 for the full contract. All public
/// mutating methods restore the AVL and `subtree_length` invariants before
/// returning; in debug builds they additionally self-audit via
/// [`BlockTree::debug_tree_structure`] (spec.md S7 `TreeInvariantViolation`).
#[derive(Debug)]
pub struct BlockTree {
    nodes: Vec<BlockTreeNode>,
    root: BlockNodeId,
}

impl BlockTree {
    /// Create a tree with a single node holding `initial_block`.
    pub fn new(initial_block: Block) -> Self {
        let nodes = vec![BlockTreeNode::leaf(initial_block, None)];
        Self {
            nodes,
            root: BlockNodeId::new(0),
        }
    }

    pub fn root(&self) -> BlockNodeId {
        self.root
    }

    pub fn block(&self, id: BlockNodeId) -> Block {
        self.node(id).block
    }

    pub fn total_length(&self) -> u64 {
        self.node(self.root).subtree_length
    }

    pub fn has_left(&self, id: BlockNodeId) -> bool {
        self.node(id).left.is_some()
    }

    pub fn parent_of(&self, id: BlockNodeId) -> Option<BlockNodeId> {
        self.node(id).parent
    }

    fn node(&self, id: BlockNodeId) -> &BlockTreeNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: BlockNodeId) -> &mut BlockTreeNode {
        &mut self.nodes[id.index()]
    }

    fn height(&self, id: Option<BlockNodeId>) -> i32 {
        id.map_or(0, |i| self.node(i).height)
    }

    fn subtree_length(&self, id: Option<BlockNodeId>) -> u64 {
        id.map_or(0, |i| self.node(i).subtree_length)
    }

    fn balance_factor(&self, id: BlockNodeId) -> i32 {
        let n = self.node(id);
        self.height(n.left) - self.height(n.right)
    }

    fn recompute(&mut self, id: BlockNodeId) {
        let (left, right, own_len) = {
            let n = self.node(id);
            (n.left, n.right, n.block.len())
        };
        let n = self.node_mut(id);
        n.height = 1 + std::cmp::max(self.height_cached(left), self.height_cached(right));
        n.subtree_length = own_len + self.subtree_length_cached(left) + self.subtree_length_cached(right);
    }

    // Helpers that don't re-borrow `self` mutably; used right after
    // capturing (left, right) above, while `self` is still borrowed
    // immutably through indices only.
    fn height_cached(&self, id: Option<BlockNodeId>) -> i32 {
        self.height(id)
    }

    fn subtree_length_cached(&self, id: Option<BlockNodeId>) -> u64 {
        self.subtree_length(id)
    }

    fn set_parent(&mut self, id: Option<BlockNodeId>, parent: Option<BlockNodeId>) {
        if let Some(id) = id {
            self.node_mut(id).parent = parent;
        }
    }

    /// Insert a new block, rebalance, and refresh lengths. Returns the
    /// inserted node's id.
    pub fn insert(&mut self, block: Block) -> BlockNodeId {
        let new_id = BlockNodeId::new(self.nodes.len());
        self.nodes.push(BlockTreeNode::leaf(block, None));
        let key = block.ancestor_index;
        let root = self.root;
        let new_root = self.insert_rec(root, None, key, new_id);
        self.root = new_root;
        self.node_mut(self.root).parent = None;
        self.debug_audit();
        new_id
    }

    fn insert_rec(
        &mut self,
        current: BlockNodeId,
        parent: Option<BlockNodeId>,
        key: i64,
        new_id: BlockNodeId,
    ) -> BlockNodeId {
        // `current` always refers to an existing subtree root here; the
        // "insert into an empty slot" base case is handled by the caller
        // linking `new_id` directly (see `link_child`), mirroring
        // `AVLTree.insert`'s `if not current_node: return new_node`.
        let current_key = self.node(current).block.ancestor_index;
        if key < current_key {
            let child = self.node(current).left;
            let new_child = self.link_or_recurse(child, Some(current), key, new_id);
            self.node_mut(current).left = Some(new_child);
            self.set_parent(Some(new_child), Some(current));
        } else {
            let child = self.node(current).right;
            let new_child = self.link_or_recurse(child, Some(current), key, new_id);
            self.node_mut(current).right = Some(new_child);
            self.set_parent(Some(new_child), Some(current));
        }
        self.recompute(current);
        let result = self.rebalance_after_insert(current, key);
        if let Some(p) = parent {
            self.set_parent(Some(result), Some(p));
        }
        result
    }

    fn link_or_recurse(
        &mut self,
        child: Option<BlockNodeId>,
        parent: Option<BlockNodeId>,
        key: i64,
        new_id: BlockNodeId,
    ) -> BlockNodeId {
        match child {
            None => {
                self.set_parent(Some(new_id), parent);
                new_id
            }
            Some(child_id) => self.insert_rec(child_id, parent, key, new_id),
        }
    }

    fn rebalance_after_insert(&mut self, id: BlockNodeId, inserted_key: i64) -> BlockNodeId {
        let balance = self.balance_factor(id);
        let left = self.node(id).left;
        let right = self.node(id).right;

        if balance > 1 {
            let left_key = self.node(left.unwrap()).block.ancestor_index;
            if inserted_key < left_key {
                return self.right_rotate(id);
            } else {
                let new_left = self.left_rotate(left.unwrap());
                self.node_mut(id).left = Some(new_left);
                self.set_parent(Some(new_left), Some(id));
                return self.right_rotate(id);
            }
        }
        if balance < -1 {
            let right_key = self.node(right.unwrap()).block.ancestor_index;
            if inserted_key > right_key {
                return self.left_rotate(id);
            } else {
                let new_right = self.right_rotate(right.unwrap());
                self.node_mut(id).right = Some(new_right);
                self.set_parent(Some(new_right), Some(id));
                return self.left_rotate(id);
            }
        }
        id
    }

    /// Remove the node whose `ancestor_index` equals `key`.
    pub fn delete(&mut self, key: i64) {
        let root = self.root;
        if let Some(new_root) = self.delete_rec(root, key) {
            self.root = new_root;
            self.node_mut(self.root).parent = None;
        } else {
            // Deleting the tree's only node is disallowed by construction
            // (spec.md S4.2: "malformed calls are disallowed by
            // construction"); callers never delete the unique root
            // sentinel.
            unreachable!("attempted to delete the tree's last remaining node");
        }
        self.debug_audit();
    }

    fn delete_rec(&mut self, id: BlockNodeId, key: i64) -> Option<BlockNodeId> {
        let current_key = self.node(id).block.ancestor_index;
        if key < current_key {
            match self.node(id).left {
                Some(left) => {
                    let new_left = self.delete_rec(left, key);
                    self.node_mut(id).left = new_left;
                    self.set_parent(new_left, Some(id));
                }
                None => return Some(id), // key not present; no-op
            }
        } else if key > current_key {
            match self.node(id).right {
                Some(right) => {
                    let new_right = self.delete_rec(right, key);
                    self.node_mut(id).right = new_right;
                    self.set_parent(new_right, Some(id));
                }
                None => return Some(id),
            }
        } else {
            let (left, right) = (self.node(id).left, self.node(id).right);
            match (left, right) {
                (None, None) => return None,
                (None, Some(r)) => return Some(r),
                (Some(l), None) => return Some(l),
                (Some(_), Some(r)) => {
                    let succ = self.min_node(r);
                    let succ_block = self.node(succ).block;
                    self.node_mut(id).block = succ_block;
                    let new_right = self.delete_rec(r, succ_block.ancestor_index);
                    self.node_mut(id).right = new_right;
                    self.set_parent(new_right, Some(id));
                }
            }
        }
        self.recompute(id);
        Some(self.rebalance_after_delete(id))
    }

    fn min_node(&self, id: BlockNodeId) -> BlockNodeId {
        let mut current = id;
        while let Some(left) = self.node(current).left {
            current = left;
        }
        current
    }

    fn rebalance_after_delete(&mut self, id: BlockNodeId) -> BlockNodeId {
        let balance = self.balance_factor(id);
        if balance > 1 {
            let left = self.node(id).left.unwrap();
            if self.balance_factor(left) >= 0 {
                return self.right_rotate(id);
            }
            let new_left = self.left_rotate(left);
            self.node_mut(id).left = Some(new_left);
            self.set_parent(Some(new_left), Some(id));
            return self.right_rotate(id);
        }
        if balance < -1 {
            let right = self.node(id).right.unwrap();
            if self.balance_factor(right) <= 0 {
                return self.left_rotate(id);
            }
            let new_right = self.right_rotate(right);
            self.node_mut(id).right = Some(new_right);
            self.set_parent(Some(new_right), Some(id));
            return self.left_rotate(id);
        }
        id
    }

    fn left_rotate(&mut self, grandfather: BlockNodeId) -> BlockNodeId {
        let right_child = self.node(grandfather).right.expect("left_rotate requires a right child");
        let left_grandchild = self.node(right_child).left;
        let grandfather_parent = self.node(grandfather).parent;

        self.node_mut(right_child).left = Some(grandfather);
        self.node_mut(right_child).parent = grandfather_parent;
        self.node_mut(grandfather).parent = Some(right_child);
        self.node_mut(grandfather).right = left_grandchild;
        self.set_parent(left_grandchild, Some(grandfather));

        self.recompute(grandfather);
        self.recompute(right_child);
        right_child
    }

    fn right_rotate(&mut self, grandfather: BlockNodeId) -> BlockNodeId {
        let left_child = self.node(grandfather).left.expect("right_rotate requires a left child");
        let right_grandchild = self.node(left_child).right;
        let grandfather_parent = self.node(grandfather).parent;

        self.node_mut(left_child).right = Some(grandfather);
        self.node_mut(left_child).parent = grandfather_parent;
        self.node_mut(grandfather).parent = Some(left_child);
        self.node_mut(grandfather).left = right_grandchild;
        self.set_parent(right_grandchild, Some(grandfather));

        self.recompute(grandfather);
        self.recompute(left_child);
        left_child
    }

    /// Overwrite the counts of an existing node in place (no key change),
    /// and propagate the length delta to the root.
    pub fn update_in_place(&mut self, id: BlockNodeId, copied_count: u64, inserted_count: u64) {
        {
            let n = self.node_mut(id);
            n.block.copied_count = copied_count;
            n.block.inserted_count = inserted_count;
        }
        self.refresh_lengths_to_root(id);
    }

    /// Add deltas to an existing node's counts in place, and propagate the
    /// length delta to the root.
    pub fn increment_in_place(&mut self, id: BlockNodeId, delta_copied: i64, delta_inserted: i64) {
        {
            let n = self.node_mut(id);
            n.block.copied_count = (n.block.copied_count as i64 + delta_copied) as u64;
            n.block.inserted_count = (n.block.inserted_count as i64 + delta_inserted) as u64;
        }
        self.refresh_lengths_to_root(id);
    }

    /// Re-key an existing node to a pure-insertion block
    /// (`DELETION_ALL_COPIED_UNCONTAINED_AT_START`, spec.md S4.1). The node
    /// keeps its position in the tree; callers must ensure no other node
    /// already holds the pure-insertion key.
    pub fn update_key_to_insert_only(&mut self, id: BlockNodeId) {
        self.node_mut(id).block.update_key_to_insert_only();
    }

    fn refresh_lengths_to_root(&mut self, id: BlockNodeId) {
        let mut current = Some(id);
        while let Some(c) = current {
            self.recompute(c);
            current = self.node(c).parent;
        }
        self.debug_audit();
    }

    /// Delete the node at `key`, then insert `new_block`
    /// (`update_to_new_location` in the reference implementation). Returns
    /// the new node's id.
    pub fn replace_key(&mut self, old_key: i64, new_block: Block) -> BlockNodeId {
        self.delete(old_key);
        self.insert(new_block)
    }

    /// Locate the block covering `position`.
    ///
    /// `is_insertion` distinguishes the half-open conventions: for
    /// insertions, `position == node_length` still resolves to *this* node
    /// (so `INSERTION_AT_END` fires on the last block); for deletions it
    /// rolls forward to the next block. This is the subtle invariant
    /// spec.md S4.2 calls out, preserved verbatim from
    /// `AVLTree.search`.
    pub fn search(&self, position: i64, is_insertion: bool) -> (BlockNodeId, i64) {
        let mut current = self.root;
        let mut position = position;
        loop {
            let (left, right, own_len) = {
                let n = self.node(current);
                (n.left, n.right, n.block.len() as i64)
            };
            if let Some(left) = left {
                let left_len = self.node(left).subtree_length as i64;
                if (position <= left_len && is_insertion) || (position < left_len && !is_insertion) {
                    current = left;
                    continue;
                }
                position -= left_len;
            }
            if (position < own_len && !is_insertion) || (position <= own_len && is_insertion) {
                return (current, position);
            } else if let Some(right) = right {
                current = right;
                position -= own_len;
            } else {
                return (current, position);
            }
        }
    }

    /// Emit blocks in ancestor-index order.
    pub fn traverse_in_order(&self) -> Vec<Block> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.inorder_rec(self.root, &mut out);
        out
    }

    fn inorder_rec(&self, id: BlockNodeId, out: &mut Vec<Block>) {
        let n = self.node(id);
        if let Some(left) = n.left {
            self.inorder_rec(left, out);
        }
        out.push(n.block);
        if let Some(right) = n.right {
            self.inorder_rec(right, out);
        }
    }

    #[cfg(debug_assertions)]
    fn debug_audit(&self) {
        let (len, ok) = self.audit_rec(self.root);
        debug_assert!(ok, "BlockTree BST/subtree_length invariant violated");
        debug_assert_eq!(
            len,
            self.node(self.root).subtree_length,
            "root subtree_length out of sync with true sum"
        );
    }

    #[cfg(not(debug_assertions))]
    fn debug_audit(&self) {}

    /// Recompute each node's subtree length bottom-up and check BST
    /// ordering, returning `(computed_subtree_length_of(id), all_ok)`.
    /// Exposed for the test suite's explicit invariant checks
    /// (spec.md S7 `TreeInvariantViolation`, S8 invariant 2 and 7).
    pub fn debug_tree_structure(&self) -> bool {
        self.audit_rec(self.root).1
    }

    fn audit_rec(&self, id: BlockNodeId) -> (u64, bool) {
        let n = self.node(id);
        let mut total = n.block.len();
        let mut ok = true;
        if let Some(left) = n.left {
            if self.node(left).block.ancestor_index > n.block.ancestor_index {
                ok = false;
            }
            let (left_len, left_ok) = self.audit_rec(left);
            total += left_len;
            ok &= left_ok;
            ok &= left_len == self.node(left).subtree_length;
        }
        if let Some(right) = n.right {
            if self.node(right).block.ancestor_index < n.block.ancestor_index {
                ok = false;
            }
            let (right_len, right_ok) = self.audit_rec(right);
            total += right_len;
            ok &= right_ok;
            ok &= right_len == self.node(right).subtree_length;
        }
        let balance = self.height(n.left) - self.height(n.right);
        ok &= balance.abs() <= 1;
        (total, ok)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::PURE_INSERTION;

    #[test]
    fn test_new_single_node() {
        let t = BlockTree::new(Block::new(0, 100, 0));
        assert_eq!(t.total_length(), 100);
        assert!(t.debug_tree_structure());
    }

    #[test]
    fn test_insert_keeps_order_and_length() {
        let mut t = BlockTree::new(Block::new(0, 30, 5));
        t.insert(Block::new(30, 70, 0));
        assert_eq!(t.total_length(), 105);
        assert!(t.debug_tree_structure());
        let blocks = t.traverse_in_order();
        assert_eq!(blocks, vec![Block::new(0, 30, 5), Block::new(30, 70, 0)]);
    }

    #[test]
    fn test_many_inserts_stay_balanced() {
        let mut t = BlockTree::new(Block::new(0, 1, 0));
        for i in 1..200 {
            t.insert(Block::new(i, 1, 0));
            assert!(t.debug_tree_structure(), "invariant broken after inserting {i}");
        }
        assert_eq!(t.total_length(), 200);
    }

    #[test]
    fn test_delete_restores_balance() {
        let mut t = BlockTree::new(Block::new(0, 1, 0));
        for i in 1..50 {
            t.insert(Block::new(i, 1, 0));
        }
        for i in (0..50).step_by(2) {
            t.delete(i);
            assert!(t.debug_tree_structure(), "invariant broken after deleting {i}");
        }
        assert_eq!(t.total_length(), 25);
    }

    #[test]
    fn test_search_insertion_at_end_resolves_to_last_block() {
        let mut t = BlockTree::new(Block::new(0, 30, 0));
        t.insert(Block::new(30, 70, 0));
        let (id, offset) = t.search(100, true);
        assert_eq!(t.block(id).ancestor_index, 30);
        assert_eq!(offset, 70);
    }

    #[test]
    fn test_search_deletion_rolls_to_next_block() {
        let mut t = BlockTree::new(Block::new(0, 30, 0));
        t.insert(Block::new(30, 70, 0));
        // position 30 for a deletion means "offset 0 of the *next* block",
        // not "offset 30 of the first block" (spec.md S4.2).
        let (id, offset) = t.search(30, false);
        assert_eq!(t.block(id).ancestor_index, 30);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_pure_insertion_sorts_first() {
        let mut t = BlockTree::new(Block::new(0, 30, 8));
        t.insert(Block::new(PURE_INSERTION, 0, 12));
        let blocks = t.traverse_in_order();
        assert_eq!(blocks[0].ancestor_index, PURE_INSERTION);
    }

    #[test]
    fn test_update_in_place_propagates_length() {
        let mut t = BlockTree::new(Block::new(0, 30, 0));
        let right = t.insert(Block::new(30, 70, 0));
        t.update_in_place(right, 70, 5);
        assert_eq!(t.total_length(), 105);
        assert!(t.debug_tree_structure());
    }
}
