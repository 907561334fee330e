//! Traversal over index-linked nodes.
//!
//! The walks here work on any slice of [`Linked`] nodes, so the builder can
//! walk the raw snapshot and the validator can walk the finished tree with
//! the same code. All of them use an explicit stack, and each index is
//! yielded at most once even when corrupt links point back into the tree.

use std::ops::ControlFlow;

use crate::types::{resolve_index, EntryWithExtraInfo, Linked, Tree};

/// Order in which a walk yields nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Node, then left subtree, then right subtree.
    Pre,
    /// Left subtree, then node, then right subtree.
    In,
    /// Left subtree, then right subtree, then node.
    Post,
}

// ============================================================================
// ITERATOR STRUCTS
// ============================================================================

/// Pre-order iterator yielding `(index, node)`.
pub struct PreOrder<'a, T> {
    nodes: &'a [T],
    stack: Vec<usize>,
    visited: Vec<bool>,
}

/// In-order iterator yielding `(index, node)`.
pub struct InOrder<'a, T> {
    nodes: &'a [T],
    stack: Vec<usize>,
    current: Option<usize>,
    visited: Vec<bool>,
}

/// Post-order iterator yielding `(index, node)`.
pub struct PostOrder<'a, T> {
    nodes: &'a [T],
    // (index, children already pushed)
    stack: Vec<(usize, bool)>,
    visited: Vec<bool>,
}

fn left_of<T: Linked>(nodes: &[T], index: usize) -> Option<usize> {
    resolve_index(nodes[index].left_child(), nodes.len())
}

fn right_of<T: Linked>(nodes: &[T], index: usize) -> Option<usize> {
    resolve_index(nodes[index].right_child(), nodes.len())
}

// ============================================================================
// ITERATOR IMPLEMENTATIONS
// ============================================================================

impl<'a, T: Linked> PreOrder<'a, T> {
    pub fn new(nodes: &'a [T], start: Option<usize>) -> Self {
        Self {
            nodes,
            stack: start.filter(|&i| i < nodes.len()).into_iter().collect(),
            visited: vec![false; nodes.len()],
        }
    }
}

impl<'a, T: Linked> Iterator for PreOrder<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(index) = self.stack.pop() {
            if std::mem::replace(&mut self.visited[index], true) {
                continue;
            }
            if let Some(right) = right_of(self.nodes, index) {
                self.stack.push(right);
            }
            if let Some(left) = left_of(self.nodes, index) {
                self.stack.push(left);
            }
            return Some((index, &self.nodes[index]));
        }
        None
    }
}

impl<'a, T: Linked> InOrder<'a, T> {
    pub fn new(nodes: &'a [T], start: Option<usize>) -> Self {
        Self {
            nodes,
            stack: Vec::new(),
            current: start.filter(|&i| i < nodes.len()),
            visited: vec![false; nodes.len()],
        }
    }
}

impl<'a, T: Linked> Iterator for InOrder<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        // Descend the left spine, skipping anything already on a path.
        while let Some(index) = self.current.take() {
            if std::mem::replace(&mut self.visited[index], true) {
                break;
            }
            self.stack.push(index);
            self.current = left_of(self.nodes, index);
        }

        let index = self.stack.pop()?;
        self.current = right_of(self.nodes, index);
        Some((index, &self.nodes[index]))
    }
}

impl<'a, T: Linked> PostOrder<'a, T> {
    pub fn new(nodes: &'a [T], start: Option<usize>) -> Self {
        Self {
            nodes,
            stack: start
                .filter(|&i| i < nodes.len())
                .map(|i| (i, false))
                .into_iter()
                .collect(),
            visited: vec![false; nodes.len()],
        }
    }
}

impl<'a, T: Linked> Iterator for PostOrder<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, expanded)) = self.stack.pop() {
            if expanded {
                return Some((index, &self.nodes[index]));
            }
            if std::mem::replace(&mut self.visited[index], true) {
                continue;
            }
            self.stack.push((index, true));
            if let Some(right) = right_of(self.nodes, index) {
                self.stack.push((right, false));
            }
            if let Some(left) = left_of(self.nodes, index) {
                self.stack.push((left, false));
            }
        }
        None
    }
}

/// Walk `nodes` from `start` in `order`, calling `visit` on every node until
/// it breaks.
pub fn walk<T, B, F>(
    nodes: &[T],
    start: Option<usize>,
    order: Order,
    mut visit: F,
) -> ControlFlow<B>
where
    T: Linked,
    F: FnMut(usize, &T) -> ControlFlow<B>,
{
    match order {
        Order::Pre => PreOrder::new(nodes, start).try_for_each(|(i, node)| visit(i, node)),
        Order::In => InOrder::new(nodes, start).try_for_each(|(i, node)| visit(i, node)),
        Order::Post => PostOrder::new(nodes, start).try_for_each(|(i, node)| visit(i, node)),
    }
}

// ============================================================================
// TREE TRAVERSAL METHODS
// ============================================================================

impl Tree {
    /// Nodes reachable from the root, parents before children.
    pub fn pre_order(&self) -> PreOrder<'_, EntryWithExtraInfo> {
        PreOrder::new(&self.entries, Some(self.root))
    }

    /// Nodes reachable from the root, left subtree, node, right subtree.
    pub fn in_order(&self) -> InOrder<'_, EntryWithExtraInfo> {
        InOrder::new(&self.entries, Some(self.root))
    }

    /// Nodes reachable from the root, children before parents.
    pub fn post_order(&self) -> PostOrder<'_, EntryWithExtraInfo> {
        PostOrder::new(&self.entries, Some(self.root))
    }

    /// Visit every node reachable from the root in `order`; stops early when
    /// `visit` breaks.
    pub fn visit<B, F>(&self, order: Order, visit: F) -> ControlFlow<B>
    where
        F: FnMut(usize, &EntryWithExtraInfo) -> ControlFlow<B>,
    {
        walk(&self.entries, Some(self.root), order, visit)
    }
}
