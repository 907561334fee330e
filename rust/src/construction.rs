//! Construction of a [`Tree`] from one parsed snapshot.
//!
//! The builder wraps each entry, picks the root and then fills in the
//! derived metrics in a single post-order pass, so every child is finished
//! before its parent reads it.

use tracing::trace;

use crate::error::{BuildResult, VerifierError};
use crate::iteration::PostOrder;
use crate::types::{resolve_index, Entry, EntryWithExtraInfo, Tree, TreeType};

impl Tree {
    /// Build a tree from a snapshot.
    ///
    /// The snapshot must contain exactly one entry without a parent; zero or
    /// several roots are reported as errors instead of guessing.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree_verifier::{Entry, Tree, TreeType};
    ///
    /// let entries = vec![
    ///     Entry::new(10, 0).with_children(Some(1), None),
    ///     Entry::new(5, 0).with_parent(0),
    /// ];
    /// let tree = Tree::new(&entries, TreeType::Vanilla).unwrap();
    /// assert_eq!(tree.root(), 0);
    /// assert_eq!(tree.entries()[0].height, 2);
    /// ```
    pub fn new(snapshot: &[Entry], tree_type: TreeType) -> BuildResult<Self> {
        let root = find_root(snapshot)?;

        let mut entries: Vec<EntryWithExtraInfo> =
            snapshot.iter().copied().map(EntryWithExtraInfo::new).collect();

        let order: Vec<usize> = PostOrder::new(snapshot, Some(root)).map(|(i, _)| i).collect();
        for &index in &order {
            let entry = &snapshot[index];
            let left = resolve_index(entry.left_child, entries.len()).map(|i| entries[i]);
            let right = resolve_index(entry.right_child, entries.len()).map(|i| entries[i]);
            fill_metrics(&mut entries[index], left.as_ref(), right.as_ref(), tree_type);
        }

        trace!(
            entries = entries.len(),
            reachable = order.len(),
            root,
            %tree_type,
            "built tree"
        );

        Ok(Self {
            entries,
            root,
            tree_type,
        })
    }
}

/// Position of the only entry without a parent.
fn find_root(snapshot: &[Entry]) -> BuildResult<usize> {
    if snapshot.is_empty() {
        return Err(VerifierError::EmptySnapshot);
    }

    let candidates: Vec<usize> = snapshot
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.is_root())
        .map(|(i, _)| i)
        .collect();

    match candidates.as_slice() {
        [root] => Ok(*root),
        [] => Err(VerifierError::MissingRoot {
            entries: snapshot.len(),
        }),
        _ => Err(VerifierError::MultipleRoots { candidates }),
    }
}

/// Compute a node's metrics from its already finished children.
fn fill_metrics(
    node: &mut EntryWithExtraInfo,
    left: Option<&EntryWithExtraInfo>,
    right: Option<&EntryWithExtraInfo>,
    tree_type: TreeType,
) {
    let left_height = left.map_or(0, |n| n.height);
    let right_height = right.map_or(0, |n| n.height);
    node.height = left_height.max(right_height) + 1;
    node.avl_balance = right_height as i64 - left_height as i64;

    if tree_type == TreeType::RedBlack {
        let left_black = left.map_or(0, |n| n.black_height);
        let right_black = right.map_or(0, |n| n.black_height);
        node.black_height = u64::from(node.is_black()) + left_black.max(right_black);
        node.black_height_imbalance = left_black as i64 - right_black as i64;
        node.has_red_child = left.is_some_and(|n| n.is_red()) || right.is_some_and(|n| n.is_red());
    }
}
