//! Invariant checks for replayed trees.
//!
//! Every check returns the violations it found; an empty list means the
//! check passed. Each violation is also logged at `debug` level as it is
//! found; reporting them to a user is left to the caller.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::printer::format_index;
use crate::types::{Color, NodeIndex, Tree, TreeType};

/// Which child link of a node a violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// One broken invariant, located at the node `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A child link is neither absent nor a valid position.
    ChildOutOfRange {
        index: usize,
        side: Side,
        child: u64,
        len: usize,
    },
    /// A child does not point back at the node that links to it.
    ParentMismatch {
        index: usize,
        side: Side,
        child: usize,
        actual: NodeIndex,
    },
    /// Both child links of a node name the same entry.
    DuplicateChild { index: usize, child: usize },
    /// AVL balance factor outside of -1..=1.
    ImpossibleBalance { index: usize, balance: i64 },
    /// AVL metadata does not encode the computed balance factor.
    BalanceMismatch {
        index: usize,
        expected: i64,
        actual: u8,
    },
    /// Left and right subtrees hold different numbers of black nodes.
    BlackHeightImbalance { index: usize, imbalance: i64 },
    /// A red node has a red child.
    RedRed { index: usize },
    /// In-order key sequence is not strictly increasing.
    KeyOrder {
        index: usize,
        key: u64,
        previous: usize,
        previous_key: u64,
    },
    /// Entry cannot be reached from the root.
    Unreachable { index: usize },
    /// Red-black metadata is not a color code.
    InvalidColor { index: usize, metadata: u8 },
    /// Red-black root is not black.
    RedRoot { index: usize },
}

impl Violation {
    /// Index of the node the violation was found at.
    pub fn index(&self) -> usize {
        match *self {
            Violation::ChildOutOfRange { index, .. }
            | Violation::ParentMismatch { index, .. }
            | Violation::DuplicateChild { index, .. }
            | Violation::ImpossibleBalance { index, .. }
            | Violation::BalanceMismatch { index, .. }
            | Violation::BlackHeightImbalance { index, .. }
            | Violation::RedRed { index }
            | Violation::KeyOrder { index, .. }
            | Violation::Unreachable { index }
            | Violation::InvalidColor { index, .. }
            | Violation::RedRoot { index } => index,
        }
    }

    /// True for violations of the parent/child link structure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Violation::ChildOutOfRange { .. }
                | Violation::ParentMismatch { .. }
                | Violation::DuplicateChild { .. }
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ChildOutOfRange {
                index,
                side,
                child,
                len,
            } => write!(
                f,
                "{} child {} of node {} is out of range for {} entries",
                side, child, index, len
            ),
            Violation::ParentMismatch {
                index,
                side,
                child,
                actual,
            } => write!(
                f,
                "{} child {} doesnt match parent {}: child records parent {}",
                side,
                child,
                index,
                format_index(*actual)
            ),
            Violation::DuplicateChild { index, child } => {
                write!(f, "left and right child of {} are both {}", index, child)
            }
            Violation::ImpossibleBalance { index, balance } => {
                write!(f, "avl balance at {} is impossible: {}", index, balance)
            }
            Violation::BalanceMismatch {
                index,
                expected,
                actual,
            } => write!(
                f,
                "avl balance at {} not right: metadata {} should be {}",
                index, actual, expected
            ),
            Violation::BlackHeightImbalance { index, imbalance } => write!(
                f,
                "black height at {} is unbalanced: left minus right is {}",
                index, imbalance
            ),
            Violation::RedRed { index } => write!(f, "red node {} has a red child", index),
            Violation::KeyOrder {
                index,
                key,
                previous,
                previous_key,
            } => write!(
                f,
                "key {} at {} does not follow key {} at {} in order",
                key, index, previous_key, previous
            ),
            Violation::Unreachable { index } => {
                write!(f, "entry {} is not reachable from the root", index)
            }
            Violation::InvalidColor { index, metadata } => {
                write!(f, "metadata {} at {} is not a color", metadata, index)
            }
            Violation::RedRoot { index } => write!(f, "root {} is red", index),
        }
    }
}

fn logged(tree: &Tree, violations: Vec<Violation>) -> Vec<Violation> {
    for violation in &violations {
        debug!(tree_type = %tree.tree_type, index = violation.index(), "{}", violation);
    }
    violations
}

// ============================================================================
// VALIDATION METHODS
// ============================================================================

impl Tree {
    /// Check that every child link reachable from the root is in range,
    /// points back at its parent, and that no node links one child twice.
    pub fn verify_child(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (index, node) in self.pre_order() {
            let links = [
                (Side::Left, node.entry.left_child),
                (Side::Right, node.entry.right_child),
            ];
            for (side, link) in links {
                let Some(raw) = link else { continue };
                match self.resolve(link) {
                    None => violations.push(Violation::ChildOutOfRange {
                        index,
                        side,
                        child: raw,
                        len: self.len(),
                    }),
                    Some(child) => {
                        let actual = self.entries[child].entry.parent;
                        if actual != Some(index as u64) {
                            violations.push(Violation::ParentMismatch {
                                index,
                                side,
                                child,
                                actual,
                            });
                        }
                    }
                }
            }
            if let (Some(left), Some(right)) = (
                self.resolve(node.entry.left_child),
                self.resolve(node.entry.right_child),
            ) {
                if left == right {
                    violations.push(Violation::DuplicateChild { index, child: left });
                }
            }
        }
        logged(self, violations)
    }

    /// Check the AVL balance factor of every reachable node, and that the
    /// stored metadata encodes it.
    pub fn verify_avl_balance(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (index, node) in self.pre_order() {
            if node.avl_balance.abs() >= 2 {
                violations.push(Violation::ImpossibleBalance {
                    index,
                    balance: node.avl_balance,
                });
            }
            if i64::from(node.entry.metadata) != node.expected_avl_metadata() {
                violations.push(Violation::BalanceMismatch {
                    index,
                    expected: node.expected_avl_metadata(),
                    actual: node.entry.metadata,
                });
            }
        }
        logged(self, violations)
    }

    /// Check equal black heights and the absence of red-red edges on every
    /// reachable node.
    pub fn verify_red_black(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (index, node) in self.pre_order() {
            if node.black_height_imbalance != 0 {
                violations.push(Violation::BlackHeightImbalance {
                    index,
                    imbalance: node.black_height_imbalance,
                });
            }
            if node.is_red() && node.has_red_child {
                violations.push(Violation::RedRed { index });
            }
        }
        logged(self, violations)
    }

    /// Check that an in-order walk yields strictly increasing keys.
    pub fn verify_key_order(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut previous: Option<(usize, u64)> = None;
        for (index, node) in self.in_order() {
            let key = node.entry.key;
            if let Some((previous, previous_key)) = previous {
                if previous_key >= key {
                    violations.push(Violation::KeyOrder {
                        index,
                        key,
                        previous,
                        previous_key,
                    });
                }
            }
            previous = Some((index, key));
        }
        logged(self, violations)
    }

    /// Check that every entry hangs off the root.
    pub fn verify_reachable(&self) -> Vec<Violation> {
        let reachable: HashSet<usize> = self.pre_order().map(|(i, _)| i).collect();
        let violations = (0..self.len())
            .filter(|i| !reachable.contains(i))
            .map(|index| Violation::Unreachable { index })
            .collect();
        logged(self, violations)
    }

    /// Check that every metadata byte is a color and the root is black.
    pub fn verify_colors(&self) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, node)| node.color().is_none())
            .map(|(index, node)| Violation::InvalidColor {
                index,
                metadata: node.entry.metadata,
            })
            .collect();
        if self.entries[self.root].color() == Some(Color::Red) {
            violations.push(Violation::RedRoot { index: self.root });
        }
        logged(self, violations)
    }

    /// Shape check, then the balance check for this tree's type.
    ///
    /// The balance checks are skipped when the shape is broken, since their
    /// metrics were computed over that shape.
    pub fn verify_all(&self) -> Vec<Violation> {
        let violations = self.verify_child();
        if !violations.is_empty() {
            return violations;
        }
        match self.tree_type {
            TreeType::Vanilla => violations,
            TreeType::Avl => self.verify_avl_balance(),
            TreeType::RedBlack => self.verify_red_black(),
        }
    }

    /// [`verify_all`](Self::verify_all) plus key order, reachability and,
    /// for red-black trees, color codes.
    pub fn verify_strict(&self) -> Vec<Violation> {
        let mut violations = self.verify_all();
        if violations.iter().any(Violation::is_structural) {
            return violations;
        }
        violations.extend(self.verify_key_order());
        violations.extend(self.verify_reachable());
        if self.tree_type == TreeType::RedBlack {
            violations.extend(self.verify_colors());
        }
        violations
    }

    /// Returns true if [`verify_all`](Self::verify_all) finds nothing.
    pub fn is_valid(&self) -> bool {
        self.verify_all().is_empty()
    }
}
