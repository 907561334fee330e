//! ASCII rendering of a replayed tree.
//!
//! The tree is drawn sideways: the left subtree above its parent, the right
//! subtree below it. Each line carries a junction glyph saying which
//! children the node has.
//!
//! ```text
//! ┌── ─{k:  5, i:  1, m:  0}
//! ┤{k: 10, i:  0, m:  0}
//! └── ─{k: 15, i:  2, m:  0}
//! ```

use std::fmt;
use std::io;

use crate::types::{index_to_wire, Color, NodeIndex, Tree, TreeType, NULL_INDEX};

const LEFT_CONNECTOR: &str = "┌── ";
const RIGHT_CONNECTOR: &str = "└── ";
const CONTINUE: &str = "│   ";
const BLANK: &str = "    ";

const JUNCTION_BOTH: &str = "┤";
const JUNCTION_LEFT: &str = "┘";
const JUNCTION_RIGHT: &str = "┐";
const JUNCTION_LEAF: &str = "─";

/// Two-wide number, or `XX` for the null sentinel.
pub fn format_value(value: u64) -> String {
    if value == NULL_INDEX {
        "XX".to_string()
    } else {
        format!("{:2}", value)
    }
}

/// Two-wide index, or `XX` when absent.
pub fn format_index(index: NodeIndex) -> String {
    format_value(index_to_wire(index))
}

/// Line printed above each snapshot's diagram.
pub fn separator(entry_count: usize) -> String {
    format!("--------------------- {} ----------------------", entry_count)
}

/// Display adapter that draws a [`Tree`].
pub struct Diagram<'a> {
    tree: &'a Tree,
}

enum Frame {
    Subtree {
        index: usize,
        above: String,
        own: String,
        below: String,
    },
    Line {
        index: usize,
        own: String,
    },
}

impl fmt::Display for Diagram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree;
        let mut visited = vec![false; tree.len()];
        let mut stack = vec![Frame::Subtree {
            index: tree.root,
            above: String::new(),
            own: String::new(),
            below: String::new(),
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Line { index, own } => {
                    let node = &tree.entries[index].entry;
                    let left = tree.resolve(node.left_child);
                    let right = tree.resolve(node.right_child).filter(|&r| Some(r) != left);
                    let junction = match (left.is_some(), right.is_some()) {
                        (true, true) => JUNCTION_BOTH,
                        (true, false) => JUNCTION_LEFT,
                        (false, true) => JUNCTION_RIGHT,
                        (false, false) => JUNCTION_LEAF,
                    };
                    writeln!(f, "{}{}{}", own, junction, tree.node_summary(index))?;
                }
                Frame::Subtree {
                    index,
                    above,
                    own,
                    below,
                } => {
                    if std::mem::replace(&mut visited[index], true) {
                        continue;
                    }
                    let node = &tree.entries[index].entry;
                    // Pushed in reverse: left subtree, own line, right subtree.
                    if let Some(right) = tree.resolve(node.right_child) {
                        stack.push(Frame::Subtree {
                            index: right,
                            above: format!("{}{}", below, CONTINUE),
                            own: format!("{}{}", below, RIGHT_CONNECTOR),
                            below: format!("{}{}", below, BLANK),
                        });
                    }
                    let left = tree.resolve(node.left_child);
                    stack.push(Frame::Line { index, own });
                    if let Some(left) = left {
                        stack.push(Frame::Subtree {
                            index: left,
                            above: format!("{}{}", above, BLANK),
                            own: format!("{}{}", above, LEFT_CONNECTOR),
                            below: format!("{}{}", above, CONTINUE),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Tree {
    /// One-line description of the node at `index`.
    ///
    /// Panics if `index` is out of range.
    pub fn node_summary(&self, index: usize) -> String {
        let node = &self.entries[index];
        let base = format!(
            "k: {}, i: {}, m: {}",
            format_value(node.entry.key),
            format_value(index as u64),
            format_value(u64::from(node.entry.metadata))
        );
        match self.tree_type {
            TreeType::Vanilla => format!("{{{}}}", base),
            TreeType::Avl => format!("{{{}, avl: {}}}", base, node.avl_balance),
            TreeType::RedBlack => {
                let color = match node.color() {
                    Some(Color::Red) => "Red".to_string(),
                    Some(Color::Black) => "Black".to_string(),
                    None => format!("?{}", node.entry.metadata),
                };
                format!("{{{}, color: {}}}", base, color)
            }
        }
    }

    pub fn diagram(&self) -> Diagram<'_> {
        Diagram { tree: self }
    }

    /// Render the diagram into a string.
    pub fn render(&self) -> String {
        self.diagram().to_string()
    }

    /// Write the diagram to `out`.
    pub fn print<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self.diagram())
    }

    /// Write the separator line naming the entry count, then the diagram.
    pub fn print_with_header<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", separator(self.len()))?;
        self.print(out)
    }
}
