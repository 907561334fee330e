//! Replay debug dumps of index-addressed balanced trees and check them.
//!
//! Generated tree containers print their node array during tests. This
//! crate turns those prints back into trees and checks that they are what
//! they claim to be: a binary search tree, an AVL tree or a red-black tree.
//!
//! ```
//! use tree_verifier::{parse_debug_output, Tree, TreeType};
//!
//! let output = "\
//! running 1 test
//! [debug] (&) [ { 10, 0, 18446744073709551615, 1, 18446744073709551615, 127 }, { 5, 0, 0, 18446744073709551615, 18446744073709551615, 128 } ]
//! test result: ok";
//!
//! let snapshots = parse_debug_output(output).unwrap();
//! let tree = Tree::new(&snapshots[0], TreeType::Avl).unwrap();
//! assert!(tree.verify_all().is_empty());
//! print!("{}", tree.render());
//! ```

mod construction;
mod error;
mod iteration;
mod parser;
mod pipeline;
mod printer;
mod types;
mod validation;

pub use error::{BuildResult, EntryField, ParseResult, VerifierError, VerifierResult};
pub use iteration::{walk, InOrder, Order, PostOrder, PreOrder};
pub use parser::{
    format_snapshot_line, parse_debug_output, parse_entry, parse_snapshot_line, Snapshot,
};
pub use pipeline::{verify_captured, verify_output, RunReport, SnapshotReport, VerifierConfig};
pub use printer::{format_index, format_value, separator, Diagram};
pub use types::{
    index_from_wire, index_to_wire, Color, Entry, EntryWithExtraInfo, Linked, NodeIndex, Tree,
    TreeType, AVL_BALANCE_OFFSET, BLACK, NULL_INDEX, RED,
};
pub use validation::{Side, Violation};
