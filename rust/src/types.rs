//! Core types for replayed trees.
//!
//! A dumped tree is a flat array of entries that refer to each other by
//! position. Nothing here owns anything else: a parent or child is just an
//! index into the same array, and an absent relation is `None`.

use std::fmt;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Wire value for an absent parent or child index.
pub const NULL_INDEX: u64 = u64::MAX;

/// AVL metadata stores the balance factor shifted by this offset.
pub const AVL_BALANCE_OFFSET: i64 = 128;

/// Red-black metadata value for a red node.
pub const RED: u8 = 128;

/// Red-black metadata value for a black node.
pub const BLACK: u8 = 129;

// ============================================================================
// TYPE DEFINITIONS
// ============================================================================

/// Position of an entry inside its snapshot, `None` when absent.
///
/// The raw value is kept even when it is out of range so that the
/// validator can report it.
pub type NodeIndex = Option<u64>;

/// Decode a wire index, mapping the sentinel to `None`.
pub fn index_from_wire(raw: u64) -> NodeIndex {
    if raw == NULL_INDEX {
        None
    } else {
        Some(raw)
    }
}

/// Encode an index for the wire, mapping `None` to the sentinel.
pub fn index_to_wire(index: NodeIndex) -> u64 {
    index.unwrap_or(NULL_INDEX)
}

/// Which balancing scheme the dumped tree claims to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TreeType {
    /// Plain binary search tree; metadata is ignored.
    #[default]
    Vanilla,
    /// Red-black tree; metadata is a [`Color`] code.
    RedBlack,
    /// AVL tree; metadata is the balance factor plus 128.
    Avl,
}

impl fmt::Display for TreeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeType::Vanilla => write!(f, "vanilla"),
            TreeType::RedBlack => write!(f, "red-black"),
            TreeType::Avl => write!(f, "avl"),
        }
    }
}

/// Node color of a red-black tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// Decode a metadata byte; anything but 128 or 129 is not a color.
    pub fn from_metadata(metadata: u8) -> Option<Self> {
        match metadata {
            RED => Some(Color::Red),
            BLACK => Some(Color::Black),
            _ => None,
        }
    }

    pub fn to_metadata(self) -> u8 {
        match self {
            Color::Red => RED,
            Color::Black => BLACK,
        }
    }
}

/// Access to the child links of an index-addressed node.
///
/// Implemented by both the raw and the derived entry so the same traversal
/// code walks a snapshot before and after the builder has run.
pub trait Linked {
    fn left_child(&self) -> NodeIndex;
    fn right_child(&self) -> NodeIndex;
}

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// One raw node record as printed by the tree under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Entry {
    pub key: u64,
    pub value: u64,
    pub parent: NodeIndex,
    pub left_child: NodeIndex,
    pub right_child: NodeIndex,
    /// Tree-type dependent: unused, AVL balance code, or color code.
    pub metadata: u8,
}

impl Entry {
    /// Entry with no parent and no children.
    pub fn new(key: u64, value: u64) -> Self {
        Self {
            key,
            value,
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: u64) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_children(mut self, left: NodeIndex, right: NodeIndex) -> Self {
        self.left_child = left;
        self.right_child = right;
        self
    }

    pub fn with_metadata(mut self, metadata: u8) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl Linked for Entry {
    fn left_child(&self) -> NodeIndex {
        self.left_child
    }

    fn right_child(&self) -> NodeIndex {
        self.right_child
    }
}

/// Formats the entry in the debug-print shape, `{ k, v, p, l, r, m }`.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ {}, {}, {}, {}, {}, {} }}",
            self.key,
            self.value,
            index_to_wire(self.parent),
            index_to_wire(self.left_child),
            index_to_wire(self.right_child),
            self.metadata
        )
    }
}

/// An entry plus the metrics derived from its subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryWithExtraInfo {
    pub entry: Entry,
    /// 1 + the taller child's height; absent children count as 0.
    pub height: u64,
    /// Right height minus left height.
    pub avl_balance: i64,
    /// Red-black only.
    pub black_height: u64,
    /// Red-black only: left black height minus right black height.
    pub black_height_imbalance: i64,
    /// Red-black only.
    pub has_red_child: bool,
}

impl EntryWithExtraInfo {
    pub fn new(entry: Entry) -> Self {
        Self {
            entry,
            ..Self::default()
        }
    }

    pub fn color(&self) -> Option<Color> {
        Color::from_metadata(self.entry.metadata)
    }

    pub fn is_red(&self) -> bool {
        self.color() == Some(Color::Red)
    }

    pub fn is_black(&self) -> bool {
        self.color() == Some(Color::Black)
    }

    /// The metadata value an AVL tree should have stored for this node.
    pub fn expected_avl_metadata(&self) -> i64 {
        self.avl_balance + AVL_BALANCE_OFFSET
    }

    /// Balance factor recorded in the metadata byte.
    pub fn stored_avl_balance(&self) -> i64 {
        i64::from(self.entry.metadata) - AVL_BALANCE_OFFSET
    }
}

impl Linked for EntryWithExtraInfo {
    fn left_child(&self) -> NodeIndex {
        self.entry.left_child
    }

    fn right_child(&self) -> NodeIndex {
        self.entry.right_child
    }
}

/// A snapshot rebuilt into an index-addressed tree.
///
/// Built once by [`Tree::new`](crate::Tree::new) and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub(crate) entries: Vec<EntryWithExtraInfo>,
    pub(crate) root: usize,
    pub(crate) tree_type: TreeType,
}

impl Tree {
    pub fn entries(&self) -> &[EntryWithExtraInfo] {
        &self.entries
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn tree_type(&self) -> TreeType {
        self.tree_type
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, if that index is in range.
    pub fn get(&self, index: usize) -> Option<&EntryWithExtraInfo> {
        self.entries.get(index)
    }

    /// Resolve a stored relation to a position, `None` when absent or out
    /// of range.
    pub fn resolve(&self, index: NodeIndex) -> Option<usize> {
        resolve_index(index, self.entries.len())
    }

    /// Height of the node at `index`, 0 when absent or out of range.
    pub fn height_at(&self, index: NodeIndex) -> u64 {
        self.resolve(index)
            .map(|i| self.entries[i].height)
            .unwrap_or(0)
    }
}

/// Resolve a stored relation against a snapshot of `len` entries.
pub(crate) fn resolve_index(index: NodeIndex, len: usize) -> Option<usize> {
    let raw = index?;
    let position = usize::try_from(raw).ok()?;
    if position < len {
        Some(position)
    } else {
        None
    }
}
