//! Error handling and result types for trace verification.
//!
//! Only fatal conditions live here: text that cannot be decoded into
//! snapshots, and snapshots that cannot be built into a tree. Invariant
//! violations found by the validator are ordinary values, see
//! [`crate::validation::Violation`].

use std::num::ParseIntError;

use thiserror::Error;

/// Name of a field inside one `{ ... }` entry group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Key,
    Value,
    Parent,
    LeftChild,
    RightChild,
    Metadata,
}

impl EntryField {
    pub fn name(&self) -> &'static str {
        match self {
            EntryField::Key => "key",
            EntryField::Value => "value",
            EntryField::Parent => "parent",
            EntryField::LeftChild => "left child",
            EntryField::RightChild => "right child",
            EntryField::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for EntryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error type for parsing and building trees from debug output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierError {
    /// An entry group has fewer than the five mandatory fields.
    #[error("{text} is missing data: expected at least 5 fields, found {found}")]
    MissingFields { text: String, found: usize },
    /// A field could not be decoded as the expected unsigned integer.
    #[error("failed to parse {field} {text:?}: {source}")]
    InvalidField {
        field: EntryField,
        text: String,
        #[source]
        source: ParseIntError,
    },
    /// The input did not contain a single debug snapshot line.
    #[error("cannot find any match in:\n{input}")]
    NoMatch { input: String },
    /// A snapshot with no entries cannot be built into a tree.
    #[error("snapshot contains no entries")]
    EmptySnapshot,
    /// No entry has an absent parent.
    #[error("snapshot of {entries} entries has no root")]
    MissingRoot { entries: usize },
    /// More than one entry has an absent parent.
    #[error("snapshot has {} root candidates at {candidates:?}", .candidates.len())]
    MultipleRoots { candidates: Vec<usize> },
}

impl VerifierError {
    /// Create a MissingFields error for the raw group text
    pub fn missing_fields(text: &str, found: usize) -> Self {
        Self::MissingFields {
            text: text.to_string(),
            found,
        }
    }

    /// Create an InvalidField error naming the offending field
    pub fn invalid_field(field: EntryField, text: &str, source: ParseIntError) -> Self {
        Self::InvalidField {
            field,
            text: text.to_string(),
            source,
        }
    }

    /// Create a NoMatch error carrying the whole input for diagnosis
    pub fn no_match(input: &str) -> Self {
        Self::NoMatch {
            input: input.to_string(),
        }
    }

    /// Check if this error came out of the entry parser
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFields { .. } | Self::InvalidField { .. } | Self::NoMatch { .. }
        )
    }

    /// Check if this error came out of the tree builder
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::EmptySnapshot | Self::MissingRoot { .. } | Self::MultipleRoots { .. }
        )
    }
}

/// Result type for the entry parser
pub type ParseResult<T> = Result<T, VerifierError>;

/// Result type for tree construction
pub type BuildResult<T> = Result<T, VerifierError>;

/// Result type for the whole parse/build/validate pipeline
pub type VerifierResult<T> = Result<T, VerifierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let bad_number = "x".parse::<u64>().unwrap_err();
        assert!(VerifierError::missing_fields("{ 1, 2 }", 2).is_parse_error());
        assert!(VerifierError::invalid_field(EntryField::Key, "x", bad_number).is_parse_error());
        assert!(VerifierError::no_match("").is_parse_error());

        assert!(VerifierError::EmptySnapshot.is_build_error());
        assert!(VerifierError::MissingRoot { entries: 3 }.is_build_error());
        assert!(!VerifierError::MissingRoot { entries: 3 }.is_parse_error());
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let bad_number = "abc".parse::<u64>().unwrap_err();
        let err = VerifierError::invalid_field(EntryField::LeftChild, "abc", bad_number);
        let message = err.to_string();
        assert!(message.contains("left child"), "{}", message);
        assert!(message.contains("abc"), "{}", message);

        let err = VerifierError::MultipleRoots {
            candidates: vec![0, 4],
        };
        assert_eq!(err.to_string(), "snapshot has 2 root candidates at [0, 4]");
    }
}
