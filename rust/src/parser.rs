//! Entry parser for captured test output.
//!
//! The tree under test prints its node array with a debug print, which
//! shows up in the test runner's output as
//!
//! ```text
//! [debug] (&) [ { 10, 0, 18446744073709551615, 1, 2, 129 }, { 5, 0, 0, ... } ]
//! ```
//!
//! Every such line is one snapshot. All other lines are noise and skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{EntryField, ParseResult, VerifierError};
use crate::types::{index_from_wire, Entry};

/// Every entry of one debug print, in array order.
pub type Snapshot = Vec<Entry>;

static OUTER_MATCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[debug\] \(&\) \[(.*)\]$").expect("outer pattern is valid"));

static INNER_MATCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{ ([^{]+) \}").expect("inner pattern is valid"));

/// Parse one brace group, with or without its enclosing braces.
pub fn parse_entry(text: &str) -> ParseResult<Entry> {
    let fields: Vec<&str> = text
        .trim_matches(|c| c == ' ' || c == '{' || c == '}')
        .split(", ")
        .collect();
    if fields.len() < 5 {
        return Err(VerifierError::missing_fields(text, fields.len()));
    }

    let number = |field: EntryField| -> ParseResult<u64> {
        let raw = fields[field as usize];
        raw.parse::<u64>()
            .map_err(|e| VerifierError::invalid_field(field, raw, e))
    };

    let mut entry = Entry {
        key: number(EntryField::Key)?,
        value: number(EntryField::Value)?,
        parent: index_from_wire(number(EntryField::Parent)?),
        left_child: index_from_wire(number(EntryField::LeftChild)?),
        right_child: index_from_wire(number(EntryField::RightChild)?),
        metadata: 0,
    };

    if let Some(raw) = fields.get(EntryField::Metadata as usize) {
        entry.metadata = raw
            .parse::<u8>()
            .map_err(|e| VerifierError::invalid_field(EntryField::Metadata, raw, e))?;
    }

    Ok(entry)
}

/// Parse one line of output.
///
/// Returns `Ok(None)` when the line is not a snapshot line, or is one but
/// holds no entry groups.
pub fn parse_snapshot_line(line: &str) -> ParseResult<Option<Snapshot>> {
    let Some(captures) = OUTER_MATCH.captures(line) else {
        debug!(line, "failed to find outer match");
        return Ok(None);
    };
    let body = captures.get(1).map_or("", |m| m.as_str());

    let snapshot = INNER_MATCH
        .captures_iter(body)
        .filter_map(|group| group.get(1))
        .map(|group| parse_entry(group.as_str()))
        .collect::<ParseResult<Snapshot>>()?;

    if snapshot.is_empty() {
        debug!(body, "no entry groups in debug line");
        return Ok(None);
    }

    Ok(Some(snapshot))
}

/// Parse the captured output of a whole test run into snapshots.
///
/// A malformed entry aborts the whole parse; an input without any snapshot
/// line is a [`VerifierError::NoMatch`].
pub fn parse_debug_output(text: &str) -> ParseResult<Vec<Snapshot>> {
    let mut snapshots = Vec::new();
    for line in text.lines() {
        if let Some(snapshot) = parse_snapshot_line(line)? {
            snapshots.push(snapshot);
        }
    }

    if snapshots.is_empty() {
        return Err(VerifierError::no_match(text));
    }

    debug!(count = snapshots.len(), "parsed debug snapshots");
    Ok(snapshots)
}

/// Format entries back into the debug line shape the parser accepts.
pub fn format_snapshot_line(entries: &[Entry]) -> String {
    let groups: Vec<String> = entries.iter().map(Entry::to_string).collect();
    format!("[debug] (&) [ {} ]", groups.join(", "))
}
