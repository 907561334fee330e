//! Parse, build, validate and render every snapshot of a captured run.

use std::io;

use tracing::{debug, info};

use crate::error::VerifierResult;
use crate::parser::parse_debug_output;
use crate::types::{Tree, TreeType};
use crate::validation::Violation;

/// Settings for one verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifierConfig {
    /// Balancing scheme every snapshot is checked against.
    pub tree_type: TreeType,
    /// Run [`Tree::verify_strict`] instead of [`Tree::verify_all`].
    pub strict: bool,
}

impl VerifierConfig {
    pub fn new(tree_type: TreeType) -> Self {
        Self {
            tree_type,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Outcome for one snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    pub tree: Tree,
    pub violations: Vec<Violation>,
}

impl SnapshotReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Diagnostics, one line per violation, then the headed diagram.
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for violation in &self.violations {
            writeln!(out, "{}", violation)?;
        }
        self.tree.print_with_header(out)
    }
}

/// Outcome for a whole captured run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub snapshots: Vec<SnapshotReport>,
}

impl RunReport {
    pub fn violation_count(&self) -> usize {
        self.snapshots.iter().map(|s| s.violations.len()).sum()
    }

    /// True when no snapshot broke an invariant.
    pub fn is_clean(&self) -> bool {
        self.snapshots.iter().all(SnapshotReport::is_clean)
    }

    pub fn write_to<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for snapshot in &self.snapshots {
            snapshot.write_to(out)?;
        }
        Ok(())
    }
}

/// Verify every snapshot in `text`.
///
/// Parse and build failures abort the run; invariant violations are
/// collected in the report.
///
/// # Examples
///
/// ```
/// use tree_verifier::{verify_output, TreeType, VerifierConfig};
///
/// let text = "[debug] (&) [ { 7, 0, 18446744073709551615, 18446744073709551615, 18446744073709551615, 128 } ]";
/// let report = verify_output(text, &VerifierConfig::new(TreeType::Avl)).unwrap();
/// assert!(report.is_clean());
/// ```
pub fn verify_output(text: &str, config: &VerifierConfig) -> VerifierResult<RunReport> {
    let snapshots = parse_debug_output(text)?
        .iter()
        .enumerate()
        .map(|(number, entries)| -> VerifierResult<SnapshotReport> {
            let tree = Tree::new(entries, config.tree_type)?;
            let violations = if config.strict {
                tree.verify_strict()
            } else {
                tree.verify_all()
            };
            debug!(
                snapshot = number,
                entries = tree.len(),
                violations = violations.len(),
                "verified snapshot"
            );
            Ok(SnapshotReport { tree, violations })
        })
        .collect::<VerifierResult<Vec<_>>>()?;

    let report = RunReport { snapshots };
    info!(
        snapshots = report.snapshots.len(),
        violations = report.violation_count(),
        tree_type = %config.tree_type,
        "verification finished"
    );
    Ok(report)
}

/// Verify raw captured output.
///
/// Bytes that are not UTF-8 are replaced before parsing; they can only sit
/// on noise lines, which the parser skips anyway.
pub fn verify_captured(bytes: &[u8], config: &VerifierConfig) -> VerifierResult<RunReport> {
    verify_output(&String::from_utf8_lossy(bytes), config)
}
