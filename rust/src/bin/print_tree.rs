//! Verify and draw every tree snapshot found in captured test output.
//!
//! ```text
//! move test 2>&1 | print-tree --tree-type avl
//! ```

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;
use tree_verifier::{verify_captured, TreeType, VerifierConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TreeKind {
    Vanilla,
    Avl,
    RedBlack,
}

impl From<TreeKind> for TreeType {
    fn from(kind: TreeKind) -> Self {
        match kind {
            TreeKind::Vanilla => TreeType::Vanilla,
            TreeKind::Avl => TreeType::Avl,
            TreeKind::RedBlack => TreeType::RedBlack,
        }
    }
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Balancing scheme the dumped trees claim to follow
    #[arg(short, long, value_enum, default_value_t = TreeKind::RedBlack)]
    tree_type: TreeKind,
    /// Also check key order, reachability and color codes
    #[arg(long)]
    strict: bool,
    /// Exit successfully even when invariants are broken
    #[arg(long)]
    allow_violations: bool,
    /// Captured test output; read from stdin when omitted
    input: Option<PathBuf>,
}

fn read_input(path: Option<&PathBuf>) -> io::Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path),
        None => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes)?;
            Ok(bytes)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let bytes = match read_input(cli.input.as_ref()) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("failed to read input: {}", e);
            return ExitCode::from(2);
        }
    };

    let config = VerifierConfig::new(cli.tree_type.into()).strict(cli.strict);
    let report = match verify_captured(&bytes, &config) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = report.write_to(&mut out).and_then(|_| out.flush()) {
        error!("failed to write report: {}", e);
        return ExitCode::from(2);
    }

    if report.is_clean() || cli.allow_violations {
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "{} violation(s) across {} snapshot(s)",
            report.violation_count(),
            report.snapshots.len()
        );
        ExitCode::from(1)
    }
}
