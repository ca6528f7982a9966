//! Classification of Argon's line-oriented output
//!
//! Argon prefixes user-facing lines with a short level tag (`ERROR:`, `WARN:`,
//! `INFO:`). Anything else, or a line ending in `]` (verbose tracing output
//! such as `... [argon::server]`), is a continuation/verbose line: it is kept
//! in the output channel but never raised as a notification.

use regex::Regex;
use std::sync::LazyLock;

/// A level tag of at most five characters followed by a colon at line start
static LEVEL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.{0,5}:").expect("Invalid level prefix regex"));

/// Severity sink a line is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LineSeverity {
    Info,
    Warning,
    Error,
}

impl LineSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            LineSeverity::Info => "INFO",
            LineSeverity::Warning => "WARN",
            LineSeverity::Error => "ERROR",
        }
    }
}

/// Result of classifying one output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub severity: LineSeverity,
    pub verbose: bool,
}

/// Classify a single line. Total: every input gets exactly one severity and
/// one verbosity.
pub fn classify_line(line: &str) -> ClassifiedLine {
    let verbose = line.ends_with(']') || !LEVEL_PREFIX.is_match(line);

    let severity = if line.starts_with("ERROR") {
        LineSeverity::Error
    } else if line.starts_with("WARN") {
        LineSeverity::Warning
    } else {
        LineSeverity::Info
    };

    ClassifiedLine { severity, verbose }
}
