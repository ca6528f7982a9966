//! Test utilities for Argon process types
//!
//! Provides a recording [`OutputSink`] and runners that stand in for the Argon
//! binary with a shell script.

use std::sync::{Arc, Mutex};

use lemonade_core::LineSeverity;

use crate::runner::ArgonRunner;
use crate::sink::OutputSink;

/// One recorded line: severity, text, verbose flag
pub type RecordedLine = (LineSeverity, String, bool);

/// Sink that keeps every line it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<RecordedLine>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<RecordedLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Whether `line` was recorded with `severity`
    pub fn contains(&self, severity: LineSeverity, line: &str) -> bool {
        self.lines()
            .iter()
            .any(|(sev, text, _)| *sev == severity && text == line)
    }

    fn push(&self, severity: LineSeverity, line: &str, verbose: bool) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((severity, line.to_string(), verbose));
        }
    }
}

impl OutputSink for RecordingSink {
    fn info(&self, line: &str, verbose: bool) {
        self.push(LineSeverity::Info, line, verbose);
    }

    fn warn(&self, line: &str, verbose: bool) {
        self.push(LineSeverity::Warning, line, verbose);
    }

    fn error(&self, line: &str, verbose: bool) {
        self.push(LineSeverity::Error, line, verbose);
    }
}

/// Runner executing `sh -c <script> argon <args…>`.
///
/// Inside the script `$0` is `argon` and `$1…` are the subcommand arguments
/// followed by the common flags (`-v --yes --color never`).
pub fn scripted_runner(script: &str, sink: Arc<dyn OutputSink>) -> ArgonRunner {
    ArgonRunner::new("sh", sink).with_leading_args(vec![
        "-c".to_string(),
        script.to_string(),
        "argon".to_string(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::default();
        sink.info("INFO: a", false);
        sink.warn("WARN: b", true);
        sink.error("ERROR: c", false);

        assert_eq!(sink.lines().len(), 3);
        assert!(sink.contains(LineSeverity::Warning, "WARN: b"));
        assert!(!sink.contains(LineSeverity::Error, "WARN: b"));
    }

    #[test]
    fn test_scripted_runner_args() {
        let runner = scripted_runner("exit 0", Arc::new(RecordingSink::default()));
        assert_eq!(
            runner.command_args(&["stop".to_string()]),
            vec!["-c", "exit 0", "argon", "stop", "-v", "--yes", "--color", "never"]
        );
    }
}
