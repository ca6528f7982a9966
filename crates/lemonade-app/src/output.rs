//! Output channel and notifications
//!
//! Every Argon line lands in a bounded in-memory [`OutputChannel`] and is
//! mirrored to tracing. Non-verbose lines whose severity passes the configured
//! [`NotificationLevel`] are also handed to a [`Notifier`].

use chrono::{DateTime, Local};
use lemonade_core::LineSeverity;
use lemonade_daemon::{OutputSink, TracingSink};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::NotificationLevel;

/// User-facing notification surface
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: LineSeverity, message: &str);
}

/// Drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _severity: LineSeverity, _message: &str) {}
}

/// One entry of the output channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub timestamp: DateTime<Local>,
    pub severity: LineSeverity,
    pub text: String,
    pub verbose: bool,
}

impl OutputLine {
    /// `[12:00:01] WARN  text`
    pub fn render(&self) -> String {
        format!(
            "[{}] {:<5} {}",
            self.timestamp.format("%H:%M:%S"),
            self.severity.label(),
            self.text
        )
    }
}

/// Whether a non-verbose line of `severity` should notify at `level`
pub fn should_notify(level: NotificationLevel, severity: LineSeverity) -> bool {
    let weight = match severity {
        LineSeverity::Error => 1,
        LineSeverity::Warning => 2,
        LineSeverity::Info => 3,
    };
    weight <= level.threshold()
}

pub struct OutputChannel {
    lines: Mutex<VecDeque<OutputLine>>,
    capacity: usize,
    level: NotificationLevel,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputChannel")
            .field("capacity", &self.capacity)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl OutputChannel {
    pub fn new(capacity: usize, level: NotificationLevel, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            level,
            notifier,
        }
    }

    pub fn level(&self) -> NotificationLevel {
        self.level
    }

    /// Snapshot of the buffered lines, oldest first
    pub fn lines(&self) -> Vec<OutputLine> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Last `n` lines, oldest first
    pub fn tail(&self, n: usize) -> Vec<OutputLine> {
        let lines = self.lines();
        let skip = lines.len().saturating_sub(n);
        lines.into_iter().skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn append(&self, severity: LineSeverity, text: &str, verbose: bool) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(OutputLine {
                timestamp: Local::now(),
                severity,
                text: text.to_string(),
                verbose,
            });
        }

        if !verbose && should_notify(self.level, severity) {
            self.notifier.notify(severity, text);
        }
    }
}

/// Buffers every line and mirrors it to tracing
impl OutputSink for OutputChannel {
    fn info(&self, line: &str, verbose: bool) {
        TracingSink.info(line, verbose);
        self.append(LineSeverity::Info, line, verbose);
    }

    fn warn(&self, line: &str, verbose: bool) {
        TracingSink.warn(line, verbose);
        self.append(LineSeverity::Warning, line, verbose);
    }

    fn error(&self, line: &str, verbose: bool) {
        TracingSink.error(line, verbose);
        self.append(LineSeverity::Error, line, verbose);
    }
}
