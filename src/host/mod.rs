//! Terminal host
//!
//! Plays the part of the editor around the Lemonade core: it prints
//! notifications and the status line, reads commands from stdin and runs the
//! shutdown hook.

mod runner;

pub use runner::run;

use lemonade_app::{Notifier, StatusView};
use lemonade_core::LineSeverity;

/// Startup switches
#[derive(Debug, Clone, Copy)]
pub struct HostOptions {
    /// Restore last sessions (still subject to `behavior.auto_run`)
    pub restore: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self { restore: true }
    }
}

/// Prints notifications as `Lemonade: <message>`
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, severity: LineSeverity, message: &str) {
        match severity {
            LineSeverity::Error => eprintln!("{}", notification(message)),
            LineSeverity::Warning | LineSeverity::Info => println!("{}", notification(message)),
        }
    }
}

fn notification(message: &str) -> String {
    format!("Lemonade: {message}")
}

/// One-line status as printed after every registry change
pub fn status_line(view: &StatusView) -> String {
    format!("[{}]", view.text)
}
