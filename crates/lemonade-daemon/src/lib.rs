//! # lemonade-daemon - Argon Process Management
//!
//! Spawns the Argon CLI, relays its classified output and wraps each
//! subcommand in a typed call.
//!
//! Depends on [`lemonade_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Process Runner
//! - [`ArgonRunner`] - Spawn `argon <args> -v --yes --color never` and settle once
//! - [`RunOptions`] - Silent flag and early-resolution pattern
//! - [`RunOutcome`] - `(message, exit code)` of a settled call
//! - [`OutputSink`] - Destination of every output line
//!
//! ### Command Façade
//! - [`Argon`] - `serve`, `build`, `sourcemap`, `init`, `stop`, `debug`, `exec`,
//!   `studio`, `plugin`, `update`, `version`
//! - [`DebugMode`], [`PluginMode`], [`UpdateMode`]
//! - [`SessionIdGenerator`] - Millisecond ids with collision bump
//!
//! ### Binary Location
//! - [`locate_argon()`], [`argon_home()`], [`available_templates()`]

pub mod commands;
pub mod ids;
pub mod locate;
pub mod runner;
pub mod sink;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use commands::{address_port, parse_serve_address, Argon, DebugMode, PluginMode, UpdateMode};
pub use ids::SessionIdGenerator;
pub use locate::{argon_home, available_templates, locate_argon, parse_version};
pub use runner::{ArgonRunner, RunOptions, RunOutcome};
pub use sink::{OutputSink, TracingSink};
