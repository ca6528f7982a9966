//! Lemonade Library
//!
//! Terminal host wiring the Lemonade crates together: startup, the stdin
//! command loop and shutdown.

pub mod host;

// Re-export the crates the host is built from
pub use lemonade_app as app;
pub use lemonade_core as core;
pub use lemonade_daemon as daemon;
