//! # lemonade-core - Core Domain Types
//!
//! Foundation crate for Lemonade. Provides domain types, error handling,
//! Argon output classification and Roblox project discovery.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, regex, tracing and its subscriber stack).
//!
//! ## Public API
//!
//! ### Sessions (`session`)
//! - [`Session`] - One tracked Argon operation (serve, build or sourcemap)
//! - [`SessionBuilder`] - Produces a fully populated, immutable [`Session`]
//! - [`SessionKind`] - Operation type of a session
//! - [`PersistedSession`] - Record stored in workspace state
//! - [`RestorableSession`] - Validated projection of a stored record
//!
//! ### Output (`output`)
//! - [`classify_line()`] - Severity + verbosity of one Argon output line
//! - [`LineSeverity`], [`ClassifiedLine`]
//!
//! ### Events (`events`)
//! - [`ProcessEvent`] - stdout/stderr/exit events of a spawned Argon process
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ### Project Discovery (`project`)
//! - [`find_projects()`], [`find_places()`], [`project_name()`], [`project_address()`]
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use lemonade_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod output;
pub mod project;
pub mod session;

/// Prelude for common imports used throughout all Lemonade crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use events::{ProcessEvent, StreamKind};
pub use output::{classify_line, ClassifiedLine, LineSeverity};
pub use project::{
    find_places, find_projects, has_src_structure, project_address, project_name,
    ProjectAddress, PROJECT_SUFFIX, REQUIRED_SRC_DIRS,
};
pub use session::{
    PersistedSession, RestorableSession, Session, SessionBuilder, SessionId, SessionKind,
};
