//! lemonade-app - Session registry, configuration and actions for Lemonade
//!
//! This crate owns everything between the Argon façade and the terminal host:
//! the application context, the session registry and its persisted mirror,
//! startup restoration, settings, the output channel and the command surface.

pub mod actions;
pub mod command;
pub mod config;
pub mod context;
pub mod menu;
pub mod options;
pub mod output;
pub mod registry;
pub mod restore;
pub mod state_store;
pub mod status;

// Re-export primary types
pub use command::{execute, Command, CommandOutcome};
pub use context::AppContext;
pub use menu::{Menu, MenuAction, MenuItem, MENU_ITEMS};
pub use output::{Notifier, NullNotifier, OutputChannel, OutputLine};
pub use registry::SessionRegistry;
pub use restore::{restore_sessions, RestoreReport};
pub use state_store::StateStore;
pub use status::StatusView;
