//! Configuration file parsing for Lemonade
//!
//! Supports:
//! - `.lemonade/config.toml` - Project settings
//! - `~/.argon/config.toml` - Argon's global settings
//! - Completion entries for Argon's config file

pub mod completion;
pub mod global;
pub mod settings;
pub mod types;

pub use completion::{config_completions, SettingCompletion, ARGON_SETTINGS};
pub use global::ArgonConfig;
pub use settings::{config_path, init_config_dir, load_settings, save_settings, set_setting};
pub use types::*;
