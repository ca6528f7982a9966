//! Configuration types for Lemonade
//!
//! `Settings` mirrors `.lemonade/config.toml`. Every field has a serde default
//! so partial files load cleanly.

use serde::{Deserialize, Serialize};

/// Application settings (.lemonade/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub behavior: BehaviorSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub argon: ArgonSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

/// Behavior settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BehaviorSettings {
    /// Restore the last sessions on startup
    #[serde(default = "default_true")]
    pub auto_run: bool,

    /// Launch Studio when a restored session syncs into it
    #[serde(default)]
    pub auto_launch_studio: bool,

    /// Focus the Studio window after `exec`
    #[serde(default = "default_true")]
    pub focus_studio: bool,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            auto_run: true,
            auto_launch_studio: false,
            focus_studio: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Fallback serve address
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub default_host: String,

    #[serde(default = "default_port")]
    pub default_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            default_host: default_host(),
            default_port: default_port(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Which output lines are raised as notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum NotificationLevel {
    Info,
    #[default]
    Warning,
    Error,
    None,
}

impl NotificationLevel {
    /// 3 = everything, 0 = nothing
    pub fn threshold(&self) -> u8 {
        match self {
            NotificationLevel::Info => 3,
            NotificationLevel::Warning => 2,
            NotificationLevel::Error => 1,
            NotificationLevel::None => 0,
        }
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NotificationLevel::Info => "Info",
            NotificationLevel::Warning => "Warning",
            NotificationLevel::Error => "Error",
            NotificationLevel::None => "None",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub level: NotificationLevel,
}

/// Argon binary settings
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ArgonSettings {
    /// Path to the Argon executable; empty means auto-detect
    #[serde(default)]
    pub custom_path: String,

    /// `-vvvv` and `RUST_LOG=trace` for every call
    #[serde(default)]
    pub verbose: bool,
}

impl ArgonSettings {
    pub fn custom_path(&self) -> Option<&str> {
        Some(self.custom_path.trim()).filter(|p| !p.is_empty())
    }
}

/// Output channel settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Lines kept in memory by the output channel
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_buffer_size() -> usize {
    5_000
}
