//! Project settings in `.lemonade/config.toml`

use super::global::infer_value;
use super::types::Settings;
use lemonade_core::prelude::*;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.toml";
pub(crate) const LEMONADE_DIR: &str = ".lemonade";

const HEADER: &str = "# Lemonade Configuration\n\n";

const DEFAULT_CONFIG: &str = r#"[behavior]
auto_run = true             # Restore last sessions on startup
auto_launch_studio = false  # Launch Studio for restored serve/build sessions
focus_studio = true         # Focus Studio after exec

[server]
default_host = "localhost"
default_port = 8000

[notifications]
level = "Warning"           # Info, Warning, Error or None

[argon]
custom_path = ""            # Empty: ~/.argon/bin/argon, then PATH
verbose = false             # -vvvv and RUST_LOG=trace

[output]
buffer_size = 5000
"#;

/// `<project>/.lemonade/config.toml`
pub fn config_path(project_path: &Path) -> PathBuf {
    project_path.join(LEMONADE_DIR).join(CONFIG_FILENAME)
}

/// Never fails: a missing file means defaults, a broken one is logged and
/// ignored.
pub fn load_settings(project_path: &Path) -> Settings {
    let path = config_path(project_path);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No settings at {:?}, using defaults", path);
            return Settings::default();
        }
        Err(e) => {
            warn!("Cannot read {:?}: {}", path, e);
            return Settings::default();
        }
    };

    toml::from_str(&content).unwrap_or_else(|e| {
        warn!("Ignoring invalid settings in {:?}: {}", path, e);
        Settings::default()
    })
}

/// Write the commented default file unless one exists. Returns its path.
pub fn init_config_dir(project_path: &Path) -> Result<PathBuf> {
    let path = config_path(project_path);
    if path.exists() {
        return Ok(path);
    }

    write_atomic(&path, &format!("{HEADER}{DEFAULT_CONFIG}"))?;
    info!("Created default settings at {:?}", path);
    Ok(path)
}

pub fn save_settings(project_path: &Path, settings: &Settings) -> Result<()> {
    let content = toml::to_string_pretty(settings)?;
    let path = config_path(project_path);

    write_atomic(&path, &format!("{HEADER}{content}"))?;
    info!("Saved settings to {:?}", path);
    Ok(())
}

/// Change one `section.key` of the stored settings and save them.
///
/// The value is typed like in Argon's config (`true`, `8000`, `"text"`) and
/// must still deserialize into [`Settings`].
pub fn set_setting(project_path: &Path, key: &str, raw: &str) -> Result<Settings> {
    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| Error::config(format!("expected section.key, got {key}")))?;

    let current = load_settings(project_path);
    let toml::Value::Table(mut table) = toml::Value::try_from(&current)? else {
        return Err(Error::config("settings did not serialize to a table"));
    };

    let Some(toml::Value::Table(section_table)) = table.get_mut(section) else {
        return Err(Error::config(format!("unknown settings section: {section}")));
    };
    if !section_table.contains_key(field) {
        return Err(Error::config(format!("unknown setting: {key}")));
    }
    section_table.insert(field.to_string(), infer_value(raw));

    let updated: Settings = toml::Value::Table(table)
        .try_into()
        .map_err(|e| Error::config(format!("invalid value for {key}: {e}")))?;

    save_settings(project_path, &updated)?;
    Ok(updated)
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::config(format!("no parent directory for {:?}", path)))?;
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::config(format!("Failed to create {:?}: {}", dir, e)))?;

    let temp_path = dir.join(format!(".{CONFIG_FILENAME}.tmp"));
    std::fs::write(&temp_path, content)
        .map_err(|e| Error::config(format!("Failed to write settings: {}", e)))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| Error::config(format!("Failed to replace settings: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationLevel;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_returns_defaults() {
        let temp = tempdir().unwrap();
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_load_invalid_returns_defaults() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join(LEMONADE_DIR)).unwrap();
        std::fs::write(config_path(temp.path()), "[behavior\nauto_run = ").unwrap();

        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_default_file_matches_defaults() {
        let temp = tempdir().unwrap();
        let path = init_config_dir(temp.path()).unwrap();

        assert_eq!(path, config_path(temp.path()));
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join(LEMONADE_DIR)).unwrap();
        std::fs::write(config_path(temp.path()), "[server]\ndefault_port = 9000\n").unwrap();

        init_config_dir(temp.path()).unwrap();
        assert_eq!(load_settings(temp.path()).server.default_port, 9000);
    }

    #[test]
    fn test_save_then_load() {
        let temp = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.server.default_host = "0.0.0.0".into();
        settings.notifications.level = NotificationLevel::Error;
        settings.argon.verbose = true;

        save_settings(temp.path(), &settings).unwrap();

        assert_eq!(load_settings(temp.path()), settings);
        assert!(!temp.path().join(LEMONADE_DIR).join(".config.toml.tmp").exists());
    }

    #[test]
    fn test_set_setting() {
        let temp = tempdir().unwrap();

        let settings = set_setting(temp.path(), "server.default_port", "9000").unwrap();
        assert_eq!(settings.server.default_port, 9000);

        let settings = set_setting(temp.path(), "notifications.level", "Error").unwrap();
        assert_eq!(settings.notifications.level, NotificationLevel::Error);
        assert_eq!(load_settings(temp.path()).server.default_port, 9000);
    }

    #[test]
    fn test_set_setting_rejects_bad_input() {
        let temp = tempdir().unwrap();

        assert!(set_setting(temp.path(), "default_port", "9000").is_err());
        assert!(set_setting(temp.path(), "server.nope", "1").is_err());
        assert!(set_setting(temp.path(), "server.default_port", "many").is_err());
        assert!(!config_path(temp.path()).exists());
    }
}
