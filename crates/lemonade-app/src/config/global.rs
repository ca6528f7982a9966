//! Argon's own global configuration (`~/.argon/config.toml`)

use lemonade_core::prelude::*;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Flat key/value view of Argon's config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgonConfig {
    path: PathBuf,
    values: Table,
}

impl ArgonConfig {
    /// `~/.argon/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        lemonade_daemon::argon_home().map(|home| home.join("config.toml"))
    }

    /// Load the file at `path`. A missing file is an empty config.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            debug!("No Argon config at {:?}", path);
            return Ok(Self {
                path,
                values: Table::new(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let values: Table = toml::from_str(&content)?;
        debug!("Loaded {} Argon setting(s) from {:?}", values.len(), path);

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn values(&self) -> &Table {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set `key` from user text: booleans and numbers stay bare, anything
    /// else is stored as a string.
    pub fn set(&mut self, key: &str, raw: &str) {
        self.values.insert(key.to_string(), infer_value(raw));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Write back atomically
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string(&self.values)?;
        let temp_path = self.path.with_extension("toml.tmp");

        std::fs::write(&temp_path, content)
            .map_err(|e| Error::config(format!("Failed to write Argon config: {}", e)))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| Error::config(format!("Failed to replace Argon config: {}", e)))?;

        info!("Saved Argon config to {:?}", self.path);
        Ok(())
    }
}

/// `true`/`false`, integers and finite floats stay bare, the rest is a string
pub(crate) fn infer_value(raw: &str) -> Value {
    let raw = raw.trim();

    match raw {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Value::Integer(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        if float.is_finite() {
            return Value::Float(float);
        }
    }

    Value::String(raw.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp = tempdir().unwrap();
        let config = ArgonConfig::load(temp.path().join("config.toml")).unwrap();
        assert!(config.values().is_empty());
    }

    #[test]
    fn test_load_and_save_preserve_types() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "host = \"localhost\"\nport = 8000\nuse_git = true\n").unwrap();

        let mut config = ArgonConfig::load(&path).unwrap();
        assert_eq!(config.get("port"), Some(&Value::Integer(8000)));

        config.set("template", "place");
        config.set("scan_ports", "false");
        config.set("port", "9000");
        config.save().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("template = \"place\""));
        assert!(content.contains("scan_ports = false"));
        assert!(content.contains("port = 9000"));

        let reloaded = ArgonConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "host = ").unwrap();

        assert!(matches!(ArgonConfig::load(&path), Err(Error::TomlDe(_))));
    }

    #[test]
    fn test_infer_value() {
        assert_eq!(infer_value("true"), Value::Boolean(true));
        assert_eq!(infer_value("42"), Value::Integer(42));
        assert_eq!(infer_value("1.5"), Value::Float(1.5));
        assert_eq!(infer_value("\"MIT\""), Value::String("MIT".into()));
        assert_eq!(infer_value("inf"), Value::String("inf".into()));
    }
}
