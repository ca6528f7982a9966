//! Roblox project discovery
//!
//! Finds Argon/Rojo project descriptors (`*.project.json`) and place files in
//! the workspace root, and reads the few descriptor fields Lemonade needs.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// File suffix of a project descriptor
pub const PROJECT_SUFFIX: &str = ".project.json";

/// Service folders a place project keeps under `src/`
pub const REQUIRED_SRC_DIRS: &[&str] = &[
    "ReplicatedFirst",
    "ReplicatedStorage",
    "ServerScriptService",
    "ServerStorage",
    "StarterGui",
    "StarterPack",
    "StarterPlayer",
    "Workspace",
];

/// Host/port hints stored in a project descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectAddress {
    pub host: Option<String>,
    pub port: Option<String>,
}

/// List project descriptors in `dir`, sorted by name.
///
/// With `places_only`, keeps descriptors whose tree root is a `DataModel`.
pub fn find_projects(dir: &Path, places_only: bool) -> Result<Vec<String>> {
    let mut projects = list_files(dir, |name| name.ends_with(PROJECT_SUFFIX))?;

    if places_only {
        projects.retain(|project| is_place_project(&dir.join(project)));
    }

    debug!("Found {} project(s) in {}", projects.len(), dir.display());
    Ok(projects)
}

/// List `.rbxl` / `.rbxlx` place files in `dir`, sorted by name.
pub fn find_places(dir: &Path) -> Result<Vec<String>> {
    list_files(dir, |name| name.ends_with(".rbxl") || name.ends_with(".rbxlx"))
}

/// Display name of a project: the descriptor's `name`, else the file stem.
pub fn project_name(dir: &Path, project: &str) -> String {
    let path = resolve(dir, project);

    read_descriptor(&path)
        .and_then(|json| json.get("name").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            let file = path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| project.to_string());
            file.strip_suffix(PROJECT_SUFFIX)
                .map(str::to_string)
                .unwrap_or(file)
        })
}

/// Serve address hints of a project (`host`/`serveAddress`, `port`/`servePort`).
pub fn project_address(dir: &Path, project: &str) -> ProjectAddress {
    let Some(json) = read_descriptor(&resolve(dir, project)) else {
        return ProjectAddress::default();
    };

    let field = |primary: &str, fallback: &str| {
        json.get(primary)
            .or_else(|| json.get(fallback))
            .and_then(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    };

    ProjectAddress {
        host: field("host", "serveAddress"),
        port: field("port", "servePort"),
    }
}

/// Whether `dir/src` holds every standard service folder.
pub fn has_src_structure(dir: &Path) -> bool {
    let src = dir.join("src");
    let Ok(entries) = fs::read_dir(&src) else {
        return false;
    };

    let existing: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();

    REQUIRED_SRC_DIRS
        .iter()
        .all(|required| existing.iter().any(|e| e == required))
}

fn resolve(dir: &Path, project: &str) -> PathBuf {
    let path = Path::new(project);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

fn read_descriptor(path: &Path) -> Option<Value> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn is_place_project(path: &Path) -> bool {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return false;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(json) => json
            .get("tree")
            .and_then(|tree| tree.get("$className"))
            .and_then(Value::as_str)
            == Some("DataModel"),
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            false
        }
    }
}

fn list_files(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(Error::NoWorkspace);
    }

    let mut files: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| keep(name))
        .collect();

    files.sort();
    Ok(files)
}
