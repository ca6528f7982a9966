//! Argon binary location and installation probes

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

/// Prefix of `argon --version` output
const VERSION_PREFIX: &str = "argon-rbx ";

/// Template folders listed first, in this order
const TEMPLATE_PRIORITY: &[&str] = &["place", "plugin", "package", "model", "quick"];

/// Argon's home directory (`~/.argon`)
pub fn argon_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".argon"))
}

fn binary_name() -> &'static str {
    if cfg!(windows) {
        "argon.exe"
    } else {
        "argon"
    }
}

/// Resolve the Argon executable.
///
/// Order: a non-empty `custom` path, `~/.argon/bin/argon`, then `argon` on `PATH`.
pub fn locate_argon(custom: Option<&str>) -> Option<PathBuf> {
    if let Some(custom) = custom.map(str::trim).filter(|c| !c.is_empty()) {
        let path = PathBuf::from(custom);
        if path.is_file() {
            debug!("Using configured Argon binary: {}", path.display());
            return Some(path);
        }
        // A bare name like "argon-dev" is looked up on PATH
        if let Ok(found) = which::which(custom) {
            return Some(found);
        }
        debug!("Configured Argon path does not exist: {}", custom);
    }

    if let Some(home) = argon_home() {
        let bundled = home.join("bin").join(binary_name());
        if bundled.is_file() {
            debug!("Using Argon from {}", bundled.display());
            return Some(bundled);
        }
    }

    which::which("argon")
        .inspect_err(|e| debug!("argon not found on PATH: {}", e))
        .ok()
}

/// Run `<program> --version` synchronously.
///
/// `None` means "not installed": the binary could not be run or exited
/// unsuccessfully.
pub fn version(program: &Path) -> Option<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .inspect_err(|e| debug!("Failed to get Argon version: {}", e))
        .ok()?;

    if !output.status.success() {
        debug!("argon --version exited with {:?}", output.status.code());
        return None;
    }

    parse_version(&String::from_utf8_lossy(&output.stdout))
}

/// `"argon-rbx 2.0.13\n"` -> `"2.0.13"`
pub fn parse_version(output: &str) -> Option<String> {
    let line = output.lines().next()?.trim();
    let version = line.strip_prefix(VERSION_PREFIX).unwrap_or(line).trim();

    (!version.is_empty()).then(|| version.to_string())
}

/// Installed project templates under `<home>/templates`, most common first.
pub fn available_templates(home: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(home.join("templates")) else {
        return Vec::new();
    };

    let mut templates: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| !name.starts_with('.'))
        .collect();

    let rank = |name: &str| {
        TEMPLATE_PRIORITY
            .iter()
            .position(|p| *p == name)
            .unwrap_or(TEMPLATE_PRIORITY.len())
    };
    templates.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.cmp(b)));

    templates
}
