//! Completion entries for `.argon/config.toml`

/// A known Argon setting with its insert snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingCompletion {
    pub field: &'static str,
    /// Snippet inserted after `field = `
    pub value: &'static str,
    pub doc: &'static str,
}

impl SettingCompletion {
    /// Full snippet, e.g. `port = ${1:8000}`
    pub fn insert_text(&self) -> String {
        format!("{} = {}", self.field, self.value)
    }
}

const fn setting(
    field: &'static str,
    value: &'static str,
    doc: &'static str,
) -> SettingCompletion {
    SettingCompletion { field, value, doc }
}

pub const ARGON_SETTINGS: &[SettingCompletion] = &[
    setting("host", r#""${1:localhost}""#, "Default server host name"),
    setting("port", "${1:8000}", "Default server port number"),
    setting(
        "template",
        r#""${1|place,plugin,package,model,quick|}""#,
        "Default project template (place, model, etc.)",
    ),
    setting(
        "license",
        r#""${1|Apache-2.0,BSD-3-Clause,CC0-1.0,GPL-3.0,ISC,MIT,MPL-2.0,Unlicense,Zlib|}""#,
        "Default project license (SPDX identifier)",
    ),
    setting(
        "include_docs",
        "${1|true,false|}",
        "Include documentation in the project (README, CHANGELOG, etc.)",
    ),
    setting("use_git", "${1|true,false|}", "Use git for source control"),
    setting("use_wally", "${1|false,true|}", "Use Wally for package management"),
    setting(
        "run_async",
        "${1|false,true|}",
        "Run Argon asynchronously, freeing up the terminal",
    ),
    setting(
        "scan_ports",
        "${1|true,false|}",
        "Scan for the first available port if selected one is in use",
    ),
    setting("detect_project", "${1|true,false|}", "Automatically detect project type"),
    setting(
        "with_sourcemap",
        "${1|false,true|}",
        "Always run commands with sourcemap generation",
    ),
    setting("build_xml", "${1|false,true|}", "Build using XML format by default"),
    setting(
        "check_updates",
        "${1|true,false|}",
        "Check for new Argon releases on startup",
    ),
    setting(
        "auto_update",
        "${1|false,true|}",
        "Automatically install Argon updates if available",
    ),
    setting(
        "install_plugin",
        "${1|true,false|}",
        "Install Roblox plugin locally and keep it updated",
    ),
    setting("rojo_mode", "${1|false,true|}", "Use Rojo namespace by default"),
    setting("ts_mode", "${1|false,true|}", "Use roblox-ts by default"),
    setting(
        "package_manager",
        r#""${1|bun,npm,pnpm,yarn|}""#,
        "Package manager to use when running roblox-ts scripts (npm, yarn, etc.)",
    ),
    setting(
        "lua_extension",
        "${1|false,true|}",
        "Use .lua file extension instead of .luau when writing scripts",
    ),
    setting(
        "move_to_bin",
        "${1|false,true|}",
        "Move files to the bin instead of deleting them (two-way sync)",
    ),
    setting(
        "share_stats",
        "${1|true,false|}",
        "Share anonymous Argon usage statistics with the community",
    ),
];

/// Settings not yet present in `document`
pub fn config_completions(document: &str) -> Vec<&'static SettingCompletion> {
    ARGON_SETTINGS
        .iter()
        .filter(|setting| !has_setting(document, setting.field))
        .collect()
}

/// The first line mentioning `field` decides: present unless it is commented.
fn has_setting(document: &str, field: &str) -> bool {
    document
        .lines()
        .find(|line| line.contains(field))
        .map(|line| !line.contains('#'))
        .unwrap_or(false)
}
