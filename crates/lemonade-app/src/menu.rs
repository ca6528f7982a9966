//! Main menu entries

use std::fmt;

/// Website opened by the Help entry
pub const HELP_URL: &str = "https://argon.wiki";

/// What a menu entry does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    StartLemonade,
    Serve,
    Build,
    Sourcemap,
    Init,
    Stop,
    Debug,
    Exec,
    Studio,
    Plugin,
    Update,
    Output,
    Settings,
    Help,
}

impl MenuAction {
    /// Command word typed to trigger the entry
    pub fn command(&self) -> &'static str {
        match self {
            MenuAction::StartLemonade => "start-lemonade",
            MenuAction::Serve => "serve",
            MenuAction::Build => "build",
            MenuAction::Sourcemap => "sourcemap",
            MenuAction::Init => "init",
            MenuAction::Stop => "stop",
            MenuAction::Debug => "play",
            MenuAction::Exec => "exec",
            MenuAction::Studio => "studio",
            MenuAction::Plugin => "plugin",
            MenuAction::Update => "update",
            MenuAction::Output => "output",
            MenuAction::Settings => "settings",
            MenuAction::Help => "help",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub description: &'static str,
    pub action: MenuAction,
}

const fn item(label: &'static str, description: &'static str, action: MenuAction) -> MenuItem {
    MenuItem {
        label,
        description,
        action,
    }
}

pub const MENU_ITEMS: &[MenuItem] = &[
    item(
        "Start Lemonade",
        "Set up the workspace and sync with Roblox Studio",
        MenuAction::StartLemonade,
    ),
    item("Serve", "Live sync with Roblox Studio", MenuAction::Serve),
    item("Build", "Compile project to binary or XML", MenuAction::Build),
    item("Sourcemap", "Map project files into JSON file", MenuAction::Sourcemap),
    item("Init", "Create a new project", MenuAction::Init),
    item("Stop", "Stop running Argon sessions (ids or all)", MenuAction::Stop),
    item(
        "Debug",
        "Switch to Roblox Studio and start playtest (play, run, start, stop-test)",
        MenuAction::Debug,
    ),
    item("Exec", "Run code snippet or file in Roblox Studio", MenuAction::Exec),
    item("Studio", "Launch new Roblox Studio instance", MenuAction::Studio),
    item(
        "Plugin",
        "Install or uninstall the Roblox Studio plugin",
        MenuAction::Plugin,
    ),
    item("Update Lemonade", "Update CLI and plugin components", MenuAction::Update),
    item("Output", "Show the Argon output channel", MenuAction::Output),
    item("Settings", "Show the current settings", MenuAction::Settings),
    item("Help", "Visit the official website", MenuAction::Help),
];

/// Menu as shown by the `menu` command
#[derive(Debug, Clone, Copy)]
pub struct Menu<'a> {
    version: &'a str,
}

impl<'a> Menu<'a> {
    pub fn new(version: &'a str) -> Self {
        Self { version }
    }

    pub fn items(&self) -> &'static [MenuItem] {
        MENU_ITEMS
    }
}

impl fmt::Display for Menu<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lemonade {}", self.version)?;

        let width = MENU_ITEMS
            .iter()
            .map(|i| i.action.command().len())
            .max()
            .unwrap_or(0);

        for entry in MENU_ITEMS {
            writeln!(
                f,
                "  {:<width$}  {:<16} {}",
                entry.action.command(),
                entry.label,
                entry.description
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_action_listed_once() {
        let actions: HashSet<_> = MENU_ITEMS.iter().map(|i| i.action).collect();
        assert_eq!(actions.len(), MENU_ITEMS.len());
        assert_eq!(MENU_ITEMS[0].action, MenuAction::StartLemonade);
        assert_eq!(MENU_ITEMS.last().map(|i| i.action), Some(MenuAction::Help));
    }

    #[test]
    fn test_render() {
        let text = Menu::new("2.0.13").to_string();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("Lemonade 2.0.13"));
        assert_eq!(text.lines().count(), MENU_ITEMS.len() + 1);
        assert!(text.contains("serve"));
        assert!(text.contains("Compile project to binary or XML"));
    }
}
