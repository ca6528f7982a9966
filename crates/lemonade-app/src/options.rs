//! Per-operation option flags
//!
//! Each operation has a fixed table of flags with a default pick. The user's
//! last pick is remembered in global state under `"<Operation><flag>"`, for
//! example `Serve--sourcemap`.

use lemonade_core::prelude::*;

use crate::state_store::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionFlag {
    pub label: &'static str,
    pub flag: &'static str,
    pub picked: bool,
}

const fn flag(label: &'static str, flag: &'static str, picked: bool) -> OptionFlag {
    OptionFlag {
        label,
        flag,
        picked,
    }
}

/// Operation an option table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSet {
    Serve,
    Build,
    Sourcemap,
    Init,
}

const SERVE_OPTIONS: &[OptionFlag] = &[
    flag("Generate sourcemap", "--sourcemap", true),
    flag("Use roblox-ts", "--ts", false),
];

const BUILD_OPTIONS: &[OptionFlag] = &[
    flag("Watch for changes", "--watch", true),
    flag("Generate sourcemap", "--sourcemap", true),
    flag("Build plugin", "--plugin", false),
    flag("Use XML format", "--xml", false),
    flag("Use roblox-ts", "--ts", false),
];

const SOURCEMAP_OPTIONS: &[OptionFlag] = &[
    flag("Watch for changes", "--watch", true),
    flag("Include non-scripts", "--non-scripts", false),
];

const INIT_OPTIONS: &[OptionFlag] = &[
    flag("Include docs", "--docs", true),
    flag("Configure Git", "--git", true),
    flag("Setup Wally", "--wally", false),
    flag("Setup selene", "--selene", false),
    flag("Use roblox-ts", "--ts", false),
];

impl OptionSet {
    pub fn flags(&self) -> &'static [OptionFlag] {
        match self {
            OptionSet::Serve => SERVE_OPTIONS,
            OptionSet::Build => BUILD_OPTIONS,
            OptionSet::Sourcemap => SOURCEMAP_OPTIONS,
            OptionSet::Init => INIT_OPTIONS,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            OptionSet::Serve => "Serve",
            OptionSet::Build => "Build",
            OptionSet::Sourcemap => "Sourcemap",
            OptionSet::Init => "Init",
        }
    }

    /// Global state key remembering one flag
    pub fn key(&self, flag: &str) -> String {
        format!("{}{}", self.prefix(), flag)
    }

    pub fn is_known(&self, flag: &str) -> bool {
        self.flags().iter().any(|f| f.flag == flag)
    }

    /// Flags currently picked: the remembered choice, else the table default
    pub fn remembered(&self, store: &StateStore) -> Vec<String> {
        self.flags()
            .iter()
            .filter(|f| store.get_or(&self.key(f.flag), f.picked))
            .map(|f| f.flag.to_string())
            .collect()
    }

    /// Remember `picked` for every flag of the table
    pub fn remember(&self, store: &StateStore, picked: &[String]) -> Result<()> {
        for f in self.flags() {
            let on = picked.iter().any(|p| p == f.flag);
            store.set(&self.key(f.flag), &on)?;
        }
        Ok(())
    }

    /// Explicit picks are validated and remembered; no picks means "same as last time".
    pub fn resolve(&self, store: &StateStore, explicit: Option<&[String]>) -> Result<Vec<String>> {
        let Some(explicit) = explicit else {
            return Ok(self.remembered(store));
        };

        if let Some(unknown) = explicit.iter().find(|f| !self.is_known(f)) {
            return Err(Error::invalid_command(format!(
                "unknown {} option: {}",
                self.prefix().to_lowercase(),
                unknown
            )));
        }

        if let Err(e) = self.remember(store, explicit) {
            warn!("Failed to remember {} options: {}", self.prefix(), e);
        }

        // Keep table order regardless of input order
        Ok(self
            .flags()
            .iter()
            .filter(|f| explicit.iter().any(|e| e == f.flag))
            .map(|f| f.flag.to_string())
            .collect())
    }
}

/// `init` takes every flag explicitly: `--docs=true --git=false …`
pub fn render_init_flags(picked: &[String]) -> Vec<String> {
    INIT_OPTIONS
        .iter()
        .map(|f| format!("{}={}", f.flag, picked.iter().any(|p| p == f.flag)))
        .collect()
}
