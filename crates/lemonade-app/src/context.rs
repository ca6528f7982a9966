//! Application context
//!
//! Everything a command handler needs, built once at startup and shared as
//! `Arc<AppContext>`.

use lemonade_core::prelude::*;
use lemonade_daemon::{locate_argon, Argon, ArgonRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{load_settings, settings::LEMONADE_DIR, Settings};
use crate::output::{Notifier, OutputChannel};
use crate::registry::SessionRegistry;
use crate::state_store::StateStore;

#[derive(Debug)]
pub struct AppContext {
    workspace: PathBuf,
    settings: Settings,
    argon: Argon,
    registry: SessionRegistry,
    workspace_state: Arc<StateStore>,
    global_state: Arc<StateStore>,
    output: Arc<OutputChannel>,
    version: String,
}

impl AppContext {
    /// Assemble a context from already-built parts. `argon` should report to
    /// `output`.
    pub fn new(
        workspace: PathBuf,
        settings: Settings,
        argon: Argon,
        output: Arc<OutputChannel>,
        global_state: Arc<StateStore>,
        version: String,
    ) -> Self {
        let workspace_state = Arc::new(StateStore::workspace(&workspace));
        let registry = SessionRegistry::new(workspace_state.clone(), output.clone());

        Self {
            workspace,
            settings,
            argon,
            registry,
            workspace_state,
            global_state,
            output,
            version,
        }
    }

    /// Load settings, locate Argon and probe its version.
    ///
    /// Fails with [`Error::NoWorkspace`] for a missing directory and
    /// [`Error::ArgonNotFound`] when no runnable binary exists.
    pub fn bootstrap(workspace: &Path, notifier: Arc<dyn Notifier>) -> Result<Self> {
        if !workspace.is_dir() {
            return Err(Error::NoWorkspace);
        }

        let settings = load_settings(workspace);
        let output = Arc::new(OutputChannel::new(
            settings.output.buffer_size,
            settings.notifications.level,
            notifier,
        ));

        let program = locate_argon(settings.argon.custom_path()).ok_or(Error::ArgonNotFound)?;
        let runner = ArgonRunner::new(program, output.clone())
            .with_working_dir(workspace)
            .with_verbose(settings.argon.verbose);
        let argon = Argon::new(runner);

        let version = argon.version().ok_or(Error::ArgonNotFound)?;
        info!("Argon {} at {}", version, argon.runner().program().display());

        let global_state = StateStore::global().unwrap_or_else(|e| {
            warn!("{}; keeping global state in the workspace", e);
            StateStore::open(workspace.join(LEMONADE_DIR).join("global.json"))
        });

        Ok(Self::new(
            workspace.to_path_buf(),
            settings,
            argon,
            output,
            Arc::new(global_state),
            version,
        ))
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn argon(&self) -> &Argon {
        &self.argon
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn workspace_state(&self) -> &StateStore {
        &self.workspace_state
    }

    pub fn global_state(&self) -> &StateStore {
        &self.global_state
    }

    pub fn output(&self) -> &Arc<OutputChannel> {
        &self.output
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Context whose Argon is a shell script (see `scripted_runner`), with
/// global state kept inside the workspace.
#[cfg(test)]
pub(crate) fn scripted_context(workspace: &Path, script: &str) -> AppContext {
    use crate::output::NullNotifier;
    use lemonade_daemon::test_utils::scripted_runner;

    let settings = Settings::default();
    let output = Arc::new(OutputChannel::new(
        settings.output.buffer_size,
        settings.notifications.level,
        Arc::new(NullNotifier),
    ));
    let runner = scripted_runner(script, output.clone()).with_working_dir(workspace);
    let global_state = StateStore::open(workspace.join(LEMONADE_DIR).join("global.json"));

    AppContext::new(
        workspace.to_path_buf(),
        settings,
        Argon::new(runner),
        output,
        Arc::new(global_state),
        "2.0.0".to_string(),
    )
}
