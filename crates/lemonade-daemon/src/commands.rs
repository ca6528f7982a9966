//! Typed Argon subcommands
//!
//! [`Argon`] builds argument vectors for each subcommand, picks the calling
//! convention (silent or visible, readiness pattern) and normalizes the
//! result shape. Long-lived operations get a fresh [`SessionId`] passed to
//! Argon positionally after the project path.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use url::Url;

use lemonade_core::prelude::*;
use lemonade_core::SessionId;

use crate::ids::SessionIdGenerator;
use crate::locate;
use crate::runner::{ArgonRunner, RunOptions, RunOutcome};

/// Readiness line of `argon serve`
static SERVE_READY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Serving on: (http://[^\s,]+)").expect("Invalid serve pattern")
});

/// Readiness line of `argon build --watch`
static BUILD_READY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Build successful").expect("Invalid build pattern"));

/// Readiness line of `argon sourcemap --watch`
static SOURCEMAP_READY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)generated sourcemap|sourcemap (generated|written|saved)")
        .expect("Invalid sourcemap pattern")
});

const WATCH_FLAG: &str = "--watch";

/// `argon debug <mode>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugMode {
    Play,
    Run,
    Start,
    Stop,
}

impl DebugMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebugMode::Play => "play",
            DebugMode::Run => "run",
            DebugMode::Start => "start",
            DebugMode::Stop => "stop",
        }
    }
}

/// `argon plugin <mode>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginMode {
    Install,
    Uninstall,
}

impl PluginMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginMode::Install => "install",
            PluginMode::Uninstall => "uninstall",
        }
    }
}

/// `argon update <mode>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    #[default]
    All,
    Cli,
    Plugin,
    Templates,
}

impl UpdateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::All => "all",
            UpdateMode::Cli => "cli",
            UpdateMode::Plugin => "plugin",
            UpdateMode::Templates => "templates",
        }
    }
}

macro_rules! impl_mode_parsing {
    ($($ty:ident => [$($variant:ident),+]),+ $(,)?) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                $(
                    if s.eq_ignore_ascii_case($ty::$variant.as_str()) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(Error::invalid_command(format!(
                    "unknown {} mode: {}",
                    stringify!($ty).trim_end_matches("Mode").to_lowercase(),
                    s
                )))
            }
        }
    )+};
}

impl_mode_parsing! {
    DebugMode => [Play, Run, Start, Stop],
    PluginMode => [Install, Uninstall],
    UpdateMode => [All, Cli, Plugin, Templates],
}

/// Argon command façade
#[derive(Debug, Clone)]
pub struct Argon {
    runner: ArgonRunner,
    ids: Arc<SessionIdGenerator>,
}

impl Argon {
    pub fn new(runner: ArgonRunner) -> Self {
        Self {
            runner,
            ids: Arc::new(SessionIdGenerator::new()),
        }
    }

    pub fn runner(&self) -> &ArgonRunner {
        &self.runner
    }

    /// Start `argon serve` and wait for its readiness line.
    ///
    /// Returns the session id and the address Argon actually bound, which may
    /// differ from the requested one when the port was taken.
    pub async fn serve(&self, project: &str, options: &[String]) -> Result<(SessionId, String)> {
        let id = self.ids.next();
        let args = session_args("serve", project, Some(id), options);
        debug!("serve {} with session {}", project, id);

        let outcome = self
            .runner
            .run(args, RunOptions::visible().resolve_on(SERVE_READY.clone()))
            .await?;

        if !outcome.is_ready() {
            return Err(Error::output_contract(format!(
                "serve exited before reporting an address: {}",
                outcome.message
            )));
        }

        let address = parse_serve_address(&outcome.message)?;
        info!("Session {} serving {} on {}", id, project, address);
        Ok((id, address))
    }

    /// `argon build`. With `--watch` this starts a session and returns its id
    /// once the first build succeeded; otherwise waits for exit.
    pub async fn build(&self, project: &str, options: &[String]) -> Result<Option<SessionId>> {
        self.watchable("build", &BUILD_READY, project, options)
            .await
    }

    /// `argon sourcemap`, same shape as [`Argon::build`]
    pub async fn sourcemap(&self, project: &str, options: &[String]) -> Result<Option<SessionId>> {
        self.watchable("sourcemap", &SOURCEMAP_READY, project, options)
            .await
    }

    async fn watchable(
        &self,
        subcommand: &str,
        ready: &Regex,
        project: &str,
        options: &[String],
    ) -> Result<Option<SessionId>> {
        if !is_watch(options) {
            let args = session_args(subcommand, project, None, options);
            self.runner.run(args, RunOptions::visible()).await?;
            return Ok(None);
        }

        let id = self.ids.next();
        let args = session_args(subcommand, project, Some(id), options);
        let outcome = self
            .runner
            .run(args, RunOptions::visible().resolve_on(ready.clone()))
            .await?;

        if !outcome.is_ready() {
            return Err(Error::output_contract(format!(
                "{subcommand} --watch exited before reporting readiness: {}",
                outcome.message
            )));
        }

        Ok(Some(id))
    }

    /// `argon init <project> --template <template> [options]`
    pub async fn init(&self, project: &str, template: &str, options: &[String]) -> Result<()> {
        let args = init_args(project, template, options);
        self.runner.run(args, RunOptions::visible()).await.map(drop)
    }

    /// `argon stop <ids…>`. Advisory: Argon is asked to end the sessions, the
    /// processes are not killed from here.
    pub async fn stop(&self, ids: &[SessionId]) -> Result<()> {
        let args = std::iter::once("stop".to_string())
            .chain(ids.iter().map(SessionId::to_string))
            .collect();
        self.runner.run(args, RunOptions::silent()).await.map(drop)
    }

    pub async fn debug(&self, mode: DebugMode) -> Result<()> {
        let args = vec!["debug".to_string(), mode.as_str().to_string()];
        self.runner.run(args, RunOptions::silent()).await.map(drop)
    }

    /// Run Luau `code` in Studio, optionally focusing the Studio window
    pub async fn exec(&self, code: &str, focus: bool) -> Result<()> {
        self.runner
            .run(exec_args(code, focus), RunOptions::silent())
            .await
            .map(drop)
    }

    /// Launch Studio. `check` skips the launch when Studio is already running.
    pub async fn studio(&self, check: bool, place: Option<&str>) -> Result<()> {
        self.runner
            .run(studio_args(check, place), RunOptions::silent())
            .await
            .map(drop)
    }

    pub async fn plugin(&self, mode: PluginMode) -> Result<()> {
        let args = vec!["plugin".to_string(), mode.as_str().to_string()];
        self.runner.run(args, RunOptions::visible()).await.map(drop)
    }

    /// `argon update <mode>`. Background (`auto`) updates stay silent.
    pub async fn update(&self, mode: UpdateMode, auto: bool) -> Result<RunOutcome> {
        let args = vec!["update".to_string(), mode.as_str().to_string()];
        self.runner
            .run(args, RunOptions::visible().with_silent(auto))
            .await
    }

    /// Installed Argon version, `None` when the binary cannot be run
    pub fn version(&self) -> Option<String> {
        locate::version(self.runner.program())
    }

    /// Templates available to `init`
    pub fn templates(&self) -> Vec<String> {
        locate::argon_home()
            .map(|home| locate::available_templates(&home))
            .unwrap_or_default()
    }
}

fn is_watch(options: &[String]) -> bool {
    options.iter().any(|o| o == WATCH_FLAG)
}

fn session_args(
    subcommand: &str,
    project: &str,
    id: Option<SessionId>,
    options: &[String],
) -> Vec<String> {
    let mut args = vec![subcommand.to_string(), project.to_string()];
    if let Some(id) = id {
        args.push(id.to_string());
    }
    args.extend(options.iter().cloned());
    args
}

fn init_args(project: &str, template: &str, options: &[String]) -> Vec<String> {
    let mut args = vec![
        "init".to_string(),
        project.to_string(),
        "--template".to_string(),
        template.to_string(),
    ];
    args.extend(options.iter().cloned());
    args
}

fn exec_args(code: &str, focus: bool) -> Vec<String> {
    let mut args = vec!["exec".to_string(), code.to_string()];
    if focus {
        args.push("--focus".to_string());
    }
    args
}

fn studio_args(check: bool, place: Option<&str>) -> Vec<String> {
    let mut args = vec!["studio".to_string()];
    if let Some(place) = place.filter(|p| !p.is_empty()) {
        args.push(place.to_string());
    }
    if check {
        args.push("--check".to_string());
    }
    args
}

/// Extract and validate the URL of a `Serving on: <url>` line
pub fn parse_serve_address(line: &str) -> Result<String> {
    let captured = SERVE_READY
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            Error::output_contract(format!("could not parse address from output: {line}"))
        })?;

    Url::parse(captured)
        .ok()
        .filter(|url| url.host_str().is_some())
        .ok_or_else(|| Error::output_contract(format!("invalid serve address: {captured}")))?;

    Ok(captured.to_string())
}

/// Port of a serve address (`http://localhost:8001` -> `8001`)
pub fn address_port(address: &str) -> Option<u16> {
    Url::parse(address).ok()?.port_or_known_default()
}
