//! Menu actions
//!
//! Non-interactive counterparts of the menu entries. Each action resolves its
//! inputs (project, options, address), calls the Argon façade and records any
//! resulting session in the registry.

use lemonade_core::prelude::*;
use lemonade_core::{
    find_places, find_projects, has_src_structure, project_address, project_name,
    RestorableSession, Session, SessionBuilder, SessionId, SessionKind,
};
use lemonade_daemon::{address_port, DebugMode, PluginMode, UpdateMode};
use std::path::Path;

use crate::context::AppContext;
use crate::options::{render_init_flags, OptionSet};

/// Project file created and served by "Start Lemonade"
pub const DEFAULT_PROJECT: &str = "default.project.json";

/// Template used when initializing an empty workspace
pub const DEFAULT_TEMPLATE: &str = "place";

/// Host and port, either possibly unset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub host: Option<String>,
    pub port: Option<String>,
}

impl AddressParts {
    /// Overlay the set parts of `other`
    pub fn merge(&mut self, other: AddressParts) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
    }
}

/// `8001` is a port, `myhost` a host, `myhost:8001` both
pub fn parse_address(input: &str) -> AddressParts {
    let input = input.trim();
    let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

    match input.split_once(':') {
        Some((host, port)) => AddressParts {
            host: non_empty(host),
            port: non_empty(port),
        },
        None if input.parse::<u16>().is_ok() => AddressParts {
            host: None,
            port: non_empty(input),
        },
        None => AddressParts {
            host: non_empty(input),
            port: None,
        },
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServeRequest {
    pub project: Option<String>,
    /// `None` reuses the remembered picks
    pub options: Option<Vec<String>>,
    /// `host`, `port` or `host:port`
    pub address: Option<String>,
}

/// Request shared by `build` and `sourcemap`
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub project: Option<String>,
    pub options: Option<Vec<String>>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InitRequest {
    pub name: Option<String>,
    pub template: Option<String>,
    pub options: Option<Vec<String>>,
}

/// Pick the project to operate on: the requested one if it exists, else
/// `default.project.json`, else the first descriptor in the workspace.
pub fn resolve_project(
    ctx: &AppContext,
    requested: Option<&str>,
    places_only: bool,
) -> Result<String> {
    let workspace = ctx.workspace();

    if let Some(project) = requested {
        let path = if Path::new(project).is_absolute() {
            Path::new(project).to_path_buf()
        } else {
            workspace.join(project)
        };

        return if path.is_file() {
            Ok(project.to_string())
        } else {
            Err(Error::no_project(path))
        };
    }

    let projects = find_projects(workspace, places_only)?;
    projects
        .iter()
        .find(|p| p.as_str() == DEFAULT_PROJECT)
        .or_else(|| projects.first())
        .cloned()
        .ok_or_else(|| Error::no_project(workspace))
}

/// Serve a project and register the session
pub async fn serve_project(ctx: &AppContext, request: ServeRequest) -> Result<Session> {
    let project = resolve_project(ctx, request.project.as_deref(), true)?;
    let options = OptionSet::Serve.resolve(ctx.global_state(), request.options.as_deref())?;

    let descriptor = project_address(ctx.workspace(), &project);
    let mut address = AddressParts {
        host: descriptor.host,
        port: descriptor.port,
    };
    if let Some(custom) = request.address.as_deref() {
        address.merge(parse_address(custom));
    }

    start_serve(ctx, project, options, address).await
}

async fn start_serve(
    ctx: &AppContext,
    project: String,
    mut options: Vec<String>,
    address: AddressParts,
) -> Result<Session> {
    let server = &ctx.settings().server;
    let host = address
        .host
        .unwrap_or_else(|| server.default_host.clone());
    let port = address
        .port
        .unwrap_or_else(|| server.default_port.to_string());

    options.extend(["--host".to_string(), host.clone()]);
    options.extend(["--port".to_string(), port.clone()]);

    let name = project_name(ctx.workspace(), &project);
    let (id, url) = ctx.argon().serve(&project, &options).await?;

    // Argon moves to the next free port when the requested one is taken
    let actual_port = address_port(&url).map(|p| p.to_string());
    let (bound_port, original_port) = match actual_port {
        Some(actual) if actual != port => {
            info!("Port {} was taken, {} is serving on {}", port, project, actual);
            (actual, port.parse::<u16>().ok())
        }
        _ => (port, None),
    };

    let session = SessionBuilder::new(name, project, id)
        .kind(SessionKind::Serve)
        .address(format!("{host}:{bound_port}"))
        .original_port(original_port)
        .build();

    ctx.registry().add_session(session.clone());
    Ok(session)
}

/// Build a project. With `--watch` the build keeps running as a session.
pub async fn build_project(ctx: &AppContext, request: BuildRequest) -> Result<Option<Session>> {
    let project = resolve_project(ctx, request.project.as_deref(), false)?;
    let options = OptionSet::Build.resolve(ctx.global_state(), request.options.as_deref())?;
    run_watchable(ctx, SessionKind::Build, project, options, request.output).await
}

/// Generate a sourcemap. With `--watch` it keeps running as a session.
pub async fn sourcemap_project(
    ctx: &AppContext,
    request: BuildRequest,
) -> Result<Option<Session>> {
    let project = resolve_project(ctx, request.project.as_deref(), false)?;
    let options = OptionSet::Sourcemap.resolve(ctx.global_state(), request.options.as_deref())?;
    run_watchable(ctx, SessionKind::Sourcemap, project, options, request.output).await
}

async fn run_watchable(
    ctx: &AppContext,
    kind: SessionKind,
    project: String,
    mut options: Vec<String>,
    output: Option<String>,
) -> Result<Option<Session>> {
    if let Some(output) = output.filter(|o| !o.is_empty()) {
        options.extend(["--output".to_string(), output]);
    }

    let id = match kind {
        SessionKind::Build => ctx.argon().build(&project, &options).await?,
        SessionKind::Sourcemap => ctx.argon().sourcemap(&project, &options).await?,
        SessionKind::Serve => {
            return Err(Error::invalid_command("serve is not a watch operation"));
        }
    };

    let Some(id) = id else {
        return Ok(None);
    };

    let name = project_name(ctx.workspace(), &project);
    let session = SessionBuilder::new(name, project, id).kind(kind).build();
    ctx.registry().add_session(session.clone());
    Ok(Some(session))
}

/// Create a new project from a template. Returns the project file name.
pub async fn init_project(ctx: &AppContext, request: InitRequest) -> Result<String> {
    let mut name = request
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "default".to_string());
    if !name.ends_with(lemonade_core::PROJECT_SUFFIX) {
        name.push_str(lemonade_core::PROJECT_SUFFIX);
    }

    let templates = ctx.argon().templates();
    let template = match request.template {
        Some(template) if templates.is_empty() || templates.contains(&template) => template,
        Some(template) => {
            return Err(Error::invalid_command(format!(
                "unknown template: {} (available: {})",
                template,
                templates.join(", ")
            )));
        }
        None => templates
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
    };

    let picked = OptionSet::Init.resolve(ctx.global_state(), request.options.as_deref())?;
    ctx.argon()
        .init(&name, &template, &render_init_flags(&picked))
        .await?;

    Ok(name)
}

/// Stop the given sessions and drop them from the registry
pub async fn stop_sessions(ctx: &AppContext, ids: &[SessionId]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let result = ctx.argon().stop(ids).await;
    // Stopping is advisory; the registry forgets the sessions either way
    ctx.registry().remove_sessions(ids);
    result
}

/// Stop every tracked session. Returns how many were stopped.
pub async fn stop_all(ctx: &AppContext) -> Result<usize> {
    let ids: Vec<SessionId> = ctx.registry().sessions().iter().map(Session::id).collect();
    stop_sessions(ctx, &ids).await?;
    Ok(ids.len())
}

pub async fn debug(ctx: &AppContext, mode: DebugMode) -> Result<()> {
    ctx.argon().debug(mode).await
}

/// Run a snippet, or a file when `code` names one in the workspace
pub async fn exec(ctx: &AppContext, code: &str) -> Result<()> {
    let file = ctx.workspace().join(code);
    let payload = if !code.contains('\n') && file.is_file() {
        file.to_string_lossy().to_string()
    } else {
        code.to_string()
    };

    ctx.argon()
        .exec(&payload, ctx.settings().behavior.focus_studio)
        .await
}

/// Launch Studio, optionally with a place file. `studio obby` also finds
/// `obby.rbxl` / `obby.rbxlx` in the workspace.
pub async fn open_studio(ctx: &AppContext, place: Option<&str>) -> Result<()> {
    let place = place.map(|p| resolve_place(ctx.workspace(), p)).transpose()?;
    ctx.argon().studio(false, place.as_deref()).await
}

fn resolve_place(workspace: &Path, place: &str) -> Result<String> {
    let path = workspace.join(place);
    if path.is_file() {
        return Ok(path.to_string_lossy().to_string());
    }

    find_places(workspace)?
        .into_iter()
        .find(|p| Path::new(p).file_stem().is_some_and(|stem| stem == place))
        .map(|p| workspace.join(p).to_string_lossy().to_string())
        .ok_or_else(|| Error::no_project(path))
}

pub async fn plugin(ctx: &AppContext, mode: PluginMode) -> Result<()> {
    ctx.argon().plugin(mode).await
}

/// User-requested update (visible output)
pub async fn update(ctx: &AppContext, mode: UpdateMode) -> Result<String> {
    ctx.argon()
        .update(mode, false)
        .await
        .map(|outcome| outcome.message)
}

/// One-step setup: make sure the workspace is a place project, then serve it.
pub async fn start_lemonade(ctx: &AppContext) -> Result<Session> {
    let workspace = ctx.workspace();
    let project_path = workspace.join(DEFAULT_PROJECT);

    if !has_src_structure(workspace) {
        info!("Initializing project structure in {:?}", workspace);
        ctx.argon()
            .init(DEFAULT_PROJECT, DEFAULT_TEMPLATE, &[])
            .await?;

        if !workspace.join("src").is_dir() || !project_path.is_file() {
            return Err(Error::no_project(project_path));
        }
    }

    if !project_path.is_file() {
        return Err(Error::no_project(project_path));
    }

    start_serve(
        ctx,
        DEFAULT_PROJECT.to_string(),
        Vec::new(),
        AddressParts::default(),
    )
    .await
}

/// Re-run a persisted session with the remembered options.
///
/// Serve sessions ask for their original port again when Argon had moved
/// them. Incomplete records are skipped with `Ok(None)`.
pub async fn restore_session(
    ctx: &AppContext,
    session: &RestorableSession,
) -> Result<Option<Session>> {
    let (Some(kind), Some(project)) = (session.kind(), session.project()) else {
        return Ok(None);
    };
    let project = project.to_string();

    match kind {
        SessionKind::Serve => {
            let mut address = session.address().map(parse_address).unwrap_or_default();
            if let Some(port) = session.original_port() {
                address.port = Some(port.to_string());
            }

            let options = OptionSet::Serve.remembered(ctx.global_state());
            start_serve(ctx, project, options, address).await.map(Some)
        }
        SessionKind::Build => {
            let options = OptionSet::Build.remembered(ctx.global_state());
            run_watchable(ctx, kind, project, options, None).await
        }
        SessionKind::Sourcemap => {
            let options = OptionSet::Sourcemap.remembered(ctx.global_state());
            run_watchable(ctx, kind, project, options, None).await
        }
    }
}
