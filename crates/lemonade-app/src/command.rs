//! Line-oriented command surface
//!
//! Every menu entry and shortcut is reachable as one typed line, e.g.
//! `serve default.project.json --ts --address 8001` or `stop all`.

use lemonade_core::prelude::*;
use lemonade_core::{Session, SessionId};
use lemonade_daemon::{DebugMode, PluginMode, UpdateMode};
use std::path::Path;

use crate::actions::{self, BuildRequest, InitRequest, ServeRequest};
use crate::config::{
    config_completions, config_path, init_config_dir, set_setting, ArgonConfig,
};
use crate::context::AppContext;
use crate::menu::{Menu, HELP_URL};

/// Lines shown by `output`
const OUTPUT_TAIL: usize = 200;

/// A lone `--` passes an explicit empty option list
const NO_OPTIONS: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopTarget {
    All,
    Ids(Vec<SessionId>),
}

/// `settings` subcommand against `.lemonade/config.toml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsCommand {
    Show,
    /// Write the commented default file
    Init,
    /// `section.key value`, applied on the next start
    Set(String, String),
}

/// `config` subcommand against Argon's global config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    List,
    Get(String),
    Set(String, String),
    Unset(String),
    /// Known settings not yet present in the file
    Missing,
}

#[derive(Debug, Clone)]
pub enum Command {
    Menu,
    StartLemonade,
    Serve(ServeRequest),
    Build(BuildRequest),
    Sourcemap(BuildRequest),
    Init(InitRequest),
    Stop(StopTarget),
    Sessions,
    Debug(DebugMode),
    Exec(String),
    Studio(Option<String>),
    Plugin(PluginMode),
    Update(UpdateMode),
    Output,
    Settings(SettingsCommand),
    Config(ConfigCommand),
    Help,
    Quit,
}

/// Result of executing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Message(String),
    Quit,
}

impl Command {
    /// Parse one input line. Empty lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        let Some((word, rest)) = split_word(line) else {
            return Ok(None);
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word.to_lowercase().as_str() {
            "menu" => Command::Menu,
            "start-lemonade" | "start_lemonade" => Command::StartLemonade,
            "serve" => Command::Serve(parse_serve(&args)?),
            "build" => Command::Build(parse_build(&args, "build")?),
            "sourcemap" => Command::Sourcemap(parse_build(&args, "sourcemap")?),
            "init" => Command::Init(parse_init(&args)?),
            "stop" => Command::Stop(parse_stop(&args)?),
            "sessions" | "status" => Command::Sessions,
            "play" => Command::Debug(DebugMode::Play),
            "run" => Command::Debug(DebugMode::Run),
            "start" => Command::Debug(DebugMode::Start),
            "stop-test" => Command::Debug(DebugMode::Stop),
            "debug" => Command::Debug(required(&args, 0, "debug mode")?.parse()?),
            "exec" => {
                if rest.trim().is_empty() {
                    return Err(Error::invalid_command("exec needs code or a file"));
                }
                Command::Exec(rest.trim().to_string())
            }
            "studio" => Command::Studio(args.first().map(|p| p.to_string())),
            "plugin" => Command::Plugin(required(&args, 0, "plugin mode")?.parse()?),
            "update" => Command::Update(match args.first() {
                Some(mode) => mode.parse()?,
                None => UpdateMode::default(),
            }),
            "output" | "log" => Command::Output,
            "settings" => Command::Settings(parse_settings(&args)?),
            "config" => Command::Config(parse_config(&args)?),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => {
                return Err(Error::invalid_command(format!(
                    "unknown command: {other} (try `menu`)"
                )));
            }
        };

        Ok(Some(command))
    }
}

fn split_word(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() {
        return None;
    }
    Some(line.split_once(char::is_whitespace).unwrap_or((line, "")))
}

fn required<'a>(args: &[&'a str], index: usize, what: &str) -> Result<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| Error::invalid_command(format!("missing {what}")))
}

/// Positional arguments, option flags and the value of `value_flag`
struct SplitArgs {
    positional: Vec<String>,
    options: Option<Vec<String>>,
    value: Option<String>,
}

fn split_args(args: &[&str], value_flag: Option<&str>) -> Result<SplitArgs> {
    let mut positional = Vec::new();
    let mut options: Option<Vec<String>> = None;
    let mut value = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if Some(*arg) == value_flag {
            let v = iter.next().ok_or_else(|| {
                Error::invalid_command(format!("{arg} needs a value"))
            })?;
            value = Some(v.to_string());
        } else if *arg == NO_OPTIONS {
            options.get_or_insert_with(Vec::new);
        } else if arg.starts_with("--") {
            options.get_or_insert_with(Vec::new).push(arg.to_string());
        } else {
            positional.push(arg.to_string());
        }
    }

    Ok(SplitArgs {
        positional,
        options,
        value,
    })
}

fn parse_serve(args: &[&str]) -> Result<ServeRequest> {
    let split = split_args(args, Some("--address"))?;
    Ok(ServeRequest {
        project: split.positional.into_iter().next(),
        options: split.options,
        address: split.value,
    })
}

fn parse_build(args: &[&str], subcommand: &str) -> Result<BuildRequest> {
    let split = split_args(args, Some("--output"))?;
    if split.positional.len() > 1 {
        return Err(Error::invalid_command(format!(
            "{subcommand} takes at most one project"
        )));
    }
    Ok(BuildRequest {
        project: split.positional.into_iter().next(),
        options: split.options,
        output: split.value,
    })
}

fn parse_init(args: &[&str]) -> Result<InitRequest> {
    let split = split_args(args, None)?;
    let mut positional = split.positional.into_iter();
    Ok(InitRequest {
        name: positional.next(),
        template: positional.next(),
        options: split.options,
    })
}

fn parse_stop(args: &[&str]) -> Result<StopTarget> {
    if args.is_empty() {
        return Err(Error::invalid_command("usage: stop <id…|all>"));
    }
    if args.iter().any(|a| a.eq_ignore_ascii_case("all")) {
        return Ok(StopTarget::All);
    }

    args.iter()
        .map(|a| {
            a.parse::<SessionId>()
                .map_err(|_| Error::invalid_command(format!("invalid session id: {a}")))
        })
        .collect::<Result<Vec<_>>>()
        .map(StopTarget::Ids)
}

fn parse_settings(args: &[&str]) -> Result<SettingsCommand> {
    match args {
        [] => Ok(SettingsCommand::Show),
        ["init"] => Ok(SettingsCommand::Init),
        [key, value @ ..] if !value.is_empty() => {
            Ok(SettingsCommand::Set(key.to_string(), value.join(" ")))
        }
        _ => Err(Error::invalid_command(
            "usage: settings [init | <section.key> <value>]",
        )),
    }
}

fn parse_config(args: &[&str]) -> Result<ConfigCommand> {
    Ok(match args {
        [] => ConfigCommand::List,
        ["missing"] => ConfigCommand::Missing,
        ["unset", key] => ConfigCommand::Unset(key.to_string()),
        [key] => ConfigCommand::Get(key.to_string()),
        [key, value @ ..] => ConfigCommand::Set(key.to_string(), value.join(" ")),
    })
}

/// Run a parsed command
pub async fn execute(ctx: &AppContext, command: Command) -> Result<CommandOutcome> {
    let message = match command {
        Command::Menu => Menu::new(ctx.version()).to_string(),
        Command::StartLemonade => serving(&actions::start_lemonade(ctx).await?),
        Command::Serve(request) => serving(&actions::serve_project(ctx, request).await?),
        Command::Build(request) => match actions::build_project(ctx, request).await? {
            Some(session) => watching(&session),
            None => "Build finished".to_string(),
        },
        Command::Sourcemap(request) => match actions::sourcemap_project(ctx, request).await? {
            Some(session) => watching(&session),
            None => "Sourcemap generated".to_string(),
        },
        Command::Init(request) => {
            let project = actions::init_project(ctx, request).await?;
            format!("Initialized {project}")
        }
        Command::Stop(StopTarget::All) => {
            let stopped = actions::stop_all(ctx).await?;
            format!("Stopped {stopped} session(s)")
        }
        Command::Stop(StopTarget::Ids(ids)) => {
            actions::stop_sessions(ctx, &ids).await?;
            let ids: Vec<String> = ids.iter().map(SessionId::to_string).collect();
            format!("Stopped session(s) {}", ids.join(", "))
        }
        Command::Sessions => ctx.registry().status().tooltip,
        Command::Debug(mode) => {
            actions::debug(ctx, mode).await?;
            format!("Debug: {mode}")
        }
        Command::Exec(code) => {
            actions::exec(ctx, &code).await?;
            "Executed in Studio".to_string()
        }
        Command::Studio(place) => {
            actions::open_studio(ctx, place.as_deref()).await?;
            "Launching Roblox Studio".to_string()
        }
        Command::Plugin(mode) => {
            actions::plugin(ctx, mode).await?;
            format!("Plugin {mode} finished")
        }
        Command::Update(mode) => actions::update(ctx, mode).await?,
        Command::Output => render_output(ctx),
        Command::Settings(SettingsCommand::Show) => render_settings(ctx)?,
        Command::Settings(SettingsCommand::Init) => {
            let path = init_config_dir(ctx.workspace())?;
            format!("Settings file: {}", path.display())
        }
        Command::Settings(SettingsCommand::Set(key, value)) => {
            set_setting(ctx.workspace(), &key, &value)?;
            format!("Saved {key}; restart Lemonade to apply it")
        }
        Command::Config(config) => {
            let path = ArgonConfig::default_path()
                .ok_or_else(|| Error::config("cannot locate the Argon home directory"))?;
            run_config(&path, config)?
        }
        Command::Help => format!("Documentation: {HELP_URL}\n\n{}", Menu::new(ctx.version())),
        Command::Quit => return Ok(CommandOutcome::Quit),
    };

    Ok(CommandOutcome::Message(message))
}

fn serving(session: &Session) -> String {
    format!(
        "Serving {} on {} (session {})",
        session.name(),
        session.address().unwrap_or("unknown address"),
        session.id()
    )
}

fn watching(session: &Session) -> String {
    format!(
        "Watching {} for {} (session {})",
        session.name(),
        session.kind(),
        session.id()
    )
}

fn render_output(ctx: &AppContext) -> String {
    let lines = ctx.output().tail(OUTPUT_TAIL);
    if lines.is_empty() {
        return "No output yet".to_string();
    }
    lines
        .iter()
        .map(|line| line.render())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_settings(ctx: &AppContext) -> Result<String> {
    let content = toml::to_string_pretty(ctx.settings())?;
    Ok(format!(
        "# {}\n# logs: {}\n{}",
        config_path(ctx.workspace()).display(),
        lemonade_core::logging::log_directory().display(),
        content
    ))
}

/// Apply a `config` subcommand to the Argon config at `path`
pub fn run_config(path: &Path, command: ConfigCommand) -> Result<String> {
    let mut config = ArgonConfig::load(path)?;

    Ok(match command {
        ConfigCommand::List => {
            if config.values().is_empty() {
                format!("{} is empty", path.display())
            } else {
                toml::to_string(config.values())?
            }
        }
        ConfigCommand::Get(key) => match config.get(&key) {
            Some(value) => format!("{key} = {value}"),
            None => format!("{key} is not set"),
        },
        ConfigCommand::Set(key, value) => {
            config.set(&key, &value);
            config.save()?;
            format!("{key} = {}", config.get(&key).map(ToString::to_string).unwrap_or_default())
        }
        ConfigCommand::Unset(key) => {
            if config.remove(&key).is_some() {
                config.save()?;
                format!("Removed {key}")
            } else {
                format!("{key} is not set")
            }
        }
        ConfigCommand::Missing => {
            let document = std::fs::read_to_string(path).unwrap_or_default();
            config_completions(&document)
                .iter()
                .map(|s| format!("{:<48} # {}", s.insert_text(), s.doc))
                .collect::<Vec<_>>()
                .join("\n")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::scripted_context;
    use tempfile::tempdir;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_empty_line() {
        assert!(Command::parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = Command::parse("deploy").unwrap_err();
        assert!(matches!(err, Error::InvalidCommand { .. }));
    }

    #[test]
    fn test_parse_serve() {
        let Command::Serve(request) = parse("serve game.project.json --ts --address 8001") else {
            panic!("expected serve");
        };
        assert_eq!(request.project.as_deref(), Some("game.project.json"));
        assert_eq!(request.options, Some(vec!["--ts".to_string()]));
        assert_eq!(request.address.as_deref(), Some("8001"));

        let Command::Serve(request) = parse("serve") else {
            panic!("expected serve");
        };
        assert!(request.project.is_none());
        assert!(request.options.is_none());
    }

    #[test]
    fn test_parse_explicit_no_options() {
        let Command::Build(request) = parse("build -- --output out.rbxl") else {
            panic!("expected build");
        };
        assert_eq!(request.options, Some(vec![]));
        assert_eq!(request.output.as_deref(), Some("out.rbxl"));
    }

    #[test]
    fn test_parse_missing_flag_value() {
        assert!(Command::parse("serve --address").is_err());
        assert!(Command::parse("sourcemap a b").is_err());
    }

    #[test]
    fn test_parse_init() {
        let Command::Init(request) = parse("init game plugin --git") else {
            panic!("expected init");
        };
        assert_eq!(request.name.as_deref(), Some("game"));
        assert_eq!(request.template.as_deref(), Some("plugin"));
        assert_eq!(request.options, Some(vec!["--git".to_string()]));
    }

    #[test]
    fn test_parse_stop() {
        assert!(Command::parse("stop").is_err());
        assert!(matches!(parse("stop all"), Command::Stop(StopTarget::All)));
        let Command::Stop(StopTarget::Ids(ids)) = parse("stop 12 13") else {
            panic!("expected ids");
        };
        assert_eq!(ids, vec![SessionId(12), SessionId(13)]);
        assert!(Command::parse("stop twelve").is_err());
    }

    #[test]
    fn test_parse_shortcuts() {
        assert!(matches!(parse("play"), Command::Debug(DebugMode::Play)));
        assert!(matches!(parse("stop-test"), Command::Debug(DebugMode::Stop)));
        assert!(matches!(parse("debug RUN"), Command::Debug(DebugMode::Run)));
        assert!(matches!(parse("plugin install"), Command::Plugin(PluginMode::Install)));
        assert!(matches!(parse("update"), Command::Update(UpdateMode::All)));
        assert!(matches!(parse("update cli"), Command::Update(UpdateMode::Cli)));
        assert!(matches!(parse("quit"), Command::Quit));
        assert!(Command::parse("plugin").is_err());
        assert!(Command::parse("update everything").is_err());
    }

    #[test]
    fn test_parse_exec_keeps_code() {
        let Command::Exec(code) = parse("exec print(\"hello world\")") else {
            panic!("expected exec");
        };
        assert_eq!(code, "print(\"hello world\")");
        assert!(Command::parse("exec").is_err());
    }

    #[test]
    fn test_parse_config() {
        assert!(matches!(parse("config"), Command::Config(ConfigCommand::List)));
        assert!(matches!(
            parse("config missing"),
            Command::Config(ConfigCommand::Missing)
        ));
        assert!(matches!(
            parse("config port 8001"),
            Command::Config(ConfigCommand::Set(k, v)) if k == "port" && v == "8001"
        ));
    }

    #[test]
    fn test_run_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");

        assert!(run_config(&path, ConfigCommand::List).unwrap().ends_with("is empty"));
        assert_eq!(
            run_config(&path, ConfigCommand::Set("port".into(), "8001".into())).unwrap(),
            "port = 8001"
        );
        assert_eq!(
            run_config(&path, ConfigCommand::Get("port".into())).unwrap(),
            "port = 8001"
        );

        let missing = run_config(&path, ConfigCommand::Missing).unwrap();
        assert!(missing.contains("host"));
        assert!(!missing.lines().any(|l| l.starts_with("port ")));

        assert_eq!(
            run_config(&path, ConfigCommand::Unset("port".into())).unwrap(),
            "Removed port"
        );
    }

    #[tokio::test]
    async fn test_execute_sessions_and_quit() {
        let temp = tempdir().unwrap();
        let ctx = scripted_context(temp.path(), "exit 0");

        assert_eq!(
            execute(&ctx, Command::Sessions).await.unwrap(),
            CommandOutcome::Message("No running sessions".to_string())
        );
        assert_eq!(execute(&ctx, Command::Quit).await.unwrap(), CommandOutcome::Quit);
    }

    #[tokio::test]
    async fn test_execute_stop_all_without_sessions() {
        let temp = tempdir().unwrap();
        let ctx = scripted_context(temp.path(), "exit 1");

        assert_eq!(
            execute(&ctx, parse("stop all")).await.unwrap(),
            CommandOutcome::Message("Stopped 0 session(s)".to_string())
        );
    }

    #[tokio::test]
    async fn test_execute_settings() {
        let temp = tempdir().unwrap();
        let ctx = scripted_context(temp.path(), "exit 0");

        let CommandOutcome::Message(text) = execute(&ctx, parse("settings")).await.unwrap() else {
            panic!("expected message");
        };
        assert!(text.contains("[server]"));
        assert!(text.contains("default_port = 8000"));
    }

    #[tokio::test]
    async fn test_execute_debug_failure_propagates() {
        let temp = tempdir().unwrap();
        let ctx = scripted_context(temp.path(), r#"echo "ERROR: Studio is not running" >&2; exit 1"#);

        let err = execute(&ctx, parse("play")).await.unwrap_err();
        assert_eq!(err.to_string(), "ERROR: Studio is not running");
    }

    #[test]
    fn test_parse_settings() {
        assert!(matches!(parse("settings"), Command::Settings(SettingsCommand::Show)));
        assert!(matches!(parse("settings init"), Command::Settings(SettingsCommand::Init)));
        assert!(matches!(
            parse("settings server.default_port 9000"),
            Command::Settings(SettingsCommand::Set(k, v)) if k == "server.default_port" && v == "9000"
        ));
        assert!(Command::parse("settings server.default_port").is_err());
    }

    #[tokio::test]
    async fn test_execute_settings_set() {
        let temp = tempdir().unwrap();
        let ctx = scripted_context(temp.path(), "exit 0");

        execute(&ctx, parse("settings behavior.auto_run false"))
            .await
            .unwrap();
        assert!(!crate::config::load_settings(temp.path()).behavior.auto_run);
        // The running context keeps its settings
        assert!(ctx.settings().behavior.auto_run);
    }
}
