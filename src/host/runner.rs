//! Host event loop

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use lemonade_app::config::ArgonConfig;
use lemonade_app::{execute, restore_sessions, AppContext, Command, CommandOutcome, StatusView};
use lemonade_core::prelude::{Result, ResultExt};
use lemonade_daemon::UpdateMode;

use super::{status_line, HostOptions, TerminalNotifier};

/// Run Lemonade for `workspace` until `quit`, EOF or Ctrl-C
pub async fn run(workspace: &Path, options: HostOptions) -> Result<()> {
    let _log_guard = lemonade_core::logging::init().context("Failed to initialize logging")?;

    info!("Workspace: {}", workspace.display());

    let ctx = match AppContext::bootstrap(workspace, Arc::new(TerminalNotifier)) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            error!("Startup failed: {}", e);
            eprintln!("Lemonade: {e}");
            if e.is_fatal() {
                eprintln!("Lemonade needs Argon and an existing workspace folder to run.");
            }
            return Err(e);
        }
    };

    println!("Lemonade running with Argon {}", ctx.version());
    schedule_update(&ctx);

    let status_task = spawn_status_printer(&ctx);

    let mut tasks = JoinSet::new();
    if options.restore && ctx.settings().behavior.auto_run {
        tasks.spawn(restore_in_background(ctx.clone()));
    }

    load_argon_config();

    println!("Type `menu` for the list of commands, `quit` to exit.");
    let result = command_loop(&ctx, &mut tasks).await;

    tasks.abort_all();
    ctx.registry().cleanup(ctx.argon()).await;
    status_task.abort();

    info!("Lemonade exiting");
    result
}

/// Silent `argon update all` in the background
fn schedule_update(ctx: &Arc<AppContext>) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        match ctx.argon().update(UpdateMode::All, true).await {
            Ok(outcome) => debug!("Automatic update: {}", outcome.message),
            Err(e) => warn!("Automatic update failed: {}", e),
        }
    });
}

fn spawn_status_printer(ctx: &Arc<AppContext>) -> tokio::task::JoinHandle<()> {
    let mut rx = ctx.registry().subscribe();
    println!("{}", status_line(&ctx.registry().status()));

    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let view = StatusView::render(&rx.borrow_and_update());
            println!("{}", status_line(&view));
        }
    })
}

fn load_argon_config() {
    let Some(path) = ArgonConfig::default_path() else {
        return;
    };

    match ArgonConfig::load(&path) {
        Ok(config) => debug!(
            "Argon config at {}: {} setting(s)",
            config.path().display(),
            config.values().len()
        ),
        Err(e) => warn!("Failed to read Argon config: {}", e),
    }
}

async fn restore_in_background(ctx: Arc<AppContext>) {
    let report = restore_sessions(&ctx).await;
    if !report.is_empty() {
        println!("{}", report.summary());
    }
    for (record, e) in &report.failed {
        eprintln!(
            "Lemonade: failed to restore {}: {}",
            record.project().unwrap_or("session"),
            e
        );
    }
}

/// Reads commands until `quit`, EOF or Ctrl-C. Commands run as background
/// tasks, so a session waiting for readiness never blocks the next line.
async fn command_loop(ctx: &Arc<AppContext>, tasks: &mut JoinSet<()>) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::channel::<String>(32);
    std::thread::spawn(move || read_stdin_blocking(line_tx));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else {
                    info!("Stdin closed");
                    break;
                };
                if !dispatch(ctx, &line, tasks) {
                    break;
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!("Command task panicked: {}", e);
                    }
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    Ok(())
}

/// Parse one line and start it on `tasks`. Returns `false` when the host
/// should quit.
fn dispatch(ctx: &Arc<AppContext>, line: &str, tasks: &mut JoinSet<()>) -> bool {
    let command = match Command::parse(line) {
        Ok(Some(Command::Quit)) => return false,
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(e) => {
            eprintln!("Lemonade: {e}");
            return true;
        }
    };

    debug!("Command: {:?}", command);
    let ctx = ctx.clone();
    tasks.spawn(async move { report(execute(&ctx, command).await) });
    true
}

fn report(outcome: Result<CommandOutcome>) {
    match outcome {
        Ok(CommandOutcome::Message(message)) => println!("{message}"),
        Ok(CommandOutcome::Quit) => {}
        Err(e) => {
            if e.is_recoverable() {
                warn!("Command failed: {}", e);
            } else {
                error!("Command failed: {:?}", e);
            }
            eprintln!("Lemonade: {e}");
        }
    }
}

fn read_stdin_blocking(line_tx: mpsc::Sender<String>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    debug!("Stdin reader exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use lemonade_app::config::Settings;
    use lemonade_app::{NullNotifier, OutputChannel, StateStore};
    use lemonade_daemon::test_utils::scripted_runner;
    use lemonade_daemon::Argon;
    use tempfile::tempdir;

    /// `serve` never reports readiness; `build` finishes at once
    const ARGON: &str = r#"case "$1" in
  serve) sleep 5 ;;
  build) echo "INFO: Build successful" ;;
esac"#;

    fn context(workspace: &Path) -> Arc<AppContext> {
        let settings = Settings::default();
        let output = Arc::new(OutputChannel::new(
            settings.output.buffer_size,
            settings.notifications.level,
            Arc::new(NullNotifier),
        ));
        let runner = scripted_runner(ARGON, output.clone()).with_working_dir(workspace);

        Arc::new(AppContext::new(
            workspace.to_path_buf(),
            settings,
            Argon::new(runner),
            output,
            Arc::new(StateStore::open(workspace.join("global.json"))),
            "2.0.0".to_string(),
        ))
    }

    #[tokio::test]
    async fn test_dispatch_quit_and_unparsed_lines() {
        let temp = tempdir().unwrap();
        let ctx = context(temp.path());
        let mut tasks = JoinSet::new();

        assert!(dispatch(&ctx, "   ", &mut tasks));
        assert!(dispatch(&ctx, "frobnicate", &mut tasks));
        assert!(!dispatch(&ctx, "quit", &mut tasks));
        assert!(tasks.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pending_serve_does_not_block_next_command() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join("default.project.json"),
            r#"{"name":"Obby","tree":{"$className":"DataModel"}}"#,
        )
        .unwrap();
        let ctx = context(temp.path());
        let mut tasks = JoinSet::new();

        assert!(dispatch(&ctx, "serve", &mut tasks));
        assert!(dispatch(&ctx, "build", &mut tasks));

        let joined = tokio::time::timeout(Duration::from_secs(3), tasks.join_next())
            .await
            .expect("build should finish while serve is still waiting");
        assert!(matches!(joined, Some(Ok(()))));
        assert_eq!(tasks.len(), 1);
        assert!(ctx.output().lines().iter().any(|l| l.text == "INFO: Build successful"));

        tasks.abort_all();
    }
}
