//! End-to-end session lifecycle against a scripted Argon stand-in:
//! serve, persist, shut down, restore in a fresh context, stop.

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;

use lemonade_app::actions::{self, ServeRequest};
use lemonade_app::config::Settings;
use lemonade_app::registry::LAST_SESSIONS_KEY;
use lemonade_app::{
    execute, restore_sessions, AppContext, Command, CommandOutcome, NullNotifier, OutputChannel,
    StateStore,
};
use lemonade_core::{RestorableSession, SessionKind};
use lemonade_daemon::test_utils::scripted_runner;
use lemonade_daemon::Argon;
use tempfile::tempdir;

/// Argon stand-in: serve reports the requested port, except 8000 which is
/// "taken" and moves to 8001. Every invocation is appended to `calls.log`.
const ARGON: &str = r#"echo "$*" >> calls.log
case "$1" in
  serve)
    port=8000
    while [ $# -gt 0 ]; do
      if [ "$1" = "--port" ]; then port=$2; fi
      shift
    done
    if [ "$port" = "8000" ]; then
      echo "WARN: Port 8000 is already in use, retrying on 8001"
      port=8001
    fi
    echo "INFO: Serving on: http://localhost:$port"
    ;;
  build) echo "INFO: Build successful" ;;
  stop) ;;
  *) echo "ERROR: unexpected $1" >&2; exit 1 ;;
esac"#;

fn context(workspace: &Path, global: &Path) -> AppContext {
    let settings = Settings::default();
    let output = Arc::new(OutputChannel::new(
        settings.output.buffer_size,
        settings.notifications.level,
        Arc::new(NullNotifier),
    ));
    let runner = scripted_runner(ARGON, output.clone()).with_working_dir(workspace);

    AppContext::new(
        workspace.to_path_buf(),
        settings,
        Argon::new(runner),
        output,
        Arc::new(StateStore::open(global.join("global.json"))),
        "2.0.0".to_string(),
    )
}

fn calls(workspace: &Path) -> Vec<String> {
    std::fs::read_to_string(workspace.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn place_project(workspace: &Path) {
    std::fs::write(
        workspace.join("default.project.json"),
        r#"{"name":"Obby","tree":{"$className":"DataModel"}}"#,
    )
    .unwrap();
}

#[tokio::test]
async fn test_serve_persist_restore_on_original_port() {
    let workspace = tempdir().unwrap();
    let global = tempdir().unwrap();
    place_project(workspace.path());

    // First run: 8000 is taken, Argon moves to 8001
    let first = context(workspace.path(), global.path());
    let session = actions::serve_project(&first, ServeRequest::default())
        .await
        .unwrap();
    assert_eq!(session.address(), Some("localhost:8001"));
    assert_eq!(session.original_port(), Some(8000));

    first.registry().cleanup(first.argon()).await;
    assert!(calls(workspace.path())
        .iter()
        .any(|c| c == &format!("stop {} -v --yes --color never", session.id())));

    // Shutdown keeps the persisted list for the next start
    let stored = first.workspace_state().get_raw(LAST_SESSIONS_KEY).unwrap();
    let records: Vec<RestorableSession> = stored
        .as_array()
        .unwrap()
        .iter()
        .map(RestorableSession::from_value)
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind(), Some(SessionKind::Serve));
    assert_eq!(records[0].project(), Some("default.project.json"));
    drop(first);

    // Second run restores, asking for the original port again
    let second = context(workspace.path(), global.path());
    let report = restore_sessions(&second).await;

    assert_eq!(report.restored.len(), 1);
    assert!(report.failed.is_empty());
    let restored = &report.restored[0];
    assert_eq!(restored.kind(), SessionKind::Serve);
    assert_eq!(restored.original_port(), Some(8000));
    assert!(calls(workspace.path())
        .iter()
        .filter(|c| c.starts_with("serve "))
        .all(|c| c.contains("--port 8000")));
}

#[tokio::test]
async fn test_command_surface_round_trip() {
    let workspace = tempdir().unwrap();
    let global = tempdir().unwrap();
    place_project(workspace.path());
    let ctx = context(workspace.path(), global.path());

    let serve = Command::parse("serve --address 9000").unwrap().unwrap();
    let CommandOutcome::Message(message) = execute(&ctx, serve).await.unwrap() else {
        panic!("expected message");
    };
    assert!(message.starts_with("Serving Obby on localhost:9000"));

    let build = Command::parse("build --watch").unwrap().unwrap();
    execute(&ctx, build).await.unwrap();
    assert_eq!(ctx.registry().len(), 2);

    let CommandOutcome::Message(sessions) =
        execute(&ctx, Command::parse("sessions").unwrap().unwrap())
            .await
            .unwrap()
    else {
        panic!("expected message");
    };
    assert!(sessions.contains("Type: Serve"));
    assert!(sessions.contains("Type: Build"));

    let outcome = execute(&ctx, Command::parse("stop all").unwrap().unwrap())
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Message("Stopped 2 session(s)".to_string()));
    assert!(ctx.registry().is_empty());
    assert!(ctx.workspace_state().get_raw(LAST_SESSIONS_KEY).is_none());

    assert_eq!(
        execute(&ctx, Command::parse("quit").unwrap().unwrap())
            .await
            .unwrap(),
        CommandOutcome::Quit
    );
}

#[tokio::test]
async fn test_unknown_subcommand_surfaces_stderr() {
    let workspace = tempdir().unwrap();
    let global = tempdir().unwrap();
    let ctx = context(workspace.path(), global.path());

    let err = execute(&ctx, Command::parse("play").unwrap().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "ERROR: unexpected debug");
}
