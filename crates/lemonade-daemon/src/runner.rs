//! Argon process runner
//!
//! Spawns the Argon CLI, relays its output to an [`OutputSink`] and produces
//! exactly one [`RunOutcome`] (or error) per invocation.
//!
//! Each spawn gets three background tasks feeding one ordered event channel:
//! a stdout reader, a stderr reader and a wait task that owns the `Child`.
//! A supervisor task consumes the channel, classifies lines, watches for the
//! completion pattern and settles the caller's future through a
//! [`SettleOnce`]. The supervisor only acts on the exit event once both pipes
//! reached EOF, so a readiness line printed before the process closed always
//! wins over the close.
//!
//! After settlement the supervisor keeps draining output into the sink, which
//! keeps long-lived processes such as `argon serve` from blocking on a full pipe.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};

use lemonade_core::prelude::*;
use lemonade_core::{classify_line, LineSeverity, ProcessEvent, StreamKind};

use crate::sink::OutputSink;

/// Capacity of the per-process event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Suppress notifications for informational lines
    pub silent: bool,

    /// Settle as soon as a line matches, without waiting for exit
    pub resolve_on: Option<Regex>,
}

impl RunOptions {
    pub fn visible() -> Self {
        Self::default()
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            resolve_on: None,
        }
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn resolve_on(mut self, pattern: Regex) -> Self {
        self.resolve_on = Some(pattern);
        self
    }
}

/// Successful result of one Argon invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Matched line, or first meaningful output on exit
    pub message: String,

    /// `None` when settled by the completion pattern while still running
    pub exit_code: Option<i32>,
}

impl RunOutcome {
    /// Whether the call settled on the completion pattern
    pub fn is_ready(&self) -> bool {
        self.exit_code.is_none()
    }
}

/// Spawns Argon subcommands with the common trailing flags
#[derive(Clone)]
pub struct ArgonRunner {
    program: PathBuf,
    /// Arguments placed before the subcommand (wrapper programs)
    leading_args: Vec<String>,
    working_dir: Option<PathBuf>,
    verbose: bool,
    sink: Arc<dyn OutputSink>,
}

impl std::fmt::Debug for ArgonRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgonRunner")
            .field("program", &self.program)
            .field("leading_args", &self.leading_args)
            .field("working_dir", &self.working_dir)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl ArgonRunner {
    pub fn new(program: impl Into<PathBuf>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            working_dir: None,
            verbose: false,
            sink,
        }
    }

    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// `-vvvv` and `RUST_LOG=trace` instead of `-v` and `RUST_LOG=info`
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn sink(&self) -> &Arc<dyn OutputSink> {
        &self.sink
    }

    /// Full argument vector: leading args, subcommand args, common flags
    pub fn command_args(&self, args: &[String]) -> Vec<String> {
        let verbosity = if self.verbose { "-vvvv" } else { "-v" };

        self.leading_args
            .iter()
            .cloned()
            .chain(args.iter().cloned())
            .chain(
                [verbosity, "--yes", "--color", "never"]
                    .into_iter()
                    .map(String::from),
            )
            .collect()
    }

    /// Spawn `argon <args>` and wait for the first settlement.
    ///
    /// Resolves with `exit_code == None` when `options.resolve_on` matched,
    /// `Some(0)` on a clean exit. Any other exit becomes
    /// [`Error::ProcessFailed`] carrying aggregated stderr (or the first
    /// meaningful line) and the exit code.
    pub async fn run(&self, args: Vec<String>, options: RunOptions) -> Result<RunOutcome> {
        let command_line = format!("argon {}", args.join(" "));
        self.sink.info(&format!("Spawning: {command_line}"), true);

        let mut child = self.spawn_child(&args).inspect_err(|e| {
            self.sink
                .error(&format!("Failed to spawn process: {e}"), false);
        })?;

        let pid = child.id();
        debug!("{} started with PID {:?}", command_line, pid);

        let (event_tx, event_rx) = mpsc::channel::<ProcessEvent>(EVENT_CHANNEL_CAPACITY);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::process_spawn("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::process_spawn("stderr was not captured"))?;

        tokio::spawn(read_lines(stdout, StreamKind::Stdout, event_tx.clone()));
        tokio::spawn(read_lines(stderr, StreamKind::Stderr, event_tx.clone()));
        tokio::spawn(wait_for_exit(child, event_tx));

        let (settle_tx, settle_rx) = oneshot::channel();
        let supervisor = Supervisor::new(
            Arc::clone(&self.sink),
            options,
            SettleOnce::new(settle_tx),
        );
        tokio::spawn(supervisor.run(event_rx));

        let settlement = settle_rx.await.map_err(|_| Error::ChannelClosed)?;
        let result = settlement.into_result();

        match &result {
            Ok(outcome) => self.sink.info(
                &format!(
                    "Command \"{}\" finished. Exit Code: {}. Output: {}",
                    command_line,
                    outcome
                        .exit_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "N/A (Pattern Resolved)".to_string()),
                    outcome.message
                ),
                true,
            ),
            Err(e) => self.sink.info(
                &format!(
                    "Command \"{}\" failed. Exit Code: {:?}. Error: {}",
                    command_line,
                    e.exit_code(),
                    e
                ),
                true,
            ),
        }

        result
    }

    fn spawn_child(&self, args: &[String]) -> Result<Child> {
        let full_args = self.command_args(args);
        info!("Spawning: {} {}", self.program.display(), full_args.join(" "));

        let mut command = Command::new(&self.program);
        command
            .args(&full_args)
            .env("RUST_LOG", if self.verbose { "trace" } else { "info" })
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Sessions outlive the call; `argon stop` ends them
            .kill_on_drop(false);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ArgonNotFound
            } else {
                Error::process_spawn(e.to_string())
            }
        })
    }
}

/// Read lines from one pipe until EOF, then report the close.
///
/// Invalid UTF-8 is replaced rather than treated as an error so the pipe
/// keeps draining for the whole life of the process.
async fn read_lines<R>(reader: R, stream: StreamKind, tx: mpsc::Sender<ProcessEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = decode_line(&buf);
                trace!("{}: {}", stream.label(), line);
                if tx.send(ProcessEvent::Line { stream, line }).await.is_err() {
                    debug!("{} channel closed", stream.label());
                    return;
                }
            }
            Err(e) => {
                debug!("{} read failed: {}", stream.label(), e);
                break;
            }
        }
    }

    let _ = tx.send(ProcessEvent::Closed(stream)).await;
}

/// Strip the line terminator and decode lossily
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Owns the child, waits for it and emits exactly one terminal event.
async fn wait_for_exit(mut child: Child, tx: mpsc::Sender<ProcessEvent>) {
    let event = match child.wait().await {
        Ok(status) => {
            debug!("Argon process exited with status: {:?}", status);
            ProcessEvent::Exited {
                code: status.code(),
            }
        }
        Err(e) => {
            error!("Error waiting for Argon process: {}", e);
            ProcessEvent::WaitFailed(e.to_string())
        }
    };

    let _ = tx.send(event).await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Settlement
// ─────────────────────────────────────────────────────────────────────────────

/// Terminal state of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Settlement {
    /// The completion pattern matched this line
    Ready(String),

    /// The process closed (or could not be waited on)
    Closed {
        code: Option<i32>,
        first_output: Option<String>,
        stderr: String,
    },
}

impl Settlement {
    pub(crate) fn into_result(self) -> Result<RunOutcome> {
        match self {
            Settlement::Ready(line) => Ok(RunOutcome {
                message: line,
                exit_code: None,
            }),
            Settlement::Closed {
                code: Some(0),
                first_output,
                stderr,
            } => {
                let message = first_output
                    .filter(|m| !m.is_empty())
                    .or_else(|| non_empty(stderr.trim()))
                    .unwrap_or_else(|| "Process finished (code 0).".to_string());
                Ok(RunOutcome {
                    message,
                    exit_code: Some(0),
                })
            }
            Settlement::Closed {
                code,
                first_output,
                stderr,
            } => {
                let message = non_empty(stderr.trim())
                    .or_else(|| first_output.filter(|m| !m.is_empty()))
                    .unwrap_or_else(|| match code {
                        Some(code) => format!("Command failed with exit code {code}"),
                        None => "Command terminated without an exit code".to_string(),
                    });
                Err(Error::process_failed(message, code))
            }
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Single-use completion handle. The first `settle` delivers its value; every
/// later call is ignored and reports `false`.
pub(crate) struct SettleOnce<T> {
    tx: Option<oneshot::Sender<T>>,
}

impl<T> SettleOnce<T> {
    pub(crate) fn new(tx: oneshot::Sender<T>) -> Self {
        Self { tx: Some(tx) }
    }

    pub(crate) fn settle(&mut self, value: T) -> bool {
        match self.tx.take() {
            Some(tx) => {
                // The caller may have given up waiting; the result is still final
                let _ = tx.send(value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.tx.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Supervisor
// ─────────────────────────────────────────────────────────────────────────────

/// Consumes the event stream of one process
pub(crate) struct Supervisor {
    sink: Arc<dyn OutputSink>,
    silent: bool,
    pattern: Option<Regex>,
    first_output: Option<String>,
    stderr: String,
    open_streams: u8,
    exit: Option<Option<i32>>,
    settle: SettleOnce<Settlement>,
}

impl Supervisor {
    pub(crate) fn new(
        sink: Arc<dyn OutputSink>,
        options: RunOptions,
        settle: SettleOnce<Settlement>,
    ) -> Self {
        Self {
            sink,
            silent: options.silent,
            pattern: options.resolve_on,
            first_output: None,
            stderr: String::new(),
            open_streams: 2,
            exit: None,
            settle,
        }
    }

    pub(crate) async fn run(mut self, mut rx: mpsc::Receiver<ProcessEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(event);
        }

        // Every producer is gone; settle with whatever we know
        if !self.settle.is_settled() {
            let code = self.exit.flatten();
            self.close(code);
        }
    }

    pub(crate) fn handle(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Line { stream, line } => self.on_line(stream, line),
            ProcessEvent::Closed(stream) => {
                trace!("{} closed", stream.label());
                self.open_streams = self.open_streams.saturating_sub(1);
            }
            ProcessEvent::Exited { code } => {
                self.sink.info(
                    &format!(
                        "Process exited with code: {}",
                        code.map(|c| c.to_string())
                            .unwrap_or_else(|| "none".to_string())
                    ),
                    true,
                );
                self.exit = Some(code);
            }
            ProcessEvent::WaitFailed(reason) => {
                self.sink.error(&format!("Spawn error: {reason}"), true);
                self.exit = Some(None);
            }
        }

        if self.open_streams == 0 {
            if let Some(code) = self.exit {
                self.close(code);
            }
        }
    }

    fn on_line(&mut self, stream: StreamKind, line: String) {
        let settled = self.settle.is_settled();
        if stream == StreamKind::Stderr && !settled {
            self.stderr.push_str(&line);
            self.stderr.push('\n');
        }

        let classified = classify_line(&line);
        match classified.severity {
            LineSeverity::Error => self.sink.error(&line, classified.verbose),
            LineSeverity::Warning => self.sink.warn(&line, classified.verbose),
            LineSeverity::Info => self.sink.info(&line, classified.verbose || self.silent),
        }

        // Nothing reads these after settlement
        if settled {
            return;
        }

        if !classified.verbose && self.first_output.is_none() {
            self.first_output = Some(line.clone());
        }

        let matched = self
            .pattern
            .as_ref()
            .map(|pattern| pattern.is_match(&line))
            .unwrap_or(false);

        if matched {
            debug!("Completion pattern matched on {}: {}", stream.label(), line);
            self.settle.settle(Settlement::Ready(line));
        }
    }

    fn close(&mut self, code: Option<i32>) {
        let settlement = Settlement::Closed {
            code,
            first_output: self.first_output.clone(),
            stderr: self.stderr.clone(),
        };

        if self.settle.settle(settlement) {
            debug!("Process settled on close with code {:?}", code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{scripted_runner, RecordingSink};
    use std::time::Duration;

    fn supervisor(
        pattern: Option<&str>,
    ) -> (Supervisor, oneshot::Receiver<Settlement>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let (tx, rx) = oneshot::channel();
        let mut options = RunOptions::visible();
        if let Some(p) = pattern {
            options = options.resolve_on(Regex::new(p).unwrap());
        }
        let sup = Supervisor::new(sink.clone(), options, SettleOnce::new(tx));
        (sup, rx, sink)
    }

    // ─────────────────────────────────────────────────────────
    // SettleOnce
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_settle_once_only_first_value_wins() {
        let (tx, mut rx) = oneshot::channel();
        let mut settle = SettleOnce::new(tx);

        assert!(!settle.is_settled());
        assert!(settle.settle(1));
        assert!(settle.is_settled());
        assert!(!settle.settle(2));
        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[test]
    fn test_settle_once_tolerates_dropped_receiver() {
        let (tx, rx) = oneshot::channel::<u8>();
        drop(rx);
        let mut settle = SettleOnce::new(tx);
        assert!(settle.settle(7));
        assert!(!settle.settle(8));
    }

    // ─────────────────────────────────────────────────────────
    // Supervisor (event-level, no process)
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_pattern_match_settles_ready() {
        let (mut sup, mut rx, _) = supervisor(Some(r"Serving on: (http://[^\s,]+)"));

        sup.handle(ProcessEvent::stdout("INFO: Starting server"));
        assert!(rx.try_recv().is_err());

        sup.handle(ProcessEvent::stdout("Serving on: http://localhost:8000"));
        assert_eq!(
            rx.try_recv().unwrap(),
            Settlement::Ready("Serving on: http://localhost:8000".to_string())
        );
    }

    #[test]
    fn test_close_after_match_does_not_resettle() {
        let (mut sup, mut rx, sink) = supervisor(Some("Build successful"));

        sup.handle(ProcessEvent::stdout("INFO: Build successful"));
        sup.handle(ProcessEvent::stderr("ERROR: watcher crashed"));
        sup.handle(ProcessEvent::Closed(StreamKind::Stdout));
        sup.handle(ProcessEvent::Closed(StreamKind::Stderr));
        sup.handle(ProcessEvent::Exited { code: Some(1) });

        assert_eq!(
            rx.try_recv().unwrap(),
            Settlement::Ready("INFO: Build successful".to_string())
        );
        // Output after settlement is still relayed
        assert!(sink.contains(LineSeverity::Error, "ERROR: watcher crashed"));
    }

    #[test]
    fn test_exit_waits_for_streams_to_close() {
        let (mut sup, mut rx, _) = supervisor(Some("Serving on"));

        // Exit delivered before the last stdout line: the line must still win
        sup.handle(ProcessEvent::Exited { code: Some(0) });
        assert!(rx.try_recv().is_err());

        sup.handle(ProcessEvent::stdout("Serving on: http://localhost:8000"));
        sup.handle(ProcessEvent::Closed(StreamKind::Stdout));
        sup.handle(ProcessEvent::Closed(StreamKind::Stderr));

        assert!(matches!(rx.try_recv().unwrap(), Settlement::Ready(_)));
    }

    #[test]
    fn test_settled_supervisor_stops_buffering() {
        let (mut sup, mut rx, sink) = supervisor(Some("Serving on"));

        sup.handle(ProcessEvent::stderr("WARN: port 8000 busy"));
        sup.handle(ProcessEvent::stdout("Serving on: http://localhost:8001"));
        assert!(matches!(rx.try_recv().unwrap(), Settlement::Ready(_)));

        for i in 0..1000 {
            sup.handle(ProcessEvent::stderr(format!("ERROR: request {i} failed")));
        }

        assert_eq!(sup.stderr, "WARN: port 8000 busy\n");
        assert_eq!(sup.first_output.as_deref(), Some("WARN: port 8000 busy"));
        assert!(sink.contains(LineSeverity::Error, "ERROR: request 999 failed"));
    }

    #[test]
    fn test_decode_line_replaces_invalid_utf8() {
        assert_eq!(decode_line(b"INFO: caf\xe9\r\n"), "INFO: caf\u{FFFD}");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"\n"), "");
    }

    #[test]
    fn test_close_without_pattern_reports_first_meaningful_line() {
        let (mut sup, mut rx, _) = supervisor(None);

        sup.handle(ProcessEvent::stdout("Compiling [argon::build]"));
        sup.handle(ProcessEvent::stdout("INFO: Successfully built project"));
        sup.handle(ProcessEvent::stdout("INFO: Second line"));
        sup.handle(ProcessEvent::Closed(StreamKind::Stdout));
        sup.handle(ProcessEvent::Closed(StreamKind::Stderr));
        sup.handle(ProcessEvent::Exited { code: Some(0) });

        let outcome = rx.try_recv().unwrap().into_result().unwrap();
        assert_eq!(outcome.message, "INFO: Successfully built project");
        assert_eq!(outcome.exit_code, Some(0));
        assert!(!outcome.is_ready());
    }

    #[test]
    fn test_wait_failure_settles_with_no_code() {
        let (mut sup, mut rx, _) = supervisor(None);

        sup.handle(ProcessEvent::Closed(StreamKind::Stdout));
        sup.handle(ProcessEvent::Closed(StreamKind::Stderr));
        sup.handle(ProcessEvent::WaitFailed("no child".into()));

        let err = rx.try_recv().unwrap().into_result().unwrap_err();
        assert_eq!(err.exit_code(), None);
        assert!(matches!(err, Error::ProcessFailed { .. }));
    }

    #[test]
    fn test_silent_marks_info_verbose() {
        let sink = Arc::new(RecordingSink::default());
        let (tx, _rx) = oneshot::channel();
        let mut sup = Supervisor::new(sink.clone(), RunOptions::silent(), SettleOnce::new(tx));

        sup.handle(ProcessEvent::stdout("INFO: Stopped session"));
        sup.handle(ProcessEvent::stdout("WARN: Session not found"));

        let lines = sink.lines();
        assert_eq!(lines[0], (LineSeverity::Info, "INFO: Stopped session".into(), true));
        assert_eq!(lines[1], (LineSeverity::Warning, "WARN: Session not found".into(), false));
    }

    // ─────────────────────────────────────────────────────────
    // Settlement -> Result
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_failure_prefers_stderr() {
        let settlement = Settlement::Closed {
            code: Some(1),
            first_output: Some("ERROR: Something".into()),
            stderr: "template not found\n".into(),
        };
        let err = settlement.into_result().unwrap_err();
        assert_eq!(err.to_string(), "template not found");
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn test_failure_falls_back_to_first_output_then_code() {
        let err = Settlement::Closed {
            code: Some(3),
            first_output: Some("ERROR: Project not found".into()),
            stderr: String::new(),
        }
        .into_result()
        .unwrap_err();
        assert_eq!(err.to_string(), "ERROR: Project not found");

        let err = Settlement::Closed {
            code: Some(3),
            first_output: None,
            stderr: "  \n".into(),
        }
        .into_result()
        .unwrap_err();
        assert_eq!(err.to_string(), "Command failed with exit code 3");
    }

    // ─────────────────────────────────────────────────────────
    // Real processes (sh stand-in for argon)
    // ─────────────────────────────────────────────────────────

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_resolves_on_pattern_while_running() {
        let sink = Arc::new(RecordingSink::default());
        let runner = scripted_runner(
            "echo 'INFO: Starting'; echo 'Serving on: http://localhost:8000'; sleep 5",
            sink,
        );

        let options =
            RunOptions::visible().resolve_on(Regex::new(r"Serving on: (http://[^\s,]+)").unwrap());
        let outcome = tokio::time::timeout(
            Duration::from_secs(3),
            runner.run(vec!["serve".into()], options),
        )
        .await
        .expect("pattern should settle before the process exits")
        .unwrap();

        assert_eq!(outcome.exit_code, None);
        assert_eq!(outcome.message, "Serving on: http://localhost:8000");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_survives_invalid_utf8_output() {
        let sink = Arc::new(RecordingSink::default());
        let runner = scripted_runner(
            "printf 'INFO: caf\\351\\n'; echo 'Serving on: http://localhost:8000'; sleep 5",
            sink.clone(),
        );

        let options = RunOptions::visible().resolve_on(Regex::new("Serving on").unwrap());
        let outcome = tokio::time::timeout(
            Duration::from_secs(3),
            runner.run(vec!["serve".into()], options),
        )
        .await
        .expect("readiness line should still be seen")
        .unwrap();

        assert_eq!(outcome.exit_code, None);
        assert!(sink.contains(LineSeverity::Info, "INFO: caf\u{FFFD}"));
        assert!(sink.contains(LineSeverity::Info, "Serving on: http://localhost:8000"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_pattern_wins_over_immediate_exit() {
        let sink = Arc::new(RecordingSink::default());
        let runner = scripted_runner("echo 'Serving on: http://localhost:8000'; exit 0", sink);

        for _ in 0..10 {
            let options = RunOptions::visible().resolve_on(Regex::new("Serving on").unwrap());
            let outcome = runner.run(vec!["serve".into()], options).await.unwrap();
            assert_eq!(outcome.exit_code, None);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_failure_carries_stderr_and_code() {
        let sink = Arc::new(RecordingSink::default());
        let runner = scripted_runner("echo 'template not found' >&2; exit 1", sink);

        let err = runner
            .run(vec!["build".into()], RunOptions::visible())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "template not found");
        assert_eq!(err.exit_code(), Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_success_with_exit_code_zero() {
        let sink = Arc::new(RecordingSink::default());
        let runner = scripted_runner("echo 'INFO: Built default.project.json'", sink.clone());

        let outcome = runner
            .run(vec!["build".into()], RunOptions::visible())
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.message, "INFO: Built default.project.json");
        assert!(sink.contains(LineSeverity::Info, "INFO: Built default.project.json"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_passes_common_flags() {
        let sink = Arc::new(RecordingSink::default());
        let runner = scripted_runner("echo \"INFO: $*\"", sink);

        let outcome = runner
            .run(vec!["stop".into(), "42".into()], RunOptions::silent())
            .await
            .unwrap();

        assert_eq!(outcome.message, "INFO: stop 42 -v --yes --color never");
    }

    #[tokio::test]
    async fn test_run_spawn_failure() {
        let sink = Arc::new(RecordingSink::default());
        let runner = ArgonRunner::new("/nonexistent/lemonade/argon", sink.clone());

        let err = runner
            .run(vec!["serve".into()], RunOptions::visible())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ArgonNotFound));
        assert_eq!(err.exit_code(), None);
        assert!(sink
            .lines()
            .iter()
            .any(|(sev, line, verbose)| *sev == LineSeverity::Error
                && line.starts_with("Failed to spawn process")
                && !verbose));
    }

    #[test]
    fn test_command_args_verbose() {
        let sink = Arc::new(RecordingSink::default());
        let runner = ArgonRunner::new("argon", sink).with_verbose(true);
        assert_eq!(
            runner.command_args(&["update".into(), "all".into()]),
            vec!["update", "all", "-vvvv", "--yes", "--color", "never"]
        );
    }
}
