//! Events emitted by a spawned Argon process

/// Which output pipe a line or EOF belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn label(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

/// Ordered event stream of one Argon process.
///
/// Reader tasks emit `Line` and `Closed`; the wait task emits exactly one
/// `Exited` (or `WaitFailed`) after the child terminates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// One line of output, without the trailing newline
    Line { stream: StreamKind, line: String },

    /// The pipe reached EOF
    Closed(StreamKind),

    /// The process terminated. `code` is `None` when killed by a signal.
    Exited { code: Option<i32> },

    /// Waiting on the child failed
    WaitFailed(String),
}

impl ProcessEvent {
    pub fn stdout(line: impl Into<String>) -> Self {
        Self::Line {
            stream: StreamKind::Stdout,
            line: line.into(),
        }
    }

    pub fn stderr(line: impl Into<String>) -> Self {
        Self::Line {
            stream: StreamKind::Stderr,
            line: line.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_constructors() {
        assert_eq!(
            ProcessEvent::stdout("hi"),
            ProcessEvent::Line {
                stream: StreamKind::Stdout,
                line: "hi".to_string()
            }
        );
        assert!(matches!(
            ProcessEvent::stderr("oops"),
            ProcessEvent::Line {
                stream: StreamKind::Stderr,
                ..
            }
        ));
    }
}
