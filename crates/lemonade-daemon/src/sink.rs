//! Destination for classified Argon output

/// Receives every line an Argon process prints, already routed by severity.
///
/// `verbose` lines belong in the durable log only; non-verbose lines may also
/// be surfaced to the user, subject to the sink's own notification policy.
pub trait OutputSink: Send + Sync {
    fn info(&self, line: &str, verbose: bool);
    fn warn(&self, line: &str, verbose: bool);
    fn error(&self, line: &str, verbose: bool);
}

/// Sink that forwards everything to tracing only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn info(&self, line: &str, verbose: bool) {
        if verbose {
            tracing::debug!(target: "argon", "{}", line);
        } else {
            tracing::info!(target: "argon", "{}", line);
        }
    }

    fn warn(&self, line: &str, _verbose: bool) {
        tracing::warn!(target: "argon", "{}", line);
    }

    fn error(&self, line: &str, _verbose: bool) {
        tracing::error!(target: "argon", "{}", line);
    }
}
