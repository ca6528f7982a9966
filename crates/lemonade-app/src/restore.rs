//! Startup restoration of the sessions that were running when the workspace
//! was last closed.

use futures_util::future::join_all;
use lemonade_core::prelude::*;
use lemonade_core::{RestorableSession, Session};

use crate::actions::restore_session;
use crate::context::AppContext;

/// Outcome of one restoration pass
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub restored: Vec<Session>,
    /// Incomplete records and one-shot runs that produced no session
    pub skipped: usize,
    pub failed: Vec<(RestorableSession, Error)>,
}

impl RestoreReport {
    pub fn is_empty(&self) -> bool {
        self.restored.is_empty() && self.skipped == 0 && self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Restored {} session(s), skipped {}, failed {}",
            self.restored.len(),
            self.skipped,
            self.failed.len()
        )
    }
}

/// Re-run every complete persisted session concurrently.
///
/// Never fails: broken records are skipped and failed restores are logged and
/// reported.
pub async fn restore_sessions(ctx: &AppContext) -> RestoreReport {
    let records = ctx.registry().persisted_sessions();
    let mut report = RestoreReport::default();

    let (complete, incomplete): (Vec<_>, Vec<_>) =
        records.into_iter().partition(RestorableSession::is_complete);
    report.skipped += incomplete.len();

    if complete.is_empty() {
        return report;
    }

    info!("Restoring {} session(s)", complete.len());
    let results = join_all(complete.iter().map(|record| restore_one(ctx, record))).await;

    for (record, result) in complete.into_iter().zip(results) {
        match result {
            Ok(Some(session)) => report.restored.push(session),
            Ok(None) => report.skipped += 1,
            Err(e) => {
                warn!("Failed to restore {:?}: {}", record, e);
                report.failed.push((record, e));
            }
        }
    }

    debug!("{}", report.summary());
    report
}

async fn restore_one(ctx: &AppContext, record: &RestorableSession) -> Result<Option<Session>> {
    let session = restore_session(ctx, record).await?;

    if session.is_some() && record.needs_studio() && ctx.settings().behavior.auto_launch_studio {
        if let Err(e) = ctx.argon().studio(true, None).await {
            warn!("Failed to launch Studio: {}", e);
        }
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::scripted_context;
    use crate::registry::LAST_SESSIONS_KEY;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn place_project(dir: &std::path::Path, file: &str) {
        fs::write(dir.join(file), r#"{"tree":{"$className":"DataModel"}}"#).unwrap();
    }

    #[tokio::test]
    async fn test_nothing_persisted() {
        let temp = tempdir().unwrap();
        let ctx = scripted_context(temp.path(), "exit 1");

        let report = restore_sessions(&ctx).await;
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_records_are_skipped() {
        let temp = tempdir().unwrap();
        place_project(temp.path(), "a.project.json");
        let ctx = scripted_context(
            temp.path(),
            r#"echo "INFO: Serving on: http://localhost:8000""#,
        );
        ctx.workspace_state()
            .update(
                LAST_SESSIONS_KEY,
                Some(json!([
                    { "id": 1, "type": "Serve", "project": "a.project.json" },
                    { "id": 2, "type": "Serve" },
                    null
                ])),
            )
            .unwrap();

        let report = restore_sessions(&ctx).await;

        assert_eq!(report.restored.len(), 1);
        assert_eq!(report.restored[0].project(), "a.project.json");
        assert_eq!(report.skipped, 2);
        assert!(report.failed.is_empty());
        assert_eq!(ctx.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_reported_not_raised() {
        let temp = tempdir().unwrap();
        let ctx = scripted_context(temp.path(), r#"echo "ERROR: no project" >&2; exit 1"#);
        ctx.workspace_state()
            .update(
                LAST_SESSIONS_KEY,
                Some(json!([{ "type": "Build", "project": "gone.project.json" }])),
            )
            .unwrap();

        let report = restore_sessions(&ctx).await;

        assert!(report.restored.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].1.to_string(), "ERROR: no project");
        assert!(ctx.registry().is_empty());
    }
}
