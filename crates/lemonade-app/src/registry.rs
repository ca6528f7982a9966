//! Session registry
//!
//! Authoritative list of running sessions, mirrored into workspace state under
//! `lastSessions` and published on a watch channel for the status indicator.
//! Mutations never fail: persistence problems are logged and the in-memory
//! change still happens.

use lemonade_core::prelude::*;
use lemonade_core::{RestorableSession, Session, SessionId};
use lemonade_daemon::{Argon, OutputSink};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::state_store::StateStore;
use crate::status::StatusView;

/// Workspace state key of the persisted session list
pub const LAST_SESSIONS_KEY: &str = "lastSessions";

pub struct SessionRegistry {
    sessions: Mutex<Vec<Session>>,
    store: Arc<StateStore>,
    sink: Arc<dyn OutputSink>,
    snapshot_tx: watch::Sender<Vec<Session>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions())
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    pub fn new(store: Arc<StateStore>, sink: Arc<dyn OutputSink>) -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            sessions: Mutex::new(Vec::new()),
            store,
            sink,
            snapshot_tx,
        }
    }

    /// Receiver that sees every registry change
    pub fn subscribe(&self) -> watch::Receiver<Vec<Session>> {
        self.snapshot_tx.subscribe()
    }

    /// Copy of the current sessions in insertion order
    pub fn sessions(&self) -> Vec<Session> {
        self.sessions
            .lock()
            .map(|sessions| sessions.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions
            .lock()
            .ok()?
            .iter()
            .find(|s| s.id() == id)
            .cloned()
    }

    pub fn status(&self) -> StatusView {
        StatusView::render(&self.sessions())
    }

    /// Append a session. A second session with the same type and project is
    /// allowed but flagged with a warning.
    pub fn add_session(&self, session: Session) {
        let Ok(mut sessions) = self.sessions.lock() else {
            error!("Session registry lock poisoned, dropping session {}", session.id());
            return;
        };

        if sessions.iter().any(|s| s.same_target(&session)) {
            self.sink.warn(
                &format!(
                    "Session with type: {} and project: {} is already running. \
                     Ignore this message if this is desired behavior",
                    session.kind(),
                    session.project()
                ),
                false,
            );
        }

        info!(
            "Adding {} session {} for {}",
            session.kind(),
            session.id(),
            session.project()
        );
        sessions.push(session);

        let persisted: Vec<_> = sessions.iter().map(Session::to_persisted).collect();
        match serde_json::to_value(&persisted) {
            Ok(value) => self.persist(Some(value)),
            Err(e) => warn!("Failed to serialize sessions: {}", e),
        }

        self.publish(&sessions);
    }

    /// Remove the sessions with the given ids. Unknown ids are ignored.
    ///
    /// Matching persisted entries are replaced with `null` in place; when no
    /// session is left the persisted key is cleared entirely.
    pub fn remove_sessions(&self, ids: &[SessionId]) {
        let Ok(mut sessions) = self.sessions.lock() else {
            error!("Session registry lock poisoned, cannot remove {:?}", ids);
            return;
        };

        let before = sessions.len();
        sessions.retain(|s| !ids.contains(&s.id()));

        if sessions.len() == before {
            debug!("No sessions matched {:?}", ids);
            return;
        }

        info!("Removed {} session(s)", before - sessions.len());

        if sessions.is_empty() {
            self.persist(None);
        } else if let Some(Value::Array(mut persisted)) = self.store.get_raw(LAST_SESSIONS_KEY) {
            for entry in persisted.iter_mut() {
                let matches = entry
                    .get("id")
                    .and_then(Value::as_u64)
                    .is_some_and(|id| ids.contains(&SessionId(id)));
                if matches {
                    *entry = Value::Null;
                }
            }
            self.persist(Some(Value::Array(persisted)));
        }

        self.publish(&sessions);
    }

    /// Records persisted by the previous run. Entries that do not validate come
    /// back as [`RestorableSession::Incomplete`].
    pub fn persisted_sessions(&self) -> Vec<RestorableSession> {
        match self.store.get_raw(LAST_SESSIONS_KEY) {
            Some(Value::Array(entries)) => entries.iter().map(RestorableSession::from_value).collect(),
            Some(other) => {
                warn!("Ignoring malformed {}: {}", LAST_SESSIONS_KEY, other);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Ask Argon to stop every tracked session with a single `stop` call.
    /// Best effort: failures are logged and the call is not retried.
    pub async fn cleanup(&self, argon: &Argon) {
        let ids: Vec<SessionId> = self.sessions().iter().map(Session::id).collect();

        if ids.is_empty() {
            return;
        }

        info!("Stopping running sessions: {:?}", ids);
        if let Err(e) = argon.stop(&ids).await {
            warn!("Failed to stop sessions on shutdown: {}", e);
        }
    }

    fn persist(&self, value: Option<Value>) {
        if let Err(e) = self.store.update(LAST_SESSIONS_KEY, value) {
            warn!("Failed to persist sessions: {}", e);
        }
    }

    fn publish(&self, sessions: &[Session]) {
        self.snapshot_tx.send_replace(sessions.to_vec());
    }
}
