//! Session domain types
//!
//! A [`Session`] is one Argon operation that keeps running after the call that
//! started it returned: `serve`, `build --watch` or `sourcemap --watch`.
//! Sessions are persisted as [`PersistedSession`] records and read back at
//! startup as [`RestorableSession`] values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Process-unique session identifier handed to Argon as a positional argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(SessionId)
    }
}

/// Operation type of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Serve,
    Build,
    Sourcemap,
}

impl SessionKind {
    /// Argon subcommand for this kind
    pub fn subcommand(&self) -> &'static str {
        match self {
            SessionKind::Serve => "serve",
            SessionKind::Build => "build",
            SessionKind::Sourcemap => "sourcemap",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Serve => "Serve",
            SessionKind::Build => "Build",
            SessionKind::Sourcemap => "Sourcemap",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Serve" | "serve" => Ok(SessionKind::Serve),
            "Build" | "build" => Ok(SessionKind::Build),
            "Sourcemap" | "sourcemap" => Ok(SessionKind::Sourcemap),
            other => Err(format!("unknown session type: {other}")),
        }
    }
}

/// One tracked Argon operation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    name: String,
    project: String,
    kind: SessionKind,
    address: Option<String>,
    original_port: Option<u16>,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Human label from the project descriptor or file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the `*.project.json` descriptor, as given to Argon
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// `host:port` or URL the server listens on (serve sessions only)
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Port that was requested before Argon moved the server elsewhere
    pub fn original_port(&self) -> Option<u16> {
        self.original_port
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since the session was started
    pub fn duration(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    /// Same operation type against the same project
    pub fn same_target(&self, other: &Session) -> bool {
        self.kind == other.kind && self.project == other.project
    }

    /// Record stored in workspace state
    pub fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            id: Some(self.id),
            kind: self.kind,
            project: self.project.clone(),
            address: self.address.clone(),
            original_port: self.original_port,
        }
    }
}

/// Builds a [`Session`] in one step.
///
/// ```rust
/// use lemonade_core::{SessionBuilder, SessionId, SessionKind};
///
/// let session = SessionBuilder::new("Game", "default.project.json", SessionId(1))
///     .kind(SessionKind::Serve)
///     .address("localhost:8000")
///     .build();
/// assert_eq!(session.address(), Some("localhost:8000"));
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    id: SessionId,
    name: String,
    project: String,
    kind: SessionKind,
    address: Option<String>,
    original_port: Option<u16>,
    started_at: Option<DateTime<Utc>>,
}

impl SessionBuilder {
    /// Start a builder. The kind defaults to [`SessionKind::Serve`].
    pub fn new(name: impl Into<String>, project: impl Into<String>, id: SessionId) -> Self {
        Self {
            id,
            name: name.into(),
            project: project.into(),
            kind: SessionKind::Serve,
            address: None,
            original_port: None,
            started_at: None,
        }
    }

    pub fn kind(mut self, kind: SessionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn original_port(mut self, port: Option<u16>) -> Self {
        self.original_port = port;
        self
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn build(self) -> Session {
        // Only serve sessions listen on an address
        let address = match self.kind {
            SessionKind::Serve => self.address,
            _ => None,
        };

        Session {
            id: self.id,
            name: self.name,
            project: self.project,
            kind: self.kind,
            address,
            original_port: self.original_port,
            started_at: self.started_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Stored form of a session in workspace state (`lastSessions`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SessionId>,

    #[serde(rename = "type")]
    pub kind: SessionKind,

    pub project: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_port: Option<u16>,
}

/// Startup-only projection of a persisted record.
///
/// Parsing never fails: anything lacking a valid `type` or a non-empty
/// `project` becomes [`RestorableSession::Incomplete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestorableSession {
    Complete {
        kind: SessionKind,
        project: String,
        address: Option<String>,
        original_port: Option<u16>,
    },
    Incomplete,
}

impl RestorableSession {
    /// Validate an arbitrary JSON value read back from workspace state
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Incomplete;
        };

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<SessionKind>().ok());

        let project = object
            .get("project")
            .and_then(Value::as_str)
            .filter(|p| !p.trim().is_empty());

        let (Some(kind), Some(project)) = (kind, project) else {
            return Self::Incomplete;
        };

        let address = object
            .get("address")
            .and_then(Value::as_str)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        let original_port = object
            .get("originalPort")
            .and_then(Value::as_u64)
            .and_then(|p| u16::try_from(p).ok());

        Self::Complete {
            kind,
            project: project.to_string(),
            address,
            original_port,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    pub fn kind(&self) -> Option<SessionKind> {
        match self {
            Self::Complete { kind, .. } => Some(*kind),
            Self::Incomplete => None,
        }
    }

    pub fn project(&self) -> Option<&str> {
        match self {
            Self::Complete { project, .. } => Some(project),
            Self::Incomplete => None,
        }
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Complete { address, .. } => address.as_deref(),
            Self::Incomplete => None,
        }
    }

    pub fn original_port(&self) -> Option<u16> {
        match self {
            Self::Complete { original_port, .. } => *original_port,
            Self::Incomplete => None,
        }
    }

    /// Serve and build sessions sync into a running Studio instance
    pub fn needs_studio(&self) -> bool {
        matches!(
            self.kind(),
            Some(SessionKind::Serve) | Some(SessionKind::Build)
        )
    }
}
