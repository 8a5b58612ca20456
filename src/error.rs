use thiserror::Error;

// ─── Runtime error taxonomy ──────────────────────────────────────────────────

/// Closed error taxonomy for `likebot` runtime operations.
///
/// Component boundaries (the batch executor, the fleet aggregator, the HTTP
/// handlers) match on these variants to decide how a failure is reported.
/// Startup and configuration code keeps using `anyhow::Result` for ad-hoc
/// context chains.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LikeError {
    // ── Caller errors ───────────────────────────────────────────────────
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("a like batch is already running, try again later")]
    Busy,

    // ── Upstream / transport ────────────────────────────────────────────
    #[error("upstream {target} unreachable{}: {message}", status_suffix(.status))]
    UpstreamUnreachable {
        target: String,
        status: Option<u16>,
        message: String,
    },

    #[error("upstream {target} rejected the request{}: {message}", retcode_suffix(.retcode))]
    UpstreamRejected {
        target: String,
        retcode: Option<i64>,
        message: String,
    },

    // ── Fleet ───────────────────────────────────────────────────────────
    #[error("unknown bot: {name}")]
    UnknownInstance { name: String },

    // ── Persistence ─────────────────────────────────────────────────────
    #[error("failed to persist state to {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

#[allow(clippy::ref_option)]
fn retcode_suffix(retcode: &Option<i64>) -> String {
    retcode
        .map(|code| format!(" (retcode {code})"))
        .unwrap_or_default()
}

impl LikeError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn unreachable(target: impl Into<String>, message: impl ToString) -> Self {
        Self::UpstreamUnreachable {
            target: target.into(),
            status: None,
            message: message.to_string(),
        }
    }

    /// Stable machine-readable identifier, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Busy => "busy",
            Self::UpstreamUnreachable { .. } => "upstream_unreachable",
            Self::UpstreamRejected { .. } => "upstream_rejected",
            Self::UnknownInstance { .. } => "unknown_instance",
            Self::Persistence { .. } => "persistence_failure",
            Self::Internal(_) => "internal",
        }
    }
}

/// Shorthand result type for runtime operations.
pub type Result<T> = std::result::Result<T, LikeError>;
