use thiserror::Error;

/// Top-level error type for the `ztadmin-api` crate.
///
/// Transport failures are classified exactly once, inside
/// [`ControllerClient`](crate::ControllerClient). Callers never see a raw
/// `reqwest::Error`; `ztadmin-core` maps these variants onto the
/// user-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Controller rejected the auth token (HTTP 401 or 403).
    #[error("Controller rejected the API token (HTTP {status})")]
    Unauthorized { status: u16 },

    /// The token contains bytes that cannot be sent as a header value.
    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    // ── Transport ───────────────────────────────────────────────────
    /// Connection refused/reset, DNS failure, or timeout.
    #[error("Controller unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An id that cannot be used as a single URL path segment.
    #[error("Invalid path segment: '{0}'")]
    InvalidPathSegment(String),

    /// The HTTP client could not be constructed (TLS backend, bad options).
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    // ── Controller responses ────────────────────────────────────────
    /// HTTP 404 for the requested path.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// A transient status survived the whole retry budget.
    #[error("Controller returned HTTP {status} after {attempts} attempts")]
    Transient { status: u16, attempts: u32 },

    /// Any other non-success status. Never retried.
    #[error("Controller error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The request body could not be encoded as JSON.
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the controller rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::InvalidToken(_))
    }

    /// Returns `true` if the controller could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the retry budget was spent on transient statuses.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status }
            | Self::Transient { status, .. }
            | Self::Upstream { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}
