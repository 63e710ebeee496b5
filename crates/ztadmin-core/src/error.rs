// ── Core error types ──
//
// Controller failures are classified once, inside `ztadmin-api`, and pass
// through here unchanged. `kind()` folds every variant onto the small
// taxonomy the dashboard shows to users.

use thiserror::Error;

use ztadmin_config::ConfigError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Classified controller failure.
    #[error(transparent)]
    Upstream(#[from] ztadmin_api::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    // ── Domain absence ───────────────────────────────────────────────
    #[error("Network not found: {nwid}")]
    NetworkNotFound { nwid: String },

    #[error("Member {member_id} not found in network {nwid}")]
    MemberNotFound { nwid: String, member_id: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// User-facing failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// No controller token anywhere. Expected on unconfigured installs.
    TokenNotFound,
    /// Controller rejected the token.
    Unauthorized,
    /// Controller could not be reached.
    Unreachable,
    NotFound,
    /// Transient statuses outlived the retry budget.
    TransientUpstream,
    /// Any other controller-side failure.
    Upstream,
    Validation,
    Internal,
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Upstream(err) => match err {
                ztadmin_api::Error::Unauthorized { .. } | ztadmin_api::Error::InvalidToken(_) => {
                    ErrorKind::Unauthorized
                }
                ztadmin_api::Error::Unreachable { .. } => ErrorKind::Unreachable,
                ztadmin_api::Error::NotFound { .. } => ErrorKind::NotFound,
                ztadmin_api::Error::Transient { .. } => ErrorKind::TransientUpstream,
                ztadmin_api::Error::InvalidUrl(_) | ztadmin_api::Error::InvalidPathSegment(_) => {
                    ErrorKind::Validation
                }
                ztadmin_api::Error::Upstream { .. }
                | ztadmin_api::Error::Deserialization { .. } => ErrorKind::Upstream,
                ztadmin_api::Error::Client(_) | ztadmin_api::Error::Encode(_) => {
                    ErrorKind::Internal
                }
            },
            Self::Config(err) => match err {
                ConfigError::TokenNotFound { .. } => ErrorKind::TokenNotFound,
                ConfigError::Validation { .. } | ConfigError::UnknownActiveProfile { .. } => {
                    ErrorKind::Validation
                }
                _ => ErrorKind::Internal,
            },
            Self::NetworkNotFound { .. } | Self::MemberNotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_keep_their_class() {
        let unauthorized = CoreError::from(ztadmin_api::Error::Unauthorized { status: 403 });
        assert_eq!(unauthorized.kind(), ErrorKind::Unauthorized);

        let unreachable = CoreError::from(ztadmin_api::Error::Unreachable {
            url: "http://localhost:9993/status".into(),
            reason: "connection refused".into(),
        });
        assert_eq!(unreachable.kind(), ErrorKind::Unreachable);

        let transient = CoreError::from(ztadmin_api::Error::Transient {
            status: 503,
            attempts: 3,
        });
        assert_eq!(transient.kind(), ErrorKind::TransientUpstream);

        let bad_id = CoreError::from(ztadmin_api::Error::InvalidPathSegment("..".into()));
        assert_eq!(bad_id.kind(), ErrorKind::Validation);
    }

    #[test]
    fn missing_token_is_its_own_class() {
        let err = CoreError::from(ConfigError::TokenNotFound {
            searched: vec!["$ZT_TOKEN".into()],
        });
        assert_eq!(err.kind(), ErrorKind::TokenNotFound);
        assert_eq!(err.kind().to_string(), "token_not_found");
    }
}
