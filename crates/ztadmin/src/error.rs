//! Error types for the dashboard server.
//!
//! [`ApiError`] is what every handler returns. It renders as a JSON body
//! with a machine-readable `error` code and a human-readable `message`.
//! Controller failures keep distinct codes so the UI can tell a bad token
//! from an unreachable controller from anything else.
//!
//! [`StartupError`] covers everything that can stop the process before it
//! serves a request, with miette help text.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use ztadmin_config::ConfigError;
use ztadmin_core::{CoreError, ErrorKind};

use crate::users::UserError;

// ── HTTP errors ─────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    /// No valid session, or bad credentials.
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// The controller failed in a way the user must see.
    Controller {
        status: StatusCode,
        code: &'static str,
        message: &'static str,
    },
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::Controller {
                status,
                code,
                message,
            } => (status, code, message.to_owned()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl ApiError {
    pub fn session_required() -> Self {
        Self::Unauthorized("Authentication required".to_owned())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err.kind() {
            ErrorKind::TokenNotFound => Self::Controller {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "token_not_found",
                message: "No controller API token configured",
            },
            ErrorKind::Unauthorized => {
                warn!(error = %err, "controller rejected the API token");
                Self::Controller {
                    status: StatusCode::BAD_GATEWAY,
                    code: "invalid_api_token",
                    message: "Invalid API token",
                }
            }
            ErrorKind::Unreachable => {
                warn!(error = %err, "controller unreachable");
                Self::Controller {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    code: "controller_unreachable",
                    message: "Controller unreachable",
                }
            }
            ErrorKind::TransientUpstream | ErrorKind::Upstream => {
                error!(error = %err, "controller request failed");
                Self::Controller {
                    status: StatusCode::BAD_GATEWAY,
                    code: "controller_error",
                    message: "Controller request failed",
                }
            }
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::Validation => Self::BadRequest(err.to_string()),
            ErrorKind::Internal => {
                error!(error = %err, "internal error");
                Self::Internal("Internal server error".to_owned())
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::MissingFields | UserError::PasswordTooShort => {
                Self::BadRequest(err.to_string())
            }
            UserError::AlreadyExists(_) => Self::Conflict(err.to_string()),
            UserError::NotFound(_) => Self::NotFound(err.to_string()),
            UserError::LastUser | UserError::AlreadyInitialized => {
                Self::Forbidden(err.to_string())
            }
            UserError::Hash(_) | UserError::Store(_) => {
                error!(error = %err, "user store failure");
                Self::Internal("Internal server error".to_owned())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

// ── Startup errors ──────────────────────────────────────────────────

/// Exit codes for the `ztadmin` binary.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
}

#[derive(Debug, Error, Diagnostic)]
pub enum StartupError {
    #[error("Failed to load configuration from {path}")]
    #[diagnostic(
        code(ztadmin::config),
        help(
            "Check the TOML file and any ZTADMIN_* environment variables.\n\
             Run: ztadmin --print-config to see the effective settings."
        )
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("Could not create data directory {path}")]
    #[diagnostic(
        code(ztadmin::data_dir),
        help("Choose a writable location with --data-dir or ZTADMIN_DATA_DIR.")
    )]
    DataDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(ztadmin::bind),
        help("Another process may already use this port. Pick another with --bind.")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server stopped unexpectedly")]
    #[diagnostic(code(ztadmin::serve))]
    Serve(#[source] std::io::Error),
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => exit_code::CONFIG,
            Self::DataDir { .. } | Self::Bind { .. } | Self::Serve(_) => exit_code::GENERAL,
        }
    }
}
