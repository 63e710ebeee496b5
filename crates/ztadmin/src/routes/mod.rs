//! HTTP route handlers for the dashboard API.
//!
//! Each submodule exposes a `router()` mounted under `/api/...`. Everything
//! except [`auth::public_router`] sits behind the session middleware.

pub mod auth;
pub mod members;
pub mod networks;
pub mod settings;
pub mod stats;
pub mod users;

use serde::Serialize;

/// `{"success": true}` for mutations with nothing else to return.
#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub const OK: Self = Self { success: true };
}
