//! ztadmin: web dashboard server for a ZeroTier network controller.
//!
//! The binary in `main.rs` loads configuration and serves the router built
//! by [`build_router`].

pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod users;

use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_mw;
use tower_http::trace::TraceLayer;

use crate::session::require_session;
use crate::state::AppState;

pub use error::{ApiError, StartupError};

/// Build the dashboard API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Everything except status, setup and login needs a session.
    let authenticated_routes = Router::new()
        .nest("/api/auth", routes::auth::router())
        .nest(
            "/api/networks",
            routes::networks::router().merge(routes::members::router()),
        )
        .nest("/api/users", routes::users::router())
        .nest("/api/stats", routes::stats::router())
        .nest("/api/settings", routes::settings::router())
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            require_session,
        ));

    Router::new()
        .nest("/api/auth", routes::auth::public_router())
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
