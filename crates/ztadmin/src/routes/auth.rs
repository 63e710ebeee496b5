//! Login, logout, first-run setup and session introspection.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::routes::Success;
use crate::session::{SESSION_COOKIE, SessionUser};
use crate::state::AppState;
use crate::users::UserInfo;

/// Routes reachable without a session.
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(status))
        .route("/setup", post(setup))
        .route("/login", post(login))
}

/// Routes that need a session.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub initialized: bool,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserInfo,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    pub user: MeUser,
}

#[derive(Serialize)]
pub struct MeUser {
    pub name: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let initialized = state.users.is_initialized().await?;
    Ok(Json(StatusResponse { initialized }))
}

/// Create the first admin. Refused once any account exists.
async fn setup(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Success>, ApiError> {
    let Json(body) = body?;
    let user = state
        .users
        .create_first(&body.username, &body.password)
        .await?;
    info!(user = %user.name, "dashboard initialized");
    Ok(Json(Success::OK))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let Json(body) = body?;
    let user = state
        .users
        .authenticate(&body.username, &body.password)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_owned()))?;

    let token = state.sessions.create(&user.name);
    info!(user = %user.name, "login");
    let jar = jar.add(state.sessions.cookie(token));

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user,
        }),
    ))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(SessionUser(user)): Extension<SessionUser>,
    jar: CookieJar,
) -> (CookieJar, Json<Success>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.revoke(cookie.value());
    }
    info!(%user, "logout");
    (jar.add(state.sessions.removal_cookie()), Json(Success::OK))
}

async fn me(Extension(SessionUser(name)): Extension<SessionUser>) -> Json<MeResponse> {
    Json(MeResponse {
        authenticated: true,
        user: MeUser { name },
    })
}
