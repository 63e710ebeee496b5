//! Local dashboard account management.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::Success;
use crate::routes::auth::Credentials;
use crate::state::AppState;
use crate::users::UserInfo;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{username}", patch(change_password).delete(remove))
}

#[derive(Deserialize)]
pub struct PasswordChange {
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct CreatedUser {
    pub success: bool,
    pub user: UserInfo,
}

async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserInfo>>, ApiError> {
    Ok(Json(state.users.list().await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<CreatedUser>, ApiError> {
    let Json(body) = body?;
    let user = state.users.create(&body.username, &body.password).await?;
    Ok(Json(CreatedUser {
        success: true,
        user,
    }))
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    body: Result<Json<PasswordChange>, JsonRejection>,
) -> Result<Json<Success>, ApiError> {
    let Json(body) = body?;
    state.users.change_password(&username, &body.password).await?;
    Ok(Json(Success::OK))
}

/// Delete an account and end its sessions.
async fn remove(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<Success>, ApiError> {
    state.users.delete(&username).await?;
    state.sessions.revoke_user(&username);
    Ok(Json(Success::OK))
}
