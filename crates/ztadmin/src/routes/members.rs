//! Member edits. Nested under `/api/networks` next to the network routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::patch;
use axum::{Json, Router};
use serde_json::Value;

use ztadmin_core::{MemberEdit, delete_member};

use crate::error::ApiError;
use crate::routes::Success;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/{nwid}/members/{member_id}", patch(update).delete(remove))
}

/// `addIP` / `removeIP` edit addresses; `name` goes to the local name store;
/// every other field is forwarded to the controller. Answers with the
/// updated member, or `{"success": true}` when only the name changed.
async fn update(
    State(state): State<Arc<AppState>>,
    Path((nwid, member_id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let edit = MemberEdit::from_body(body)?;
    let backend = state.backend().await?;

    let member = edit.apply(&backend, &state.names, &nwid, &member_id).await?;
    Ok(match member {
        Some(member) => Json(member).into_response(),
        None => Json(Success::OK).into_response(),
    })
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path((nwid, member_id)): Path<(String, String)>,
) -> Result<Json<Success>, ApiError> {
    let backend = state.backend().await?;
    delete_member(&backend, &state.names, &nwid, &member_id).await?;
    Ok(Json(Success::OK))
}
