//! Controller profile settings.
//!
//! Reads never expose stored tokens: each one is replaced by the mask.
//! Writes take the full profile list; a token sent back as the mask keeps
//! the stored value.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use ztadmin_config::{ControllerSettings, SettingsUpdate};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(read).post(write))
}

async fn read(State(state): State<Arc<AppState>>) -> Result<Json<ControllerSettings>, ApiError> {
    let settings = state.settings.load().await?;
    Ok(Json(settings.masked()))
}

async fn write(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SettingsUpdate>, JsonRejection>,
) -> Result<Json<ControllerSettings>, ApiError> {
    let Json(update) = body?;
    let settings = state.settings.update(update).await?;
    info!(
        profiles = settings.backends.len(),
        active = settings.active_id.as_deref().unwrap_or(""),
        "controller settings saved"
    );
    Ok(Json(settings.masked()))
}
