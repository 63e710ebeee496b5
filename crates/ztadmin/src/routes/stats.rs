//! Dashboard landing page totals.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use ztadmin_core::{CoreError, DashboardStats, dashboard_stats};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(stats))
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<DashboardStats>, ApiError> {
    let backend = state.backend().await?;
    let user_count = async {
        state
            .users
            .count()
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))
    };
    Ok(Json(dashboard_stats(&backend, user_count).await?))
}
