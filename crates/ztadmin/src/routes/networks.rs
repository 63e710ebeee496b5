//! Network listing, lifecycle, routes, IP pools and easy setup.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use ztadmin_api::{IpAssignmentPool, Network, Route, V4AssignMode};
use ztadmin_core::{
    MutationAction, NetworkDetail, NetworkSummary, detailed_networks, easy_setup, network_detail,
    update_ip_assignment_pools, update_routes,
};

use crate::error::ApiError;
use crate::routes::Success;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{nwid}", get(detail).patch(update).delete(remove))
        .route("/{nwid}/routes", post(routes))
        .route("/{nwid}/ip-pools", post(ip_pools))
        .route("/{nwid}/easy-setup", post(setup))
}

// ── Request types ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateNetwork {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct RouteAction {
    pub route: Route,
    pub action: MutationAction,
}

#[derive(Deserialize)]
pub struct PoolAction {
    pub pool: IpAssignmentPool,
    pub action: MutationAction,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EasySetup {
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub ip_assignment_pools: Vec<IpAssignmentPool>,
    #[serde(default)]
    pub v4_assign_mode: V4AssignMode,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<NetworkSummary>>, ApiError> {
    let backend = state.backend().await?;
    Ok(Json(detailed_networks(&backend).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateNetwork>, JsonRejection>,
) -> Result<Json<Network>, ApiError> {
    let Json(body) = body?;
    let backend = state.backend().await?;
    Ok(Json(backend.create_network(body.name.trim()).await?))
}

async fn detail(
    State(state): State<Arc<AppState>>,
    Path(nwid): Path<String>,
) -> Result<Json<NetworkDetail>, ApiError> {
    let backend = state.backend().await?;
    Ok(Json(network_detail(&backend, &state.names, &nwid).await?))
}

/// Partial update; the body is forwarded to the controller as-is.
async fn update(
    State(state): State<Arc<AppState>>,
    Path(nwid): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Network>, ApiError> {
    let Json(patch) = body?;
    if !patch.is_object() {
        return Err(ApiError::BadRequest(
            "network update must be a JSON object".to_owned(),
        ));
    }
    let backend = state.backend().await?;
    Ok(Json(backend.update_network(&nwid, &patch).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Path(nwid): Path<String>,
) -> Result<Json<Success>, ApiError> {
    let backend = state.backend().await?;
    backend.delete_network(&nwid).await?;
    Ok(Json(Success::OK))
}

async fn routes(
    State(state): State<Arc<AppState>>,
    Path(nwid): Path<String>,
    body: Result<Json<RouteAction>, JsonRejection>,
) -> Result<Json<Network>, ApiError> {
    let Json(body) = body?;
    let backend = state.backend().await?;
    Ok(Json(
        update_routes(&backend, &nwid, &body.route, body.action).await?,
    ))
}

async fn ip_pools(
    State(state): State<Arc<AppState>>,
    Path(nwid): Path<String>,
    body: Result<Json<PoolAction>, JsonRejection>,
) -> Result<Json<Network>, ApiError> {
    let Json(body) = body?;
    let backend = state.backend().await?;
    Ok(Json(
        update_ip_assignment_pools(&backend, &nwid, &body.pool, body.action).await?,
    ))
}

async fn setup(
    State(state): State<Arc<AppState>>,
    Path(nwid): Path<String>,
    body: Result<Json<EasySetup>, JsonRejection>,
) -> Result<Json<Network>, ApiError> {
    let Json(body) = body?;
    let backend = state.backend().await?;
    Ok(Json(
        easy_setup(
            &backend,
            &nwid,
            &body.routes,
            &body.ip_assignment_pools,
            &body.v4_assign_mode,
        )
        .await?,
    ))
}
