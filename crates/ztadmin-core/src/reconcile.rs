// Idempotent add/delete of routes and IP assignment pools.
//
// Each mutation reads the network, edits the full array locally, and writes
// the whole array back in one update. The read-modify-write is not atomic:
// two concurrent edits of the same network race and the later write wins.

use std::net::Ipv6Addr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use ztadmin_api::{IpAssignmentPool, Network, Route, V4AssignMode};

use crate::backend::Backend;
use crate::error::CoreError;

/// Prefix length assumed for an IPv6 target without one.
const IPV6_HOST_PREFIX: u8 = 128;

/// What to do with the given entry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MutationAction {
    Add,
    Delete,
}

// ── Canonical targets ───────────────────────────────────────────────

/// Comparison key for a route target.
///
/// An IPv6 address is rewritten to its compressed lowercase form with the
/// prefix appended (`/128` when absent or empty). Anything else, IPv4 included, is
/// returned unchanged.
pub fn canonical_target(target: &str) -> String {
    let (addr, prefix) = match target.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (target, None),
    };

    let Ok(ip) = addr.parse::<Ipv6Addr>() else {
        return target.to_owned();
    };
    let prefix = match prefix {
        None | Some("") => IPV6_HOST_PREFIX,
        Some(raw) => match raw.parse::<u8>() {
            Ok(len) if len <= IPV6_HOST_PREFIX => len,
            _ => return target.to_owned(),
        },
    };
    format!("{ip}/{prefix}")
}

// ── Pure reconciliation ─────────────────────────────────────────────

/// Apply `action` for `route` to a route list.
///
/// Adding is a no-op when a route with the same canonical target exists;
/// deleting removes every route with that canonical target.
pub fn reconcile_routes(routes: &[Route], route: &Route, action: MutationAction) -> Vec<Route> {
    let key = canonical_target(&route.target);
    match action {
        MutationAction::Add => {
            let mut out = routes.to_vec();
            if !routes.iter().any(|r| canonical_target(&r.target) == key) {
                out.push(route.clone());
            }
            out
        }
        MutationAction::Delete => routes
            .iter()
            .filter(|r| canonical_target(&r.target) != key)
            .cloned()
            .collect(),
    }
}

/// Apply `action` for `pool` to a pool list. Pools are equal only when both
/// ends match exactly.
pub fn reconcile_pools(
    pools: &[IpAssignmentPool],
    pool: &IpAssignmentPool,
    action: MutationAction,
) -> Vec<IpAssignmentPool> {
    match action {
        MutationAction::Add => {
            let mut out = pools.to_vec();
            if !pools.contains(pool) {
                out.push(pool.clone());
            }
            out
        }
        MutationAction::Delete => pools.iter().filter(|p| *p != pool).cloned().collect(),
    }
}

// ── Controller-backed mutations ─────────────────────────────────────

/// Add or delete a managed route and push the full route list back.
pub async fn update_routes(
    backend: &Backend,
    nwid: &str,
    route: &Route,
    action: MutationAction,
) -> Result<Network, CoreError> {
    if route.target.trim().is_empty() {
        return Err(CoreError::validation("route target is required"));
    }
    let network = backend.require_network(nwid).await?;
    let routes = reconcile_routes(&network.routes, route, action);
    info!(nwid, target = %route.target, %action, routes = routes.len(), "updating routes");
    backend
        .update_network(nwid, &json!({ "routes": routes }))
        .await
}

/// Add or delete an IP assignment pool and push the full pool list back.
pub async fn update_ip_assignment_pools(
    backend: &Backend,
    nwid: &str,
    pool: &IpAssignmentPool,
    action: MutationAction,
) -> Result<Network, CoreError> {
    if pool.ip_range_start.trim().is_empty() || pool.ip_range_end.trim().is_empty() {
        return Err(CoreError::validation(
            "ipRangeStart and ipRangeEnd are required",
        ));
    }
    let network = backend.require_network(nwid).await?;
    let pools = reconcile_pools(&network.ip_assignment_pools, pool, action);
    info!(
        nwid,
        start = %pool.ip_range_start,
        end = %pool.ip_range_end,
        %action,
        pools = pools.len(),
        "updating IP assignment pools"
    );
    backend
        .update_network(nwid, &json!({ "ipAssignmentPools": pools }))
        .await
}

/// Replace routes, pools and the v4 auto-assign switch in a single update.
pub async fn easy_setup(
    backend: &Backend,
    nwid: &str,
    routes: &[Route],
    pools: &[IpAssignmentPool],
    v4_assign_mode: &V4AssignMode,
) -> Result<Network, CoreError> {
    info!(
        nwid,
        routes = routes.len(),
        pools = pools.len(),
        "applying easy setup"
    );
    backend
        .update_network(
            nwid,
            &json!({
                "routes": routes,
                "ipAssignmentPools": pools,
                "v4AssignMode": v4_assign_mode,
            }),
        )
        .await
}
