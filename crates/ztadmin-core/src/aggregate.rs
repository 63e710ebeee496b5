// Dashboard view models.
//
// Joins controller networks and members with peer liveness and local
// display names. Peers are indexed by address once per call, then reused
// for every network and member.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use ztadmin_api::{Member, MemberRevisions, Network, Peer};

use crate::backend::Backend;
use crate::error::{CoreError, ErrorKind};
use crate::names::MemberNames;

const UNKNOWN: &str = "unknown";
const RELAY: &str = "relay";

// ── View models ─────────────────────────────────────────────────────

/// A network with member counts, as listed on the networks page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    #[serde(flatten)]
    pub network: Network,
    pub member_count: usize,
    /// Members that appear in the peer list with an active path.
    pub online_count: usize,
}

/// One row of the members table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: String,
    /// Local display name, empty when none is stored.
    pub name: String,
    pub authorized: bool,
    pub active_bridge: bool,
    pub ip_assignments: Vec<String>,
    pub online: bool,
    pub version: String,
    /// `"12ms"`, `"relay"`, or `"unknown"`.
    pub latency: String,
    pub physical_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkDetail {
    pub network: Network,
    pub members: Vec<MemberView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub networks_count: usize,
    pub total_members: usize,
    pub online_members: usize,
    pub total_users: usize,
    pub version: String,
    pub address: String,
}

// ── Peer index ──────────────────────────────────────────────────────

struct PeerIndex<'a>(HashMap<&'a str, &'a Peer>);

impl<'a> PeerIndex<'a> {
    fn new(peers: &'a [Peer]) -> Self {
        Self(peers.iter().map(|p| (p.address.as_str(), p)).collect())
    }

    fn get(&self, address: &str) -> Option<&'a Peer> {
        self.0.get(address).copied()
    }

    fn is_online(&self, address: &str) -> bool {
        self.get(address).is_some_and(Peer::is_online)
    }
}

impl MemberView {
    fn build(member: Member, name: Option<String>, peer: Option<&Peer>) -> Self {
        let (online, version, latency, physical_address) = match peer {
            Some(peer) => (
                peer.is_online(),
                if peer.version.is_empty() {
                    UNKNOWN.to_owned()
                } else {
                    peer.version.clone()
                },
                format_latency(peer.latency),
                peer.active_path()
                    .map_or_else(|| UNKNOWN.to_owned(), |p| p.address.clone()),
            ),
            None => (
                false,
                UNKNOWN.to_owned(),
                UNKNOWN.to_owned(),
                UNKNOWN.to_owned(),
            ),
        };

        Self {
            id: member.id,
            name: name.unwrap_or_default(),
            authorized: member.authorized,
            active_bridge: member.active_bridge,
            ip_assignments: member.ip_assignments,
            online,
            version,
            latency,
            physical_address,
        }
    }
}

fn format_latency(latency: i64) -> String {
    if latency < 0 {
        RELAY.to_owned()
    } else {
        format!("{latency}ms")
    }
}

/// Member ids for a network that may have vanished since it was listed.
async fn member_ids_or_empty(backend: &Backend, nwid: &str) -> Result<MemberRevisions, CoreError> {
    match backend.list_member_ids(nwid).await {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(nwid, "network vanished while counting members");
            Ok(MemberRevisions::default())
        }
        other => other,
    }
}

// ── Aggregations ────────────────────────────────────────────────────

/// Every network with its member and online counts.
pub async fn detailed_networks(backend: &Backend) -> Result<Vec<NetworkSummary>, CoreError> {
    let (networks, peers) = futures::try_join!(backend.list_networks(), backend.list_peers())?;
    let index = PeerIndex::new(&peers);

    let member_sets = try_join_all(
        networks
            .iter()
            .map(|network| member_ids_or_empty(backend, &network.nwid)),
    )
    .await?;

    Ok(networks
        .into_iter()
        .zip(member_sets)
        .map(|(network, members)| {
            let online_count = members.ids().filter(|id| index.is_online(id)).count();
            NetworkSummary {
                network,
                member_count: members.len(),
                online_count,
            }
        })
        .collect())
}

/// One network with a joined view of its members.
///
/// A network the controller does not know is
/// [`CoreError::NetworkNotFound`], never a generic failure.
pub async fn network_detail(
    backend: &Backend,
    names: &MemberNames,
    nwid: &str,
) -> Result<NetworkDetail, CoreError> {
    let (network, member_ids, peers) = futures::join!(
        backend.get_network(nwid),
        backend.list_member_ids(nwid),
        backend.list_peers(),
    );
    let network = network?.ok_or_else(|| CoreError::NetworkNotFound {
        nwid: nwid.to_owned(),
    })?;
    let member_ids = member_ids?;
    let peers = peers?;
    let index = PeerIndex::new(&peers);

    let (members, mut stored_names): (Vec<Option<Member>>, BTreeMap<String, String>) =
        futures::try_join!(
            try_join_all(member_ids.ids().map(|id| backend.get_member(nwid, id))),
            names.all(),
        )?;

    let members = members
        .into_iter()
        .flatten()
        .map(|member| {
            let name = stored_names.remove(&member.id);
            let peer = index.get(&member.id);
            MemberView::build(member, name, peer)
        })
        .collect();

    Ok(NetworkDetail { network, members })
}

/// Totals for the dashboard landing page.
///
/// `user_count` is the local user store lookup; it runs concurrently with
/// the controller calls.
pub async fn dashboard_stats<F>(backend: &Backend, user_count: F) -> Result<DashboardStats, CoreError>
where
    F: Future<Output = Result<usize, CoreError>>,
{
    let (networks, status, total_users) =
        futures::try_join!(detailed_networks(backend), backend.status(), user_count)?;

    Ok(DashboardStats {
        networks_count: networks.len(),
        total_members: networks.iter().map(|n| n.member_count).sum(),
        online_members: networks.iter().map(|n| n.online_count).sum(),
        total_users,
        version: status.version,
        address: status.address,
    })
}
