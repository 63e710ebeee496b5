// Controller API response types
//
// Models for the ZeroTier controller's JSON API. The controller returns many
// more fields than the dashboard cares about, and the set varies between
// releases. Every entity keeps the unmodelled fields in `extra` so a
// read-modify-write round trip never drops data.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Network ──────────────────────────────────────────────────────────

/// A managed route pushed to network members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Destination in CIDR notation, e.g. `10.147.17.0/24`.
    pub target: String,
    /// Gateway address, or `null` for an on-link route.
    #[serde(default)]
    pub via: Option<String>,
}

/// An automatic IP assignment range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAssignmentPool {
    pub ip_range_start: String,
    pub ip_range_end: String,
}

/// IPv4 auto-assignment switch (`{"zt": true}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4AssignMode {
    #[serde(default)]
    pub zt: bool,
}

/// DNS settings pushed to members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dns {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub servers: Vec<String>,
}

/// Network object from `GET /controller/network/{nwid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Network {
    pub nwid: String,
    pub name: String,
    pub private: bool,
    pub routes: Vec<Route>,
    pub ip_assignment_pools: Vec<IpAssignmentPool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v4_assign_mode: Option<V4AssignMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<Dns>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Member ───────────────────────────────────────────────────────────

/// Member object from `GET /controller/network/{nwid}/member/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Member {
    /// Node address (10 hex digits).
    pub id: String,
    pub authorized: bool,
    pub active_bridge: bool,
    pub ip_assignments: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Member id → revision marker, from `GET /controller/network/{nwid}/member`.
///
/// Most controller releases answer with an object. Some answer with an
/// array whose entries are either bare ids or single-key `{id: revision}`
/// objects; both forms are folded into the same mapping on deserialize.
/// Bare ids get revision `1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MemberRevisions(IndexMap<String, Value>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMemberList {
    Map(IndexMap<String, Value>),
    List(Vec<RawMemberEntry>),
    Empty(()),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMemberEntry {
    Id(String),
    Single(IndexMap<String, Value>),
}

impl<'de> Deserialize<'de> for MemberRevisions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let revisions = match RawMemberList::deserialize(deserializer)? {
            RawMemberList::Map(map) => map,
            RawMemberList::List(entries) => entries
                .into_iter()
                .filter_map(|entry| match entry {
                    RawMemberEntry::Id(id) => Some((id, Value::from(1))),
                    RawMemberEntry::Single(map) => map.into_iter().next(),
                })
                .collect(),
            RawMemberList::Empty(()) => IndexMap::new(),
        };
        Ok(Self(revisions))
    }
}

impl MemberRevisions {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn revision(&self, id: &str) -> Option<&Value> {
        self.0.get(id)
    }
}

impl FromIterator<(String, Value)> for MemberRevisions {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ── Peer ─────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn unknown_latency() -> i64 {
    -1
}

/// One physical path to a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerPath {
    /// Physical `ip/port` endpoint.
    #[serde(default)]
    pub address: String,
    /// Older controllers omit the flag and only list live paths.
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub preferred: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Peer object from `GET /peer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub address: String,
    /// Round-trip latency in milliseconds; `-1` when only relayed.
    #[serde(default = "unknown_latency")]
    pub latency: i64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub paths: Vec<PeerPath>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Peer {
    /// The first active path, if any.
    pub fn active_path(&self) -> Option<&PeerPath> {
        self.paths.iter().find(|p| p.active)
    }

    pub fn is_online(&self) -> bool {
        self.active_path().is_some()
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// Node status from `GET /status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerStatus {
    /// The controller's own node address; new network ids start with it.
    pub address: String,
    pub version: String,
    pub online: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn member_list_object_form() {
        let revs: MemberRevisions =
            serde_json::from_value(json!({"aaaaaaaaaa": 3, "bbbbbbbbbb": 1})).unwrap();
        assert_eq!(revs.ids().collect::<Vec<_>>(), ["aaaaaaaaaa", "bbbbbbbbbb"]);
        assert_eq!(revs.revision("aaaaaaaaaa"), Some(&json!(3)));
    }

    #[test]
    fn member_list_array_of_single_key_objects() {
        let revs: MemberRevisions =
            serde_json::from_value(json!([{"aaaaaaaaaa": 2}, {"bbbbbbbbbb": 5}])).unwrap();
        assert_eq!(revs.len(), 2);
        assert_eq!(revs.revision("bbbbbbbbbb"), Some(&json!(5)));
    }

    #[test]
    fn member_list_array_of_bare_ids() {
        let revs: MemberRevisions =
            serde_json::from_value(json!(["aaaaaaaaaa", {"bbbbbbbbbb": 4}])).unwrap();
        assert_eq!(revs.revision("aaaaaaaaaa"), Some(&json!(1)));
        assert!(revs.contains("bbbbbbbbbb"));
    }

    #[test]
    fn member_list_null_is_empty() {
        let revs: MemberRevisions = serde_json::from_value(Value::Null).unwrap();
        assert!(revs.is_empty());
    }

    #[test]
    fn network_keeps_unknown_fields() {
        let raw = json!({
            "id": "8056c2e21c000001",
            "nwid": "8056c2e21c000001",
            "name": "lab",
            "private": true,
            "routes": [{"target": "10.0.0.0/24", "via": null}],
            "ipAssignmentPools": [],
            "v4AssignMode": {"zt": true},
            "multicastLimit": 32,
        });
        let network: Network = serde_json::from_value(raw).unwrap();
        assert_eq!(network.routes.len(), 1);
        assert_eq!(network.extra.get("multicastLimit"), Some(&json!(32)));

        let back = serde_json::to_value(&network).unwrap();
        assert_eq!(back["multicastLimit"], json!(32));
        assert_eq!(back["routes"][0]["via"], Value::Null);
    }

    #[test]
    fn peer_without_active_flag_counts_as_online() {
        let peer: Peer = serde_json::from_value(json!({
            "address": "aaaaaaaaaa",
            "latency": 12,
            "paths": [{"address": "192.0.2.1/9993"}],
        }))
        .unwrap();
        assert!(peer.is_online());

        let relayed: Peer = serde_json::from_value(json!({
            "address": "bbbbbbbbbb",
            "paths": [{"address": "192.0.2.2/9993", "active": false}],
        }))
        .unwrap();
        assert!(!relayed.is_online());
        assert_eq!(relayed.latency, -1);
    }
}
