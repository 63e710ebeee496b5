// Offline stand-in for a controller.
//
// Used when no auth token can be found so the dashboard stays usable on a
// machine without a controller. The sample network list is owned by
// whoever creates the `MockController` (the server state) and shared by
// clone; it is never global.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::info;

use ztadmin_api::{ControllerStatus, Member, Network};

use crate::error::CoreError;

pub const MOCK_NWID: &str = "mock_nwid_123456";
pub const MOCK_ADDRESS: &str = "mock_addr";
pub const MOCK_VERSION: &str = "1.0.0 MOCK";

/// In-memory controller with a shared, mutable network list.
#[derive(Debug, Clone)]
pub struct MockController {
    networks: Arc<Mutex<Vec<Network>>>,
}

impl Default for MockController {
    fn default() -> Self {
        Self::with_networks(vec![Network {
            nwid: MOCK_NWID.to_owned(),
            name: "Mock Network 1".to_owned(),
            ..Network::default()
        }])
    }
}

impl MockController {
    pub fn with_networks(networks: Vec<Network>) -> Self {
        Self {
            networks: Arc::new(Mutex::new(networks)),
        }
    }

    pub async fn list_networks(&self) -> Vec<Network> {
        self.networks.lock().await.clone()
    }

    pub async fn get_network(&self, nwid: &str) -> Option<Network> {
        self.networks
            .lock()
            .await
            .iter()
            .find(|n| n.nwid == nwid)
            .cloned()
    }

    pub async fn create_network(&self, name: &str) -> Network {
        let network = Network {
            nwid: format!("mock_{}", chrono::Utc::now().timestamp_millis()),
            name: name.to_owned(),
            ..Network::default()
        };
        self.networks.lock().await.push(network.clone());
        info!(nwid = %network.nwid, "mock network created");
        network
    }

    /// Merge `patch` into the stored network the way the controller does.
    pub async fn update_network(&self, nwid: &str, patch: &Value) -> Result<Network, CoreError> {
        let mut networks = self.networks.lock().await;
        let network = networks
            .iter_mut()
            .find(|n| n.nwid == nwid)
            .ok_or_else(|| CoreError::NetworkNotFound {
                nwid: nwid.to_owned(),
            })?;
        *network = merge(&*network, patch)?;
        Ok(network.clone())
    }

    pub async fn delete_network(&self, nwid: &str) {
        self.networks.lock().await.retain(|n| n.nwid != nwid);
    }
}

/// Mock networks have no members; any id reads as a bare member record.
pub fn member(member_id: &str) -> Member {
    Member {
        id: member_id.to_owned(),
        ..Member::default()
    }
}

/// Echo a member update back without storing it.
pub fn update_member(member_id: &str, patch: &Value) -> Result<Member, CoreError> {
    let mut member = merge(&self::member(member_id), patch)?;
    member.id = member_id.to_owned();
    Ok(member)
}

pub fn status() -> ControllerStatus {
    ControllerStatus {
        address: MOCK_ADDRESS.to_owned(),
        version: MOCK_VERSION.to_owned(),
        ..ControllerStatus::default()
    }
}

/// Shallow field merge of a JSON object into a serializable entity.
fn merge<T>(current: &T, patch: &Value) -> Result<T, CoreError>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let Value::Object(patch) = patch else {
        return Err(CoreError::validation("update body must be a JSON object"));
    };
    let mut merged = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => return Err(CoreError::Internal(e.to_string())),
    };
    merged.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
    serde_json::from_value(Value::Object(merged))
        .map_err(|e| CoreError::validation(format!("invalid field value: {e}")))
}
