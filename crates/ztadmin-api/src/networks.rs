// Controller network endpoints
//
// `/controller/network` and `/controller/network/{nwid}`. Updates are POSTs
// whose body is merged field-by-field into the stored network.

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::{ControllerStatus, Network};

/// Suffix asking the controller to pick the last six hex digits of a new nwid.
pub const NEW_NETWORK_SUFFIX: &str = "______";

impl ControllerClient {
    /// List the ids of every network this controller manages.
    ///
    /// `GET /controller/network`
    pub async fn list_network_ids(&self) -> Result<Vec<String>, Error> {
        debug!("listing network ids");
        self.get(&["controller", "network"]).await
    }

    /// Fetch one network; `None` if the controller answers 404.
    ///
    /// `GET /controller/network/{nwid}`
    pub async fn get_network(&self, nwid: &str) -> Result<Option<Network>, Error> {
        debug!(nwid, "fetching network");
        self.get_optional(&["controller", "network", nwid]).await
    }

    /// Merge `patch` into a network and return the updated object.
    ///
    /// `POST /controller/network/{nwid}`
    pub async fn update_network<B: Serialize + Sync>(
        &self,
        nwid: &str,
        patch: &B,
    ) -> Result<Network, Error> {
        debug!(nwid, "updating network");
        self.post(&["controller", "network", nwid], patch).await
    }

    /// Create a network named `name` on this controller.
    ///
    /// Reads the controller address from `/status`, then
    /// `POST /controller/network/{address}______`.
    pub async fn create_network(&self, name: &str) -> Result<Network, Error> {
        let status = self.status().await?;
        debug!(controller = %status.address, name, "creating network");
        let nwid = format!("{}{NEW_NETWORK_SUFFIX}", status.address);
        self.post(&["controller", "network", nwid.as_str()], &json!({ "name": name }))
            .await
    }

    /// Delete a network.
    ///
    /// `DELETE /controller/network/{nwid}`
    pub async fn delete_network(&self, nwid: &str) -> Result<(), Error> {
        debug!(nwid, "deleting network");
        self.delete(&["controller", "network", nwid]).await?;
        Ok(())
    }

    /// Controller node status (address, version).
    ///
    /// `GET /status`
    pub async fn status(&self) -> Result<ControllerStatus, Error> {
        debug!("fetching controller status");
        self.get(&["status"]).await
    }
}
