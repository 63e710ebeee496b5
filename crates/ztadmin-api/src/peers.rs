// Node peer endpoints
//
// Liveness and path information, joined with members by node address.

use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::Peer;

impl ControllerClient {
    /// All peers known to the controller node.
    ///
    /// `GET /peer`
    pub async fn list_peers(&self) -> Result<Vec<Peer>, Error> {
        debug!("listing peers");
        self.get(&["peer"]).await
    }

    /// One peer; `None` if unknown.
    ///
    /// `GET /peer/{address}`
    pub async fn get_peer(&self, address: &str) -> Result<Option<Peer>, Error> {
        debug!(address, "fetching peer");
        self.get_optional(&["peer", address]).await
    }
}
