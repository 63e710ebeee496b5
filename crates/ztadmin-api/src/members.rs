// Controller member endpoints
//
// `/controller/network/{nwid}/member[/{id}]`.

use serde::Serialize;
use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::{Member, MemberRevisions};

impl ControllerClient {
    /// Member ids of a network with their revision markers.
    ///
    /// `GET /controller/network/{nwid}/member`
    pub async fn list_member_ids(&self, nwid: &str) -> Result<MemberRevisions, Error> {
        debug!(nwid, "listing members");
        self.get(&["controller", "network", nwid, "member"])
            .await
    }

    /// Fetch one member; `None` if the controller answers 404.
    ///
    /// `GET /controller/network/{nwid}/member/{id}`
    pub async fn get_member(&self, nwid: &str, member_id: &str) -> Result<Option<Member>, Error> {
        debug!(nwid, member_id, "fetching member");
        self.get_optional(&["controller", "network", nwid, "member", member_id])
            .await
    }

    /// Merge `patch` into a member and return the updated object.
    ///
    /// `POST /controller/network/{nwid}/member/{id}`
    pub async fn update_member<B: Serialize + Sync>(
        &self,
        nwid: &str,
        member_id: &str,
        patch: &B,
    ) -> Result<Member, Error> {
        debug!(nwid, member_id, "updating member");
        self.post(&["controller", "network", nwid, "member", member_id], patch)
            .await
    }

    /// Remove a member from a network.
    ///
    /// `DELETE /controller/network/{nwid}/member/{id}`
    pub async fn delete_member(&self, nwid: &str, member_id: &str) -> Result<(), Error> {
        debug!(nwid, member_id, "deleting member");
        self.delete(&["controller", "network", nwid, "member", member_id])
            .await?;
        Ok(())
    }
}
