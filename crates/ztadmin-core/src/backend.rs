// Live or mock controller access, chosen once per request chain.
//
// Every dashboard action starts by calling `BackendSelector::select`, which
// re-reads the stored settings, resolves the effective address and token,
// and hands back either a live client or the shared mock.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, warn};

use ztadmin_api::{
    ControllerClient, ControllerStatus, Member, MemberRevisions, Network, Peer, TransportConfig,
};
use ztadmin_config::{
    ConfigError, ControllerSettings, ResolveOptions, SettingsStore, resolve_effective_config,
};

use crate::error::CoreError;
use crate::mock::{self, MockController};

/// The controller a request chain talks to.
#[derive(Debug, Clone)]
pub enum Backend {
    Live(ControllerClient),
    /// No token anywhere: serve sample data instead of failing.
    Mock(MockController),
}

impl Backend {
    /// Pick a backend for the given settings.
    ///
    /// A missing token selects the mock; every other configuration error
    /// is returned.
    pub async fn select(
        settings: &ControllerSettings,
        options: &ResolveOptions,
        transport: &TransportConfig,
        mock: &MockController,
    ) -> Result<Self, CoreError> {
        match resolve_effective_config(settings, options).await {
            Ok(effective) => {
                let client =
                    ControllerClient::new(&effective.address, &effective.token, transport)?;
                Ok(Self::Live(client))
            }
            Err(ConfigError::TokenNotFound { searched }) => {
                warn!(
                    searched = %searched.join(", "),
                    "no controller token found, using mock mode"
                );
                Ok(Self::Mock(mock.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }

    // ── Networks ─────────────────────────────────────────────────────

    /// Every network with full details.
    ///
    /// Details are fetched concurrently. A network deleted between the id
    /// listing and its detail fetch is skipped.
    pub async fn list_networks(&self) -> Result<Vec<Network>, CoreError> {
        match self {
            Self::Live(client) => {
                let ids = client.list_network_ids().await?;
                let details = try_join_all(ids.iter().map(|nwid| client.get_network(nwid))).await?;
                let networks: Vec<Network> = details.into_iter().flatten().collect();
                if networks.len() < ids.len() {
                    debug!(
                        listed = ids.len(),
                        fetched = networks.len(),
                        "some networks vanished while listing"
                    );
                }
                Ok(networks)
            }
            Self::Mock(mock) => Ok(mock.list_networks().await),
        }
    }

    pub async fn get_network(&self, nwid: &str) -> Result<Option<Network>, CoreError> {
        match self {
            Self::Live(client) => Ok(client.get_network(nwid).await?),
            Self::Mock(mock) => Ok(mock.get_network(nwid).await),
        }
    }

    /// Like [`get_network`](Self::get_network) but absence is an error.
    pub async fn require_network(&self, nwid: &str) -> Result<Network, CoreError> {
        self.get_network(nwid)
            .await?
            .ok_or_else(|| CoreError::NetworkNotFound {
                nwid: nwid.to_owned(),
            })
    }

    pub async fn create_network(&self, name: &str) -> Result<Network, CoreError> {
        match self {
            Self::Live(client) => Ok(client.create_network(name).await?),
            Self::Mock(mock) => Ok(mock.create_network(name).await),
        }
    }

    /// Merge `patch` (a JSON object) into a network.
    pub async fn update_network(&self, nwid: &str, patch: &Value) -> Result<Network, CoreError> {
        match self {
            Self::Live(client) => Ok(client.update_network(nwid, patch).await?),
            Self::Mock(mock) => mock.update_network(nwid, patch).await,
        }
    }

    pub async fn delete_network(&self, nwid: &str) -> Result<(), CoreError> {
        match self {
            Self::Live(client) => Ok(client.delete_network(nwid).await?),
            Self::Mock(mock) => {
                mock.delete_network(nwid).await;
                Ok(())
            }
        }
    }

    // ── Members ──────────────────────────────────────────────────────

    pub async fn list_member_ids(&self, nwid: &str) -> Result<MemberRevisions, CoreError> {
        match self {
            Self::Live(client) => Ok(client.list_member_ids(nwid).await?),
            Self::Mock(_) => Ok(MemberRevisions::default()),
        }
    }

    pub async fn get_member(&self, nwid: &str, member_id: &str) -> Result<Option<Member>, CoreError> {
        match self {
            Self::Live(client) => Ok(client.get_member(nwid, member_id).await?),
            Self::Mock(_) => Ok(Some(mock::member(member_id))),
        }
    }

    pub async fn require_member(&self, nwid: &str, member_id: &str) -> Result<Member, CoreError> {
        self.get_member(nwid, member_id)
            .await?
            .ok_or_else(|| CoreError::MemberNotFound {
                nwid: nwid.to_owned(),
                member_id: member_id.to_owned(),
            })
    }

    pub async fn update_member(
        &self,
        nwid: &str,
        member_id: &str,
        patch: &Value,
    ) -> Result<Member, CoreError> {
        match self {
            Self::Live(client) => Ok(client.update_member(nwid, member_id, patch).await?),
            Self::Mock(_) => mock::update_member(member_id, patch),
        }
    }

    pub async fn delete_member(&self, nwid: &str, member_id: &str) -> Result<(), CoreError> {
        match self {
            Self::Live(client) => Ok(client.delete_member(nwid, member_id).await?),
            Self::Mock(_) => Ok(()),
        }
    }

    // ── Node ─────────────────────────────────────────────────────────

    pub async fn list_peers(&self) -> Result<Vec<Peer>, CoreError> {
        match self {
            Self::Live(client) => Ok(client.list_peers().await?),
            Self::Mock(_) => Ok(Vec::new()),
        }
    }

    pub async fn status(&self) -> Result<ControllerStatus, CoreError> {
        match self {
            Self::Live(client) => Ok(client.status().await?),
            Self::Mock(_) => Ok(mock::status()),
        }
    }
}

// ── Selector ────────────────────────────────────────────────────────

/// Everything needed to pick a [`Backend`] for a new request chain.
#[derive(Debug, Clone)]
pub struct BackendSelector {
    settings: Arc<SettingsStore>,
    options: ResolveOptions,
    transport: TransportConfig,
    mock: MockController,
}

impl BackendSelector {
    pub fn new(
        settings: Arc<SettingsStore>,
        options: ResolveOptions,
        transport: TransportConfig,
        mock: MockController,
    ) -> Self {
        Self {
            settings,
            options,
            transport,
            mock,
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn resolve_options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Re-read the stored settings and pick a backend.
    pub async fn select(&self) -> Result<Backend, CoreError> {
        let settings = self.settings.load().await?;
        Backend::select(&settings, &self.options, &self.transport, &self.mock).await
    }
}
