// Backend profiles and the persisted controller settings record.
//
// The record has had three on-disk shapes over time. All of them are read;
// only the current `{activeId, backends}` shape is ever written.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::ConfigError;

/// Placeholder shown instead of a stored token. Echoing it back on update
/// keeps the stored value.
pub const TOKEN_MASK: &str = "******";

/// Id and name given to the implicit profile read from a legacy record.
pub const LEGACY_PROFILE_ID: &str = "default";
pub const LEGACY_PROFILE_NAME: &str = "Default";

// ── Profiles ────────────────────────────────────────────────────────

/// One controller instance the dashboard can talk to.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendProfile {
    pub id: String,
    pub name: String,
    /// Base URL; empty means "use the configured default address".
    pub address: String,
    /// Auth token; empty means "fall through to the token resolver".
    pub token: String,
}

impl fmt::Debug for BackendProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address)
            .field("token", &if self.token.is_empty() { "" } else { TOKEN_MASK })
            .finish()
    }
}

/// What to do when `activeId` matches no stored profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaleActivePolicy {
    /// Treat the first stored profile as active.
    #[default]
    FirstProfile,
    /// Fail with [`ConfigError::UnknownActiveProfile`].
    Reject,
}

// ── Settings record ─────────────────────────────────────────────────

/// Controller settings as stored in `controller.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredSettings")]
pub struct ControllerSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_id: Option<String>,
    pub backends: Vec<BackendProfile>,
}

/// Union of every shape the record has had on disk.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredSettings {
    active_id: Option<String>,
    backends: Option<Vec<BackendProfile>>,
    // `{address, token}`
    address: Option<String>,
    token: Option<String>,
    // `{ztAddr, ztToken}` from the single-controller settings page
    zt_addr: Option<String>,
    zt_token: Option<String>,
}

impl From<StoredSettings> for ControllerSettings {
    fn from(raw: StoredSettings) -> Self {
        if let Some(backends) = raw.backends {
            return Self {
                active_id: raw.active_id.filter(|id| !id.is_empty()),
                backends,
            };
        }

        let address = raw.address.or(raw.zt_addr);
        let token = raw.token.or(raw.zt_token);
        if address.is_none() && token.is_none() {
            return Self::default();
        }

        Self {
            active_id: Some(LEGACY_PROFILE_ID.to_owned()),
            backends: vec![BackendProfile {
                id: LEGACY_PROFILE_ID.to_owned(),
                name: LEGACY_PROFILE_NAME.to_owned(),
                address: address.unwrap_or_default(),
                token: token.unwrap_or_default(),
            }],
        }
    }
}

impl ControllerSettings {
    /// The active profile, or `None` when no profiles are stored.
    pub fn active_profile(
        &self,
        policy: StaleActivePolicy,
    ) -> Result<Option<&BackendProfile>, ConfigError> {
        let Some(first) = self.backends.first() else {
            return Ok(None);
        };
        let Some(active_id) = self.active_id.as_deref() else {
            return Ok(Some(first));
        };

        match self.backends.iter().find(|p| p.id == active_id) {
            Some(profile) => Ok(Some(profile)),
            None => match policy {
                StaleActivePolicy::FirstProfile => Ok(Some(first)),
                StaleActivePolicy::Reject => Err(ConfigError::UnknownActiveProfile {
                    id: active_id.to_owned(),
                }),
            },
        }
    }

    /// Copy safe to hand to the browser: stored tokens become [`TOKEN_MASK`].
    pub fn masked(&self) -> Self {
        let backends = self
            .backends
            .iter()
            .map(|p| BackendProfile {
                token: if p.token.is_empty() {
                    String::new()
                } else {
                    TOKEN_MASK.to_owned()
                },
                ..p.clone()
            })
            .collect();
        Self {
            active_id: self.active_id.clone(),
            backends,
        }
    }

    /// Apply a settings form submission on top of the stored record.
    ///
    /// The client sends the whole profile list. A token equal to the mask
    /// keeps the stored token of the profile with the same id; an empty
    /// token clears it. If the requested active profile is gone, the first
    /// remaining one is promoted.
    pub fn apply_update(&self, update: SettingsUpdate) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut backends = Vec::with_capacity(update.backends.len());

        for incoming in update.backends {
            let id = match incoming.id.trim() {
                "" => Uuid::new_v4().to_string(),
                id => id.to_owned(),
            };
            if !seen.insert(id.clone()) {
                return Err(ConfigError::validation(
                    "backends",
                    format!("duplicate profile id '{id}'"),
                ));
            }

            let address = incoming.address.trim().to_owned();
            if !address.is_empty() {
                Url::parse(&address).map_err(|e| {
                    ConfigError::validation("address", format!("'{address}': {e}"))
                })?;
            }

            let token = if incoming.token == TOKEN_MASK {
                self.backends
                    .iter()
                    .find(|p| p.id == id)
                    .map(|p| p.token.clone())
                    .unwrap_or_default()
            } else {
                incoming.token.trim().to_owned()
            };

            let name = match incoming.name.trim() {
                "" if address.is_empty() => LEGACY_PROFILE_NAME.to_owned(),
                "" => address.clone(),
                name => name.to_owned(),
            };

            backends.push(BackendProfile {
                id,
                name,
                address,
                token,
            });
        }

        let wanted = update.active_id.or_else(|| self.active_id.clone());
        let active_id = wanted
            .filter(|id| backends.iter().any(|p| &p.id == id))
            .or_else(|| backends.first().map(|p| p.id.clone()));

        Ok(Self {
            active_id,
            backends,
        })
    }
}

/// Body of a settings update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub active_id: Option<String>,
    pub backends: Vec<BackendProfile>,
}
