// Effective controller address and token for one request chain.

use secrecy::SecretString;
use tracing::debug;

use crate::error::ConfigError;
use crate::settings::{ControllerSettings, StaleActivePolicy};
use crate::token::TokenResolver;

/// Fallback controller address when neither profile nor config set one.
pub const DEFAULT_CONTROLLER_ADDRESS: &str = "http://localhost:9993";

/// Where to send controller requests and with which token.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub address: String,
    pub token: SecretString,
    /// Id of the profile this came from, `None` when no profiles exist.
    pub profile_id: Option<String>,
}

/// Inputs that do not live in the settings record.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub default_address: String,
    pub stale_active: StaleActivePolicy,
    pub tokens: TokenResolver,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            default_address: DEFAULT_CONTROLLER_ADDRESS.to_owned(),
            stale_active: StaleActivePolicy::default(),
            tokens: TokenResolver::default(),
        }
    }
}

/// Pick the active profile and fill in its address and token.
pub async fn resolve_effective_config(
    settings: &ControllerSettings,
    options: &ResolveOptions,
) -> Result<EffectiveConfig, ConfigError> {
    let profile = settings.active_profile(options.stale_active)?;

    let address = profile
        .map(|p| p.address.trim())
        .filter(|a| !a.is_empty())
        .unwrap_or(options.default_address.as_str())
        .to_owned();
    let profile_token = profile.map_or("", |p| p.token.as_str());
    let token = options.tokens.resolve(profile_token).await?;
    let profile_id = profile.map(|p| p.id.clone());

    debug!(
        %address,
        profile = profile_id.as_deref().unwrap_or("-"),
        "resolved controller config"
    );
    Ok(EffectiveConfig {
        address,
        token,
        profile_id,
    })
}
