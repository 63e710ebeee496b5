// Process configuration for the dashboard server.
//
// Layered with figment: compiled defaults, then the TOML file, then
// `ZT_ADDR` (kept for existing deployments), then `ZTADMIN_*` variables with
// nested keys split on `__` (e.g. `ZTADMIN_CONTROLLER__TIMEOUT_SECS=10`).

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use ztadmin_api::{RetryPolicy, TlsMode, TransportConfig};

use crate::error::ConfigError;
use crate::resolve::{DEFAULT_CONTROLLER_ADDRESS, ResolveOptions};
use crate::settings::StaleActivePolicy;
use crate::token::{DEFAULT_TOKEN_ENV, TokenResolver, default_secret_paths};

const DEFAULT_PORT: u16 = 3000;

// ── Config structs ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Listen address for the dashboard HTTP server.
    pub bind: SocketAddr,
    /// Holds `controller.json`, `users.json` and `member-names.json`.
    pub data_dir: PathBuf,
    /// Mark the session cookie `Secure`. Enable when served behind HTTPS.
    pub secure_cookies: bool,
    pub controller: ControllerDefaults,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            data_dir: default_data_dir(),
            secure_cookies: false,
            controller: ControllerDefaults::default(),
        }
    }
}

/// How to reach a controller when the active profile leaves gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerDefaults {
    /// Used when the active profile has no address.
    pub address: String,
    /// Env var consulted when the profile has no token. Empty disables it.
    pub token_env: String,
    /// `authtoken.secret` locations, tried in order.
    pub secret_paths: Vec<PathBuf>,
    pub stale_active: StaleActivePolicy,
    /// Accept self-signed controller certificates.
    pub insecure: bool,
    /// PEM CA bundle; only used when `insecure` is off.
    pub ca_cert: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for ControllerDefaults {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONTROLLER_ADDRESS.to_owned(),
            token_env: DEFAULT_TOKEN_ENV.to_owned(),
            secret_paths: default_secret_paths(),
            stale_active: StaleActivePolicy::FirstProfile,
            insecure: true,
            ca_cert: None,
            connect_timeout_secs: 5,
            timeout_secs: 30,
            max_retries: 2,
            retry_base_delay_ms: 250,
        }
    }
}

impl ControllerDefaults {
    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
            },
        }
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            default_address: self.address.clone(),
            stale_active: self.stale_active,
            tokens: TokenResolver::new(Some(self.token_env.as_str()), self.secret_paths.clone()),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "ztadmin", "ztadmin")
}

/// Platform config file location (`~/.config/ztadmin/config.toml` on Linux).
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("ztadmin.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn default_data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("data"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

impl DashboardConfig {
    /// The figment this config is extracted from. A missing TOML file is
    /// not an error.
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(
                Env::raw()
                    .only(&["ZT_ADDR"])
                    .map(|_| "controller.address".into()),
            )
            .merge(Env::prefixed("ZTADMIN_").split("__"))
    }

    /// Load from `path`, or from [`config_path`] when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(config_path, Path::to_path_buf);
        let config: Self = Self::figment(&path).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.timeout_secs == 0 {
            return Err(ConfigError::validation(
                "controller.timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.controller.connect_timeout_secs > self.controller.timeout_secs {
            return Err(ConfigError::validation(
                "controller.connect_timeout_secs",
                "must not exceed controller.timeout_secs",
            ));
        }
        url::Url::parse(&self.controller.address).map_err(|e| {
            ConfigError::validation("controller.address", format!("'{}': {e}", self.controller.address))
        })?;
        Ok(())
    }

    /// Render as TOML, e.g. for `--print-config`.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("absent.toml");
            let config = DashboardConfig::load(Some(&path)).map_err(|e| e.to_string())?;
            assert_eq!(config.bind.port(), 3000);
            assert_eq!(config.controller.address, "http://localhost:9993");
            assert_eq!(config.controller.transport().retry, RetryPolicy::default());
            Ok(())
        });
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ztadmin.toml",
                r#"
                bind = "0.0.0.0:8080"
                data_dir = "/srv/ztadmin"

                [controller]
                address = "https://file:9993"
                stale_active = "reject"
                max_retries = 4
                "#,
            )?;
            jail.set_env("ZTADMIN_CONTROLLER__MAX_RETRIES", "1");

            let path = jail.directory().join("ztadmin.toml");
            let config = DashboardConfig::load(Some(&path)).map_err(|e| e.to_string())?;
            assert_eq!(config.bind.port(), 8080);
            assert_eq!(config.data_dir, PathBuf::from("/srv/ztadmin"));
            assert_eq!(config.controller.address, "https://file:9993");
            assert_eq!(config.controller.stale_active, StaleActivePolicy::Reject);
            assert_eq!(config.controller.max_retries, 1);
            Ok(())
        });
    }

    #[test]
    fn zt_addr_sets_default_address() {
        Jail::expect_with(|jail| {
            jail.set_env("ZT_ADDR", "http://10.0.0.5:9993");
            let path = jail.directory().join("absent.toml");
            let config = DashboardConfig::load(Some(&path)).map_err(|e| e.to_string())?;
            assert_eq!(config.controller.address, "http://10.0.0.5:9993");
            Ok(())
        });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("ZTADMIN_CONTROLLER__TIMEOUT_SECS", "0");
            let path = jail.directory().join("absent.toml");
            let err = DashboardConfig::load(Some(&path));
            assert!(matches!(err, Err(ConfigError::Validation { .. })));
            Ok(())
        });
    }

    #[test]
    fn secure_mode_uses_custom_ca() {
        let controller = ControllerDefaults {
            insecure: false,
            ca_cert: Some(PathBuf::from("/etc/ztadmin/ca.pem")),
            ..ControllerDefaults::default()
        };
        assert_eq!(
            controller.transport().tls,
            TlsMode::CustomCa(PathBuf::from("/etc/ztadmin/ca.pem"))
        );
    }
}
