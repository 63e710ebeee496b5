//! Configuration for ztadmin.
//!
//! Two kinds of state live here. Controller settings (`controller.json`)
//! hold the backend profiles an operator edits from the dashboard; they are
//! re-read for every request chain and resolved into an [`EffectiveConfig`]
//! by [`resolve_effective_config`]. [`DashboardConfig`] is the process-level
//! configuration loaded once at startup from defaults, TOML and environment.

pub mod dashboard;
pub mod error;
pub mod resolve;
pub mod settings;
pub mod store;
pub mod token;

pub use dashboard::{ControllerDefaults, DashboardConfig, config_path};
pub use error::ConfigError;
pub use resolve::{
    DEFAULT_CONTROLLER_ADDRESS, EffectiveConfig, ResolveOptions, resolve_effective_config,
};
pub use settings::{
    BackendProfile, ControllerSettings, SettingsUpdate, StaleActivePolicy, TOKEN_MASK,
};
pub use store::{JsonFile, SettingsStore};
pub use token::{TokenResolver, TokenSource};
