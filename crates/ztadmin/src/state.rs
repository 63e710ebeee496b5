//! Shared application state for the dashboard server.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ztadmin_config::{DashboardConfig, SettingsStore};
use ztadmin_core::{Backend, BackendSelector, CoreError, MemberNames, MockController};

use crate::session::Sessions;
use crate::users::UserStore;

/// Everything a handler needs, shared as `Arc<AppState>`.
pub struct AppState {
    /// Picks a live or mock backend per request chain.
    pub selector: BackendSelector,
    /// Local member display names.
    pub names: MemberNames,
    pub users: UserStore,
    pub sessions: Sessions,
    /// Persisted controller profiles, edited from the settings page.
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    /// Build state rooted at `data_dir`, with the controller defaults from
    /// `config`.
    pub fn new(config: &DashboardConfig, data_dir: &Path) -> Self {
        let settings = Arc::new(SettingsStore::in_dir(data_dir));
        let selector = BackendSelector::new(
            Arc::clone(&settings),
            config.controller.resolve_options(),
            config.controller.transport(),
            MockController::default(),
        );

        Self {
            selector,
            names: MemberNames::in_dir(data_dir),
            users: UserStore::in_dir(data_dir),
            sessions: Sessions::new(config.secure_cookies),
            settings,
        }
    }

    pub async fn backend(&self) -> Result<Backend, CoreError> {
        self.selector.select().await
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings.path())
            .finish_non_exhaustive()
    }
}
