// JSON files in the data directory.
//
// Every store here is a whole-file JSON document: read it, change it in
// memory, write it back. Writes go to a sibling temp file first and are
// renamed into place so a crash never leaves a truncated document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::settings::{ControllerSettings, SettingsUpdate};

pub const CONTROLLER_SETTINGS_FILE: &str = "controller.json";

// ── Generic JSON file ───────────────────────────────────────────────

/// A JSON document on disk. A missing file reads as `T::default()`.
#[derive(Debug)]
pub struct JsonFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read<T: DeserializeOwned + Default>(&self) -> Result<T, ConfigError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no file yet, using defaults");
                return Ok(T::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })
    }

    pub async fn write<T: Serialize + Sync>(&self, value: &T) -> Result<(), ConfigError> {
        let json = serde_json::to_vec_pretty(value).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })?;

        let _guard = self.write_lock.lock().await;
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

// ── Controller settings ─────────────────────────────────────────────

/// Persisted backend profiles (`controller.json`).
///
/// Read on every request chain; there is no in-memory cache, so edits made
/// by another process are picked up immediately.
#[derive(Debug)]
pub struct SettingsStore {
    file: JsonFile,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    /// Store at `<data_dir>/controller.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(CONTROLLER_SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub async fn load(&self) -> Result<ControllerSettings, ConfigError> {
        self.file.read().await
    }

    pub async fn save(&self, settings: &ControllerSettings) -> Result<(), ConfigError> {
        self.file.write(settings).await
    }

    /// Load, apply a settings form submission, and save.
    ///
    /// Two concurrent updates race; the later write wins.
    pub async fn update(&self, update: SettingsUpdate) -> Result<ControllerSettings, ConfigError> {
        let current = self.load().await?;
        let updated = current.apply_update(update)?;
        self.save(&updated).await?;
        info!(
            profiles = updated.backends.len(),
            active = updated.active_id.as_deref().unwrap_or("-"),
            "controller settings updated"
        );
        Ok(updated)
    }
}
