// Local display names for members.
//
// The controller has no field for a human-readable member name, so names
// live in `member-names.json`, keyed by member id.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::sync::Mutex;
use tracing::debug;

use ztadmin_config::JsonFile;

use crate::error::CoreError;

pub const MEMBER_NAMES_FILE: &str = "member-names.json";

#[derive(Debug)]
pub struct MemberNames {
    file: JsonFile,
    /// Held across load, edit and write.
    update_lock: Mutex<()>,
}

impl MemberNames {
    pub fn new(file: JsonFile) -> Self {
        Self {
            file,
            update_lock: Mutex::new(()),
        }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(JsonFile::new(data_dir.join(MEMBER_NAMES_FILE)))
    }

    pub async fn all(&self) -> Result<BTreeMap<String, String>, CoreError> {
        Ok(self.file.read().await?)
    }

    pub async fn get(&self, member_id: &str) -> Result<Option<String>, CoreError> {
        Ok(self.all().await?.remove(member_id))
    }

    /// Set a name; an empty name removes the entry.
    pub async fn set(&self, member_id: &str, name: &str) -> Result<(), CoreError> {
        let _guard = self.update_lock.lock().await;
        let mut names = self.all().await?;
        let name = name.trim();
        if name.is_empty() {
            names.remove(member_id);
        } else {
            names.insert(member_id.to_owned(), name.to_owned());
        }
        self.file.write(&names).await?;
        debug!(member_id, "member name stored");
        Ok(())
    }

    pub async fn remove(&self, member_id: &str) -> Result<(), CoreError> {
        let _guard = self.update_lock.lock().await;
        let mut names = self.all().await?;
        if names.remove(member_id).is_some() {
            self.file.write(&names).await?;
        }
        Ok(())
    }
}
