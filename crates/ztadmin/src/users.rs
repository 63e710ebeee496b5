// Local dashboard accounts.
//
// Stored in `users.json` as a map keyed by user name. Passwords are Argon2id
// PHC strings; plaintext never touches disk. Every mutation is a
// read-modify-write under one lock so concurrent edits cannot drop users.

use std::collections::BTreeMap;
use std::path::Path;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use ztadmin_config::{ConfigError, JsonFile};

pub const USERS_FILE: &str = "users.json";
pub const MIN_PASSWORD_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Username and password required")]
    MissingFields,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Cannot delete the last user")]
    LastUser,

    #[error("System already initialized")]
    AlreadyInitialized,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] ConfigError),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    name: String,
    hash: String,
    #[serde(default, alias = "pass_set")]
    pass_set: bool,
}

/// A user as shown to the dashboard. Never carries the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub name: String,
    pub pass_set: bool,
}

impl From<&StoredUser> for UserInfo {
    fn from(user: &StoredUser) -> Self {
        Self {
            name: user.name.clone(),
            pass_set: user.pass_set,
        }
    }
}

type UserMap = BTreeMap<String, StoredUser>;

#[derive(Debug)]
pub struct UserStore {
    file: JsonFile,
    update_lock: Mutex<()>,
}

impl UserStore {
    pub fn new(file: JsonFile) -> Self {
        Self {
            file,
            update_lock: Mutex::new(()),
        }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(JsonFile::new(data_dir.join(USERS_FILE)))
    }

    async fn load(&self) -> Result<UserMap, UserError> {
        Ok(self.file.read().await?)
    }

    pub async fn list(&self) -> Result<Vec<UserInfo>, UserError> {
        Ok(self.load().await?.values().map(UserInfo::from).collect())
    }

    pub async fn count(&self) -> Result<usize, UserError> {
        Ok(self.load().await?.len())
    }

    /// True once any account exists. Until then the dashboard offers setup.
    pub async fn is_initialized(&self) -> Result<bool, UserError> {
        Ok(self.count().await? > 0)
    }

    pub async fn create(&self, name: &str, password: &str) -> Result<UserInfo, UserError> {
        self.insert(name, password, false).await
    }

    /// Create the first account. Fails once any account exists.
    pub async fn create_first(&self, name: &str, password: &str) -> Result<UserInfo, UserError> {
        self.insert(name, password, true).await
    }

    async fn insert(
        &self,
        name: &str,
        password: &str,
        first_only: bool,
    ) -> Result<UserInfo, UserError> {
        let name = name.trim();
        if name.is_empty() || password.is_empty() {
            return Err(UserError::MissingFields);
        }
        check_password(password)?;
        let hash = hash_password(password).await?;

        let _guard = self.update_lock.lock().await;
        let mut users = self.load().await?;
        if first_only && !users.is_empty() {
            return Err(UserError::AlreadyInitialized);
        }
        if users.contains_key(name) {
            return Err(UserError::AlreadyExists(name.to_owned()));
        }

        let user = StoredUser {
            name: name.to_owned(),
            hash,
            pass_set: true,
        };
        let info = UserInfo::from(&user);
        users.insert(name.to_owned(), user);
        self.file.write(&users).await?;
        info!(user = name, "user created");
        Ok(info)
    }

    /// The user when `password` matches, `None` otherwise.
    pub async fn authenticate(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Option<UserInfo>, UserError> {
        let users = self.load().await?;
        let Some(user) = users.get(name) else {
            debug!(user = name, "login for unknown user");
            return Ok(None);
        };
        if verify_password(password, &user.hash).await? {
            Ok(Some(UserInfo::from(user)))
        } else {
            debug!(user = name, "password mismatch");
            Ok(None)
        }
    }

    pub async fn change_password(&self, name: &str, password: &str) -> Result<(), UserError> {
        if password.is_empty() {
            return Err(UserError::MissingFields);
        }
        check_password(password)?;
        let hash = hash_password(password).await?;

        let _guard = self.update_lock.lock().await;
        let mut users = self.load().await?;
        let user = users
            .get_mut(name)
            .ok_or_else(|| UserError::NotFound(name.to_owned()))?;
        user.hash = hash;
        user.pass_set = true;
        self.file.write(&users).await?;
        info!(user = name, "password changed");
        Ok(())
    }

    /// Delete a user. The last remaining user cannot be deleted.
    pub async fn delete(&self, name: &str) -> Result<(), UserError> {
        let _guard = self.update_lock.lock().await;
        let mut users = self.load().await?;
        if !users.contains_key(name) {
            return Err(UserError::NotFound(name.to_owned()));
        }
        if users.len() == 1 {
            return Err(UserError::LastUser);
        }
        users.remove(name);
        self.file.write(&users).await?;
        info!(user = name, "user deleted");
        Ok(())
    }
}

// ── Password hashing ────────────────────────────────────────────────

fn check_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::PasswordTooShort);
    }
    Ok(())
}

// Argon2 work runs on the blocking pool.

async fn hash_password(password: &str) -> Result<String, UserError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::Hash(e.to_string()))
    })
    .await
    .map_err(|e| UserError::Hash(e.to_string()))?
}

async fn verify_password(password: &str, hash: &str) -> Result<bool, UserError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| UserError::Hash(e.to_string()))
}
