// Controller auth token lookup.
//
// A profile's own token wins. Otherwise the resolver walks an ordered list
// of fallbacks: an environment variable, then the `authtoken.secret` files a
// locally installed controller writes on Linux, Windows and macOS.

use std::path::PathBuf;

use secrecy::SecretString;
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable consulted when the profile has no token.
pub const DEFAULT_TOKEN_ENV: &str = "ZT_TOKEN";

/// Well-known secret locations, in lookup order.
pub fn default_secret_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/var/lib/zerotier-one/authtoken.secret"),
        PathBuf::from(r"C:\ProgramData\ZeroTier\One\authtoken.secret"),
    ];
    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        paths.push(
            PathBuf::from(home)
                .join("Library/Application Support/ZeroTier/One/authtoken.secret"),
        );
    }
    paths
}

/// One place a token may come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Env(String),
    File(PathBuf),
}

impl TokenSource {
    fn describe(&self) -> String {
        match self {
            Self::Env(name) => format!("${name}"),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Trimmed, non-empty token from this source.
    async fn read(&self) -> Option<String> {
        let raw = match self {
            Self::Env(name) => std::env::var(name).ok()?,
            Self::File(path) => tokio::fs::read_to_string(path).await.ok()?,
        };
        let token = raw.trim();
        (!token.is_empty()).then(|| token.to_owned())
    }
}

/// Ordered token fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResolver {
    sources: Vec<TokenSource>,
}

impl Default for TokenResolver {
    fn default() -> Self {
        Self::new(Some(DEFAULT_TOKEN_ENV), default_secret_paths())
    }
}

impl TokenResolver {
    pub fn new(env_var: Option<&str>, secret_paths: Vec<PathBuf>) -> Self {
        let sources = env_var
            .filter(|name| !name.is_empty())
            .map(|name| TokenSource::Env(name.to_owned()))
            .into_iter()
            .chain(secret_paths.into_iter().map(TokenSource::File))
            .collect();
        Self { sources }
    }

    /// A resolver with no fallbacks: only profile tokens count.
    pub fn profile_only() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn sources(&self) -> &[TokenSource] {
        &self.sources
    }

    /// Resolve the effective token for a profile.
    ///
    /// Fails with [`ConfigError::TokenNotFound`] listing every searched
    /// source when all of them are empty or unreadable.
    pub async fn resolve(&self, profile_token: &str) -> Result<SecretString, ConfigError> {
        let profile_token = profile_token.trim();
        if !profile_token.is_empty() {
            return Ok(SecretString::from(profile_token.to_owned()));
        }

        for source in &self.sources {
            if let Some(token) = source.read().await {
                debug!(source = %source.describe(), "controller token resolved");
                return Ok(SecretString::from(token));
            }
        }

        let mut searched = vec!["profile".to_owned()];
        searched.extend(self.sources.iter().map(TokenSource::describe));
        Err(ConfigError::TokenNotFound { searched })
    }
}
