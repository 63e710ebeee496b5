// In-memory login sessions.
//
// A session is a random token in an HttpOnly cookie mapped to a user name
// and an expiry. Sessions do not survive a restart.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "ztadmin_session";
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone)]
struct SessionEntry {
    user: String,
    expires_at: DateTime<Utc>,
}

/// The logged-in user, placed in request extensions by [`require_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub String);

#[derive(Debug)]
pub struct Sessions {
    entries: DashMap<String, SessionEntry>,
    secure_cookies: bool,
}

impl Sessions {
    pub fn new(secure_cookies: bool) -> Self {
        Self {
            entries: DashMap::new(),
            secure_cookies,
        }
    }

    /// Start a session for `user` and return its token.
    pub fn create(&self, user: &str) -> String {
        self.purge_expired();
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.entries.insert(token.clone(), SessionEntry {
            user: user.to_owned(),
            expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
        });
        token
    }

    /// The user behind a live token. Expired tokens are dropped.
    pub fn user(&self, token: &str) -> Option<String> {
        let entry = self.entries.get(token)?;
        if entry.expires_at > Utc::now() {
            return Some(entry.user.clone());
        }
        drop(entry);
        self.entries.remove(token);
        debug!("session expired");
        None
    }

    pub fn revoke(&self, token: &str) {
        self.entries.remove(token);
    }

    /// Drop every session of `user`, e.g. after the account is deleted.
    pub fn revoke_user(&self, user: &str) {
        self.entries.retain(|_, entry| entry.user != user);
    }

    fn purge_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookies)
            .max_age(cookie::time::Duration::days(SESSION_TTL_DAYS))
            .build()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookies)
            .max_age(cookie::time::Duration::ZERO)
            .build()
    }
}

/// Reject requests without a live session cookie.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.user(cookie.value()))
        .ok_or_else(ApiError::session_required)?;

    req.extensions_mut().insert(SessionUser(user));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_lookup_revoke() {
        let sessions = Sessions::new(false);
        let token = sessions.create("admin");
        assert_eq!(token.len(), 64);
        assert_eq!(sessions.user(&token).as_deref(), Some("admin"));
        assert_eq!(sessions.user("not-a-token"), None);

        sessions.revoke(&token);
        assert_eq!(sessions.user(&token), None);
    }

    #[test]
    fn expired_session_is_dropped() {
        let sessions = Sessions::new(false);
        sessions.entries.insert("stale".into(), SessionEntry {
            user: "admin".into(),
            expires_at: Utc::now() - Duration::seconds(1),
        });
        assert_eq!(sessions.user("stale"), None);
        assert!(sessions.entries.is_empty());
    }

    #[test]
    fn revoke_user_drops_all_their_sessions() {
        let sessions = Sessions::new(false);
        let a = sessions.create("admin");
        let b = sessions.create("admin");
        let other = sessions.create("ops");

        sessions.revoke_user("admin");
        assert_eq!(sessions.user(&a), None);
        assert_eq!(sessions.user(&b), None);
        assert_eq!(sessions.user(&other).as_deref(), Some("ops"));
    }

    #[test]
    fn cookie_attributes() {
        let session_cookie = Sessions::new(true).cookie("abc".into());
        assert_eq!(session_cookie.name(), SESSION_COOKIE);
        assert_eq!(session_cookie.http_only(), Some(true));
        assert_eq!(session_cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(session_cookie.secure(), Some(true));
        assert_eq!(
            session_cookie.max_age(),
            Some(cookie::time::Duration::days(SESSION_TTL_DAYS))
        );
    }
}
