// Controller HTTP client
//
// Wraps `reqwest::Client` with base-URL handling, auth header injection,
// the retry loop, and failure classification. Endpoint groups (networks,
// members, peers) are implemented as inherent methods in separate files to
// keep this module focused on transport mechanics.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::transport::TransportConfig;

/// Header carrying the controller auth token.
pub const AUTH_HEADER: &str = "X-ZT1-Auth";

/// Maximum number of body bytes copied into logs and error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Result of a single HTTP attempt.
enum Attempt {
    Done(Value),
    /// Worth repeating if the budget allows.
    Transient(Error),
    Fatal(Error),
}

/// Async client for one controller instance.
///
/// Every request carries the `X-ZT1-Auth` header (marked sensitive so it
/// never shows up in debug output). All methods return classified
/// [`Error`]s; raw transport errors never escape this type.
#[derive(Debug, Clone)]
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl ControllerClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, auth token and transport config.
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut token_value = HeaderValue::from_str(token.expose_secret().trim())
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        token_value.set_sensitive(true);
        headers.insert(AUTH_HEADER, token_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self {
            http,
            base_url,
            retry: transport.retry.clone(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            retry,
        })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Endpoint URL from path segments. Each segment is percent-encoded, so
    /// an id containing `/` stays one segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || matches!(**s, "." | ".."))
        {
            return Err(Error::InvalidPathSegment((*bad).to_owned()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidPathSegment(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Raw request ──────────────────────────────────────────────────

    /// Send a request and return the decoded JSON body.
    ///
    /// An empty success body yields `Value::Null`. Transient statuses and
    /// connection failures are retried for GET/POST/DELETE within the
    /// retry budget; everything else fails on the first attempt.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        self.send(method, &url, body).await
    }

    async fn send(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<Value, Error> {
        let max_attempts = self.retry.max_attempts(&method);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(method = %method, url = %url, attempt, "controller request");

            let mut builder = self.http.request(method.clone(), url.clone());
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let outcome = match builder.send().await {
                Ok(resp) => Self::read_response(&method, url, attempt, resp).await,
                Err(e) => Attempt::Transient(classify_transport(url, &e)),
            };

            match outcome {
                Attempt::Done(value) => return Ok(value),
                Attempt::Fatal(err) => return Err(err),
                Attempt::Transient(err) if attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        method = %method,
                        url = %url,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient controller failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Attempt::Transient(err) => return Err(err),
            }
        }
    }

    async fn read_response(
        method: &Method,
        url: &Url,
        attempt: u32,
        resp: reqwest::Response,
    ) -> Attempt {
        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => return Attempt::Transient(classify_transport(url, &e)),
        };

        debug!(
            method = %method,
            url = %url,
            status = status.as_u16(),
            body = preview(&body),
            "controller response"
        );

        if status.is_success() {
            if body.trim().is_empty() {
                return Attempt::Done(Value::Null);
            }
            return match serde_json::from_str(&body) {
                Ok(value) => Attempt::Done(value),
                Err(e) => Attempt::Fatal(Error::Deserialization {
                    message: format!("{e} (body preview: {:?})", preview(&body)),
                    body,
                }),
            };
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Attempt::Fatal(Error::Unauthorized {
                status: status.as_u16(),
            }),
            StatusCode::NOT_FOUND => Attempt::Fatal(Error::NotFound {
                path: url.path().to_owned(),
            }),
            s if RetryPolicy::is_transient_status(s) => Attempt::Transient(Error::Transient {
                status: s.as_u16(),
                attempts: attempt,
            }),
            s => Attempt::Fatal(Error::Upstream {
                status: s.as_u16(),
                message: upstream_message(s, &body),
            }),
        }
    }

    // ── Typed helpers ────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        let value = self.send(Method::GET, &url, None).await?;
        decode(value)
    }

    /// GET that maps a 404 to `None`.
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Option<T>, Error> {
        match self.get(segments).await {
            Ok(value) => Ok(Some(value)),
            Err(Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// POST a JSON body. The controller treats POST as a field merge.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        let body = serde_json::to_value(body).map_err(|e| Error::Encode(e.to_string()))?;
        let value = self.send(Method::POST, &url, Some(&body)).await?;
        decode(value)
    }

    pub(crate) async fn delete(&self, segments: &[&str]) -> Result<Value, Error> {
        let url = self.endpoint(segments)?;
        self.send(Method::DELETE, &url, None).await
    }
}

/// Decode a JSON value, keeping the raw text on failure.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    T::deserialize(&value).map_err(|e| {
        let body = value.to_string();
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        }
    })
}

/// Map a send/read failure onto `Unreachable`, keeping the cause chain.
fn classify_transport(url: &Url, err: &reqwest::Error) -> Error {
    let reason = if err.is_timeout() {
        "timed out".to_owned()
    } else {
        let mut reason = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }
        reason
    };
    Error::Unreachable {
        url: url.to_string(),
        reason,
    }
}

/// Controller error bodies are usually empty or `{"message": "..."}`.
fn upstream_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    if let Ok(ErrorBody {
        message: Some(message),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        return message;
    }
    if body.trim().is_empty() {
        status.to_string()
    } else {
        preview(body).to_owned()
    }
}

/// Truncate to at most `BODY_PREVIEW_LEN` bytes on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW_LEN);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = preview(&body);
        assert!(cut.len() <= BODY_PREVIEW_LEN);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = ControllerClient::normalize_base_url("http://localhost:9993").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9993/");

        let nested = ControllerClient::normalize_base_url("https://host/zt/").unwrap();
        assert_eq!(nested.as_str(), "https://host/zt/");
    }

    fn client(base: &str) -> ControllerClient {
        ControllerClient::from_reqwest(base, reqwest::Client::new(), RetryPolicy::none()).unwrap()
    }

    #[test]
    fn endpoint_encodes_each_segment() {
        let client = client("http://localhost:9993/zt/");
        let url = client
            .endpoint(&["controller", "network", "../../status"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9993/zt/controller/network/..%2F..%2Fstatus"
        );
    }

    #[test]
    fn endpoint_rejects_dot_and_empty_segments() {
        let client = client("http://localhost:9993");
        for bad in ["..", ".", ""] {
            let err = client.endpoint(&["controller", "network", bad]).unwrap_err();
            assert!(matches!(err, Error::InvalidPathSegment(ref s) if s == bad));
        }
    }

    #[test]
    fn upstream_message_prefers_json_message() {
        assert_eq!(
            upstream_message(StatusCode::BAD_REQUEST, r#"{"message":"bad nwid"}"#),
            "bad nwid"
        );
        assert_eq!(
            upstream_message(StatusCode::BAD_REQUEST, ""),
            "400 Bad Request"
        );
    }
}
