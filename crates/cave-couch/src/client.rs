//! Server-level CouchDB client: session lifecycle and database catalog.
//!
//! [`Couch`] holds connection settings and performs the login handshake;
//! [`CouchSession`] is the authenticated client every other handle is
//! derived from. The session token is immutable after login and shared
//! read-only by all handles; one `reqwest::Client` (and therefore one
//! connection pool) backs every request issued through a session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::database::{validate_database_name, Database, DatabaseInfo};
use crate::error::{CouchError, Result};
use crate::session::SessionToken;

/// The role required on the authenticating account.
const ADMIN_ROLE: &str = "_admin";

/// Connection settings for a CouchDB server.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Base URL of the server, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
}

impl CouchConfig {
    /// Create a config for the given base URL with default timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Build an absolute URL for a server-relative path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Default for CouchConfig {
    fn default() -> Self {
        Self::new("http://localhost:5984")
    }
}

/// Credentials payload for `POST /_session`.
#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    name: &'a str,
    password: &'a str,
}

/// Body of the login response.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    roles: Vec<String>,
    error: Option<String>,
    reason: Option<String>,
}

/// Error payload CouchDB attaches to failed operations.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    reason: Option<String>,
}

/// Acknowledgement body (`{ok: true}`).
#[derive(Debug, Deserialize)]
struct OkBody {
    #[serde(default)]
    ok: bool,
}

/// Decode a response body, surfacing CouchDB error payloads uniformly.
///
/// CouchDB signals application failures with an `error` field in the body
/// regardless of HTTP status, so the error probe runs before the typed
/// decode.
pub(crate) async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.bytes().await?;
    if let Ok(ApiErrorBody {
        error: Some(error),
        reason,
    }) = serde_json::from_slice::<ApiErrorBody>(&body)
    {
        return Err(CouchError::Api {
            error,
            reason: reason.unwrap_or_default(),
        });
    }
    Ok(serde_json::from_slice(&body)?)
}

/// An unauthenticated client for one CouchDB server.
#[derive(Debug, Clone)]
pub struct Couch {
    config: CouchConfig,
    http: reqwest::Client,
}

impl Couch {
    /// Create a client for the given server. No network traffic is issued
    /// until [`Couch::login`].
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should never happen
    /// with default TLS).
    #[must_use]
    pub fn connect(config: CouchConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .expect("failed to create HTTP client");
        Self { config, http }
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Obtain a session cookie with the given admin credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The credentials are rejected (`InvalidCredentials`)
    /// - The account lacks the `_admin` role (`InsufficientPrivilege`)
    /// - The response carries no session cookie (`MissingCookie`)
    /// - The request fails at the transport level
    pub async fn login(&self, name: &str, password: &str) -> Result<CouchSession> {
        let url = self.config.url("/_session");
        tracing::debug!(url = %url, name = name, "Logging in");

        let response = self
            .http
            .post(&url)
            .json(&SessionRequest { name, password })
            .send()
            .await?;

        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(SessionToken::parse);

        let body: SessionResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(CouchError::InvalidCredentials(
                body.reason.unwrap_or(error),
            ));
        }
        if !status.is_success() || !body.ok {
            return Err(CouchError::InvalidCredentials(format!("HTTP {status}")));
        }
        if !body.roles.iter().any(|role| role == ADMIN_ROLE) {
            return Err(CouchError::InsufficientPrivilege);
        }

        let token = cookie
            .filter(|token| token.auth_session().is_some_and(|v| !v.is_empty()))
            .ok_or(CouchError::MissingCookie)?;

        tracing::debug!(name = name, "Session established");
        Ok(CouchSession {
            inner: Arc::new(SessionInner {
                http: self.http.clone(),
                config: self.config.clone(),
                token,
                revoked: AtomicBool::new(false),
            }),
        })
    }
}

struct SessionInner {
    http: reqwest::Client,
    config: CouchConfig,
    token: SessionToken,
    revoked: AtomicBool,
}

/// An authenticated CouchDB session.
///
/// Cloning is cheap; clones share the token, the revocation flag, and the
/// underlying connection pool. All database, design, and view handles are
/// derived from a session and carry it internally.
#[derive(Clone)]
pub struct CouchSession {
    inner: Arc<SessionInner>,
}

impl CouchSession {
    /// The session token obtained at login.
    #[must_use]
    pub fn token(&self) -> &SessionToken {
        &self.inner.token
    }

    /// Start an authenticated request for a server-relative path.
    ///
    /// Fails with `SessionRevoked` after [`CouchSession::logout`]; the
    /// stale token is never sent to the wire.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        if self.inner.revoked.load(Ordering::Acquire) {
            return Err(CouchError::SessionRevoked);
        }
        Ok(self
            .inner
            .http
            .request(method, self.inner.config.url(path))
            .header(header::ACCEPT, "application/json")
            .header(header::COOKIE, self.inner.token.cookie_header()))
    }

    /// Invalidate the session server-side and revoke it locally.
    ///
    /// After a successful logout every operation through this session or
    /// any derived handle fails with `SessionRevoked`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is already revoked, the request
    /// fails, or the server does not confirm the deletion.
    pub async fn logout(&self) -> Result<()> {
        let response = self.request(Method::DELETE, "/_session")?.send().await?;
        let body: OkBody = decode(response).await?;
        if !body.ok {
            return Err(CouchError::Api {
                error: "logout_failed".to_string(),
                reason: "server did not confirm session deletion".to_string(),
            });
        }
        self.inner.revoked.store(true, Ordering::Release);
        tracing::debug!("Session revoked");
        Ok(())
    }

    /// List mission databases, filtering out reserved `_`-prefixed names.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn databases(&self) -> Result<Vec<String>> {
        let response = self.request(Method::GET, "/_all_dbs")?.send().await?;
        let names: Vec<String> = decode(response).await?;
        Ok(names
            .into_iter()
            .filter(|name| !name.starts_with('_'))
            .collect())
    }

    /// Probe whether a database exists, without fetching its metadata.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a status outside
    /// {200, 404}. A missing database is `Ok(false)`, not an error.
    pub async fn database_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .request(Method::HEAD, &format!("/{name}"))?
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(CouchError::UnexpectedStatus(status.as_u16())),
        }
    }

    /// Create a new mission database.
    ///
    /// Not idempotent: creating an existing database surfaces the server's
    /// `file_exists` error. Callers wanting create-if-absent semantics
    /// should probe with [`CouchSession::database_exists`] first.
    ///
    /// # Errors
    ///
    /// Returns an error if the name violates CouchDB naming rules, the
    /// database already exists, or the request fails.
    pub async fn create_database(&self, name: &str) -> Result<Database> {
        validate_database_name(name)?;
        let response = self
            .request(Method::PUT, &format!("/{name}"))?
            .send()
            .await?;
        let _: OkBody = decode(response).await?;
        tracing::debug!(db = name, "Created database");
        Ok(Database::new(self.clone(), name))
    }

    /// Fetch summary metadata for a database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database does not exist or the request
    /// fails.
    pub async fn database_info(&self, name: &str) -> Result<DatabaseInfo> {
        let response = self
            .request(Method::GET, &format!("/{name}"))?
            .send()
            .await?;
        decode(response).await
    }

    /// Delete a database and every document in it, designs included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database does not exist or the request
    /// fails.
    pub async fn delete_database(&self, name: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("/{name}"))?
            .send()
            .await?;
        let _: OkBody = decode(response).await?;
        tracing::debug!(db = name, "Deleted database");
        Ok(())
    }

    /// Construct a database handle without any network call.
    ///
    /// The handle is a pure local descriptor; no check is made that the
    /// database exists.
    #[must_use]
    pub fn database(&self, name: &str) -> Database {
        Database::new(self.clone(), name)
    }
}

impl std::fmt::Debug for CouchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouchSession")
            .field("base_url", &self.inner.config.base_url)
            .field("revoked", &self.inner.revoked.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_strips_trailing_slash() {
        let config = CouchConfig::new("http://localhost:5984/");
        assert_eq!(config.base_url, "http://localhost:5984");
        assert_eq!(config.url("/_all_dbs"), "http://localhost:5984/_all_dbs");
    }

    #[test]
    fn default_config() {
        let config = CouchConfig::default();
        assert_eq!(config.base_url, "http://localhost:5984");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn client_creation() {
        let couch = Couch::connect(CouchConfig::default());
        assert_eq!(couch.base_url(), "http://localhost:5984");
    }
}
