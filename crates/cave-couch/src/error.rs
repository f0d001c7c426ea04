//! Error types for the CouchDB client.
//!
//! Every failure surfaced by this crate falls into one of three groups:
//! transport failures (the request never produced a usable response),
//! application failures (CouchDB answered with an error payload), and
//! precondition failures (the caller violated the client contract before
//! anything was sent to the wire).

use thiserror::Error;

/// A result type using `CouchError`.
pub type Result<T> = std::result::Result<T, CouchError>;

/// Errors that can occur while talking to CouchDB.
#[derive(Debug, Error)]
pub enum CouchError {
    /// The request failed at the transport level (connection, timeout,
    /// response framing). Never retried by the client.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not valid JSON for the expected shape.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// CouchDB answered with an error payload (`{error, reason}`).
    #[error("couchdb error: {error}: {reason}")]
    Api {
        /// The server's error token, e.g. `not_found` or `conflict`.
        error: String,
        /// The server's human-readable reason.
        reason: String,
    },

    /// The login credentials were rejected.
    #[error("login failed: {0}")]
    InvalidCredentials(String),

    /// The account authenticated but lacks the `_admin` role.
    #[error("not an administrator")]
    InsufficientPrivilege,

    /// The login response carried no usable `Set-Cookie` header.
    #[error("login response carried no session cookie")]
    MissingCookie,

    /// The session was logged out; no further requests may be issued
    /// through it or any handle derived from it.
    #[error("session has been logged out")]
    SessionRevoked,

    /// The database name violates CouchDB naming rules.
    #[error("invalid database name: {0:?}")]
    InvalidDatabaseName(String),

    /// A view query was constructed with an empty key.
    #[error("empty view key")]
    EmptyKey,

    /// A design document was built from an empty map script.
    #[error("map script missing for view {0:?}")]
    MissingScript(String),

    /// An existence probe returned a status outside its defined set.
    #[error("unexpected status: {0}")]
    UnexpectedStatus(u16),
}

impl CouchError {
    /// Returns `true` if the server reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { error, .. } if error == "not_found")
    }

    /// Returns `true` if the server reported a document update conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { error, .. } if error == "conflict" || error == "file_exists")
    }

    /// Returns `true` for contract violations that were caught before any
    /// request was sent.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::SessionRevoked
                | Self::InvalidDatabaseName(_)
                | Self::EmptyKey
                | Self::MissingScript(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        let err = CouchError::Api {
            error: "not_found".to_string(),
            reason: "missing".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
    }

    #[test]
    fn conflict_classification() {
        let err = CouchError::Api {
            error: "conflict".to_string(),
            reason: "Document update conflict.".to_string(),
        };
        assert!(err.is_conflict());

        let err = CouchError::Api {
            error: "file_exists".to_string(),
            reason: "The database could not be created".to_string(),
        };
        assert!(err.is_conflict());
    }

    #[test]
    fn precondition_classification() {
        assert!(CouchError::SessionRevoked.is_precondition());
        assert!(CouchError::EmptyKey.is_precondition());
        assert!(!CouchError::InsufficientPrivilege.is_precondition());
    }
}
