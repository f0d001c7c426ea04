//! Database handle: document CRUD and design-document lifecycle.
//!
//! A mission is stored as one CouchDB database; every event that takes
//! place during the mission is added to it as a document. Handles are
//! lightweight descriptors (session + name) that can be recreated freely.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::{decode, CouchSession};
use crate::design::{Design, DesignDocument};
use crate::error::{CouchError, Result};
use crate::view::View;

/// Path prefix CouchDB reserves for design documents.
const DESIGN_PREFIX: &str = "_design/";

/// Characters CouchDB allows in database names after the leading letter.
const NAME_CHARSET: &str = "_$()+-/";

/// Validate a database name against CouchDB naming rules: lowercase,
/// starting with a letter (in particular, no leading underscore).
pub(crate) fn validate_database_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_lowercase()
                && chars.all(|c| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || NAME_CHARSET.contains(c)
                })
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CouchError::InvalidDatabaseName(name.to_string()))
    }
}

/// Compose the conventional chronological document identifier for an
/// event: `<stamp>-<source>`.
///
/// CouchDB indexes are ordered lexically, so numeric stamp components must
/// be zero-padded by the caller for lexical and chronological order to
/// coincide (`"00100"`, not `"100"`).
#[must_use]
pub fn event_id(stamp: &str, source: &str) -> String {
    format!("{stamp}-{source}")
}

/// Summary metadata for a database (`GET /{db}`).
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseInfo {
    /// The database name.
    pub db_name: String,
    /// Number of live documents, design documents included.
    pub doc_count: u64,
    /// Number of deleted documents still tracked.
    pub doc_del_count: u64,
    /// Storage footprint.
    #[serde(default)]
    pub sizes: DatabaseSizes,
}

/// Storage size breakdown reported by the server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSizes {
    /// Bytes on disk.
    pub file: u64,
    /// Bytes of live data inside the file.
    pub active: u64,
    /// Uncompressed external size of the documents.
    pub external: u64,
}

/// Acknowledgement of a successful document write.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteReceipt {
    /// Always `true` on the success path.
    pub ok: bool,
    /// The identifier the document was stored under.
    pub id: String,
    /// The server-assigned revision token.
    pub rev: String,
}

/// Rows of `GET /{db}/_design_docs`.
#[derive(Debug, Deserialize)]
struct DesignDocsPage {
    rows: Vec<DesignDocsRow>,
}

#[derive(Debug, Deserialize)]
struct DesignDocsRow {
    id: String,
}

/// A handle to one mission database.
#[derive(Debug, Clone)]
pub struct Database {
    session: CouchSession,
    name: String,
}

impl Database {
    pub(crate) fn new(session: CouchSession, name: &str) -> Self {
        Self {
            session,
            name: name.to_string(),
        }
    }

    /// The database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch a document by identifier.
    ///
    /// The returned document carries the server-assigned `_id` and `_rev`
    /// fields alongside the caller-supplied ones.
    ///
    /// # Errors
    ///
    /// Fails with a `not_found` application error if the document does not
    /// exist (see [`CouchError::is_not_found`]), or on transport failure.
    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<T> {
        let response = self
            .session
            .request(Method::GET, &format!("/{}/{id}", self.name))?
            .send()
            .await?;
        decode(response).await
    }

    /// Write a document at the given identifier.
    ///
    /// Identifiers must be unique across the database; reusing one without
    /// supplying the current revision surfaces the server's `conflict`
    /// error (see [`CouchError::is_conflict`]). The client performs no
    /// uniqueness checking of its own.
    ///
    /// # Errors
    ///
    /// Fails on write conflict, validation error, or transport failure.
    pub async fn put<T: Serialize>(&self, id: &str, doc: &T) -> Result<WriteReceipt> {
        let response = self
            .session
            .request(Method::PUT, &format!("/{}/{id}", self.name))?
            .json(doc)
            .send()
            .await?;
        let receipt: WriteReceipt = decode(response).await?;
        tracing::debug!(db = %self.name, id = %receipt.id, rev = %receipt.rev, "Stored document");
        Ok(receipt)
    }

    /// Upload a design document under the given name.
    ///
    /// # Errors
    ///
    /// Fails on conflict, validation error, or transport failure.
    pub async fn put_design(&self, name: &str, design: &DesignDocument) -> Result<Design> {
        let response = self
            .session
            .request(Method::PUT, &format!("/{}/_design/{name}", self.name))?
            .json(design)
            .send()
            .await?;
        let receipt: WriteReceipt = decode(response).await?;
        tracing::debug!(db = %self.name, design = name, rev = %receipt.rev, "Stored design");
        Ok(Design::new(self.session.clone(), &self.name, name))
    }

    /// List design documents, stripped of the `_design/` prefix to yield
    /// bare product names.
    ///
    /// # Errors
    ///
    /// Fails if the database does not exist or on transport failure.
    pub async fn designs(&self) -> Result<Vec<String>> {
        let response = self
            .session
            .request(Method::GET, &format!("/{}/_design_docs", self.name))?
            .send()
            .await?;
        let page: DesignDocsPage = decode(response).await?;
        Ok(page
            .rows
            .into_iter()
            .map(|row| {
                row.id
                    .strip_prefix(DESIGN_PREFIX)
                    .map(str::to_string)
                    .unwrap_or(row.id)
            })
            .collect())
    }

    /// Construct a design handle without any network call.
    #[must_use]
    pub fn design(&self, name: &str) -> Design {
        Design::new(self.session.clone(), &self.name, name)
    }

    /// Construct a handle on a product's default view without any network
    /// call. No check is made that the design exists.
    #[must_use]
    pub fn view(&self, design_name: &str) -> View {
        self.design(design_name).default_view()
    }

    /// The database's built-in primary index, ordered by document
    /// identifier. Behaves like a named view for range queries and embeds
    /// the documents in the returned rows.
    #[must_use]
    pub fn all_docs(&self) -> View {
        View::all_docs(self.session.clone(), &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mission_shaped_names() {
        assert!(validate_database_name("test_mission").is_ok());
        assert!(validate_database_name("m2020-07-17").is_ok());
        assert!(validate_database_name("sensors").is_ok());
    }

    #[test]
    fn rejects_reserved_and_malformed_names() {
        assert!(matches!(
            validate_database_name("_replicator"),
            Err(CouchError::InvalidDatabaseName(_))
        ));
        assert!(validate_database_name("Mission").is_err());
        assert!(validate_database_name("7seas").is_err());
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name("bad name").is_err());
    }

    #[test]
    fn event_id_convention() {
        assert_eq!(event_id("00100", "sim"), "00100-sim");
    }

    #[test]
    fn zero_padded_ids_sort_chronologically() {
        let earlier = event_id(&format!("{:05}", 900), "sim");
        let later = event_id(&format!("{:05}", 10_000), "sim");
        assert!(earlier < later);
    }
}
