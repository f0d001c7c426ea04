//! Design documents: index definitions for mission data products.
//!
//! By convention every data product is one design document exposing a
//! single view named [`DEFAULT_VIEW`], whose map function emits events in
//! `[stamp, source]` key order. Map scripts are opaque text supplied by
//! the caller; this module only assembles and validates the document
//! shape.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{decode, CouchSession};
use crate::error::{CouchError, Result};
use crate::view::View;

/// The view name every data product exposes.
pub const DEFAULT_VIEW: &str = "events";

/// The indexing language of the map scripts.
const LANGUAGE: &str = "javascript";

/// One view definition inside a design document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDef {
    /// The map function body, in the database's indexing language.
    pub map: String,
}

/// A CouchDB design document: a named bundle of view definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocument {
    /// Document identifier, assigned by the server on fetch.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Revision token, assigned by the server on fetch.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// The indexing language the scripts are written in.
    pub language: String,
    /// Views keyed by name. One view per design by convention; multiple
    /// views per design are a documented future extension.
    pub views: BTreeMap<String, ViewDef>,
}

impl DesignDocument {
    /// Build a design document holding a single view.
    ///
    /// # Errors
    ///
    /// Fails with `MissingScript` if the script text is empty or blank.
    pub fn single_view(view: &str, script: impl Into<String>) -> Result<Self> {
        let script = script.into();
        if script.trim().is_empty() {
            return Err(CouchError::MissingScript(view.to_string()));
        }
        let mut views = BTreeMap::new();
        views.insert(view.to_string(), ViewDef { map: script });
        Ok(Self {
            id: None,
            rev: None,
            language: LANGUAGE.to_string(),
            views,
        })
    }

    /// The map script of the named view, if present.
    #[must_use]
    pub fn map_script(&self, view: &str) -> Option<&str> {
        self.views.get(view).map(|def| def.map.as_str())
    }
}

/// A mission data product: a name plus the design document that indexes it.
///
/// Implementations assemble the document from whatever source holds their
/// map scripts; construction is synchronous and performs no network I/O.
pub trait DataProduct {
    /// The design document name the product is stored under.
    fn name(&self) -> &str;

    /// Assemble the product's design document.
    ///
    /// # Errors
    ///
    /// Fails with `MissingScript` if a map script is empty or unavailable.
    fn design_document(&self) -> Result<DesignDocument>;
}

/// A handle to one design document in one database.
///
/// Like [`crate::Database`], this is a pure local descriptor.
#[derive(Debug, Clone)]
pub struct Design {
    session: CouchSession,
    db: String,
    name: String,
}

impl Design {
    pub(crate) fn new(session: CouchSession, db: &str, name: &str) -> Self {
        Self {
            session,
            db: db.to_string(),
            name: name.to_string(),
        }
    }

    /// The design document name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the stored design document back from the server.
    ///
    /// # Errors
    ///
    /// Fails with a `not_found` application error if the design was never
    /// uploaded, or on transport failure.
    pub async fn fetch(&self) -> Result<DesignDocument> {
        let response = self
            .session
            .request(Method::GET, &format!("/{}/_design/{}", self.db, self.name))?
            .send()
            .await?;
        decode(response).await
    }

    /// A handle on the named view of this design. No network call, no
    /// verification that the view exists.
    #[must_use]
    pub fn view(&self, view: &str) -> View {
        View::of_design(self.session.clone(), &self.db, &self.name, view)
    }

    /// A handle on the product's default `events` view.
    #[must_use]
    pub fn default_view(&self) -> View {
        self.view(DEFAULT_VIEW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_view_wire_shape() {
        let design = DesignDocument::single_view("events", "function(doc) { emit(doc._id, null); }")
            .unwrap();

        let json = serde_json::to_value(&design).unwrap();
        assert_eq!(json["language"], "javascript");
        assert_eq!(
            json["views"]["events"]["map"],
            "function(doc) { emit(doc._id, null); }"
        );
        // _id/_rev are server-assigned and must not be sent on create
        assert!(json.get("_id").is_none());
        assert!(json.get("_rev").is_none());
    }

    #[test]
    fn blank_script_is_rejected() {
        let err = DesignDocument::single_view("events", "   \n").unwrap_err();
        assert!(matches!(err, CouchError::MissingScript(view) if view == "events"));
    }

    #[test]
    fn fetched_document_round_trips() {
        let body = serde_json::json!({
            "_id": "_design/network",
            "_rev": "1-abc",
            "language": "javascript",
            "views": { "events": { "map": "function(doc) {}" } }
        });

        let design: DesignDocument = serde_json::from_value(body).unwrap();
        assert_eq!(design.id.as_deref(), Some("_design/network"));
        assert_eq!(design.map_script("events"), Some("function(doc) {}"));
        assert_eq!(design.map_script("other"), None);
    }
}
