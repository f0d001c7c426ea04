//! Range queries over a view's ordered key space.
//!
//! CouchDB keeps every view sorted by key under its native collation, so
//! pagination is expressed as key ranges: `[startkey, endkey]` inclusive,
//! or `startkey` plus a row limit. Keys are JSON values; for composite
//! keys the serialized representation is array-typed (`["stamp","source"]`).
//!
//! # Key encoding contract
//!
//! The client JSON-encodes every key exactly once. Callers supply unquoted
//! values through [`ViewKey::string`] or [`ViewKey::composite`]; passing a
//! pre-quoted string double-encodes it and will not match the index.

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::client::{decode, CouchSession};
use crate::error::{CouchError, Result};

/// A view key in its JSON representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewKey(Value);

impl ViewKey {
    /// A plain string key, e.g. a `<stamp>-<source>` document identifier.
    #[must_use]
    pub fn string(key: impl Into<String>) -> Self {
        Self(Value::String(key.into()))
    }

    /// A composite (array-typed) key, e.g. `["00100", "sim"]`.
    #[must_use]
    pub fn composite<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Value::Array(
            parts
                .into_iter()
                .map(|part| Value::String(part.into()))
                .collect(),
        ))
    }

    /// Serialize the key for a query parameter.
    ///
    /// Empty keys are a contract violation caught before the request is
    /// issued.
    pub(crate) fn encode(&self) -> Result<String> {
        let empty = match &self.0 {
            Value::String(s) => s.is_empty(),
            Value::Array(parts) => parts.is_empty(),
            _ => false,
        };
        if empty {
            return Err(CouchError::EmptyKey);
        }
        Ok(serde_json::to_string(&self.0)?)
    }
}

impl From<&str> for ViewKey {
    fn from(key: &str) -> Self {
        Self::string(key)
    }
}

impl From<String> for ViewKey {
    fn from(key: String) -> Self {
        Self::string(key)
    }
}

/// One row of a query result: the emitted key, the id of the document it
/// came from, the emitted value, and optionally the document itself.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewRow {
    /// Identifier of the document that produced this row.
    pub id: String,
    /// The emitted index key.
    pub key: Value,
    /// The emitted value.
    #[serde(default)]
    pub value: Value,
    /// The document body, when the index embeds documents.
    #[serde(default)]
    pub doc: Option<Value>,
}

/// One page of an ordered range query.
///
/// There is no explicit continuation flag on the wire; [`ViewPage::has_more`]
/// derives it from the offset arithmetic.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewPage {
    /// Cardinality of the full index at query time.
    pub total_rows: u64,
    /// 0-based position of the first returned row within the full index.
    pub offset: u64,
    /// The page contents, in collation order.
    pub rows: Vec<ViewRow>,
}

impl ViewPage {
    /// Whether rows remain beyond this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        let len = u64::try_from(self.rows.len()).unwrap_or(u64::MAX);
        self.offset.saturating_add(len) < self.total_rows
    }
}

/// Which index a view handle targets.
#[derive(Debug, Clone)]
enum ViewIndex {
    /// The database's built-in primary index, ordered by document id.
    AllDocs,
    /// A view of a user-defined design document.
    Design { design: String, view: String },
}

/// A handle on one ordered index, queryable by key range.
///
/// Pure local descriptor; constructing one performs no network call and no
/// verification that the design or view exists. A query against a missing
/// index surfaces the server's `not_found` error.
#[derive(Debug, Clone)]
pub struct View {
    session: CouchSession,
    db: String,
    index: ViewIndex,
}

impl View {
    pub(crate) fn all_docs(session: CouchSession, db: &str) -> Self {
        Self {
            session,
            db: db.to_string(),
            index: ViewIndex::AllDocs,
        }
    }

    pub(crate) fn of_design(session: CouchSession, db: &str, design: &str, view: &str) -> Self {
        Self {
            session,
            db: db.to_string(),
            index: ViewIndex::Design {
                design: design.to_string(),
                view: view.to_string(),
            },
        }
    }

    fn path(&self) -> String {
        match &self.index {
            ViewIndex::AllDocs => format!("/{}/_all_docs", self.db),
            ViewIndex::Design { design, view } => {
                format!("/{}/_design/{design}/_view/{view}", self.db)
            }
        }
    }

    /// Fetch all rows whose key falls within `[start, end]`, inclusive on
    /// both bounds, in collation order.
    ///
    /// # Errors
    ///
    /// Fails on an empty key, a missing design or view (`not_found`
    /// application error), or transport failure.
    pub async fn range(
        &self,
        start: impl Into<ViewKey>,
        end: impl Into<ViewKey>,
    ) -> Result<ViewPage> {
        let params = [
            ("startkey", start.into().encode()?),
            ("endkey", end.into().encode()?),
        ];
        self.query(&params).await
    }

    /// Fetch up to `limit` rows starting at `start`, inclusive, in
    /// collation order.
    ///
    /// # Errors
    ///
    /// Fails on an empty key, a missing design or view (`not_found`
    /// application error), or transport failure.
    pub async fn page(&self, start: impl Into<ViewKey>, limit: u64) -> Result<ViewPage> {
        let params = [
            ("startkey", start.into().encode()?),
            ("limit", limit.to_string()),
        ];
        self.query(&params).await
    }

    async fn query(&self, params: &[(&str, String)]) -> Result<ViewPage> {
        let path = self.path();
        let mut request = self.session.request(Method::GET, &path)?.query(params);
        // The primary index holds only ids and revs; embed the documents
        // so its rows carry the same payload a product view emits.
        if matches!(self.index, ViewIndex::AllDocs) {
            request = request.query(&[("include_docs", "true")]);
        }
        tracing::debug!(path = %path, "Querying view");
        let response = request.send().await?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_key_is_json_quoted() {
        let key = ViewKey::string("00100-sim");
        assert_eq!(key.encode().unwrap(), "\"00100-sim\"");
    }

    #[test]
    fn composite_key_is_array_typed() {
        let key = ViewKey::composite(["00100", "sim"]);
        assert_eq!(key.encode().unwrap(), "[\"00100\",\"sim\"]");
    }

    #[test]
    fn empty_keys_are_rejected() {
        assert!(matches!(
            ViewKey::string("").encode(),
            Err(CouchError::EmptyKey)
        ));
        assert!(matches!(
            ViewKey::composite(Vec::<String>::new()).encode(),
            Err(CouchError::EmptyKey)
        ));
    }

    #[test]
    fn has_more_arithmetic() {
        let page = |total_rows, offset, n| ViewPage {
            total_rows,
            offset,
            rows: (0..n)
                .map(|i| ViewRow {
                    id: format!("{i:05}-sim"),
                    key: Value::String(format!("{i:05}-sim")),
                    value: Value::Null,
                    doc: None,
                })
                .collect(),
        };

        assert!(page(100, 1, 10).has_more());
        assert!(!page(100, 90, 10).has_more());
        assert!(!page(0, 0, 0).has_more());
    }
}
