//! The network-visualization data product.
//!
//! One `events` view of all network events in chronological `[stamp,
//! source]` key order, fed by the map script embedded at build time.

use cave_couch::{CouchError, DataProduct, DesignDocument, DEFAULT_VIEW};

/// Map function for the default event view: projects the fields each
/// event class needs and emits them under a `[stamp, source]` key.
const EVENTS_MAP: &str = include_str!("../scripts/events.map.js");

/// The network data product.
#[derive(Debug, Clone, Copy, Default)]
pub struct Network;

impl Network {
    /// The design document name the product is stored under.
    pub const NAME: &'static str = "network";

    /// Create the product descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DataProduct for Network {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn design_document(&self) -> Result<DesignDocument, CouchError> {
        DesignDocument::single_view(DEFAULT_VIEW, EVENTS_MAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_single_events_view() {
        let design = Network::new().design_document().unwrap();

        assert_eq!(design.language, "javascript");
        assert_eq!(design.views.len(), 1);
        let map = design.map_script(DEFAULT_VIEW).unwrap();
        assert!(map.contains("emit( [doc.stamp, doc.source]"));
    }

    #[test]
    fn wire_shape_matches_the_couchdb_contract() {
        let design = Network::new().design_document().unwrap();
        let json = serde_json::to_value(&design).unwrap();

        assert!(json["views"]["events"]["map"].is_string());
        assert!(json.get("_id").is_none());
    }
}
