//! The script-source collaborator: read map-script text by name.
//!
//! The client core places no constraint on where script text comes from;
//! this module defines the seam and a filesystem implementation.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use cave_couch::{CouchError, DataProduct, DesignDocument, DEFAULT_VIEW};

/// Errors raised while reading a map script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script could not be read from its backing store.
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),

    /// The script was read but contains no text.
    #[error("script {0:?} is empty")]
    Empty(String),
}

/// Read map-script text by name.
pub trait ScriptSource {
    /// Fetch the script text stored under `name`.
    ///
    /// # Errors
    ///
    /// Fails if the script cannot be read or is empty.
    fn read_script(&self, name: &str) -> Result<String, ScriptError>;
}

/// A script source rooted at a filesystem directory.
#[derive(Debug, Clone)]
pub struct DirScriptSource {
    root: PathBuf,
}

impl DirScriptSource {
    /// Create a source reading scripts relative to `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ScriptSource for DirScriptSource {
    fn read_script(&self, name: &str) -> Result<String, ScriptError> {
        let path = self.root.join(name);
        tracing::debug!(path = %path.display(), "Reading map script");
        let script = fs::read_to_string(&path)?;
        if script.trim().is_empty() {
            return Err(ScriptError::Empty(name.to_string()));
        }
        Ok(script)
    }
}

/// A data product whose map script was loaded from a [`ScriptSource`].
///
/// The read happens once, at construction; building the design document is
/// pure after that.
#[derive(Debug, Clone)]
pub struct ScriptedProduct {
    name: String,
    script: String,
}

impl ScriptedProduct {
    /// Load the product's script from the given source.
    ///
    /// # Errors
    ///
    /// Fails if the script cannot be read or is empty.
    pub fn load(
        name: impl Into<String>,
        script_name: &str,
        source: &impl ScriptSource,
    ) -> Result<Self, ScriptError> {
        Ok(Self {
            name: name.into(),
            script: source.read_script(script_name)?,
        })
    }
}

impl DataProduct for ScriptedProduct {
    fn name(&self) -> &str {
        &self.name
    }

    fn design_document(&self) -> Result<DesignDocument, CouchError> {
        DesignDocument::single_view(DEFAULT_VIEW, self.script.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_scripts_from_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("radar.map.js")).unwrap();
        writeln!(file, "function(doc) {{ emit(doc._id, null); }}").unwrap();

        let source = DirScriptSource::new(dir.path());
        let product = ScriptedProduct::load("radar", "radar.map.js", &source).unwrap();

        assert_eq!(product.name(), "radar");
        let design = product.design_document().unwrap();
        assert!(design.map_script(DEFAULT_VIEW).unwrap().contains("emit"));
    }

    #[test]
    fn missing_script_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirScriptSource::new(dir.path());

        let err = source.read_script("nonesuch.map.js").unwrap_err();
        assert!(matches!(err, ScriptError::Io(_)));
    }

    #[test]
    fn blank_script_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.map.js"), "  \n").unwrap();

        let source = DirScriptSource::new(dir.path());
        let err = source.read_script("blank.map.js").unwrap_err();
        assert!(matches!(err, ScriptError::Empty(name) if name == "blank.map.js"));
    }
}
