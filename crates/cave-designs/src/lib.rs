//! Design documents for mission data products.
//!
//! Each data product is one CouchDB design document with a single `events`
//! view, implemented here as a [`cave_couch::DataProduct`]. Map scripts
//! are opaque text; they can be embedded in the binary (see
//! [`network::Network`]) or read through the [`ScriptSource`] seam from a
//! filesystem or any other backing store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod network;
pub mod source;

pub use network::Network;
pub use source::{DirScriptSource, ScriptError, ScriptSource, ScriptedProduct};
