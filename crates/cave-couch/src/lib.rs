//! CouchDB client for mission telemetry storage.
//!
//! Missions are stored as CouchDB databases; every event that takes place
//! during a mission is a document whose identifier sorts chronologically
//! (`<stamp>-<source>`). This crate provides the full client surface the
//! mission server is built on:
//!
//! - Cookie-based session authentication ([`Couch::login`])
//! - Database catalog operations on [`CouchSession`]
//! - Document put/get through [`Database`]
//! - Design-document lifecycle through [`Design`] and [`DesignDocument`]
//! - Key-range pagination over ordered indexes through [`View`]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ login ┌──────────────────┐
//! │    Couch     │──────▶│   CouchSession   │ catalog: databases(),
//! │ (server URL) │       │ (token + pool)   │ create/info/delete
//! └──────────────┘       └────────┬─────────┘
//!                                 │ database(name)
//!                        ┌────────▼─────────┐
//!                        │     Database     │ get/put documents,
//!                        │                  │ put_design/designs
//!                        └────────┬─────────┘
//!                                 │ view(design) / all_docs()
//!                        ┌────────▼─────────┐
//!                        │       View       │ range(start, end),
//!                        │ (ordered index)  │ page(start, limit)
//!                        └──────────────────┘
//! ```
//!
//! Every handle below the session is a cheap, cloneable local descriptor;
//! the session token is immutable after login and shared read-only. All
//! operations are `async` and resolve to a single `Result` — the client
//! never retries, never streams, and surfaces the first failure it meets.
//!
//! # Example
//!
//! ```no_run
//! use cave_couch::{Couch, CouchConfig, ViewKey};
//!
//! # async fn example() -> cave_couch::Result<()> {
//! let couch = Couch::connect(CouchConfig::new("http://localhost:5984"));
//! let session = couch.login("admin", "secret").await?;
//!
//! let db = session.create_database("sensors").await?;
//! db.put("00100-sim", &serde_json::json!({ "class": "strobe" })).await?;
//!
//! let page = db.all_docs().page(ViewKey::string("00100-sim"), 10).await?;
//! println!("{} of {} events", page.rows.len(), page.total_rows);
//!
//! session.logout().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod database;
pub mod design;
pub mod error;
pub mod session;
pub mod view;

pub use client::{Couch, CouchConfig, CouchSession};
pub use database::{event_id, Database, DatabaseInfo, DatabaseSizes, WriteReceipt};
pub use design::{DataProduct, Design, DesignDocument, ViewDef, DEFAULT_VIEW};
pub use error::{CouchError, Result};
pub use session::{SessionToken, AUTH_COOKIE};
pub use view::{View, ViewKey, ViewPage, ViewRow};
