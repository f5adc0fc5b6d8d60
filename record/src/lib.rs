//! # High Systems Record
//!
//! An active-record style handle on one row of a remote High Systems table.
//!
//! A [`Record`] maps stable, caller-chosen field names onto the remote
//! table's field identifiers, discovers the table's field schema on demand,
//! and keeps its in-memory data in step with the remote store through four
//! calls: load, load schema, save and delete.
//!
//! ## Core Concepts
//!
//! ### Aliases
//!
//! Callers read and write data by name (`"name"`, `"email"`). The
//! [`FieldAliases`] table maps each name to the remote field identifier
//! (`"6"`, `"7"`). Every record carries an alias for the identity field,
//! [`IDENTITY_FIELD`] (`"recordid"`), which holds the remote record id.
//!
//! ### Field schema
//!
//! [`Record::load_schema`] fetches the table's [`Field`] descriptors and
//! merges them by identifier. [`Record::save`] uses them to strip fields the
//! remote store computes itself (lookup, summary, formula).
//!
//! ### Remote client
//!
//! The network client lives behind the [`RemoteApi`] trait. Its errors are
//! passed through untouched as [`Error::Remote`].
//!
//! ### Serialization
//!
//! [`Record::to_json`] produces a [`RecordJson`]; [`Record::from_json`] and
//! [`Record::restore`] rebuild a record from it, from a [`serde_json::Value`]
//! or from JSON text.
//!
//! ## Quick Start
//!
//! ```rust
//! use highsystems_record::{Record, RecordOptions, IDENTITY_FIELD};
//!
//! let mut record = Record::new(
//!     RecordOptions::new()
//!         .application_id("app1")
//!         .table_id("tbl1")
//!         .fid("name", "6"),
//! );
//!
//! record.set("name", "Ada");
//! assert_eq!(record.get_fid("name"), "6");
//! assert_eq!(record.get_fid(IDENTITY_FIELD), "id");
//!
//! let json = record.to_json(None);
//! let copy = Record::from_json(json).unwrap();
//! assert_eq!(copy.get("name"), record.get("name"));
//! ```
//!
//! ## Host integration
//!
//! Applications that want process-wide defaults, or records bound from a
//! bare [`ClientConfig`], register them once at startup through [`Host`].

pub mod alias;
pub mod client;
pub mod config;
pub mod error;
pub mod field;
pub mod record;
pub mod snapshot;
pub mod value;

// Re-export main types at crate root
pub use alias::FieldAliases;
pub use client::{ApiResult, ClientBinding, RecordsQuery, RemoteApi, RequestOptions};
pub use config::{ClientConfig, ConfigError, Connector, Host, RecordOptions};
pub use error::{BoxError, Error, Result};
pub use field::{Field, FieldJson, COMPUTED_FIELD_TYPES};
pub use record::{ColumnList, LoadOptions, Record, SaveOptions};
pub use snapshot::{RecordJson, RecordSource};
pub use value::replace_undefined_with_string;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Type tag carried by every [`Record`].
pub const CLASS_NAME: &str = "HSRecord";

/// Alias name of the field holding the remote record id.
pub const IDENTITY_FIELD: &str = "recordid";

/// Type aliases for clarity
pub type FieldId = String;
pub type Data = serde_json::Map<String, serde_json::Value>;
pub type Row = serde_json::Map<String, serde_json::Value>;
