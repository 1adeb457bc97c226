//! # tnt-schema
//!
//! Client-side schema catalog for a Tarantool connector.
//!
//! The catalog is built from the raw select results of the `_space` and
//! `_index` system spaces (or their `_vspace` / `_vindex` views) and
//! resolves space, index and field names to the numeric ids the binary
//! protocol needs. Fetching the rows is left to the transport; this crate
//! only consumes the MessagePack bytes.
//!
//! ## Quick Start
//!
//! ```
//! use serde_json::json;
//! use tnt_schema::SchemaCatalog;
//!
//! // What a select from _space and _index returns.
//! let spaces = rmp_serde::to_vec(&json!([
//!     [512, 1, "users", "memtx", 0, {}, [{"name": "id", "type": "unsigned"}]]
//! ]))
//! .unwrap();
//! let indexes = rmp_serde::to_vec(&json!([
//!     [512, 0, "primary", "tree", {"unique": true}, [[0, "unsigned"]]]
//! ]))
//! .unwrap();
//!
//! let mut catalog = SchemaCatalog::new();
//! catalog.add_spaces(&spaces).unwrap();
//! catalog.add_indexes(&indexes).unwrap();
//!
//! assert_eq!(catalog.stosid("users"), Some(512));
//! assert_eq!(catalog.stoiid(512, "primary"), Some(0));
//! assert_eq!(catalog.stoiid(512, "secondary"), None);
//! ```

pub mod catalog;
pub mod error;
pub mod tuple;
pub mod types;

pub use catalog::{CatalogHandle, SchemaCatalog};
pub use error::{DecodeError, Error, Result};
