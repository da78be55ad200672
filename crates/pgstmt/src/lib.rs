//! # pgstmt
//!
//! A schema-aware dynamic statement builder for PostgreSQL.
//!
//! `pgstmt` introspects the connected database once at startup, then builds
//! fully quoted, parameterized SQL from loosely shaped caller input: typed
//! records, JSON documents, or plain key-value maps. The loaded catalog
//! drives everything: identifier quoting, camelCase external-name
//! resolution, primary-key routing, and the textual-column pattern
//! matching.
//!
//! ## Quick start
//!
//! ```ignore
//! use pgstmt::{Builder, Record};
//!
//! #[derive(Record)]
//! struct Person {
//!     #[sql(pk)]
//!     id: i64,
//!     a_a: Option<String>,
//! }
//!
//! let builder = Builder::load(&client).await?;
//!
//! // SELECT, shaped as one JSON array document
//! let people = builder
//!     .query("person")
//!     .filter_value("aA", "jo")
//!     .order_by("id desc")
//!     .limit(20)
//!     .all_json(&client)
//!     .await?;
//!
//! // INSERT; nil fields fall back to column defaults
//! builder
//!     .insert("person")
//!     .values(&Person { id: 0, a_a: Some("ann".into()) })
//!     .returning(&["id"])
//!     .one_json(&client)
//!     .await?;
//!
//! // UPDATE routed by primary key
//! builder
//!     .update("person")
//!     .set_where_pk(&person)
//!     .execute(&client)
//!     .await?;
//! ```
//!
//! `build()` on every statement is pure and side-effect free, so the same
//! configured statement can be rendered, logged, and executed.

pub mod catalog;
pub mod client;
pub mod error;
pub mod fields;
pub mod params;
pub mod stmt;
pub mod value;

mod predicate;
mod projection;
mod quote;

pub use catalog::{ColumnSchema, SchemaCatalog};
pub use client::GenericClient;
pub use error::{StmtError, StmtResult};
pub use fields::{map_from_json, FieldValue, Map, MatchMode, Record};
pub use params::ParamList;
pub use stmt::{Builder, DeleteStmt, InsertStmt, QueryStmt, UpdateStmt};
pub use value::Value;

#[cfg(feature = "derive")]
pub use pgstmt_derive::Record;
