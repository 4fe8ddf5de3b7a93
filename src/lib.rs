//! # kindred
//!
//! Inheritance-by-reference object mapping for SQLite:
//! - One table per model type in a single-rooted inheritance chain
//! - Child tables reference their parent's row through a cascading foreign key
//! - Cascading inserts write ancestor slices root-first inside one transaction
//! - Polymorphic selects LEFT JOIN direct subclass tables and rebuild the
//!   correctly-typed instance per row
//!
//! Model types declare a static [`ModelDescriptor`] (name, parent, own fields)
//! and implement [`Model`]; parents of polymorphic reads also implement
//! [`Polymorphic`]. The subclass graph is an explicit, caller-populated
//! [`Registry`]; nothing is inferred from global state.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod query;
pub mod rebuild;
pub mod registry;
pub mod schema;
pub mod value;

pub use config::{resolve_database_path, DatabaseConfig, DEFAULT_DB_FILE};
pub use db::Database;
pub use error::{Error, Result};
pub use model::{FieldDef, FieldType, Model, ModelDescriptor, Polymorphic};
pub use query::Filter;
pub use registry::Registry;
pub use value::{ColumnMap, Value};
