//! Common error types for kindred

use thiserror::Error;

/// Common result type for kindred operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for schema derivation, inserts and polymorphic reads
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    ///
    /// Foreign-key and uniqueness constraint violations surface here verbatim.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A declared field type has no entry in the storage-type table
    #[error("Unsupported field type: {0}")]
    UnsupportedType(String),

    /// Hierarchy misuse detected at registration time
    #[error("Inheritance error: {0}")]
    Inheritance(String),

    /// Empty or blank predicate key supplied to a query builder
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// A table or column name failed identifier validation
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A column expected by a model constructor was absent from the row
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column held a value of an unexpected storage type
    #[error("Column {column} holds {found}, expected {expected}")]
    ColumnType {
        column: String,
        found: &'static str,
        expected: &'static str,
    },

    /// A joined row carried non-null ids for more than one subclass table
    #[error("Ambiguous row: subclass ids set for both {0} and {1}")]
    AmbiguousRow(String, String),
}
