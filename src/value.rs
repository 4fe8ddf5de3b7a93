//! Dynamic column values and row mappings
//!
//! `Value` is the unit of data exchanged with the database: model instances
//! flatten themselves into `Value`s on the write path, and fetched rows are
//! decoded back into a [`ColumnMap`] on the read path before a typed instance
//! is rebuilt from it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single dynamically-typed column value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Storage-type label used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
        }
    }

    /// Render the value for use inside a LIKE pattern
    pub(crate) fn like_pattern(&self) -> String {
        match self {
            Value::Null => "%%".to_string(),
            Value::Integer(i) => format!("%{}%", i),
            Value::Real(r) => format!("%{}%", r),
            Value::Text(s) => format!("%{}%", s),
            Value::Blob(_) => "%%".to_string(),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// Ordered column-name → value mapping decoded from one result row.
///
/// Joined rows carry columns belonging to sibling subclass tables, so every
/// getter tolerates keys the caller never asks for. Lookups are linear; rows
/// stay small (one entry per joined column).
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    entries: Vec<(String, Value)>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// True when the column is present and non-null
    pub fn is_set(&self, name: &str) -> bool {
        !matches!(self.get(name), None | Some(Value::Null))
    }

    /// Required integer column
    pub fn integer(&self, name: &str) -> Result<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Ok(*i),
            Some(other) => Err(Error::ColumnType {
                column: name.to_string(),
                found: other.kind(),
                expected: "INTEGER",
            }),
            None => Err(Error::MissingColumn(name.to_string())),
        }
    }

    /// Required text column
    pub fn text(&self, name: &str) -> Result<String> {
        match self.get(name) {
            Some(Value::Text(s)) => Ok(s.clone()),
            Some(other) => Err(Error::ColumnType {
                column: name.to_string(),
                found: other.kind(),
                expected: "TEXT",
            }),
            None => Err(Error::MissingColumn(name.to_string())),
        }
    }

    /// Nullable integer column; absent columns read as None
    pub fn opt_integer(&self, name: &str) -> Result<Option<i64>> {
        match self.get(name) {
            Some(Value::Integer(i)) => Ok(Some(*i)),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(Error::ColumnType {
                column: name.to_string(),
                found: other.kind(),
                expected: "INTEGER",
            }),
        }
    }

    /// Nullable text column; absent columns read as None
    pub fn opt_text(&self, name: &str) -> Result<Option<String>> {
        match self.get(name) {
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(Error::ColumnType {
                column: name.to_string(),
                found: other.kind(),
                expected: "TEXT",
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
