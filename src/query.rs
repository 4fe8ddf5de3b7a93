//! Polymorphic query building
//!
//! Builds the SELECT / COUNT / search statements and the join-column ordering
//! that the read path needs to map positional result rows back onto names.
//! Everything here is stateless per call; the subclass set comes from the
//! [`Registry`](crate::registry::Registry) the caller passes in.

use crate::error::{Error, Result};
use crate::model::{FieldType, ModelDescriptor};
use crate::schema::{table_name, validate_identifier};
use crate::value::{ColumnMap, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::Row;

/// Predicate and pagination options for reads, counts and updates.
///
/// Conditions are ANDed. Exact filters compare with `=`; inexact filters use
/// `LIKE` with the value wrapped in `%` wildcards. Column names are validated
/// before they reach SQL text; values always travel as bound parameters.
#[derive(Debug, Clone)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
    exact: bool,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter {
    /// Exact-match filter (`column = ?`)
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            exact: true,
            limit: None,
            offset: None,
        }
    }

    /// Substring filter (`column LIKE '%value%'`)
    pub fn like() -> Self {
        Self {
            exact: false,
            ..Self::new()
        }
    }

    /// Add one condition; conditions are ANDed together
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn is_paged(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }

    /// WHERE clause (with leading space) plus its bound parameters.
    ///
    /// An empty or blank condition key is a hard error; a key with characters
    /// outside the identifier set is rejected as an invalid identifier.
    pub(crate) fn where_clause(&self) -> Result<(String, Vec<Value>)> {
        if self.conditions.is_empty() {
            return Ok((String::new(), Vec::new()));
        }
        let mut terms = Vec::with_capacity(self.conditions.len());
        let mut params = Vec::with_capacity(self.conditions.len());
        for (column, value) in &self.conditions {
            if column.trim().is_empty() {
                return Err(Error::InvalidPredicate(
                    "empty predicate key".to_string(),
                ));
            }
            validate_identifier(column)?;
            if self.exact {
                terms.push(format!("{} = ?", column));
                params.push(value.clone());
            } else {
                terms.push(format!("{} LIKE ?", column));
                params.push(Value::Text(value.like_pattern()));
            }
        }
        Ok((format!(" WHERE {}", terms.join(" AND ")), params))
    }

    /// LIMIT/OFFSET clause (with leading space) plus bound parameters.
    ///
    /// SQLite requires LIMIT before OFFSET, so an offset without a limit is
    /// emitted as `LIMIT -1 OFFSET ?`.
    pub(crate) fn paging_clause(&self) -> (String, Vec<Value>) {
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => (
                " LIMIT ? OFFSET ?".to_string(),
                vec![Value::Integer(limit), Value::Integer(offset)],
            ),
            (Some(limit), None) => (" LIMIT ?".to_string(), vec![Value::Integer(limit)]),
            (None, Some(offset)) => (
                " LIMIT -1 OFFSET ?".to_string(),
                vec![Value::Integer(offset)],
            ),
            (None, None) => (String::new(), Vec::new()),
        }
    }
}

/// What a position in a joined result row holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// A primary-key or parent-link id column
    Id,
    /// A model field with the given semantic type
    Field(FieldType),
}

/// One column of the joined projection, in result order
#[derive(Debug, Clone)]
pub struct JoinColumn {
    pub name: String,
    pub kind: ColumnKind,
}

impl JoinColumn {
    fn id(name: String) -> Self {
        Self {
            name,
            kind: ColumnKind::Id,
        }
    }

    fn field(name: &str, ty: FieldType) -> Self {
        Self {
            name: name.to_string(),
            kind: ColumnKind::Field(ty),
        }
    }
}

/// Join-column ordering for one table as `SELECT *` returns it: primary key,
/// parent-link column when mid-chain, then own fields in declaration order.
fn table_columns(desc: &ModelDescriptor, skip_parent_link: bool) -> Vec<JoinColumn> {
    let mut columns = vec![JoinColumn::id(desc.id_column())];
    if let Some(parent) = desc.parent {
        if !skip_parent_link {
            columns.push(JoinColumn::id(parent.id_column()));
        }
    }
    for field in desc.own_fields() {
        columns.push(JoinColumn::field(field.name, field.ty));
    }
    columns
}

/// Build the joined SELECT and its column ordering.
///
/// Base projection is `SELECT * FROM <table>`; every registered direct
/// subclass contributes one `LEFT JOIN <child_table> USING (<id>)`. The join
/// is one level deep. `USING` folds each child's parent-link column into the
/// queried table's id, so child tables contribute their own id and fields
/// only.
pub fn joined_select_sql(
    desc: &ModelDescriptor,
    children: &[&ModelDescriptor],
) -> Result<(String, Vec<JoinColumn>)> {
    validate_identifier(desc.name)?;
    let mut sql = format!("SELECT * FROM {}", table_name(desc));
    let mut columns = table_columns(desc, false);

    for child in children {
        validate_identifier(child.name)?;
        sql.push_str(&format!(
            " LEFT JOIN {} USING ({})",
            table_name(child),
            desc.id_column()
        ));
        columns.extend(table_columns(child, true));
    }

    Ok((sql, columns))
}

/// COUNT variant over the same join shape
pub fn joined_count_sql(desc: &ModelDescriptor, children: &[&ModelDescriptor]) -> Result<String> {
    validate_identifier(desc.name)?;
    let mut sql = format!("SELECT count(*) FROM {}", table_name(desc));
    for child in children {
        validate_identifier(child.name)?;
        sql.push_str(&format!(
            " LEFT JOIN {} USING ({})",
            table_name(child),
            desc.id_column()
        ));
    }
    Ok(sql)
}

/// Projection over a model's visible columns, without subclass resolution.
///
/// Mid-chain models keep their inherited fields in ancestor tables, so the
/// statement walks the chain upward with one inner `JOIN ... USING` per
/// ancestor. The projection lists the visible fields ancestors-first, the
/// same flattening order [`crate::model::Model::from_columns`] expects.
pub fn search_sql(desc: &ModelDescriptor) -> Result<(String, Vec<JoinColumn>)> {
    validate_identifier(desc.name)?;
    let mut columns = Vec::new();
    for field in desc.visible_fields() {
        validate_identifier(field.name)?;
        columns.push(JoinColumn::field(field.name, field.ty));
    }
    if columns.is_empty() {
        // fieldless model: project the primary key so the SQL stays valid
        columns.push(JoinColumn::id(desc.id_column()));
    }
    let projection: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let mut sql = format!(
        "SELECT {} FROM {}",
        projection.join(", "),
        table_name(desc)
    );

    let mut cursor = desc;
    while let Some(parent) = cursor.parent {
        validate_identifier(parent.name)?;
        sql.push_str(&format!(
            " JOIN {} USING ({})",
            table_name(parent),
            parent.id_column()
        ));
        cursor = parent;
    }
    Ok((sql, columns))
}

/// Bind one dynamic value onto a statement
pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<i64>),
        Value::Integer(i) => query.bind(*i),
        Value::Real(r) => query.bind(*r),
        Value::Text(s) => query.bind(s.clone()),
        Value::Blob(b) => query.bind(b.clone()),
    }
}

/// Decode one fetched row positionally against the join-column ordering
pub fn decode_row(row: &SqliteRow, columns: &[JoinColumn]) -> Result<ColumnMap> {
    let mut map = ColumnMap::new();
    for (index, column) in columns.iter().enumerate() {
        let value = match column.kind {
            ColumnKind::Id
            | ColumnKind::Field(FieldType::Integer)
            | ColumnKind::Field(FieldType::OptionalInteger) => row
                .try_get::<Option<i64>, usize>(index)?
                .map(Value::Integer)
                .unwrap_or(Value::Null),
            ColumnKind::Field(FieldType::Text) | ColumnKind::Field(FieldType::OptionalText) => {
                row.try_get::<Option<String>, usize>(index)?
                    .map(Value::Text)
                    .unwrap_or(Value::Null)
            }
            ColumnKind::Field(other) => {
                return Err(Error::UnsupportedType(other.label().to_string()))
            }
        };
        map.insert(column.name.clone(), value);
    }
    Ok(map)
}
