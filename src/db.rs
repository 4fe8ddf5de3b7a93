//! Database handle and persistence operations
//!
//! `Database` wraps a single-connection SQLite pool: every statement the core
//! issues is serialized through one live connection, foreign keys are enforced
//! and the insert cascade runs inside one transaction so a mid-cascade failure
//! rolls back every level instead of leaving partial rows committed.

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::model::{Model, ModelDescriptor, Polymorphic};
use crate::query::{self, bind_value, decode_row, Filter};
use crate::rebuild::rebuild_row;
use crate::registry::Registry;
use crate::schema::{create_table_sql, insert_sql, table_name, validate_identifier, TABLE_EXISTS_SQL};
use crate::value::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Handle over the backing SQLite database
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database described by `config`
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let newly_created = !config.path.exists();

        let mut options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));
        if config.wal {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = Self::pool_options().connect_with(options).await?;

        if newly_created {
            info!("Initialized new database: {}", config.path.display());
        } else {
            info!("Opened existing database: {}", config.path.display());
        }

        Ok(Self { pool })
    }

    /// Open a database at `path` with default settings
    pub async fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(&DatabaseConfig::with_path(path.as_ref())).await
    }

    /// Open a throwaway in-memory database (foreign keys enforced)
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);
        let pool = Self::pool_options().connect_with(options).await?;
        Ok(Self { pool })
    }

    // One connection, never recycled: serializes all statements and keeps an
    // in-memory database alive for the lifetime of the handle.
    fn pool_options() -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    }

    /// Underlying pool, for custom statements outside the mapped surface
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection; call once at shutdown
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Destroy the backing database file, if it exists
    pub fn remove_file(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
            info!("Removed database file: {}", path.display());
        }
        Ok(())
    }

    /// Ensure tables exist for `M` and every ancestor in its chain.
    ///
    /// DDL for the whole chain is built (and type-checked) before any
    /// statement executes, so an unsupported field type anywhere in the chain
    /// fails without touching the schema. Tables are created root-first so
    /// foreign keys always reference an existing table.
    pub async fn ensure_table<M: Model>(&self) -> Result<()> {
        self.ensure_table_for(M::descriptor()).await
    }

    async fn ensure_table_for(&self, desc: &ModelDescriptor) -> Result<()> {
        let chain = desc.chain();
        let mut ddl = Vec::with_capacity(chain.len());
        for level in &chain {
            ddl.push((*level, create_table_sql(level)?));
        }

        for (level, sql) in ddl {
            let present: i64 = sqlx::query_scalar(TABLE_EXISTS_SQL)
                .bind(table_name(level))
                .fetch_one(&self.pool)
                .await?;
            if present == 0 {
                sqlx::query(&sql).execute(&self.pool).await?;
                info!("Created table {}", table_name(level));
            }
        }
        Ok(())
    }

    /// Persist `instance` and its ancestor slices, root first, inside one
    /// transaction.
    ///
    /// Each level's generated primary key feeds the next level's parent-link
    /// column. Returns the leaf row's primary key. Any failure rolls the
    /// whole cascade back.
    pub async fn insert<M: Model>(&self, instance: &M) -> Result<i64> {
        let desc = M::descriptor();
        self.ensure_table_for(desc).await?;

        let values = instance.values();
        let chain = desc.chain();
        check_flattening(desc, &chain, values.len())?;

        let mut tx = self.pool.begin().await?;
        let mut last_id: i64 = 0;
        let mut offset = 0;
        for (depth, level) in chain.iter().enumerate() {
            let own = level.own_fields().len();
            let slice = &values[offset..offset + own];
            offset += own;

            let sql = insert_sql(level)?;
            let mut statement = sqlx::query(&sql);
            if depth > 0 {
                statement = statement.bind(last_id);
            }
            for value in slice {
                statement = bind_value(statement, value);
            }
            let done = statement.execute(&mut *tx).await?;
            last_id = done.last_insert_rowid();
        }
        tx.commit().await?;

        debug!(model = desc.name, id = last_id, "cascade insert committed");
        Ok(last_id)
    }

    /// Persist only `instance`'s own row, without cascading to ancestors.
    ///
    /// Non-root models require a `parent_id`; a parent id that does not
    /// reference an existing row surfaces the foreign-key violation verbatim.
    /// Root models take no parent id. A missing parent id on a non-root
    /// model is rejected rather than writing a NULL link, which the foreign
    /// key would accept but every joined select would miss.
    pub async fn insert_shallow<M: Model>(
        &self,
        instance: &M,
        parent_id: Option<i64>,
    ) -> Result<i64> {
        let desc = M::descriptor();
        self.ensure_table_for(desc).await?;

        match (desc.parent, parent_id) {
            (None, Some(_)) => {
                return Err(Error::Inheritance(format!(
                    "{:?} is a root model and takes no parent id",
                    desc.name
                )));
            }
            (Some(_), None) => {
                return Err(Error::Inheritance(format!(
                    "{:?} requires a parent id for a shallow insert",
                    desc.name
                )));
            }
            _ => {}
        }

        let values = instance.values();
        let chain = desc.chain();
        check_flattening(desc, &chain, values.len())?;
        let own = desc.own_fields().len();
        let slice = &values[values.len() - own..];

        let sql = insert_sql(desc)?;
        let mut statement = sqlx::query(&sql);
        if desc.parent.is_some() {
            statement = bind_value(statement, &parent_id.into());
        }
        for value in slice {
            statement = bind_value(statement, value);
        }
        let done = statement.execute(&self.pool).await?;
        Ok(done.last_insert_rowid())
    }

    /// Sequential cascade insert.
    ///
    /// Each instance commits independently; the first failure aborts the
    /// remaining items and already-committed cascades stay.
    pub async fn insert_many<M: Model>(&self, instances: &[M]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(instances.len());
        for instance in instances {
            ids.push(self.insert(instance).await?);
        }
        Ok(ids)
    }

    /// Polymorphic read: LEFT JOIN every registered direct subclass of `P`
    /// and rebuild one typed variant per row with a non-null subclass id.
    ///
    /// Rows with no subclass representation are skipped; a row claiming two
    /// subclasses at once is an [`Error::AmbiguousRow`]. No matching rows is
    /// an empty list, never an error.
    pub async fn select<P: Polymorphic>(
        &self,
        registry: &Registry,
        filter: &Filter,
    ) -> Result<Vec<P::Variant>> {
        let desc = P::descriptor();
        let children = registry.children_of(desc.name);

        let (mut sql, columns) = query::joined_select_sql(desc, &children)?;
        let (where_clause, mut params) = filter.where_clause()?;
        sql.push_str(&where_clause);
        let (paging, paging_params) = filter.paging_clause();
        sql.push_str(&paging);
        params.extend(paging_params);
        debug!(model = desc.name, sql = %sql, "polymorphic select");

        let mut statement = sqlx::query(&sql);
        for value in &params {
            statement = bind_value(statement, value);
        }
        let rows = statement.fetch_all(&self.pool).await?;

        let mut results = Vec::new();
        for row in &rows {
            let map = decode_row(row, &columns)?;
            if let Some(variant) = rebuild_row::<P>(&map, &children)? {
                results.push(variant);
            }
        }
        Ok(results)
    }

    /// Row count for the same join/predicate shape as [`Database::select`].
    ///
    /// When the filter pages, the count runs over a paged subselect. Rows
    /// with no subclass representation are counted here even though `select`
    /// skips them, so the two agree only while every parent row has a
    /// subclass row.
    pub async fn count<M: Model>(&self, registry: &Registry, filter: &Filter) -> Result<i64> {
        let desc = M::descriptor();
        let children = registry.children_of(desc.name);

        let (where_clause, mut params) = filter.where_clause()?;
        let sql = if filter.is_paged() {
            let (inner, _) = query::joined_select_sql(desc, &children)?;
            let (paging, paging_params) = filter.paging_clause();
            params.extend(paging_params);
            format!("SELECT count(*) FROM ({}{}{})", inner, where_clause, paging)
        } else {
            format!(
                "{}{}",
                query::joined_count_sql(desc, &children)?,
                where_clause
            )
        };

        let mut statement = sqlx::query(&sql);
        for value in &params {
            statement = bind_value(statement, value);
        }
        let row = statement.fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, usize>(0)?)
    }

    /// Plain read returning `M` instances with no subclass resolution.
    ///
    /// Projects `M`'s visible columns; for mid-chain models the inherited
    /// columns come from ancestor tables via inner joins up the chain, so
    /// every returned instance is fully populated.
    pub async fn search<M: Model>(&self, filter: &Filter) -> Result<Vec<M>> {
        let desc = M::descriptor();

        let (mut sql, columns) = query::search_sql(desc)?;
        let (where_clause, mut params) = filter.where_clause()?;
        sql.push_str(&where_clause);
        let (paging, paging_params) = filter.paging_clause();
        sql.push_str(&paging);
        params.extend(paging_params);

        let mut statement = sqlx::query(&sql);
        for value in &params {
            statement = bind_value(statement, value);
        }
        let rows = statement.fetch_all(&self.pool).await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let map = decode_row(row, &columns)?;
            results.push(M::from_columns(&map)?);
        }
        Ok(results)
    }

    /// Parameterized UPDATE over `M`'s table.
    ///
    /// `changes` lists column/value assignments; the filter selects rows.
    /// Returns the number of rows affected.
    pub async fn update<M: Model>(
        &self,
        changes: &[(&str, Value)],
        filter: &Filter,
    ) -> Result<u64> {
        let desc = M::descriptor();
        if changes.is_empty() {
            return Err(Error::InvalidPredicate(
                "update requires at least one column assignment".to_string(),
            ));
        }

        let mut assignments = Vec::with_capacity(changes.len());
        let mut params = Vec::with_capacity(changes.len());
        for (column, value) in changes {
            if column.trim().is_empty() {
                return Err(Error::InvalidPredicate(
                    "empty update column name".to_string(),
                ));
            }
            validate_identifier(column)?;
            assignments.push(format!("{} = ?", column));
            params.push(value.clone());
        }

        let (where_clause, where_params) = filter.where_clause()?;
        params.extend(where_params);

        let sql = format!(
            "UPDATE {} SET {}{}",
            table_name(desc),
            assignments.join(", "),
            where_clause
        );
        let mut statement = sqlx::query(&sql);
        for value in &params {
            statement = bind_value(statement, value);
        }
        let done = statement.execute(&self.pool).await?;
        Ok(done.rows_affected())
    }
}

/// The flattened value count must match the descriptor chain exactly;
/// a mismatch means `Model::values` and the descriptor disagree.
fn check_flattening(
    desc: &ModelDescriptor,
    chain: &[&ModelDescriptor],
    actual: usize,
) -> Result<()> {
    let expected: usize = chain.iter().map(|level| level.own_fields().len()).sum();
    if actual != expected {
        return Err(Error::Inheritance(format!(
            "{:?} flattened {} values but its descriptor chain declares {}",
            desc.name, actual, expected
        )));
    }
    Ok(())
}
