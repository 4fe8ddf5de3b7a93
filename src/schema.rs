//! Schema derivation
//!
//! Table names, storage-type translation and CREATE TABLE statements are all
//! derived from [`ModelDescriptor`]s. Identifiers woven into SQL text are
//! validated against a restricted character set first; values always travel as
//! bound parameters, never as interpolated text.

use crate::error::{Error, Result};
use crate::model::{FieldType, ModelDescriptor};

/// Validate a name that will appear in SQL as an identifier.
///
/// Accepts lowercase ASCII letters, digits and underscores, starting with a
/// letter or underscore. Anything else is rejected outright.
pub fn validate_identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some('a'..='z') | Some('_'));
    let valid_rest = chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'));
    if name.is_empty() || !valid_start || !valid_rest {
        return Err(Error::InvalidIdentifier(name.to_string()));
    }
    Ok(name)
}

/// Table name for a model: lowercase type name plus `"s"`.
///
/// Pluralization is a deliberate dumb suffix rule; irregular nouns come out
/// wrong (`"medias"`) and that is accepted as a documented limitation in
/// exchange for a pure, deterministic mapping.
pub fn table_name(desc: &ModelDescriptor) -> String {
    format!("{}s", desc.name)
}

/// Translate a semantic field type to its storage type.
///
/// Closed allow-list: text-like maps to TEXT, integer-like to INT. Everything
/// else is an [`Error::UnsupportedType`], raised before any DDL executes.
pub fn sql_type(ty: FieldType) -> Result<&'static str> {
    match ty {
        FieldType::Text | FieldType::OptionalText => Ok("TEXT"),
        FieldType::Integer | FieldType::OptionalInteger => Ok("INT"),
        other => Err(Error::UnsupportedType(other.label().to_string())),
    }
}

/// Build the idempotent CREATE TABLE statement for one model.
///
/// Layout: own primary key first, parent-link column second when a parent
/// exists, then the own-field columns in declaration order, and finally the
/// cascading foreign-key constraint tying the parent-link column to the
/// parent table's primary key.
pub fn create_table_sql(desc: &ModelDescriptor) -> Result<String> {
    validate_identifier(desc.name)?;
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ( {} INTEGER PRIMARY KEY",
        table_name(desc),
        desc.id_column()
    );

    if let Some(parent) = desc.parent {
        validate_identifier(parent.name)?;
        sql.push_str(&format!(", {} INTEGER", parent.id_column()));
    }

    for field in desc.own_fields() {
        validate_identifier(field.name)?;
        sql.push_str(&format!(", {} {}", field.name, sql_type(field.ty)?));
    }

    if let Some(parent) = desc.parent {
        sql.push_str(&format!(
            ", FOREIGN KEY ({pid}) REFERENCES {ptable} ({pid}) ON UPDATE CASCADE ON DELETE CASCADE",
            pid = parent.id_column(),
            ptable = table_name(parent),
        ));
    }

    sql.push_str(" )");
    Ok(sql)
}

/// Build the single-row INSERT statement for one model's table.
///
/// Column list: parent-link column first when a parent exists, then own
/// fields in declaration order. All values are bound parameters.
pub fn insert_sql(desc: &ModelDescriptor) -> Result<String> {
    validate_identifier(desc.name)?;
    let mut columns: Vec<String> = Vec::new();
    if let Some(parent) = desc.parent {
        columns.push(parent.id_column());
    }
    for field in desc.own_fields() {
        validate_identifier(field.name)?;
        columns.push(field.name.to_string());
    }
    if columns.is_empty() {
        // root model with no declared fields: only the auto-assigned key
        return Ok(format!("INSERT INTO {} DEFAULT VALUES", table_name(desc)));
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table_name(desc),
        columns.join(", "),
        placeholders
    ))
}

/// Catalog query testing whether a table exists (name is a bound parameter)
pub const TABLE_EXISTS_SQL: &str =
    "SELECT count(name) FROM sqlite_master WHERE type = 'table' AND name = ?";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDef;

    static ROOT: ModelDescriptor = ModelDescriptor {
        name: "media",
        parent: None,
        fields: &[
            FieldDef::new("title", FieldType::Text),
            FieldDef::new("year", FieldType::Integer),
        ],
    };

    static CHILD: ModelDescriptor = ModelDescriptor {
        name: "book",
        parent: Some(&ROOT),
        fields: &[FieldDef::new("pages", FieldType::Integer)],
    };

    static BAD: ModelDescriptor = ModelDescriptor {
        name: "sample",
        parent: None,
        fields: &[FieldDef::new("payload", FieldType::Blob)],
    };

    #[test]
    fn identifier_validation() {
        assert!(validate_identifier("books").is_ok());
        assert!(validate_identifier("_hidden").is_ok());
        assert!(validate_identifier("book_2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("Books").is_err());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("na me").is_err());
        assert!(validate_identifier("x; DROP TABLE ys").is_err());
    }

    #[test]
    fn table_name_is_pure_and_distinct() {
        assert_eq!(table_name(&ROOT), "medias");
        assert_eq!(table_name(&ROOT), table_name(&ROOT));
        assert_ne!(table_name(&ROOT), table_name(&CHILD));
    }

    #[test]
    fn type_translation_allow_list() {
        assert_eq!(sql_type(FieldType::Text).unwrap(), "TEXT");
        assert_eq!(sql_type(FieldType::OptionalText).unwrap(), "TEXT");
        assert_eq!(sql_type(FieldType::Integer).unwrap(), "INT");
        assert_eq!(sql_type(FieldType::OptionalInteger).unwrap(), "INT");
        assert!(matches!(
            sql_type(FieldType::Real),
            Err(Error::UnsupportedType(_))
        ));
        assert!(matches!(
            sql_type(FieldType::Blob),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn root_table_has_no_parent_link() {
        let sql = create_table_sql(&ROOT).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS medias ( media_id INTEGER PRIMARY KEY, \
             title TEXT, year INT )"
        );
    }

    #[test]
    fn child_table_links_to_parent_with_cascade() {
        let sql = create_table_sql(&CHILD).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS books ( book_id INTEGER PRIMARY KEY, \
             media_id INTEGER, pages INT, FOREIGN KEY (media_id) REFERENCES \
             medias (media_id) ON UPDATE CASCADE ON DELETE CASCADE )"
        );
    }

    #[test]
    fn unsupported_type_fails_schema_build() {
        assert!(matches!(
            create_table_sql(&BAD),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn insert_statement_shapes() {
        assert_eq!(
            insert_sql(&ROOT).unwrap(),
            "INSERT INTO medias (title, year) VALUES (?, ?)"
        );
        assert_eq!(
            insert_sql(&CHILD).unwrap(),
            "INSERT INTO books (media_id, pages) VALUES (?, ?)"
        );
    }
}
