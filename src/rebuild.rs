//! Row reconstruction for polymorphic reads
//!
//! A joined row carries one id column per direct subclass table. The row
//! belongs to whichever subclass has a non-null id. Zero non-null subclass
//! ids means the row has no concrete subclass representation and is skipped.
//! More than one is a schema/data inconsistency (a LEFT JOIN per sibling can
//! only produce it when the tables disagree) and is rejected outright rather
//! than silently emitting one result per match.

use crate::error::{Error, Result};
use crate::model::{ModelDescriptor, Polymorphic};
use crate::value::ColumnMap;

/// Find the single subclass whose id column is non-null on this row
pub fn matching_child<'a>(
    columns: &ColumnMap,
    children: &[&'a ModelDescriptor],
) -> Result<Option<&'a ModelDescriptor>> {
    let mut found: Option<&ModelDescriptor> = None;
    for child in children {
        if columns.is_set(&child.id_column()) {
            if let Some(previous) = found {
                return Err(Error::AmbiguousRow(
                    previous.name.to_string(),
                    child.name.to_string(),
                ));
            }
            found = Some(child);
        }
    }
    Ok(found)
}

/// Rebuild the typed variant for one decoded row, or `None` when no subclass
/// id is present
pub fn rebuild_row<P: Polymorphic>(
    columns: &ColumnMap,
    children: &[&ModelDescriptor],
) -> Result<Option<P::Variant>> {
    match matching_child(columns, children)? {
        Some(child) => P::reconstruct(child.name, columns).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDef, FieldType};
    use crate::value::Value;

    static MEDIA: ModelDescriptor = ModelDescriptor {
        name: "media",
        parent: None,
        fields: &[FieldDef::new("title", FieldType::Text)],
    };

    static BOOK: ModelDescriptor = ModelDescriptor {
        name: "book",
        parent: Some(&MEDIA),
        fields: &[FieldDef::new("pages", FieldType::Integer)],
    };

    static VINYL: ModelDescriptor = ModelDescriptor {
        name: "vinyl",
        parent: Some(&MEDIA),
        fields: &[FieldDef::new("rpm", FieldType::Integer)],
    };

    fn row(book_id: Option<i64>, vinyl_id: Option<i64>) -> ColumnMap {
        let mut map = ColumnMap::new();
        map.insert("media_id", Value::Integer(1));
        map.insert("title", Value::Text("Dune".into()));
        map.insert("book_id", book_id.into());
        map.insert("pages", Value::Null);
        map.insert("vinyl_id", vinyl_id.into());
        map.insert("rpm", Value::Null);
        map
    }

    #[test]
    fn single_match_resolves() {
        let child = matching_child(&row(Some(3), None), &[&BOOK, &VINYL]).unwrap();
        assert_eq!(child.map(|c| c.name), Some("book"));
    }

    #[test]
    fn no_match_yields_none() {
        let child = matching_child(&row(None, None), &[&BOOK, &VINYL]).unwrap();
        assert!(child.is_none());
    }

    #[test]
    fn double_match_is_rejected() {
        let err = matching_child(&row(Some(3), Some(4)), &[&BOOK, &VINYL]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousRow(_, _)));
    }
}
