//! Model descriptors and persistence traits
//!
//! Every persisted type declares a static [`ModelDescriptor`]: its name, its
//! immediate parent (if any) and its *own* fields, i.e. the fields declared on
//! that type and not inherited from an ancestor. Descriptors are declared once
//! and linked by reference, so a type structurally has at most one direct
//! parent and the inheritance chain is walkable without runtime introspection.

use crate::error::Result;
use crate::value::{ColumnMap, Value};
use serde::{Deserialize, Serialize};

/// Semantic field types accepted by model declarations.
///
/// This is a closed set; only the text-like and integer-like members have a
/// storage translation (see [`crate::schema::sql_type`]). The remaining
/// members exist so a declaration can be rejected with a clear error instead
/// of being guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    OptionalText,
    Integer,
    OptionalInteger,
    Real,
    OptionalReal,
    Blob,
}

impl FieldType {
    /// Display label used in diagnostics
    pub fn label(self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::OptionalText => "OptionalText",
            FieldType::Integer => "Integer",
            FieldType::OptionalInteger => "OptionalInteger",
            FieldType::Real => "Real",
            FieldType::OptionalReal => "OptionalReal",
            FieldType::Blob => "Blob",
        }
    }
}

/// One declared field: name plus semantic type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldDef {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// Static description of one persisted type.
///
/// `fields` lists own fields only, in declaration order. `parent` links to the
/// immediate ancestor's descriptor; `None` marks a chain root.
#[derive(Debug)]
pub struct ModelDescriptor {
    pub name: &'static str,
    pub parent: Option<&'static ModelDescriptor>,
    pub fields: &'static [FieldDef],
}

impl ModelDescriptor {
    /// Primary-key column name for this type's table
    pub fn id_column(&self) -> String {
        format!("{}_id", self.name)
    }

    /// Own fields, declaration order (introspection contract)
    pub fn own_fields(&self) -> &'static [FieldDef] {
        self.fields
    }

    /// Inheritance chain from the root down to this type
    pub fn chain(&self) -> Vec<&ModelDescriptor> {
        let mut chain = Vec::new();
        let mut cursor = Some(self);
        while let Some(desc) = cursor {
            chain.push(desc);
            cursor = desc.parent;
        }
        chain.reverse();
        chain
    }

    /// All fields visible on instances of this type: ancestors first, each
    /// level in declaration order. Matches the flattening order of
    /// [`Model::values`].
    pub fn visible_fields(&self) -> Vec<FieldDef> {
        self.chain()
            .into_iter()
            .flat_map(|desc| desc.fields.iter().copied())
            .collect()
    }

    /// True when `other` is the same descriptor (identity, not name equality)
    pub fn is(&self, other: &ModelDescriptor) -> bool {
        std::ptr::eq(self, other)
    }
}

/// A type persisted into the inheritance-by-reference schema.
///
/// Primary keys are auto-assigned by the database and stay opaque: instances
/// carry field values only. `values` and `from_columns` are each other's
/// inverse over the visible-field flattening.
pub trait Model: Sized {
    /// Static descriptor for this type
    fn descriptor() -> &'static ModelDescriptor;

    /// Visible field values, flattened ancestors-first in declaration order
    fn values(&self) -> Vec<Value>;

    /// Rebuild an instance from a decoded row.
    ///
    /// The map may carry extra columns (ids, sibling-subclass columns); those
    /// are ignored. Implementations read their own columns by name through the
    /// [`ColumnMap`] getters.
    fn from_columns(columns: &ColumnMap) -> Result<Self>;
}

/// Read-side dispatch for polymorphic selects on a parent type.
///
/// `Variant` is the tagged result emitted by [`crate::Database::select`]: one
/// enum case per registered direct subclass. `reconstruct` receives the name
/// of the single subclass whose id column was non-null on the row.
pub trait Polymorphic: Model {
    type Variant;

    fn reconstruct(model: &str, columns: &ColumnMap) -> Result<Self::Variant>;
}
