//! Explicit subclass registry
//!
//! The set of direct subclasses of a type is not inferred from global state;
//! callers populate a `Registry` once at startup and pass it to the query
//! components. The join graph a select builds is therefore deterministic:
//! exactly the registered children, in registration order.

use crate::error::{Error, Result};
use crate::model::{Model, ModelDescriptor};
use crate::schema::validate_identifier;
use tracing::debug;

/// Caller-populated mapping from parent type to ordered direct subclasses
#[derive(Debug, Default)]
pub struct Registry {
    models: Vec<&'static ModelDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model type.
    ///
    /// Validates every identifier the type will contribute to SQL text, and
    /// enforces hierarchy rules: the parent must already be registered, names
    /// must be unique across the registry, and a child's own fields must not
    /// shadow any ancestor field (shadowing would make joined columns
    /// ambiguous). Registering the same type twice is a no-op.
    pub fn register<M: Model>(&mut self) -> Result<()> {
        self.register_descriptor(M::descriptor())
    }

    fn register_descriptor(&mut self, desc: &'static ModelDescriptor) -> Result<()> {
        if self.models.iter().any(|known| known.is(desc)) {
            return Ok(());
        }

        validate_identifier(desc.name)?;
        for field in desc.own_fields() {
            validate_identifier(field.name)?;
        }

        if self.models.iter().any(|known| known.name == desc.name) {
            return Err(Error::Inheritance(format!(
                "model name {:?} is already registered for a different type",
                desc.name
            )));
        }

        if let Some(parent) = desc.parent {
            if !self.models.iter().any(|known| known.is(parent)) {
                return Err(Error::Inheritance(format!(
                    "parent {:?} of {:?} must be registered first",
                    parent.name, desc.name
                )));
            }

            let inherited = parent.visible_fields();
            for field in desc.own_fields() {
                if inherited.iter().any(|f| f.name == field.name) {
                    return Err(Error::Inheritance(format!(
                        "field {:?} on {:?} shadows an inherited field",
                        field.name, desc.name
                    )));
                }
            }
        }

        for level in desc.chain() {
            if field_collides(desc, &level.id_column()) {
                return Err(Error::Inheritance(format!(
                    "field on {:?} collides with id column {:?}",
                    desc.name,
                    level.id_column()
                )));
            }
        }

        debug!(model = desc.name, "registered model");
        self.models.push(desc);
        Ok(())
    }

    /// Direct subclasses of the named type, in registration order
    pub fn children_of(&self, name: &str) -> Vec<&'static ModelDescriptor> {
        self.models
            .iter()
            .copied()
            .filter(|desc| matches!(desc.parent, Some(parent) if parent.name == name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn field_collides(desc: &ModelDescriptor, column: &str) -> bool {
    desc.own_fields().iter().any(|f| f.name == column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDef, FieldType};
    use crate::value::{ColumnMap, Value};

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

    static SHADOWING: ModelDescriptor = ModelDescriptor {
        name: "reprint",
        parent: Some(&MEDIA),
        fields: &[FieldDef::new("title", FieldType::Text)],
    };

    struct Media;
    struct Book;
    struct Vinyl;
    struct Reprint;

    macro_rules! stub_model {
        ($ty:ident, $desc:ident) => {
            impl Model for $ty {
                fn descriptor() -> &'static ModelDescriptor {
                    &$desc
                }
                fn values(&self) -> Vec<Value> {
                    Vec::new()
                }
                fn from_columns(_columns: &ColumnMap) -> crate::error::Result<Self> {
                    Ok(Self)
                }
            }
        };
    }

    stub_model!(Media, MEDIA);
    stub_model!(Book, BOOK);
    stub_model!(Vinyl, VINYL);
    stub_model!(Reprint, SHADOWING);

    #[test]
    fn children_follow_registration_order() {
        let mut reg = Registry::new();
        reg.register::<Media>().unwrap();
        reg.register::<Book>().unwrap();
        reg.register::<Vinyl>().unwrap();

        let names: Vec<&str> = reg.children_of("media").iter().map(|d| d.name).collect();
        assert_eq!(names, ["book", "vinyl"]);
        assert!(reg.children_of("book").is_empty());
    }

    #[test]
    fn parent_must_be_registered_first() {
        let mut reg = Registry::new();
        let err = reg.register::<Book>().unwrap_err();
        assert!(matches!(err, Error::Inheritance(_)));
    }

    #[test]
    fn shadowed_field_is_rejected() {
        let mut reg = Registry::new();
        reg.register::<Media>().unwrap();
        let err = reg.register::<Reprint>().unwrap_err();
        assert!(matches!(err, Error::Inheritance(_)));
    }

    #[test]
    fn double_registration_is_idempotent() {
        let mut reg = Registry::new();
        reg.register::<Media>().unwrap();
        reg.register::<Media>().unwrap();
        assert_eq!(reg.len(), 1);
    }
}
