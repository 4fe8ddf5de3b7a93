//! Shared model hierarchy for integration tests
//!
//! media (root: title, year)
//! ├── book (pages)
//! │   └── hardcover (jacket)
//! └── vinyl (rpm)

use kindred::{
    ColumnMap, FieldDef, FieldType, Model, ModelDescriptor, Polymorphic, Registry, Result, Value,
};

pub static MEDIA: ModelDescriptor = ModelDescriptor {
    name: "media",
    parent: None,
    fields: &[
        FieldDef::new("title", FieldType::Text),
        FieldDef::new("year", FieldType::Integer),
    ],
};

pub static BOOK: ModelDescriptor = ModelDescriptor {
    name: "book",
    parent: Some(&MEDIA),
    fields: &[FieldDef::new("pages", FieldType::Integer)],
};

pub static VINYL: ModelDescriptor = ModelDescriptor {
    name: "vinyl",
    parent: Some(&MEDIA),
    fields: &[FieldDef::new("rpm", FieldType::Integer)],
};

pub static HARDCOVER: ModelDescriptor = ModelDescriptor {
    name: "hardcover",
    parent: Some(&BOOK),
    fields: &[FieldDef::new("jacket", FieldType::Text)],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub title: String,
    pub year: i64,
}

impl Model for Media {
    fn descriptor() -> &'static ModelDescriptor {
        &MEDIA
    }

    fn values(&self) -> Vec<Value> {
        vec![self.title.clone().into(), self.year.into()]
    }

    fn from_columns(columns: &ColumnMap) -> Result<Self> {
        Ok(Self {
            title: columns.text("title")?,
            year: columns.integer("year")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub title: String,
    pub year: i64,
    pub pages: i64,
}

impl Model for Book {
    fn descriptor() -> &'static ModelDescriptor {
        &BOOK
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.title.clone().into(),
            self.year.into(),
            self.pages.into(),
        ]
    }

    fn from_columns(columns: &ColumnMap) -> Result<Self> {
        Ok(Self {
            title: columns.text("title")?,
            year: columns.integer("year")?,
            pages: columns.integer("pages")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vinyl {
    pub title: String,
    pub year: i64,
    pub rpm: i64,
}

impl Model for Vinyl {
    fn descriptor() -> &'static ModelDescriptor {
        &VINYL
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.title.clone().into(),
            self.year.into(),
            self.rpm.into(),
        ]
    }

    fn from_columns(columns: &ColumnMap) -> Result<Self> {
        Ok(Self {
            title: columns.text("title")?,
            year: columns.integer("year")?,
            rpm: columns.integer("rpm")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hardcover {
    pub title: String,
    pub year: i64,
    pub pages: i64,
    pub jacket: String,
}

impl Model for Hardcover {
    fn descriptor() -> &'static ModelDescriptor {
        &HARDCOVER
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.title.clone().into(),
            self.year.into(),
            self.pages.into(),
            self.jacket.clone().into(),
        ]
    }

    fn from_columns(columns: &ColumnMap) -> Result<Self> {
        Ok(Self {
            title: columns.text("title")?,
            year: columns.integer("year")?,
            pages: columns.integer("pages")?,
            jacket: columns.text("jacket")?,
        })
    }
}

/// Tagged read result for polymorphic selects on `media`
#[derive(Debug, Clone, PartialEq)]
pub enum MediaRecord {
    Book(Book),
    Vinyl(Vinyl),
}

impl Polymorphic for Media {
    type Variant = MediaRecord;

    fn reconstruct(model: &str, columns: &ColumnMap) -> Result<Self::Variant> {
        match model {
            "book" => Ok(MediaRecord::Book(Book::from_columns(columns)?)),
            "vinyl" => Ok(MediaRecord::Vinyl(Vinyl::from_columns(columns)?)),
            other => Err(kindred::Error::Inheritance(format!(
                "unknown subclass {:?} of media",
                other
            ))),
        }
    }
}

/// A declaration using a semantic type outside the storage allow-list
pub static SAMPLE: ModelDescriptor = ModelDescriptor {
    name: "sample",
    parent: None,
    fields: &[FieldDef::new("payload", FieldType::Blob)],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub payload: Vec<u8>,
}

impl Model for Sample {
    fn descriptor() -> &'static ModelDescriptor {
        &SAMPLE
    }

    fn values(&self) -> Vec<Value> {
        vec![self.payload.clone().into()]
    }

    fn from_columns(columns: &ColumnMap) -> Result<Self> {
        match columns.get("payload") {
            Some(Value::Blob(bytes)) => Ok(Self {
                payload: bytes.clone(),
            }),
            _ => Err(kindred::Error::MissingColumn("payload".to_string())),
        }
    }
}

/// Registry with the full test hierarchy
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register::<Media>().expect("register media");
    registry.register::<Book>().expect("register book");
    registry.register::<Vinyl>().expect("register vinyl");
    registry.register::<Hardcover>().expect("register hardcover");
    registry
}
