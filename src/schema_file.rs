//! JSON schema documents: classes, parents, field tags and defaults.
//!
//! ```json
//! {
//!   "classes": {
//!     "User": { "fields": { "name": "string" }, "defaults": { "x": "1" } },
//!     "Me": {
//!       "extends": "User",
//!       "fields": { "name": null, "geo": { "sequence": { "class": "Geo" } } },
//!       "defaults": { "name": "" }
//!     }
//!   }
//! }
//! ```
//!
//! A `null` tag asks for the type implied by the field's default value.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::instance::FieldValue;
use crate::path_de::{self, PathError};
use crate::registry::{tag_of_value, Registry, RegistryError};
use crate::schema::{ClassId, TypeTag};

#[derive(Debug, Error)]
pub enum SchemaFileError {
    #[error("failed to read schema file {}: {source}", .path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("invalid schema document {at}")]
    Shape { at: Box<PathError> },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<PathError> for SchemaFileError {
    fn from(err: PathError) -> Self {
        SchemaFileError::Shape { at: Box::new(err) }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    pub classes: IndexMap<String, ClassEntry>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: IndexMap<String, Option<TagSpec>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub defaults: IndexMap<String, Value>,
}

/// Written form of a [`TypeTag`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagSpec {
    Keyword(Keyword),
    Class { class: String },
    Sequence { sequence: Box<TagSpec> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    String,
    Number,
    Object,
    Sequence,
}

impl From<&TagSpec> for TypeTag {
    fn from(spec: &TagSpec) -> Self {
        match spec {
            TagSpec::Keyword(Keyword::String) => TypeTag::String,
            TagSpec::Keyword(Keyword::Number) => TypeTag::Number,
            TagSpec::Keyword(Keyword::Object) => TypeTag::Object,
            TagSpec::Keyword(Keyword::Sequence) => TypeTag::sequence(),
            TagSpec::Class { class } => TypeTag::class(class.as_str()),
            TagSpec::Sequence { sequence } => {
                TypeTag::sequence_of(TypeTag::from(sequence.as_ref()))
            }
        }
    }
}

impl SchemaDocument {
    pub fn load(path: &Path) -> Result<Self, SchemaFileError> {
        let bytes = std::fs::read(path).map_err(|source| SchemaFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(path_de::from_slice_with_path(&bytes)?)
    }

    pub fn from_json_str(src: &str) -> Result<Self, SchemaFileError> {
        Ok(path_de::from_str_with_path(src)?)
    }

    pub fn from_value(value: Value) -> Result<Self, SchemaFileError> {
        Ok(path_de::from_value_with_path(value)?)
    }

    /// Register every class and freeze.
    pub fn build(&self) -> Result<Registry, RegistryError> {
        let provider = |class: &ClassId, field: &str| {
            self.classes
                .get(class.as_str())
                .and_then(|entry| entry.defaults.get(field))
                .and_then(tag_of_value)
        };
        let mut builder = Registry::builder();
        for (name, entry) in &self.classes {
            builder.declare_class(name.as_str(), entry.extends.as_deref())?;
            for (field, value) in &entry.defaults {
                builder.set_default(name.as_str(), field.as_str(), FieldValue::from_json(value));
            }
            for (field, spec) in &entry.fields {
                let declared = spec.as_ref().map(TypeTag::from);
                builder.register_with(name.as_str(), field.as_str(), declared, &provider)?;
            }
        }
        builder.freeze()
    }
}

/// Read and build in one step.
pub fn load_registry(path: &Path) -> Result<Registry, SchemaFileError> {
    let document = SchemaDocument::load(path)?;
    let registry = document.build()?;
    tracing::info!(path = %path.display(), classes = document.classes.len(), "loaded schema");
    Ok(registry)
}

// ------------------------------- Tests ------------------------------------ //
