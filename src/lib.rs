//! Typed views over untyped JSON.
//!
//! Classes declare their fields with a [`TypeTag`] on a [`RegistryBuilder`].
//! The frozen [`Registry`] then drives an [`ObjectParser`], which turns raw
//! `serde_json::Value`s into [`Instance`]s: inherited fields resolved, each
//! value coerced to its declared type, nested classes parsed recursively.
//!
//! ```
//! use json_bind::{ObjectParser, Registry, TypeTag};
//! use serde_json::json;
//!
//! let mut builder = Registry::builder();
//! builder.register("Geo", "x", TypeTag::Number);
//! builder.register("Container", "geo", TypeTag::class("Geo"));
//! let registry = builder.freeze().unwrap();
//!
//! let parser = ObjectParser::new(&registry);
//! let out = parser.parse("Container", &json!({"geo": {"x": 5}})).unwrap();
//! assert_eq!(out.to_json(), json!({"geo": {"x": 5.0}}));
//!
//! // not a JSON number: the not-a-number sentinel, serialized as null
//! let out = parser.parse("Container", &json!({"geo": {"x": "5"}})).unwrap();
//! assert_eq!(out.to_json(), json!({"geo": {"x": null}}));
//! ```
pub mod coerce;
pub mod instance;
pub mod parser;
pub mod path_de;
pub mod registry;
pub mod schema;
pub mod schema_file;

pub use instance::{FieldValue, Instance};
pub use parser::{ObjectParser, ParseOptions, PresencePolicy};
pub use registry::{DeclaredTypeProvider, Registry, RegistryBuilder, RegistryError};
pub use schema::{ClassId, ClassSchema, FieldDescriptor, TypeTag};
pub use schema_file::{SchemaDocument, SchemaFileError};
