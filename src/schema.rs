//! Declared field types and the per-class schemas built from them.
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ------------------------------- ClassId ---------------------------------- //

/// Identity of a class. Cheap to clone; compares and hashes by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(Arc<str>);

impl ClassId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ClassId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ClassId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&ClassId> for ClassId {
    fn from(id: &ClassId) -> Self {
        id.clone()
    }
}

impl Serialize for ClassId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ClassId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ClassId::from)
    }
}

// ------------------------------- TypeTag ---------------------------------- //

/// Declared type of one schema field. Closed set; nothing else is coerced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Number,
    /// Untyped mapping, copied shallowly.
    Object,
    /// "Is an array" marker. `element` is only consulted when typed sequence
    /// coercion is switched on in `ParseOptions`.
    Sequence { element: Option<Box<TypeTag>> },
    /// Nested class, registered or not.
    Class(ClassId),
}

impl TypeTag {
    pub fn class(name: impl Into<ClassId>) -> Self {
        TypeTag::Class(name.into())
    }
    pub fn sequence() -> Self {
        TypeTag::Sequence { element: None }
    }
    pub fn sequence_of(element: TypeTag) -> Self {
        TypeTag::Sequence { element: Some(Box::new(element)) }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::String => f.write_str("string"),
            TypeTag::Number => f.write_str("number"),
            TypeTag::Object => f.write_str("object"),
            TypeTag::Sequence { element: None } => f.write_str("sequence"),
            TypeTag::Sequence { element: Some(el) } => write!(f, "sequence<{el}>"),
            TypeTag::Class(c) => write!(f, "{c}"),
        }
    }
}

// ----------------------------- ClassSchema -------------------------------- //

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub owner: ClassId,
    pub name: String,
    pub declared: TypeTag,
}

/// Fields declared directly on one class, in registration order.
#[derive(Clone, Debug)]
pub struct ClassSchema {
    owner: ClassId,
    fields: IndexMap<String, FieldDescriptor>,
}

impl ClassSchema {
    pub fn new(owner: ClassId) -> Self {
        Self { owner, fields: IndexMap::new() }
    }

    pub fn owner(&self) -> &ClassId {
        &self.owner
    }

    /// Last write wins; an overwritten field keeps its original position.
    pub(crate) fn insert(&mut self, name: String, declared: TypeTag) -> Option<FieldDescriptor> {
        let descriptor = FieldDescriptor {
            owner: self.owner.clone(),
            name: name.clone(),
            declared,
        };
        self.fields.insert(name, descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ------------------------------- Tests ------------------------------------ //
