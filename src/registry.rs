//! Class registry: a mutable setup phase that freezes into a read-only view.
//!
//! Registration happens on a [`RegistryBuilder`]. Once every field is
//! declared, [`RegistryBuilder::freeze`] hands back a [`Registry`], the only
//! thing an [`ObjectParser`](crate::parser::ObjectParser) accepts. Writes
//! therefore cannot interleave with parses.
pub mod ancestors;
pub mod provider;

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::instance::{FieldValue, Instance};
use crate::schema::{ClassId, ClassSchema, FieldDescriptor, TypeTag};

pub use ancestors::AncestorResolver;
pub use provider::{tag_of_value, DeclaredTypeProvider, NoProvider};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no declared type for `{class}.{field}` and the type provider could not supply one")]
    UndeclaredType { class: ClassId, field: String },
    #[error("class `{class}` already extends `{existing}`, cannot also extend `{requested}`")]
    ConflictingParent { class: ClassId, existing: ClassId, requested: ClassId },
    #[error("inheritance cycle: {}", join_chain(.chain))]
    InheritanceCycle { chain: Vec<ClassId> },
}

fn join_chain(chain: &[ClassId]) -> String {
    chain.iter().map(ClassId::as_str).collect::<Vec<_>>().join(" -> ")
}

#[derive(Clone, Debug, Default)]
struct ClassDecl {
    parent: Option<ClassId>,
    defaults: IndexMap<String, FieldValue>,
}

// ------------------------------- Builder ---------------------------------- //

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    schemas: IndexMap<ClassId, ClassSchema>,
    decls: IndexMap<ClassId, ClassDecl>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `class`'s parent. Declaring again with the same parent is a no-op.
    pub fn declare_class(
        &mut self,
        class: impl Into<ClassId>,
        parent: Option<&str>,
    ) -> Result<&mut Self, RegistryError> {
        let class = class.into();
        let decl = self.decls.entry(class.clone()).or_default();
        if let Some(requested) = parent {
            match decl.parent.clone() {
                Some(existing) if existing.as_str() != requested => {
                    return Err(RegistryError::ConflictingParent {
                        class,
                        existing,
                        requested: ClassId::new(requested),
                    });
                }
                Some(_) => {}
                None => decl.parent = Some(ClassId::new(requested)),
            }
        }
        tracing::debug!(%class, parent = ?parent, "declared class");
        Ok(self)
    }

    /// Add or overwrite `field` on `class`. Last write wins.
    pub fn register(
        &mut self,
        class: impl Into<ClassId>,
        field: impl Into<String>,
        declared: TypeTag,
    ) -> &mut Self {
        let class = class.into();
        let field = field.into();
        tracing::debug!(%class, field = field.as_str(), %declared, "registered field");
        let schema = self
            .schemas
            .entry(class.clone())
            .or_insert_with(|| ClassSchema::new(class.clone()));
        if let Some(prior) = schema.insert(field, declared) {
            tracing::debug!(
                %class,
                field = %prior.name,
                prior = %prior.declared,
                "overwrote field"
            );
        }
        self
    }

    /// Like [`register`](Self::register), asking `provider` when `declared` is
    /// omitted. Fails if the provider has no answer.
    pub fn register_with(
        &mut self,
        class: impl Into<ClassId>,
        field: impl Into<String>,
        declared: Option<TypeTag>,
        provider: &dyn DeclaredTypeProvider,
    ) -> Result<&mut Self, RegistryError> {
        let class = class.into();
        let field = field.into();
        let declared = match declared.or_else(|| provider.declared_type(&class, &field)) {
            Some(tag) => tag,
            None => return Err(RegistryError::UndeclaredType { class, field }),
        };
        Ok(self.register(class, field, declared))
    }

    /// Value a default-constructed instance of `class` starts with.
    pub fn set_default(
        &mut self,
        class: impl Into<ClassId>,
        field: impl Into<String>,
        value: FieldValue,
    ) -> &mut Self {
        let decl = self.decls.entry(class.into()).or_default();
        decl.defaults.insert(field.into(), value);
        self
    }

    pub fn lookup(&self, class: &str) -> Option<&ClassSchema> {
        self.schemas.get(class)
    }

    /// End the setup phase.
    pub fn freeze(self) -> Result<Registry, RegistryError> {
        let parents: IndexMap<ClassId, ClassId> = self
            .decls
            .iter()
            .filter_map(|(c, d)| d.parent.clone().map(|p| (c.clone(), p)))
            .collect();
        check_acyclic(&parents)?;

        let ancestors = {
            let known = self.schemas.keys().chain(self.decls.keys());
            AncestorResolver::new(parents, known)
        };
        tracing::debug!(
            classes = self.schemas.len(),
            declared = self.decls.len(),
            "registry frozen"
        );
        Ok(Registry {
            schemas: self.schemas,
            defaults: self.decls.into_iter().map(|(c, d)| (c, d.defaults)).collect(),
            ancestors,
        })
    }
}

fn check_acyclic(parents: &IndexMap<ClassId, ClassId>) -> Result<(), RegistryError> {
    let mut cleared = HashSet::<&ClassId>::new();
    for start in parents.keys() {
        let mut path: Vec<&ClassId> = Vec::new();
        let mut cursor = Some(start);
        while let Some(class) = cursor {
            if cleared.contains(class) {
                break;
            }
            if let Some(at) = path.iter().position(|c| *c == class) {
                let mut chain: Vec<ClassId> = path[at..].iter().map(|c| (*c).clone()).collect();
                chain.push(class.clone());
                return Err(RegistryError::InheritanceCycle { chain });
            }
            path.push(class);
            cursor = parents.get(class);
        }
        cleared.extend(path);
    }
    Ok(())
}

// ------------------------------- Frozen ----------------------------------- //

/// Read-only registry. `Send + Sync`; parses may share it freely.
#[derive(Debug)]
pub struct Registry {
    schemas: IndexMap<ClassId, ClassSchema>,
    defaults: IndexMap<ClassId, IndexMap<String, FieldValue>>,
    ancestors: AncestorResolver,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// `None` when no field was ever registered for `class`.
    pub fn lookup(&self, class: &str) -> Option<&ClassSchema> {
        self.schemas.get(class)
    }

    /// Classes with at least one registered field, in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassId> {
        self.schemas.keys()
    }

    pub fn parent_of(&self, class: &str) -> Option<&ClassId> {
        self.ancestors.parent_of(class)
    }

    pub fn ancestors_of(&self, class: &str) -> Arc<[ClassId]> {
        self.ancestors.ancestors_of(class)
    }

    pub fn ancestors(&self) -> &AncestorResolver {
        &self.ancestors
    }

    /// Own fields first, then each ancestor's, nearest first; a name already
    /// covered by a nearer class is skipped.
    pub fn effective_fields(&self, class: &str) -> Option<Vec<&FieldDescriptor>> {
        let own = self.lookup(class)?;
        let ancestors = self.ancestors_of(class);
        let mut seen = HashSet::<&str>::new();
        let mut out = Vec::new();
        let inherited = ancestors.iter().filter_map(|a| self.lookup(a));
        for schema in std::iter::once(own).chain(inherited) {
            for field in schema.iter() {
                if seen.insert(field.name.as_str()) {
                    out.push(field);
                }
            }
        }
        Some(out)
    }

    /// Default-constructed instance: farthest ancestor's defaults first, each
    /// nearer class overriding.
    pub fn instantiate(&self, class: &str) -> Instance {
        let class_id = self
            .schemas
            .get_key_value(class)
            .map(|(k, _)| k.clone())
            .unwrap_or_else(|| ClassId::new(class));
        let mut instance = Instance::new(class_id);
        let ancestors = self.ancestors_of(class);
        let chain = ancestors.iter().rev().map(ClassId::as_str).chain(std::iter::once(class));
        for c in chain {
            if let Some(defaults) = self.defaults.get(c) {
                for (name, value) in defaults {
                    instance.set(name.clone(), Some(value.clone()));
                }
            }
        }
        instance
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reregistering_overwrites_descriptor() {
        let mut b = Registry::builder();
        b.register("Geo", "x", TypeTag::String);
        b.register("Geo", "x", TypeTag::Number);
        let registry = b.freeze().unwrap();
        let schema = registry.lookup("Geo").unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("x").unwrap().declared, TypeTag::Number);
    }

    #[test]
    fn declared_without_fields_is_unregistered() {
        let mut b = Registry::builder();
        b.declare_class("Sub", Some("Base")).unwrap();
        b.register("Base", "name", TypeTag::String);
        let registry = b.freeze().unwrap();
        assert!(registry.lookup("Sub").is_none());
        assert!(registry.lookup("Base").is_some());
        assert!(registry.effective_fields("Sub").is_none());
    }

    #[test]
    fn subclass_shadows_ancestor() {
        let mut b = Registry::builder();
        b.declare_class("Sub", Some("Base")).unwrap();
        b.register("Base", "name", TypeTag::String).register("Base", "id", TypeTag::Number);
        b.register("Sub", "name", TypeTag::Number);
        let registry = b.freeze().unwrap();

        let fields = registry.effective_fields("Sub").unwrap();
        let view: Vec<_> = fields
            .iter()
            .map(|f| (f.owner.as_str(), f.name.as_str(), f.declared.clone()))
            .collect();
        assert_eq!(view, [("Sub", "name", TypeTag::Number), ("Base", "id", TypeTag::Number)]);
    }

    #[test]
    fn missing_type_without_provider_fails() {
        let mut b = Registry::builder();
        let err = b.register_with("Geo", "x", None, &NoProvider).unwrap_err();
        assert!(matches!(err, RegistryError::UndeclaredType { ref field, .. } if field == "x"));
        assert!(b.lookup("Geo").is_none());
    }

    #[test]
    fn provider_fills_missing_type() {
        let mut b = Registry::builder();
        let provider = |_: &ClassId, f: &str| (f == "x").then_some(TypeTag::Number);
        b.register_with("Geo", "x", None, &provider).unwrap();
        b.register_with("Geo", "y", Some(TypeTag::String), &provider).unwrap();
        assert_eq!(b.lookup("Geo").unwrap().get("x").unwrap().declared, TypeTag::Number);
        assert_eq!(b.lookup("Geo").unwrap().get("y").unwrap().declared, TypeTag::String);
    }

    #[test]
    fn conflicting_parent_is_rejected() {
        let mut b = Registry::builder();
        b.declare_class("Me", Some("User")).unwrap();
        b.declare_class("Me", Some("User")).unwrap();
        b.declare_class("Me", None).unwrap();
        let err = b.declare_class("Me", Some("Admin")).unwrap_err();
        assert!(matches!(err, RegistryError::ConflictingParent { .. }));
    }

    #[test]
    fn cycles_rejected_at_freeze() {
        let mut b = Registry::builder();
        b.declare_class("A", Some("B")).unwrap();
        b.declare_class("B", Some("C")).unwrap();
        b.declare_class("C", Some("A")).unwrap();
        b.register("A", "x", TypeTag::String);
        match b.freeze() {
            Err(RegistryError::InheritanceCycle { chain }) => {
                assert_eq!(chain.len(), 4);
                assert_eq!(chain.first(), chain.last());
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn defaults_layer_from_root_down() {
        let mut b = Registry::builder();
        b.declare_class("Me", Some("User")).unwrap();
        b.register("User", "name", TypeTag::String);
        b.register("Me", "name", TypeTag::String);
        b.set_default("User", "x", "1".into());
        b.set_default("User", "name", "user".into());
        b.set_default("Me", "name", "".into());
        let registry = b.freeze().unwrap();

        let me = registry.instantiate("Me");
        assert_eq!(me.class().as_str(), "Me");
        assert_eq!(me.get("x").and_then(FieldValue::as_str), Some("1"));
        assert_eq!(me.get("name").and_then(FieldValue::as_str), Some(""));
    }
}
