//! Untyped JSON → instances of registered classes.
use rayon::prelude::*;
use serde_json::Value;

use crate::coerce;
use crate::instance::{FieldValue, Instance};
use crate::registry::Registry;
use crate::schema::TypeTag;

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What happens to a resolved field whose input is missing or null.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PresencePolicy {
    /// Leave the default-constructed value alone.
    #[default]
    SkipMissing,
    /// Assign every field: missing scalars become unset, missing nested
    /// classes are parsed from `null`.
    AssignAll,
}

#[derive(Clone, Debug)]
pub struct ParseOptions {
    pub presence: PresencePolicy,
    /// Coerce sequence elements with the sequence's element tag.
    pub typed_sequences: bool,
    /// Number fields also read numeric strings, booleans, `null` and
    /// singleton arrays. Off: only JSON numbers are numeric, the rest is `NaN`.
    pub loose_numbers: bool,
    /// Nested classes deeper than this are treated as absent.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            presence: PresencePolicy::default(),
            typed_sequences: false,
            loose_numbers: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ObjectParser<'r> {
    registry: &'r Registry,
    options: ParseOptions,
}

impl<'r> ObjectParser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, ParseOptions::default())
    }

    pub fn with_options(registry: &'r Registry, options: ParseOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// `None` when `class` is unregistered. Never fails otherwise: null or
    /// non-object data yields a default-constructed instance whose nested
    /// class fields are parsed from `null` in turn.
    pub fn parse(&self, class: &str, data: &Value) -> Option<Instance> {
        self.parse_at(class, data, 0)
    }

    /// Coerce one raw value as a top-level field would be.
    pub fn coerce(&self, declared: &TypeTag, raw: &Value) -> Option<FieldValue> {
        coerce::coerce(self, declared, raw, 0)
    }

    /// Parse many documents in parallel; output order follows input order.
    pub fn parse_all(&self, class: &str, documents: &[Value]) -> Vec<Option<Instance>> {
        documents.par_iter().map(|doc| self.parse(class, doc)).collect()
    }

    pub(crate) fn parse_at(&self, class: &str, data: &Value, depth: usize) -> Option<Instance> {
        if depth > self.options.max_depth {
            tracing::warn!(class, depth, "nesting limit reached, treating value as absent");
            return None;
        }
        let Some(fields) = self.registry.effective_fields(class) else {
            tracing::trace!(class, "unregistered class");
            return None;
        };
        let mut instance = self.registry.instantiate(class);
        let object = data.as_object();
        for field in fields {
            let raw = object
                .and_then(|m| m.get(&field.name))
                .filter(|v| !v.is_null());
            let value = match (raw, self.options.presence) {
                (Some(raw), _) => coerce::coerce(self, &field.declared, raw, depth),
                (None, PresencePolicy::AssignAll) => {
                    coerce::coerce_missing(self, &field.declared, depth)
                }
                // no payload at all: nested classes still get built from nothing
                (None, PresencePolicy::SkipMissing)
                    if object.is_none() && matches!(field.declared, TypeTag::Class(_)) =>
                {
                    coerce::coerce_missing(self, &field.declared, depth)
                }
                (None, PresencePolicy::SkipMissing) => continue,
            };
            tracing::trace!(
                class,
                field = field.name.as_str(),
                owner = %field.owner,
                set = value.is_some(),
                "assigned field"
            );
            instance.set(field.name.clone(), value);
        }
        Some(instance)
    }
}

// ------------------------------- Tests ------------------------------------ //
