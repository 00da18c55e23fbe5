use serde_json::Value;

use crate::schema::{ClassId, TypeTag};

/// Supplies a field's declared type when a registration leaves it out.
pub trait DeclaredTypeProvider {
    fn declared_type(&self, class: &ClassId, field: &str) -> Option<TypeTag>;
}

impl<F> DeclaredTypeProvider for F
where
    F: Fn(&ClassId, &str) -> Option<TypeTag>,
{
    fn declared_type(&self, class: &ClassId, field: &str) -> Option<TypeTag> {
        self(class, field)
    }
}

/// Knows nothing; every omitted type fails registration.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProvider;

impl DeclaredTypeProvider for NoProvider {
    fn declared_type(&self, _: &ClassId, _: &str) -> Option<TypeTag> {
        None
    }
}

/// Tag implied by the JSON shape of a sample (e.g. a default) value.
/// Booleans and null have no tag.
pub fn tag_of_value(value: &Value) -> Option<TypeTag> {
    match value {
        Value::String(_) => Some(TypeTag::String),
        Value::Number(_) => Some(TypeTag::Number),
        Value::Object(_) => Some(TypeTag::Object),
        Value::Array(_) => Some(TypeTag::sequence()),
        Value::Bool(_) | Value::Null => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closures_are_providers() {
        let p = |c: &ClassId, f: &str| (c.as_str() == "Geo" && f == "x").then_some(TypeTag::Number);
        assert_eq!(p.declared_type(&ClassId::new("Geo"), "x"), Some(TypeTag::Number));
        assert_eq!(p.declared_type(&ClassId::new("Geo"), "y"), None);
    }

    #[test]
    fn value_shapes_map_to_tags() {
        assert_eq!(tag_of_value(&json!("")), Some(TypeTag::String));
        assert_eq!(tag_of_value(&json!([1, 2])), Some(TypeTag::sequence()));
        assert_eq!(tag_of_value(&json!(true)), None);
    }
}
