//! Parsed instances and the typed values stored on their fields.
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::schema::ClassId;

/// Typed field value produced by coercion (or supplied as a default).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    /// `NaN` marks input that was not numeric.
    Number(f64),
    Object(Map<String, Value>),
    /// Opaque value carried as-is: sequence pass-through and untyped defaults.
    Raw(Value),
    /// Element-wise coerced sequence; `None` marks an absent element.
    List(Vec<Option<FieldValue>>),
    Instance(Box<Instance>),
}

impl FieldValue {
    /// Default values written in JSON keep the obvious typed form.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => FieldValue::String(s.clone()),
            Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::Object(m) => FieldValue::Object(m.clone()),
            other => FieldValue::Raw(other.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            FieldValue::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map<String, Value>> {
        match self {
            FieldValue::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            FieldValue::Raw(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Option<FieldValue>]> {
        match self {
            FieldValue::List(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            FieldValue::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        // NaN and infinities become null, the same as serde_json itself does.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<Instance> for FieldValue {
    fn from(i: Instance) -> Self {
        FieldValue::Instance(Box::new(i))
    }
}

/// One object of a registered class. A field missing from `fields` is unset.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    class: ClassId,
    fields: IndexMap<String, FieldValue>,
}

impl Instance {
    pub fn new(class: ClassId) -> Self {
        Self { class, fields: IndexMap::new() }
    }

    pub fn class(&self) -> &ClassId {
        &self.class
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// `None` unsets the field.
    pub fn set(&mut self, name: impl Into<String>, value: Option<FieldValue>) {
        let name = name.into();
        match value {
            Some(v) => {
                self.fields.insert(name, v);
            }
            None => {
                self.fields.shift_remove(&name);
            }
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_fields_only_with_nan_as_null() {
        let mut geo = Instance::new(ClassId::new("Geo"));
        geo.set("x", Some(5.0.into()));
        geo.set("y", Some(FieldValue::Number(f64::NAN)));

        let mut outer = Instance::new(ClassId::new("Container"));
        outer.set("geo", Some(geo.into()));
        outer.set("tags", Some(FieldValue::Raw(json!(["a", "b"]))));

        assert_eq!(outer.to_json(), json!({"geo": {"x": 5.0, "y": null}, "tags": ["a", "b"]}));
    }

    #[test]
    fn setting_none_unsets() {
        let mut i = Instance::new(ClassId::new("User"));
        i.set("x", Some("1".into()));
        i.set("y", Some("2".into()));
        i.set("x", None);
        assert!(!i.is_set("x"));
        assert_eq!(i.len(), 1);
    }

    #[test]
    fn defaults_from_json_keep_type() {
        assert_eq!(FieldValue::from_json(&json!("a")), FieldValue::String("a".into()));
        assert_eq!(FieldValue::from_json(&json!(3)), FieldValue::Number(3.0));
        assert_eq!(FieldValue::from_json(&json!([1])), FieldValue::Raw(json!([1])));
    }
}
