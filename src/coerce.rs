//! Raw value → typed field value, one declared tag at a time.
//!
//! Coercion never fails. Bad scalars degrade (`NaN`, stringified text), and
//! an unregistered nested class comes back as `None`, which leaves the field
//! unset.
pub mod num;
pub mod str;

use serde_json::{Map, Value};

use crate::instance::FieldValue;
use crate::parser::ObjectParser;
use crate::schema::TypeTag;

pub use num::to_number;
pub use str::to_display;

/// Coerce `raw` for a field of an instance at nesting `depth`.
pub(crate) fn coerce(
    parser: &ObjectParser<'_>,
    declared: &TypeTag,
    raw: &Value,
    depth: usize,
) -> Option<FieldValue> {
    match declared {
        TypeTag::String => Some(FieldValue::String(to_display(raw))),
        TypeTag::Number if parser.options().loose_numbers => {
            Some(FieldValue::Number(to_number(raw)))
        }
        TypeTag::Number => Some(FieldValue::Number(num::strict_number(raw))),
        TypeTag::Object => Some(FieldValue::Object(shallow_copy(raw))),
        TypeTag::Sequence { element } => {
            Some(coerce_sequence(parser, element.as_deref(), raw, depth))
        }
        TypeTag::Class(class) => parser
            .parse_at(class, raw, depth + 1)
            .map(FieldValue::from),
    }
}

/// Value for a field whose input is missing, when missing fields are assigned
/// anyway. Only a nested class has something to build from nothing.
pub(crate) fn coerce_missing(
    parser: &ObjectParser<'_>,
    declared: &TypeTag,
    depth: usize,
) -> Option<FieldValue> {
    match declared {
        TypeTag::Class(class) => parser
            .parse_at(class, &Value::Null, depth + 1)
            .map(FieldValue::from),
        _ => None,
    }
}

fn coerce_sequence(
    parser: &ObjectParser<'_>,
    element: Option<&TypeTag>,
    raw: &Value,
    depth: usize,
) -> FieldValue {
    match (element, raw) {
        (Some(element), Value::Array(xs)) if parser.options().typed_sequences => {
            let items = xs
                .iter()
                .map(|x| match x {
                    Value::Null => None,
                    x => coerce(parser, element, x, depth),
                })
                .collect();
            FieldValue::List(items)
        }
        _ => FieldValue::Raw(raw.clone()),
    }
}

/// New map holding `raw`'s own entries: objects by key, arrays and strings by
/// index. Other scalars have no entries.
pub fn shallow_copy(raw: &Value) -> Map<String, Value> {
    match raw {
        Value::Object(m) => m.clone(),
        Value::Array(xs) => xs
            .iter()
            .enumerate()
            .map(|(i, x)| (i.to_string(), x.clone()))
            .collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
            .collect(),
        _ => Map::new(),
    }
}

// ------------------------------- Tests ------------------------------------ //
