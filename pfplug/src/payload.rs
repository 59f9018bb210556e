//! Encoding planned state into API request bodies

use crate::schema::{to_camel_case, Attribute, AttributeType, NestedType, Schema};
use crate::types::{Dynamic, DynamicValue};
use serde_json::{Map, Number, Value};

/// Request body for a planned state, keyed by API names.
///
/// Null and unknown values are left out, as are read-only computed
/// attributes. A reconciled plan therefore never sends an attribute the
/// target version does not accept.
pub fn encode_request(schema: &Schema, planned: &DynamicValue) -> Value {
    match planned.value.as_map() {
        Some(obj) => Value::Object(encode_object(schema.attributes(), obj)),
        None => Value::Object(Map::new()),
    }
}

fn encode_object(
    attrs: &[Attribute],
    obj: &std::collections::HashMap<String, Dynamic>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for attr in attrs {
        if attr.is_read_only() && !attr.state_only {
            continue;
        }
        let Some(value) = obj.get(&attr.name).filter(|v| v.is_defined()) else {
            continue;
        };
        if let Some(encoded) = encode_value(&attr.r#type, attr.nested_type.as_ref(), value) {
            out.insert(attr.api_name(), encoded);
        }
    }
    out
}

fn encode_value(ty: &AttributeType, nested: Option<&NestedType>, value: &Dynamic) -> Option<Value> {
    let encoded = match (ty, value) {
        (_, Dynamic::Null | Dynamic::Unknown) => return None,
        (_, Dynamic::Bool(b)) => Value::Bool(*b),
        (_, Dynamic::String(s)) => Value::String(s.clone()),
        (_, Dynamic::Number(n)) => encode_number(*n)?,
        (AttributeType::List(inner) | AttributeType::Set(inner), Dynamic::List(items)) => {
            Value::Array(
                items
                    .iter()
                    .filter_map(|item| encode_value(inner, nested, item))
                    .collect(),
            )
        }
        (AttributeType::Object(_), Dynamic::Map(obj)) if nested.is_some() => {
            let attrs = nested.map(|n| n.attributes.as_slice()).unwrap_or_default();
            Value::Object(encode_object(attrs, obj))
        }
        (AttributeType::Object(field_types), Dynamic::Map(obj)) => Value::Object(
            field_types
                .iter()
                .filter_map(|(name, field_type)| {
                    let field = obj.get(name)?;
                    Some((to_camel_case(name), encode_value(field_type, None, field)?))
                })
                .collect(),
        ),
        (AttributeType::Map(inner), Dynamic::Map(obj)) => Value::Object(
            obj.iter()
                .filter_map(|(key, item)| Some((key.clone(), encode_value(inner, None, item)?)))
                .collect(),
        ),
        (_, Dynamic::List(items)) => Value::Array(
            items
                .iter()
                .filter_map(|item| encode_value(&AttributeType::String, None, item))
                .collect(),
        ),
        (_, Dynamic::Map(obj)) => Value::Object(
            obj.iter()
                .filter_map(|(key, item)| {
                    Some((key.clone(), encode_value(&AttributeType::String, None, item)?))
                })
                .collect(),
        ),
    };
    Some(encoded)
}

/// Whole numbers go out as JSON integers; the admin API rejects `120.0`
/// for integer fields.
fn encode_number(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Some(Value::Number(Number::from(n as i64)))
    } else {
        Number::from_f64(n).map(Value::Number)
    }
}
