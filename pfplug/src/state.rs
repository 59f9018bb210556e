//! Mapping remote API responses back into resource state
//!
//! Servers omit fields they don't know and often omit fields that are at
//! their default. The reader fills those gaps from the schema's gate table
//! so a refresh against any supported version yields the same state shape.

use crate::error::{PfplugError, Result};
use crate::gate::AvailabilityResolver;
use crate::schema::{to_camel_case, Attribute, AttributeType, NestedType, Schema};
use crate::types::{AttributePath, Dynamic, DynamicValue};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, error};

/// Why the state is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// After create or update, or a plain refresh
    Refresh,
    /// First read after `terraform import`
    Import,
}

pub struct StateReader<'a> {
    schema: &'a Schema,
    resolver: &'a AvailabilityResolver,
}

impl<'a> StateReader<'a> {
    pub fn new(schema: &'a Schema, resolver: &'a AvailabilityResolver) -> Self {
        Self { schema, resolver }
    }

    /// Build state from a response body. Any mismatch between the payload and
    /// the schema fails the whole read; no partial state is returned.
    pub fn read(
        &self,
        remote: &Value,
        prior_state: Option<&DynamicValue>,
        mode: ReadMode,
    ) -> Result<DynamicValue> {
        let Value::Object(remote_obj) = remote else {
            return Err(PfplugError::RemoteDecode {
                path: String::new(),
                message: format!("expected a JSON object, got {}", json_type(remote)),
            });
        };

        let prior_obj = prior_state.and_then(|p| p.value.as_map());
        let state = self
            .read_object(
                self.schema.attributes(),
                remote_obj,
                prior_obj,
                mode,
                &AttributePath::root(),
            )
            .inspect_err(|err| error!(error = %err, "failed to decode remote response"))?;

        Ok(DynamicValue::new(Dynamic::Map(state)))
    }

    fn read_object(
        &self,
        attrs: &[Attribute],
        remote: &Map<String, Value>,
        prior: Option<&HashMap<String, Dynamic>>,
        mode: ReadMode,
        path: &AttributePath,
    ) -> Result<HashMap<String, Dynamic>> {
        let mut out = HashMap::with_capacity(attrs.len());

        for attr in attrs {
            let attr_path = path.clone().attribute(&attr.name);
            let prior_value = prior.and_then(|p| p.get(&attr.name));

            if attr.state_only {
                out.insert(
                    attr.name.clone(),
                    prior_value.cloned().unwrap_or(Dynamic::Null),
                );
                continue;
            }

            let value = match remote.get(&attr.api_name()).filter(|v| !v.is_null()) {
                Some(json) => {
                    let value = self.decode(
                        &attr.r#type,
                        attr.nested_type.as_ref(),
                        json,
                        prior_value,
                        mode,
                        &attr_path,
                    )?;
                    if attr.empty_means_default
                        && value.as_string() == Some("")
                        && self.resolver.is_available(&attr.gate)?
                    {
                        self.default_for(attr)?.unwrap_or(value)
                    } else {
                        value
                    }
                }
                None if !self.resolver.is_available(&attr.gate)? => Dynamic::Null,
                None => {
                    let value = self.default_for(attr)?.unwrap_or(Dynamic::Null);
                    if value.is_defined() {
                        debug!(attribute = %attr_path, default = %value, "response omitted attribute, using default");
                    }
                    value
                }
            };
            out.insert(attr.name.clone(), value);
        }

        if mode == ReadMode::Import {
            for attr in attrs {
                let keep = attr
                    .dependencies
                    .iter()
                    .filter(|d| d.on_import)
                    .all(|dep| {
                        out.get(&dep.companion)
                            .is_some_and(|companion| companion.semantically_equals(&dep.value))
                    });
                if !keep {
                    out.insert(attr.name.clone(), Dynamic::Null);
                }
            }
        }

        Ok(out)
    }

    fn default_for(&self, attr: &Attribute) -> Result<Option<Dynamic>> {
        match &attr.default {
            Some(default) => default.resolve(self.resolver),
            None => Ok(None),
        }
    }

    fn decode(
        &self,
        ty: &AttributeType,
        nested: Option<&NestedType>,
        json: &Value,
        prior: Option<&Dynamic>,
        mode: ReadMode,
        path: &AttributePath,
    ) -> Result<Dynamic> {
        match (ty, json) {
            (_, Value::Null) => Ok(Dynamic::Null),
            (AttributeType::String, Value::String(s)) => Ok(Dynamic::String(s.clone())),
            (AttributeType::Number, Value::Number(n)) => n
                .as_f64()
                .map(Dynamic::Number)
                .ok_or_else(|| decode_error(path, format!("number {} out of range", n))),
            (AttributeType::Bool, Value::Bool(b)) => Ok(Dynamic::Bool(*b)),
            (AttributeType::List(inner) | AttributeType::Set(inner), Value::Array(items)) => {
                let prior_items = prior.and_then(Dynamic::as_list);
                let mut decoded = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    decoded.push(self.decode(
                        inner,
                        nested,
                        item,
                        prior_items.and_then(|l| l.get(idx)),
                        mode,
                        &path.clone().index(idx as i64),
                    )?);
                }
                Ok(Dynamic::List(decoded))
            }
            (AttributeType::Map(inner), Value::Object(fields)) => {
                let mut decoded = HashMap::with_capacity(fields.len());
                for (key, item) in fields {
                    decoded.insert(
                        key.clone(),
                        self.decode(inner, None, item, None, mode, &path.clone().key(key))?,
                    );
                }
                Ok(Dynamic::Map(decoded))
            }
            (AttributeType::Object(_), Value::Object(fields)) if nested.is_some() => {
                let nested = nested.map(|n| n.attributes.as_slice()).unwrap_or_default();
                let object =
                    self.read_object(nested, fields, prior.and_then(Dynamic::as_map), mode, path)?;
                Ok(Dynamic::Map(object))
            }
            (AttributeType::Object(field_types), Value::Object(fields)) => {
                let mut decoded = HashMap::with_capacity(field_types.len());
                for (name, field_type) in field_types {
                    let value = match fields.get(&to_camel_case(name)) {
                        Some(item) => self.decode(
                            field_type,
                            None,
                            item,
                            None,
                            mode,
                            &path.clone().attribute(name),
                        )?,
                        None => Dynamic::Null,
                    };
                    decoded.insert(name.clone(), value);
                }
                Ok(Dynamic::Map(decoded))
            }
            (expected, other) => Err(decode_error(
                path,
                format!("expected {}, got {}", type_label(expected), json_type(other)),
            )),
        }
    }
}

fn decode_error(path: &AttributePath, message: String) -> PfplugError {
    PfplugError::RemoteDecode {
        path: path.to_string(),
        message,
    }
}

fn type_label(ty: &AttributeType) -> &'static str {
    match ty {
        AttributeType::String => "string",
        AttributeType::Number => "number",
        AttributeType::Bool => "bool",
        AttributeType::List(_) => "list",
        AttributeType::Set(_) => "set",
        AttributeType::Map(_) => "map",
        AttributeType::Object(_) => "object",
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
