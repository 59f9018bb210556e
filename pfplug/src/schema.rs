//! Schema types and builders for pfplug
//!
//! Besides the usual type and required/optional/computed flags, every
//! attribute carries its own version gate table: the version window in which
//! the server accepts it, a version-conditional default, and the companion
//! attributes it depends on. The reconciler and the state reader are driven
//! entirely by these declarations.

use crate::defaults::VersionedDefault;
use crate::gate::VersionGate;
use crate::plan_modifier::PlanModifier;
use crate::types::Dynamic;
use crate::validator::Validator;
use crate::version::SupportedVersion;
use std::collections::HashMap;
use std::sync::Arc;

/// AttributeType defines the type system for Terraform attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

/// Schema is returned by providers/resources/data sources
/// Version is used for state migration
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

impl Schema {
    pub fn attributes(&self) -> &[Attribute] {
        &self.block.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }
}

/// Block represents a configuration block
#[derive(Debug, Clone)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub description: String,
}

/// How nested attributes are structured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingMode {
    Single,
    List,
    Set,
}

/// NestedType for attributes with nested structures
#[derive(Debug, Clone)]
pub struct NestedType {
    pub attributes: Vec<Attribute>,
    pub nesting: NestingMode,
}

impl NestedType {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// A requirement on a sibling attribute
///
/// When this attribute is set (and equals `when`, if given), the companion
/// must hold `value`. With `validate` the requirement is checked during plan;
/// with `on_import` the attribute is dropped on import unless it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDependency {
    pub companion: String,
    pub value: Dynamic,
    pub when: Option<Dynamic>,
    pub validate: bool,
    pub on_import: bool,
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub nested_type: Option<NestedType>,
    pub gate: VersionGate,
    pub default: Option<VersionedDefault>,
    /// Recomputed by the server on every change (timestamps, hashes)
    pub server_computed: bool,
    pub dependencies: Vec<AttributeDependency>,
    /// An empty string in a response means "server default"
    pub empty_means_default: bool,
    /// Never echoed back by the server; kept from prior state on read
    pub state_only: bool,
    pub api_name: Option<String>,
}

// Manual Debug implementation since validators/modifiers don't implement Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .field(
                "plan_modifiers",
                &format!("{} plan modifiers", self.plan_modifiers.len()),
            )
            .field("nested_type", &self.nested_type)
            .field("gate", &self.gate)
            .field("default", &self.default)
            .field("server_computed", &self.server_computed)
            .field("dependencies", &self.dependencies)
            .field("empty_means_default", &self.empty_means_default)
            .field("state_only", &self.state_only)
            .field("api_name", &self.api_name)
            .finish()
    }
}

impl Attribute {
    /// Key used in API payloads
    pub fn api_name(&self) -> String {
        self.api_name
            .clone()
            .unwrap_or_else(|| to_camel_case(&self.name))
    }

    /// Computed with no way for the user to set it
    pub fn is_read_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    pub fn is_gated(&self) -> bool {
        !self.gate.is_unconditional()
    }
}

/// snake_case to camelCase
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Object type built from nested attributes
pub fn object_type(attributes: &[Attribute]) -> AttributeType {
    AttributeType::Object(
        attributes
            .iter()
            .map(|a| (a.name.clone(), a.r#type.clone()))
            .collect(),
    )
}

/// AttributeBuilder provides fluent API for building attributes
/// ALWAYS use this instead of constructing Attribute directly
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
                nested_type: None,
                gate: VersionGate::always(),
                default: None,
                server_computed: false,
                dependencies: Vec::new(),
                empty_means_default: false,
                state_only: false,
                api_name: None,
            },
        }
    }

    /// Nested object attribute; the type is derived from the children
    pub fn nested(name: &str, nesting: NestingMode, attributes: Vec<Attribute>) -> Self {
        let object = object_type(&attributes);
        let type_ = match nesting {
            NestingMode::Single => object,
            NestingMode::List => AttributeType::List(Box::new(object)),
            NestingMode::Set => AttributeType::Set(Box::new(object)),
        };
        let mut builder = Self::new(name, type_);
        builder.attribute.nested_type = Some(NestedType {
            attributes,
            nesting,
        });
        builder
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Mark as sensitive (hidden)
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.attribute.validators.push(Arc::from(validator));
        self
    }

    pub fn plan_modifier(mut self, modifier: Box<dyn PlanModifier>) -> Self {
        self.attribute.plan_modifiers.push(Arc::from(modifier));
        self
    }

    /// First version that accepts the attribute (inclusive)
    pub fn min_version(mut self, version: SupportedVersion) -> Self {
        self.attribute.gate.introduced = Some(version);
        self
    }

    /// First version that no longer accepts the attribute
    pub fn removed_in(mut self, version: SupportedVersion) -> Self {
        self.attribute.gate.removed = Some(version);
        self
    }

    /// Default applied when the value is left unknown; implies computed
    pub fn default(mut self, default: VersionedDefault) -> Self {
        self.attribute.default = Some(default);
        self.attribute.computed = true;
        self
    }

    /// Value the server recomputes whenever the resource changes
    pub fn server_computed(mut self) -> Self {
        self.attribute.server_computed = true;
        self.attribute.computed = true;
        self
    }

    /// Setting this attribute requires `companion` to equal `value`
    pub fn requires_value(mut self, companion: &str, value: Dynamic) -> Self {
        self.attribute.dependencies.push(AttributeDependency {
            companion: companion.to_string(),
            value,
            when: None,
            validate: true,
            on_import: true,
        });
        self
    }

    /// Setting this attribute to `when` requires `companion` to equal `value`
    pub fn requires_value_when(mut self, when: Dynamic, companion: &str, value: Dynamic) -> Self {
        self.attribute.dependencies.push(AttributeDependency {
            companion: companion.to_string(),
            value,
            when: Some(when),
            validate: true,
            on_import: false,
        });
        self
    }

    /// On import, keep this attribute only when `companion` equals `value`
    pub fn imported_only_with(mut self, companion: &str, value: Dynamic) -> Self {
        self.attribute.dependencies.push(AttributeDependency {
            companion: companion.to_string(),
            value,
            when: None,
            validate: false,
            on_import: true,
        });
        self
    }

    pub fn empty_means_default(mut self) -> Self {
        self.attribute.empty_means_default = true;
        self
    }

    pub fn state_only(mut self) -> Self {
        self.attribute.state_only = true;
        self
    }

    /// Override the payload key (camelCase of the name by default)
    pub fn api_name(mut self, name: &str) -> Self {
        self.attribute.api_name = Some(name.to_string());
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
/// ALWAYS use this for consistency
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    attributes: Vec::new(),
                    description: String::new(),
                },
            },
        }
    }

    /// Set schema version
    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
