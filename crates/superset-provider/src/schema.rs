// Passive schema declarations
//
// The configuration engine reads these to validate user configuration and
// to know which attributes are computed or sensitive. Nothing here talks to
// Superset.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "element", rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Object(Block),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Attribute {
    #[serde(flatten)]
    pub kind: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Forces replacement when the value changes.
    pub requires_replace: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Attribute {
    fn new(kind: AttributeType, description: &'static str) -> Self {
        Self {
            kind,
            description,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            requires_replace: false,
            default: None,
        }
    }

    pub fn required(kind: AttributeType, description: &'static str) -> Self {
        Self {
            required: true,
            ..Self::new(kind, description)
        }
    }

    pub fn optional(kind: AttributeType, description: &'static str) -> Self {
        Self {
            optional: true,
            ..Self::new(kind, description)
        }
    }

    pub fn computed(kind: AttributeType, description: &'static str) -> Self {
        Self {
            computed: true,
            ..Self::new(kind, description)
        }
    }

    /// Optional in configuration, filled in by the provider when omitted.
    pub fn optional_computed(kind: AttributeType, description: &'static str) -> Self {
        Self {
            optional: true,
            computed: true,
            ..Self::new(kind, description)
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A named set of attributes, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Block {
    pub attributes: IndexMap<&'static str, Attribute>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub description: &'static str,
    pub block: Block,
}

impl Schema {
    pub fn new(description: &'static str, block: Block) -> Self {
        Self { description, block }
    }
}

/// Everything the provider declares: its own configuration block plus one
/// schema per resource and data source type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: IndexMap<String, Schema>,
    pub data_sources: IndexMap<String, Schema>,
}

/// Nested object list attribute, e.g. `resource_permissions`.
pub fn object_list(block: Block) -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Object(block)))
}

pub fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}
