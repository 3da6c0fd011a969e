//! Attribute contract for declarative resources
//!
//! A [`Schema`] declares, per attribute, whether the user must supply it,
//! may supply it, or never supplies it, what it defaults to, whether it is
//! sensitive, and how a change to it is applied.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    String,
    Bool,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

/// Who provides the attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// Must be set in configuration
    Required,
    /// May be set in configuration, null otherwise
    Optional,
    /// May be set in configuration, otherwise filled from a default or by the service
    OptionalComputed,
    /// Never set in configuration
    Computed,
}

impl Cardinality {
    /// Whether configuration may set this attribute
    pub fn is_configurable(&self) -> bool {
        !matches!(self, Self::Computed)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Optional => write!(f, "optional"),
            Self::OptionalComputed => write!(f, "optional, computed"),
            Self::Computed => write!(f, "computed"),
        }
    }
}

/// How a change to the attribute reaches the remote system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutability {
    /// Changed in place
    Mutable,
    /// Any change forces replacement
    Immutable,
    /// Changed in place unless the condition holds, then replaced
    ReplaceIf { condition: String },
    /// Never set directly, derived from other attributes
    Derived,
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mutable => write!(f, "mutable"),
            Self::Immutable => write!(f, "immutable"),
            Self::ReplaceIf { condition } => write!(f, "replace if {condition}"),
            Self::Derived => write!(f, "derived"),
        }
    }
}

/// Static default applied when configuration omits an attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeDefault {
    String(String),
    Bool(bool),
}

impl fmt::Display for AttributeDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Declaration of a single attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    pub attr_type: AttributeType,
    pub cardinality: Cardinality,
    pub default: Option<AttributeDefault>,
    /// Redact in user-facing output
    pub sensitive: bool,
    pub mutability: Mutability,
    pub description: String,
}

impl AttributeSpec {
    /// A string attribute, optional and mutable until told otherwise
    pub fn string(name: &str) -> Self {
        Self::new(name, AttributeType::String)
    }

    /// A bool attribute, optional and mutable until told otherwise
    pub fn bool(name: &str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    fn new(name: &str, attr_type: AttributeType) -> Self {
        Self {
            name: name.to_string(),
            attr_type,
            cardinality: Cardinality::Optional,
            default: None,
            sensitive: false,
            mutability: Mutability::Mutable,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.cardinality = Cardinality::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.cardinality = Cardinality::Computed;
        self.mutability = Mutability::Derived;
        self
    }

    /// Optional in configuration, filled from `default` when omitted
    pub fn with_default(mut self, default: AttributeDefault) -> Self {
        self.cardinality = Cardinality::OptionalComputed;
        self.default = Some(default);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.mutability = Mutability::Immutable;
        self
    }

    pub fn replace_if(mut self, condition: &str) -> Self {
        self.mutability = Mutability::ReplaceIf {
            condition: condition.to_string(),
        };
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// The full attribute contract of a resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Resource type name, e.g. "tfe_test_variable"
    pub type_name: String,
    /// Bumped whenever the persisted state layout changes
    pub version: u32,
    pub attributes: Vec<AttributeSpec>,
}

impl Schema {
    pub fn new(type_name: &str, version: u32) -> Self {
        Self {
            type_name: type_name.to_string(),
            version,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute, replacing any earlier declaration with the same name
    pub fn with_attribute(mut self, spec: AttributeSpec) -> Self {
        self.attributes.retain(|a| a.name != spec.name);
        self.attributes.push(spec);
        self
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Whether the named attribute must be redacted in output
    ///
    /// Unknown attributes are treated as sensitive.
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.attribute(name).is_none_or(|a| a.sensitive)
    }

    /// Names of attributes configuration must set
    pub fn required_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|a| a.cardinality == Cardinality::Required)
            .map(|a| a.name.as_str())
    }
}
