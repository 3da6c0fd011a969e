//! Core types for the variable store.
//!
//! These mirror the store's own representation of a variable and of the
//! registry module it belongs to. They carry no reconciliation policy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category tag the store attaches to every variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Exposed to runs as an environment variable.
    Env,
    /// Exposed to runs as a Terraform input variable.
    Terraform,
}

impl Category {
    /// The wire name of the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Terraform => "terraform",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registry that hosts a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryName {
    /// The organization's private registry.
    Private,
    /// The public registry.
    Public,
}

impl fmt::Display for RegistryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Public => write!(f, "public"),
        }
    }
}

/// Address of the registry module a variable belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryModuleId {
    /// Organization that owns the module.
    pub organization: String,
    /// Module name, e.g. "vpc".
    pub name: String,
    /// Module provider, e.g. "aws".
    pub provider: String,
    /// Registry namespace the module is published under.
    pub namespace: String,
    /// Registry hosting the module.
    pub registry_name: RegistryName,
}

impl fmt::Display for RegistryModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.organization, self.registry_name, self.namespace, self.name, self.provider
        )
    }
}

/// A variable as the store reports it.
///
/// For sensitive variables the store still fills `value`, but its content is
/// not the stored secret and must never be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVariable {
    /// Service-assigned identifier.
    pub id: String,
    /// Variable name.
    pub key: String,
    /// Plaintext value, meaningful only when `sensitive` is false.
    pub value: String,
    /// Category tag.
    pub category: Category,
    /// Free-form description.
    pub description: String,
    /// Whether the value is parsed as an HCL expression.
    pub hcl: bool,
    /// Whether the value is write-only.
    pub sensitive: bool,
}

/// Attributes for creating a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableCreateOptions {
    /// Variable name.
    pub key: String,
    /// Initial value.
    pub value: String,
    /// Category tag.
    pub category: Category,
    /// Parse the value as HCL.
    pub hcl: bool,
    /// Make the value write-only.
    pub sensitive: bool,
    /// Free-form description.
    pub description: String,
}

/// Attributes for updating a variable.
///
/// A `None` field is left unchanged by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariableUpdateOptions {
    /// New variable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// New value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New HCL flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hcl: Option<bool>,
    /// New sensitivity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,
}

impl VariableUpdateOptions {
    /// Whether the update carries a new value.
    #[must_use]
    pub fn sets_value(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        assert_eq!(serde_json::to_string(&Category::Env).unwrap(), "\"env\"");
        let parsed: Category = serde_json::from_str("\"terraform\"").unwrap();
        assert_eq!(parsed, Category::Terraform);
        assert_eq!(Category::Env.to_string(), "env");
    }

    #[test]
    fn test_update_options_skip_unset_fields() {
        let options = VariableUpdateOptions {
            key: Some("FOO".into()),
            hcl: Some(false),
            ..Default::default()
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json, serde_json::json!({"key": "FOO", "hcl": false}));
        assert!(!options.sets_value());
    }

    #[test]
    fn test_module_id_display() {
        let id = RegistryModuleId {
            organization: "acme".into(),
            name: "vpc".into(),
            provider: "aws".into(),
            namespace: "acme".into(),
            registry_name: RegistryName::Private,
        };
        assert_eq!(id.to_string(), "acme/private/acme/vpc/aws");
    }
}
