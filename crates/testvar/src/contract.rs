//! Attribute contract of `tfe_test_variable`
//!
//! Declares cardinality, defaults, sensitivity and mutability of every
//! attribute, and turns a [`DesiredConfig`] into a [`ResolvedConfig`].

use crate::error::{Error, Result};
use crate::model::{DesiredConfig, ResolvedConfig, VariableCategory};
use declarative::{AttributeDefault, AttributeSpec, Schema};

/// Resource type name
pub const TYPE_NAME: &str = "tfe_test_variable";

/// Bumped whenever the recorded state layout changes
pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_VALUE: &str = "";
pub const DEFAULT_DESCRIPTION: &str = "";
pub const DEFAULT_HCL: bool = false;
pub const DEFAULT_SENSITIVE: bool = false;

/// The attribute contract
pub fn schema() -> Schema {
    Schema::new(TYPE_NAME, SCHEMA_VERSION)
        .with_attribute(
            AttributeSpec::string("id")
                .computed()
                .immutable()
                .description("Service-assigned identifier of the variable."),
        )
        .with_attribute(
            AttributeSpec::string("key")
                .required()
                .replace_if("the prior state is sensitive")
                .description("Name of the variable."),
        )
        .with_attribute(
            AttributeSpec::string("value")
                .with_default(AttributeDefault::String(DEFAULT_VALUE.to_string()))
                .sensitive()
                .description("Value of the variable. Write-only once the variable is sensitive."),
        )
        .with_attribute(
            AttributeSpec::string("category")
                .required()
                .immutable()
                .description("Variable category. Only \"env\" is accepted."),
        )
        .with_attribute(
            AttributeSpec::string("description")
                .with_default(AttributeDefault::String(DEFAULT_DESCRIPTION.to_string()))
                .description("Description of the variable."),
        )
        .with_attribute(
            AttributeSpec::bool("hcl")
                .with_default(AttributeDefault::Bool(DEFAULT_HCL))
                .description("Parse the value as an HCL expression."),
        )
        .with_attribute(
            AttributeSpec::bool("sensitive")
                .with_default(AttributeDefault::Bool(DEFAULT_SENSITIVE))
                .replace_if("it changes in either direction")
                .description("Make the value write-only."),
        )
        .with_attribute(
            AttributeSpec::string("organization")
                .immutable()
                .description("Organization owning the registry module."),
        )
        .with_attribute(
            AttributeSpec::string("module_name")
                .immutable()
                .description("Name of the registry module."),
        )
        .with_attribute(
            AttributeSpec::string("module_provider")
                .immutable()
                .description("Provider of the registry module."),
        )
        .with_attribute(
            AttributeSpec::string("readable_value")
                .computed()
                .description("Copy of value when the variable is not sensitive, null otherwise."),
        )
}

/// Validate configuration and apply defaults
///
/// The module scope is checked separately by [`crate::scope::resolve`].
pub fn resolve(desired: &DesiredConfig) -> Result<ResolvedConfig> {
    if desired.key.trim().is_empty() {
        return Err(Error::validation("key", "must not be empty"));
    }
    let category = desired.category.parse::<VariableCategory>()?;

    Ok(ResolvedConfig {
        key: desired.key.clone(),
        value: desired
            .value
            .clone()
            .unwrap_or_else(|| DEFAULT_VALUE.to_string()),
        category,
        description: desired
            .description
            .clone()
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        hcl: desired.hcl.unwrap_or(DEFAULT_HCL),
        sensitive: desired.sensitive.unwrap_or(DEFAULT_SENSITIVE),
        scope: desired.scope(),
    })
}
