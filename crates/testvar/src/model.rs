//! Configuration, state and plan types for a test variable.

use crate::error::{Error, Result};
use declarative::{Action, AttributeChange, PlanValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use varstore::Category;

/// The registry module a variable belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleScope {
    pub organization: String,
    pub module_name: String,
    pub module_provider: String,
}

impl ModuleScope {
    pub fn new(organization: &str, module_name: &str, module_provider: &str) -> Self {
        Self {
            organization: organization.to_string(),
            module_name: module_name.to_string(),
            module_provider: module_provider.to_string(),
        }
    }
}

impl fmt::Display for ModuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.organization, self.module_name, self.module_provider
        )
    }
}

/// Categories a test variable may take
///
/// Test runs only receive environment variables, so this is deliberately
/// narrower than [`varstore::Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableCategory {
    Env,
}

impl VariableCategory {
    /// Every accepted category, for error messages
    pub const ALLOWED: &'static [&'static str] = &["env"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Env => "env",
        }
    }

    /// The store's tag for this category
    pub fn to_remote(self) -> Category {
        match self {
            Self::Env => Category::Env,
        }
    }
}

impl FromStr for VariableCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "env" => Ok(Self::Env),
            other => Err(Error::validation(
                "category",
                format!(
                    "expected one of [{}], got \"{other}\"",
                    Self::ALLOWED.join(", ")
                ),
            )),
        }
    }
}

impl fmt::Display for VariableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A variable as declared in configuration
///
/// Optional attributes stay `None` until the contract fills their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesiredConfig {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hcl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub module_name: String,
    #[serde(default)]
    pub module_provider: String,
}

impl DesiredConfig {
    pub fn scope(&self) -> ModuleScope {
        ModuleScope::new(&self.organization, &self.module_name, &self.module_provider)
    }
}

/// Configuration after validation, with every default applied
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub key: String,
    pub value: String,
    pub category: VariableCategory,
    pub description: String,
    pub hcl: bool,
    pub sensitive: bool,
    pub scope: ModuleScope,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("key", &self.key)
            .field("value", &declarative::REDACTED)
            .field("category", &self.category)
            .field("description", &self.description)
            .field("hcl", &self.hcl)
            .field("sensitive", &self.sensitive)
            .field("scope", &self.scope)
            .finish()
    }
}

/// The recorded result of the last successful reconciliation
///
/// `value` holds the last value this resource submitted whenever the remote
/// variable is sensitive, since the store never returns it.
/// `readable_value` is `Some(value)` exactly when `sensitive` is false.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    pub id: String,
    pub key: String,
    pub value: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hcl: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readable_value: Option<String>,
    #[serde(flatten)]
    pub scope: ModuleScope,
}

impl ObservedState {
    /// Attach the module scope, which the store does not echo back
    #[must_use]
    pub fn with_scope(mut self, scope: ModuleScope) -> Self {
        self.scope = scope;
        self
    }

    /// Whether every configurable attribute already matches `config`
    pub fn matches(&self, config: &ResolvedConfig) -> bool {
        self.key == config.key
            && self.value == config.value
            && self.category == config.category.to_remote()
            && self.description == config.description
            && self.hcl == config.hcl
            && self.sensitive == config.sensitive
            && self.scope == config.scope
    }
}

impl fmt::Debug for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedState")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("value", &declarative::REDACTED)
            .field("category", &self.category)
            .field("description", &self.description)
            .field("hcl", &self.hcl)
            .field("sensitive", &self.sensitive)
            .field("readable_value", &self.readable_value)
            .field("scope", &self.scope)
            .finish()
    }
}

/// The state a plan expects after apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedState {
    /// Kept from prior state for in-place changes, unknown for new instances
    pub id: PlanValue<String>,
    pub config: ResolvedConfig,
    pub readable_value: PlanValue<Option<String>>,
}

/// Everything the reconciler needs to move one instance to its planned state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub action: Action,
    pub prior: Option<ObservedState>,
    /// `None` only for [`Action::Delete`]
    pub planned: Option<PlannedState>,
    /// Attribute transitions for display, sensitive values redacted
    pub changes: Vec<AttributeChange>,
    /// Why replacement was forced, in policy order
    pub replace_reasons: Vec<&'static str>,
}

impl PlannedChange {
    pub fn requires_replace(&self) -> bool {
        self.action == Action::Replace
    }
}
