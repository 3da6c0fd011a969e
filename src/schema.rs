use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use testvar::DesiredConfig;
use varstore::{ClientSettings, RegistryModuleId};

// ============================================================================
// Main Config Schema
// ============================================================================

/// Environment variable consulted when `provider.token` is not set
pub const ENV_TOKEN: &str = "TFE_TOKEN";

pub const DEFAULT_HOSTNAME: &str = "app.terraform.io";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The modvar configuration file
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModvarConfig {
    /// Connection settings and the default organization
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Declared test variables, keyed by instance name
    #[serde(default)]
    pub variables: BTreeMap<String, DesiredConfig>,
}

impl ModvarConfig {
    /// Load the config, or an empty one if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))?;

        log::debug!(
            "Loaded {} variables from {}",
            config.variables.len(),
            path.display()
        );
        Ok(config)
    }

    /// Validate provider settings and every declared variable
    ///
    /// The token is not required here; only commands that reach the store
    /// need one.
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;

        for (name, checked) in self.check_variables() {
            checked.with_context(|| format!("Invalid variable '{name}'"))?;
        }

        Ok(())
    }

    /// Contract and scope check of each declared variable, in name order
    pub fn check_variables(&self) -> Vec<(&str, testvar::Result<RegistryModuleId>)> {
        self.desired_variables()
            .map(|(name, desired)| {
                let checked = testvar::contract::resolve(&desired)
                    .and_then(|config| testvar::scope::resolve(&config.scope));
                (name, checked)
            })
            .collect()
    }

    /// Declared variables with the provider organization filled in
    pub fn desired_variables(&self) -> impl Iterator<Item = (&str, DesiredConfig)> {
        self.variables
            .iter()
            .map(|(name, desired)| (name.as_str(), self.inherit(desired)))
    }

    fn inherit(&self, desired: &DesiredConfig) -> DesiredConfig {
        let mut desired = desired.clone();
        if desired.organization.is_empty()
            && let Some(org) = &self.provider.organization
        {
            desired.organization.clone_from(org);
        }
        desired
    }
}

// ============================================================================
// Provider
// ============================================================================

/// The `[provider]` table
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// API token; falls back to `$TFE_TOKEN`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Organization for variables that do not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            token: None,
            organization: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            bail!("provider.hostname must not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("provider.timeout_secs must be greater than zero");
        }
        if self.organization.as_deref().is_some_and(|o| o.trim().is_empty()) {
            bail!("provider.organization must not be empty when set");
        }
        Ok(())
    }

    /// The configured token, else `$TFE_TOKEN`
    pub fn token(&self) -> Option<String> {
        self.token_or(std::env::var(ENV_TOKEN).ok())
    }

    fn token_or(&self, fallback: Option<String>) -> Option<String> {
        self.token
            .clone()
            .or(fallback)
            .filter(|t| !t.trim().is_empty())
    }

    /// Settings for a client that talks to the store
    pub fn client_settings(&self) -> Result<ClientSettings> {
        self.validate()?;
        let token = self.token().with_context(|| {
            format!("No API token: set provider.token in the config or ${ENV_TOKEN}")
        })?;
        Ok(ClientSettings::new(&self.hostname, token)
            .timeout(Duration::from_secs(self.timeout_secs)))
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("hostname", &self.hostname)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("organization", &self.organization)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_hostname() -> String {
    DEFAULT_HOSTNAME.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

// ============================================================================
// Tests
// ============================================================================
