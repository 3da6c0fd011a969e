//! HTTP variables API backend.
//!
//! This module provides the [`HttpStore`] implementation, which speaks the
//! JSON:API flavoured registry-module test variables endpoint:
//!
//! ```text
//! /api/v2/organizations/{org}/tests/registry-modules/{registry}/{namespace}/{name}/{provider}/vars[/{id}]
//! ```
//!
//! Requests carry a bearer token. A 404 answer maps to [`Error::NotFound`].

use crate::backend::VariableStore;
use crate::error::{Error, Result};
use crate::types::{
    Category, RegistryModuleId, RemoteVariable, VariableCreateOptions, VariableUpdateOptions,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Media type required by the API.
const JSON_API: &str = "application/vnd.api+json";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP variables backend.
///
/// # Example
///
/// ```no_run
/// use varstore::backend::http::HttpStore;
///
/// let store = HttpStore::new("app.terraform.io", "my-token");
/// assert_eq!(store.api_base(), "https://app.terraform.io/api/v2");
/// ```
pub struct HttpStore {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL, without trailing slash.
    api_base: String,
    /// Bearer token.
    token: String,
}

impl HttpStore {
    /// Create a store for `hostname` with the default timeout.
    #[must_use]
    pub fn new(hostname: &str, token: impl Into<String>) -> Self {
        Self::with_timeout(hostname, token, DEFAULT_TIMEOUT)
    }

    /// Create a store for `hostname` with a custom request timeout.
    #[must_use]
    pub fn with_timeout(hostname: &str, token: impl Into<String>, timeout: Duration) -> Self {
        let api_base = format!("https://{}/api/v2", hostname.trim_end_matches('/'));
        Self::with_api_base(api_base, token, timeout)
    }

    /// Create a store with a custom API base (for testing).
    #[must_use]
    pub fn with_api_base(
        api_base: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build the collection URL for a module's variables.
    fn vars_url(&self, module: &RegistryModuleId) -> String {
        format!(
            "{}/organizations/{}/tests/registry-modules/{}/{}/{}/{}/vars",
            self.api_base,
            module.organization,
            module.registry_name,
            module.namespace,
            module.name,
            module.provider
        )
    }

    /// Build the URL for a single variable.
    fn var_url(&self, module: &RegistryModuleId, variable_id: &str) -> String {
        format!("{}/{}", self.vars_url(module), variable_id)
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl VariableStore for HttpStore {
    fn create(
        &self,
        module: &RegistryModuleId,
        options: &VariableCreateOptions,
    ) -> Result<RemoteVariable> {
        let url = self.vars_url(module);
        let body = Document::new(VarRequest::new(None, options));

        let response: Document<VarResponse> = self
            .agent
            .post(&url)
            .header("Authorization", self.authorization())
            .header("Content-Type", JSON_API)
            .header("Accept", JSON_API)
            .send_json(&body)?
            .body_mut()
            .read_json()?;

        response.data.try_into()
    }

    fn read(&self, module: &RegistryModuleId, variable_id: &str) -> Result<RemoteVariable> {
        let url = self.var_url(module, variable_id);

        let response: Document<VarResponse> = self
            .agent
            .get(&url)
            .header("Authorization", self.authorization())
            .header("Accept", JSON_API)
            .call()?
            .body_mut()
            .read_json()?;

        response.data.try_into()
    }

    fn update(
        &self,
        module: &RegistryModuleId,
        variable_id: &str,
        options: &VariableUpdateOptions,
    ) -> Result<RemoteVariable> {
        let url = self.var_url(module, variable_id);
        let body = Document::new(VarRequest::new(Some(variable_id), options));

        let response: Document<VarResponse> = self
            .agent
            .patch(&url)
            .header("Authorization", self.authorization())
            .header("Content-Type", JSON_API)
            .header("Accept", JSON_API)
            .send_json(&body)?
            .body_mut()
            .read_json()?;

        response.data.try_into()
    }

    fn delete(&self, module: &RegistryModuleId, variable_id: &str) -> Result<()> {
        let url = self.var_url(module, variable_id);

        self.agent
            .delete(&url)
            .header("Authorization", self.authorization())
            .header("Accept", JSON_API)
            .call()?;

        Ok(())
    }
}

// =============================================================================
// JSON:API document types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct Document<T> {
    data: T,
}

impl<T> Document<T> {
    fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
struct VarRequest<'a, A> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: &'a A,
}

impl<'a, A> VarRequest<'a, A> {
    fn new(id: Option<&'a str>, attributes: &'a A) -> Self {
        Self {
            id,
            kind: "vars",
            attributes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VarResponse {
    #[serde(default)]
    id: Option<String>,
    attributes: VarAttributes,
}

#[derive(Debug, Deserialize)]
struct VarAttributes {
    key: String,
    #[serde(default)]
    value: Option<String>,
    category: Category,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    hcl: bool,
    #[serde(default)]
    sensitive: bool,
}

impl TryFrom<VarResponse> for RemoteVariable {
    type Error = Error;

    fn try_from(resource: VarResponse) -> Result<Self> {
        let id = resource
            .id
            .ok_or_else(|| Error::InvalidResponse("variable without id".to_string()))?;
        let a = resource.attributes;
        Ok(Self {
            id,
            key: a.key,
            value: a.value.unwrap_or_default(),
            category: a.category,
            description: a.description.unwrap_or_default(),
            hcl: a.hcl,
            sensitive: a.sensitive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegistryName;

    fn module() -> RegistryModuleId {
        RegistryModuleId {
            organization: "acme".to_string(),
            name: "vpc".to_string(),
            provider: "aws".to_string(),
            namespace: "acme".to_string(),
            registry_name: RegistryName::Private,
        }
    }

    #[test]
    fn test_vars_url() {
        let store = HttpStore::new("app.terraform.io", "t");
        assert_eq!(
            store.vars_url(&module()),
            "https://app.terraform.io/api/v2/organizations/acme/tests/registry-modules/private/acme/vpc/aws/vars"
        );
        assert!(store.var_url(&module(), "var-1").ends_with("/vars/var-1"));
    }

    #[test]
    fn test_custom_api_base() {
        let store =
            HttpStore::with_api_base("http://localhost:8080/api/v2", "t", DEFAULT_TIMEOUT);
        assert_eq!(store.api_base(), "http://localhost:8080/api/v2");
        assert_eq!(store.authorization(), "Bearer t");
    }

    #[test]
    fn test_trailing_slash_hostname() {
        let store = HttpStore::new("tfe.example.com/", "t");
        assert_eq!(store.api_base(), "https://tfe.example.com/api/v2");
    }

    #[test]
    fn test_update_body_omits_unset_attributes() {
        let options = VariableUpdateOptions {
            key: Some("FOO".to_string()),
            ..Default::default()
        };
        let body = Document::new(VarRequest::new(Some("var-1"), &options));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": {"id": "var-1", "type": "vars", "attributes": {"key": "FOO"}}
            })
        );
    }

    #[test]
    fn test_parse_sensitive_response() {
        let raw = r#"{
            "data": {
                "id": "var-EavQ1LztoRTQHSNT",
                "type": "vars",
                "attributes": {
                    "key": "TOKEN",
                    "value": null,
                    "sensitive": true,
                    "category": "env",
                    "hcl": false,
                    "description": null
                }
            }
        }"#;
        let doc: Document<VarResponse> = serde_json::from_str(raw).unwrap();
        let variable = RemoteVariable::try_from(doc.data).unwrap();
        assert_eq!(variable.id, "var-EavQ1LztoRTQHSNT");
        assert!(variable.sensitive);
        assert_eq!(variable.value, "");
        assert_eq!(variable.description, "");
    }

    #[test]
    fn test_response_without_id_is_invalid() {
        let raw = r#"{"data": {"type": "vars", "attributes": {"key": "A", "category": "env"}}}"#;
        let doc: Document<VarResponse> = serde_json::from_str(raw).unwrap();
        let err = RemoteVariable::try_from(doc.data).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }
}
