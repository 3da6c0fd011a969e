//! Module scope resolution
//!
//! Test variables live under a private registry module, addressed by
//! organization, module name and provider. The registry namespace of a
//! private module is always its organization.

use crate::error::{Error, Result};
use crate::model::ModuleScope;
use varstore::{RegistryModuleId, RegistryName};

/// Registry hosting modules that own test variables
pub const REGISTRY: RegistryName = RegistryName::Private;

/// Build the store address for a module scope
pub fn resolve(scope: &ModuleScope) -> Result<RegistryModuleId> {
    for (attribute, value) in [
        ("organization", &scope.organization),
        ("module_name", &scope.module_name),
        ("module_provider", &scope.module_provider),
    ] {
        if value.trim().is_empty() {
            return Err(Error::validation(attribute, "must be set"));
        }
    }

    Ok(RegistryModuleId {
        organization: scope.organization.clone(),
        name: scope.module_name.clone(),
        provider: scope.module_provider.clone(),
        namespace: scope.organization.clone(),
        registry_name: REGISTRY,
    })
}
