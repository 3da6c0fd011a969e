//! Provider handle handed to the resource by its host
//!
//! The host owns authentication and transport. All the resource needs from
//! it is a store for registry-module test variables; a handle that cannot
//! provide one is rejected when the resource is configured.

use std::sync::Arc;
use varstore::VariableStore;

/// Capability a provider handle must offer
pub const TEST_VARIABLES: &str = "registry-module test variables";

/// What a host passes to [`crate::TestVariableResource::configure`]
pub trait ProviderHandle: Send + Sync {
    /// Short description of the handle, used in diagnostics
    fn kind(&self) -> String;

    /// Store for test variables, if this handle offers one
    fn test_variables(&self) -> Option<Arc<dyn VariableStore>>;
}

impl ProviderHandle for varstore::Client {
    fn kind(&self) -> String {
        format!("varstore client for {}", self.hostname())
    }

    fn test_variables(&self) -> Option<Arc<dyn VariableStore>> {
        Some(self.shared_store())
    }
}
