//! # varstore
//!
//! Client library for registry-module test variables.
//!
//! A registry module keeps a set of variables that are injected into its
//! test runs. This crate provides:
//! - The store's own data model ([`RemoteVariable`], [`RegistryModuleId`])
//! - A [`VariableStore`] trait with an HTTP implementation
//! - An in-memory [`MockStore`] that hides sensitive values like the real one
//! - A pre-authenticated [`Client`] handle
//!
//! ## Example
//!
//! ```no_run
//! use varstore::{Category, Client, ClientSettings, RegistryModuleId, RegistryName};
//! use varstore::{VariableCreateOptions, VariableStore};
//!
//! let client = Client::new(&ClientSettings::new("app.terraform.io", "my-token"));
//! let module = RegistryModuleId {
//!     organization: "acme".to_string(),
//!     name: "vpc".to_string(),
//!     provider: "aws".to_string(),
//!     namespace: "acme".to_string(),
//!     registry_name: RegistryName::Private,
//! };
//!
//! let created = client
//!     .create(&module, &VariableCreateOptions {
//!         key: "AWS_REGION".to_string(),
//!         value: "eu-west-1".to_string(),
//!         category: Category::Env,
//!         hcl: false,
//!         sensitive: false,
//!         description: String::new(),
//!     })
//!     .expect("create failed");
//!
//! println!("Created {} as {}", created.key, created.id);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use backend::http::HttpStore;
pub use backend::{MockStore, Operation, RecordedCall, VariableStore};
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    Category, RegistryModuleId, RegistryName, RemoteVariable, VariableCreateOptions,
    VariableUpdateOptions,
};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Connection settings for [`Client::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// API hostname, e.g. "app.terraform.io".
    pub hostname: String,
    /// Bearer token.
    pub token: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl ClientSettings {
    /// Settings with the default timeout.
    pub fn new(hostname: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            token: token.into(),
            timeout: backend::http::DEFAULT_TIMEOUT,
        }
    }

    /// Override the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Pre-authenticated handle to a variable store.
///
/// Cloning is cheap; clones share the underlying store.
///
/// # Example
///
/// ```
/// use varstore::{Client, MockStore};
///
/// let store = MockStore::new();
/// let client = Client::with_store(store.clone());
/// assert_eq!(client.hostname(), "mock");
/// assert!(store.is_empty());
/// ```
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn VariableStore>,
    hostname: String,
}

impl Client {
    /// Create a client talking HTTP to the configured host.
    #[must_use]
    pub fn new(settings: &ClientSettings) -> Self {
        Self {
            store: Arc::new(HttpStore::with_timeout(
                &settings.hostname,
                settings.token.clone(),
                settings.timeout,
            )),
            hostname: settings.hostname.clone(),
        }
    }

    /// Create a client with a custom store (useful for testing).
    #[must_use]
    pub fn with_store(store: impl VariableStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            hostname: "mock".to_string(),
        }
    }

    /// Hostname this client talks to.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Access the underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn VariableStore {
        self.store.as_ref()
    }

    /// Shared handle to the underlying store.
    #[must_use]
    pub fn shared_store(&self) -> Arc<dyn VariableStore> {
        Arc::clone(&self.store)
    }
}

impl VariableStore for Client {
    fn create(
        &self,
        module: &RegistryModuleId,
        options: &VariableCreateOptions,
    ) -> Result<RemoteVariable> {
        self.store.create(module, options)
    }

    fn read(&self, module: &RegistryModuleId, variable_id: &str) -> Result<RemoteVariable> {
        self.store.read(module, variable_id)
    }

    fn update(
        &self,
        module: &RegistryModuleId,
        variable_id: &str,
        options: &VariableUpdateOptions,
    ) -> Result<RemoteVariable> {
        self.store.update(module, variable_id, options)
    }

    fn delete(&self, module: &RegistryModuleId, variable_id: &str) -> Result<()> {
        self.store.delete(module, variable_id)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("hostname", &self.hostname)
            .finish_non_exhaustive()
    }
}
