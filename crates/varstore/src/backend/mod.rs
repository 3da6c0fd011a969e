//! Store trait and implementations.
//!
//! This module provides the [`VariableStore`] trait and its implementations.
//! The primary implementation is [`http::HttpStore`], which talks to the
//! variables API over HTTP.
//!
//! # Testing
//!
//! Use [`MockStore`] for testing without network access. It keeps variables
//! in memory, hides sensitive values the way the real store does, and records
//! every call so tests can assert on exactly what was sent:
//!
//! ```
//! use varstore::backend::{MockStore, RecordedCall, VariableStore};
//! use varstore::{Category, RegistryModuleId, RegistryName, VariableCreateOptions};
//!
//! let store = MockStore::new();
//! let module = RegistryModuleId {
//!     organization: "acme".to_string(),
//!     name: "vpc".to_string(),
//!     provider: "aws".to_string(),
//!     namespace: "acme".to_string(),
//!     registry_name: RegistryName::Private,
//! };
//!
//! let created = store
//!     .create(&module, &VariableCreateOptions {
//!         key: "TOKEN".to_string(),
//!         value: "s3cret".to_string(),
//!         category: Category::Env,
//!         hcl: false,
//!         sensitive: true,
//!         description: String::new(),
//!     })
//!     .unwrap();
//!
//! // The store never hands a sensitive value back.
//! assert_eq!(created.value, "");
//! assert!(matches!(store.calls()[0], RecordedCall::Create { .. }));
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{RegistryModuleId, RemoteVariable, VariableCreateOptions, VariableUpdateOptions};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Store trait for module-scoped variables.
///
/// Every call is a single blocking request/response. Implementations must
/// report a missing variable as [`Error::NotFound`].
pub trait VariableStore: Send + Sync {
    /// Create a variable in the given module.
    fn create(
        &self,
        module: &RegistryModuleId,
        options: &VariableCreateOptions,
    ) -> Result<RemoteVariable>;

    /// Read a variable by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the variable doesn't exist.
    fn read(&self, module: &RegistryModuleId, variable_id: &str) -> Result<RemoteVariable>;

    /// Update a variable by id, leaving every `None` option unchanged.
    fn update(
        &self,
        module: &RegistryModuleId,
        variable_id: &str,
        options: &VariableUpdateOptions,
    ) -> Result<RemoteVariable>;

    /// Delete a variable by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the variable doesn't exist.
    fn delete(&self, module: &RegistryModuleId, variable_id: &str) -> Result<()>;
}

/// Store operation, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`VariableStore::create`].
    Create,
    /// [`VariableStore::read`].
    Read,
    /// [`VariableStore::update`].
    Update,
    /// [`VariableStore::delete`].
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Read => write!(f, "read"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A call received by [`MockStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// A create call.
    Create {
        /// Addressed module.
        module: RegistryModuleId,
        /// Options exactly as received.
        options: VariableCreateOptions,
    },
    /// A read call.
    Read {
        /// Addressed module.
        module: RegistryModuleId,
        /// Variable id.
        id: String,
    },
    /// An update call.
    Update {
        /// Addressed module.
        module: RegistryModuleId,
        /// Variable id.
        id: String,
        /// Options exactly as received.
        options: VariableUpdateOptions,
    },
    /// A delete call.
    Delete {
        /// Addressed module.
        module: RegistryModuleId,
        /// Variable id.
        id: String,
    },
}

#[derive(Debug, Default)]
struct MockState {
    variables: HashMap<String, (RegistryModuleId, RemoteVariable)>,
    next_id: u64,
    calls: Vec<RecordedCall>,
    failures: HashMap<Operation, VecDeque<Error>>,
}

impl MockState {
    fn take_failure(&mut self, operation: Operation) -> Option<Error> {
        self.failures.get_mut(&operation).and_then(VecDeque::pop_front)
    }

    fn find_mut(&mut self, module: &RegistryModuleId, id: &str) -> Result<&mut RemoteVariable> {
        match self.variables.get_mut(id) {
            Some((owner, variable)) if owner == module => Ok(variable),
            _ => Err(Error::NotFound),
        }
    }
}

/// In-memory store for testing without network access.
///
/// Clones share the same underlying state, so a test can keep one handle
/// while the code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<MockState>>,
}

impl MockStore {
    /// Create a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call of `operation` fail with `error`.
    ///
    /// Failures queue up and are consumed in order.
    pub fn fail_next(&self, operation: Operation, error: Error) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// The options of every update call received so far.
    #[must_use]
    pub fn update_calls(&self) -> Vec<VariableUpdateOptions> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Update { options, .. } => Some(options.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget all recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of variables currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().variables.len()
    }

    /// Whether the store holds no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value actually stored for a variable, sensitive or not.
    ///
    /// This is the mock's own view; the store API never exposes it.
    #[must_use]
    pub fn stored_value(&self, variable_id: &str) -> Option<String> {
        self.lock()
            .variables
            .get(variable_id)
            .map(|(_, v)| v.value.clone())
    }

    /// Delete a variable behind the caller's back, simulating drift.
    pub fn remove_out_of_band(&self, variable_id: &str) -> bool {
        self.lock().variables.remove(variable_id).is_some()
    }

    /// Seed a variable without recording a call.
    pub fn insert(&self, module: RegistryModuleId, variable: RemoteVariable) {
        self.lock()
            .variables
            .insert(variable.id.clone(), (module, variable));
    }
}

/// What the store API reports for a stored variable.
fn visible(variable: &RemoteVariable) -> RemoteVariable {
    let mut shown = variable.clone();
    if shown.sensitive {
        shown.value = String::new();
    }
    shown
}

impl VariableStore for MockStore {
    fn create(
        &self,
        module: &RegistryModuleId,
        options: &VariableCreateOptions,
    ) -> Result<RemoteVariable> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Create {
            module: module.clone(),
            options: options.clone(),
        });
        if let Some(err) = state.take_failure(Operation::Create) {
            return Err(err);
        }

        state.next_id += 1;
        let variable = RemoteVariable {
            id: format!("var-{:06}", state.next_id),
            key: options.key.clone(),
            value: options.value.clone(),
            category: options.category,
            description: options.description.clone(),
            hcl: options.hcl,
            sensitive: options.sensitive,
        };
        let shown = visible(&variable);
        state
            .variables
            .insert(variable.id.clone(), (module.clone(), variable));
        Ok(shown)
    }

    fn read(&self, module: &RegistryModuleId, variable_id: &str) -> Result<RemoteVariable> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Read {
            module: module.clone(),
            id: variable_id.to_string(),
        });
        if let Some(err) = state.take_failure(Operation::Read) {
            return Err(err);
        }

        state.find_mut(module, variable_id).map(|v| visible(v))
    }

    fn update(
        &self,
        module: &RegistryModuleId,
        variable_id: &str,
        options: &VariableUpdateOptions,
    ) -> Result<RemoteVariable> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Update {
            module: module.clone(),
            id: variable_id.to_string(),
            options: options.clone(),
        });
        if let Some(err) = state.take_failure(Operation::Update) {
            return Err(err);
        }

        let variable = state.find_mut(module, variable_id)?;
        if variable.sensitive && options.sensitive == Some(false) {
            return Err(Error::Rejected(
                "a sensitive variable cannot be made non-sensitive".to_string(),
            ));
        }
        if let Some(key) = &options.key {
            variable.key = key.clone();
        }
        if let Some(value) = &options.value {
            variable.value = value.clone();
        }
        if let Some(description) = &options.description {
            variable.description = description.clone();
        }
        if let Some(hcl) = options.hcl {
            variable.hcl = hcl;
        }
        if let Some(sensitive) = options.sensitive {
            variable.sensitive = sensitive;
        }
        Ok(visible(variable))
    }

    fn delete(&self, module: &RegistryModuleId, variable_id: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Delete {
            module: module.clone(),
            id: variable_id.to_string(),
        });
        if let Some(err) = state.take_failure(Operation::Delete) {
            return Err(err);
        }

        state.find_mut(module, variable_id)?;
        state.variables.remove(variable_id);
        Ok(())
    }
}
