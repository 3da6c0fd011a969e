//! Registry-module test variables as a declarative resource
//!
//! `tfe_test_variable` reconciles three views of one variable: the desired
//! configuration, the last recorded state, and what the remote store reports.
//! The store accepts a sensitive value but never returns it, so:
//!
//! - the [`translate()`] function substitutes the last submitted value for a
//!   sensitive remote value and leaves `readable_value` null
//! - updates only send `value` when it differs from the recorded one
//! - changes that cannot be made safely in place force replacement
//!
//! # Example
//!
//! ```
//! use declarative::{Action, ApplyContext};
//! use std::sync::Arc;
//! use testvar::{DesiredConfig, TestVariableResource};
//! use varstore::MockStore;
//!
//! let resource = TestVariableResource::with_store(Arc::new(MockStore::new()));
//! let desired = DesiredConfig {
//!     key: "FOO".to_string(),
//!     value: Some("bar".to_string()),
//!     category: "env".to_string(),
//!     organization: "acme".to_string(),
//!     module_name: "vpc".to_string(),
//!     module_provider: "aws".to_string(),
//!     ..Default::default()
//! };
//!
//! let change = resource.plan(None, &desired).unwrap();
//! assert_eq!(change.action, Action::Create);
//!
//! let outcome = resource.apply(&ApplyContext::default(), &change);
//! let state = outcome.state.unwrap();
//! assert_eq!(state.readable_value.as_deref(), Some("bar"));
//! ```

pub mod contract;
pub mod error;
pub mod handle;
pub mod model;
pub mod policy;
pub mod reconciler;
pub mod scope;
pub mod translate;

pub use contract::{SCHEMA_VERSION, TYPE_NAME};
pub use error::{Error, ErrorKind, Result};
pub use handle::ProviderHandle;
pub use model::{
    DesiredConfig, ModuleScope, ObservedState, PlannedChange, PlannedState, ResolvedConfig,
    VariableCategory,
};
pub use reconciler::{ApplyOutcome, TestVariableResource};
pub use translate::translate;
