//! # Declarative
//!
//! Plan-time building blocks for declarative resource management.
//!
//! A resource is declared through an attribute contract, planned by
//! comparing its prior recorded state with the proposed configuration, and
//! then applied. This crate holds the pieces that do not depend on any
//! particular resource type.
//!
//! ## Core Concepts
//!
//! - **Schema**: the attribute contract (cardinality, defaults, sensitivity, mutability)
//! - **PlanValue**: a planned value that may only be known after apply
//! - **PolicySet**: ordered replacement policies combined by logical OR
//! - **AttributeChange**: a rendered, redaction-aware attribute transition
//! - **ApplyContext**: dry-run flag and the cancellation token for lifecycle operations
//!
//! ## Example
//!
//! ```
//! use declarative::{PolicySet, ReplacementDecision, ReplacementPolicy};
//!
//! struct NameChanged;
//!
//! impl ReplacementPolicy<String, String> for NameChanged {
//!     fn name(&self) -> &'static str { "name_changed" }
//!     fn description(&self) -> &'static str { "name cannot change in place" }
//!     fn evaluate(&self, prior: &String, proposed: &String) -> ReplacementDecision {
//!         ReplacementDecision::from_bool(prior != proposed)
//!     }
//! }
//!
//! let policies = PolicySet::new().with(NameChanged);
//! let outcome = policies.evaluate(&"a".to_string(), &"b".to_string());
//! assert!(outcome.requires_replace());
//! ```
//!
//! ## Caller Hooks
//!
//! - [`ProgressCallback`]: receives progress updates
//! - [`ConfirmCallback`]: handles user confirmations
//! - [`CancelToken`]: external cancellation honoured before remote calls

pub mod attribute;
pub mod context;
pub mod diff;
pub mod planner;
pub mod types;

// Re-export main types at crate root
pub use attribute::{
    AttributeDefault, AttributeSpec, AttributeType, Cardinality, Mutability, Schema,
};
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, CancelToken, ConfirmCallback, NoProgress,
    ProgressCallback,
};
pub use diff::{AttributeChange, DiffSummary, REDACTED};
pub use planner::{
    PlanValue, PolicyOutcome, PolicySet, ReplacementDecision, ReplacementPolicy, TriggeredPolicy,
};
pub use types::{Action, ApplyResult, ExecuteSummary};
