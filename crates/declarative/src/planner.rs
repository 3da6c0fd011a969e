//! Plan-time building blocks
//!
//! Planning compares the prior recorded state of a resource with the
//! configuration proposed for it. Values that will only be known once the
//! change is applied are [`PlanValue::Unknown`]. Whether a change can be made
//! in place is decided by an ordered [`PolicySet`] of independent
//! [`ReplacementPolicy`] strategies combined by logical OR.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A planned attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanValue<T> {
    /// Value is already known at plan time
    Known(T),
    /// Value is only known after apply
    Unknown,
}

impl<T> PlanValue<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Borrow the known value, if any
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> PlanValue<U> {
        match self {
            Self::Known(v) => PlanValue::Known(f(v)),
            Self::Unknown => PlanValue::Unknown,
        }
    }
}

impl<T: fmt::Display> fmt::Display for PlanValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(v) => write!(f, "{v}"),
            Self::Unknown => write!(f, "(known after apply)"),
        }
    }
}

/// Outcome of a single replacement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementDecision {
    /// The change may be applied in place as far as this policy is concerned
    InPlace,
    /// The resource must be destroyed and recreated
    Replace,
}

impl ReplacementDecision {
    pub fn from_bool(requires_replace: bool) -> Self {
        if requires_replace {
            Self::Replace
        } else {
            Self::InPlace
        }
    }

    pub fn requires_replace(&self) -> bool {
        matches!(self, Self::Replace)
    }
}

/// A plan-time strategy deciding whether a change needs full replacement
///
/// `P` is the prior recorded state, `C` the proposed configuration.
/// Policies must be pure.
pub trait ReplacementPolicy<P, C>: Send + Sync {
    /// Stable identifier used in logs and plan output
    fn name(&self) -> &'static str;

    /// Human-readable explanation shown when the policy forces replacement
    fn description(&self) -> &'static str;

    fn evaluate(&self, prior: &P, proposed: &C) -> ReplacementDecision;
}

/// Combined result of evaluating a [`PolicySet`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOutcome {
    /// Policies that demanded replacement, in evaluation order
    pub triggered: Vec<TriggeredPolicy>,
}

/// A policy that demanded replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredPolicy {
    pub name: &'static str,
    pub description: &'static str,
}

impl PolicyOutcome {
    pub fn requires_replace(&self) -> bool {
        !self.triggered.is_empty()
    }

    /// Descriptions of the policies that demanded replacement
    pub fn reasons(&self) -> Vec<&'static str> {
        self.triggered.iter().map(|t| t.description).collect()
    }
}

/// Ordered list of replacement policies, combined by logical OR
pub struct PolicySet<P, C> {
    policies: Vec<Box<dyn ReplacementPolicy<P, C>>>,
}

impl<P, C> PolicySet<P, C> {
    pub fn new() -> Self {
        Self {
            policies: Vec::new(),
        }
    }

    pub fn with(mut self, policy: impl ReplacementPolicy<P, C> + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Evaluate every policy
    ///
    /// All policies run even after one demands replacement so the plan can
    /// report every reason.
    pub fn evaluate(&self, prior: &P, proposed: &C) -> PolicyOutcome {
        let triggered = self
            .policies
            .iter()
            .filter(|p| p.evaluate(prior, proposed).requires_replace())
            .map(|p| TriggeredPolicy {
                name: p.name(),
                description: p.description(),
            })
            .collect();
        PolicyOutcome { triggered }
    }
}

impl<P, C> Default for PolicySet<P, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, C> fmt::Debug for PolicySet<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.policies.iter().map(|p| p.name()))
            .finish()
    }
}
