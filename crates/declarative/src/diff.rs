//! Attribute-level change descriptions for plan output

use crate::planner::PlanValue;
use crate::types::Action;
use serde::{Deserialize, Serialize};

/// Placeholder shown instead of a sensitive value
pub const REDACTED: &str = "(sensitive value)";

/// A single attribute's transition in a plan
///
/// Values are already rendered for display; sensitive values are redacted
/// at construction and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub name: String,
    /// Rendered prior value, `None` when the attribute was null or absent
    pub before: Option<String>,
    /// Rendered planned value
    pub after: PlanValue<Option<String>>,
    pub sensitive: bool,
    /// Whether this attribute's change is the reason for replacement
    pub forces_replacement: bool,
}

impl AttributeChange {
    pub fn new(
        name: &str,
        before: Option<String>,
        after: PlanValue<Option<String>>,
        sensitive: bool,
    ) -> Self {
        let redact = |v: Option<String>| v.map(|_| REDACTED.to_string());
        let (before, after) = if sensitive {
            (redact(before), after.map(redact))
        } else {
            (before, after)
        };
        Self {
            name: name.to_string(),
            before,
            after,
            sensitive,
            forces_replacement: false,
        }
    }

    pub fn forcing_replacement(mut self, forces: bool) -> Self {
        self.forces_replacement = forces;
        self
    }

    /// Render as `before → after`
    pub fn render(&self) -> String {
        let before = self.before.as_deref().unwrap_or("null");
        let after = match &self.after {
            PlanValue::Known(Some(v)) => v.clone(),
            PlanValue::Known(None) => "null".to_string(),
            PlanValue::Unknown => "(known after apply)".to_string(),
        };
        format!("{before} → {after}")
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub additions: usize,
    pub changes: usize,
    pub replacements: usize,
    pub removals: usize,
}

impl DiffSummary {
    /// Create a summary from planned actions
    pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a Action>) -> Self {
        let mut summary = Self::default();
        for action in actions {
            match action {
                Action::Create => summary.additions += 1,
                Action::Update => summary.changes += 1,
                Action::Replace => summary.replacements += 1,
                Action::Delete => summary.removals += 1,
                Action::NoOp => {}
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.changes + self.replacements + self.removals
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}
