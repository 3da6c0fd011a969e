//! Plan-time policies
//!
//! Independent replacement policies decide whether a change can be made
//! in place. Any one of them demanding replacement wins. Separately,
//! `readable_value` is derived so an unchanged variable plans as a no-op
//! instead of "(known after apply)" on every run.

use crate::contract;
use crate::error::Result;
use crate::model::{DesiredConfig, ObservedState, PlannedChange, PlannedState, ResolvedConfig};
use crate::scope;
use declarative::{
    Action, AttributeChange, PlanValue, PolicyOutcome, PolicySet, ReplacementDecision,
    ReplacementPolicy,
};

/// Renaming a sensitive variable forces replacement
#[derive(Debug, Clone, Copy)]
pub struct KeyReplaceIfSensitive;

impl ReplacementPolicy<ObservedState, ResolvedConfig> for KeyReplaceIfSensitive {
    fn name(&self) -> &'static str {
        "key_replace_if_sensitive"
    }

    fn description(&self) -> &'static str {
        "key of a sensitive variable cannot change in place"
    }

    fn evaluate(&self, prior: &ObservedState, proposed: &ResolvedConfig) -> ReplacementDecision {
        ReplacementDecision::from_bool(prior.sensitive && proposed.key != prior.key)
    }
}

/// A sensitive variable can never become readable in place
#[derive(Debug, Clone, Copy)]
pub struct SensitiveDowngradeReplace;

impl ReplacementPolicy<ObservedState, ResolvedConfig> for SensitiveDowngradeReplace {
    fn name(&self) -> &'static str {
        "sensitive_downgrade_replace"
    }

    fn description(&self) -> &'static str {
        "sensitive cannot change from true to false in place"
    }

    fn evaluate(&self, prior: &ObservedState, proposed: &ResolvedConfig) -> ReplacementDecision {
        ReplacementDecision::from_bool(prior.sensitive && !proposed.sensitive)
    }
}

/// A readable variable becomes write-only through a fresh variable
///
/// Updating in place would leave the previously readable value in the
/// store's history of the same variable id.
#[derive(Debug, Clone, Copy)]
pub struct SensitiveUpgradeReplace;

impl ReplacementPolicy<ObservedState, ResolvedConfig> for SensitiveUpgradeReplace {
    fn name(&self) -> &'static str {
        "sensitive_upgrade_replace"
    }

    fn description(&self) -> &'static str {
        "sensitive cannot change from false to true in place"
    }

    fn evaluate(&self, prior: &ObservedState, proposed: &ResolvedConfig) -> ReplacementDecision {
        ReplacementDecision::from_bool(!prior.sensitive && proposed.sensitive)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryReplace;

impl ReplacementPolicy<ObservedState, ResolvedConfig> for CategoryReplace {
    fn name(&self) -> &'static str {
        "category_replace"
    }

    fn description(&self) -> &'static str {
        "category cannot change in place"
    }

    fn evaluate(&self, prior: &ObservedState, proposed: &ResolvedConfig) -> ReplacementDecision {
        ReplacementDecision::from_bool(prior.category != proposed.category.to_remote())
    }
}

/// Moving a variable to another module is a new variable
#[derive(Debug, Clone, Copy)]
pub struct ScopeReplace;

impl ReplacementPolicy<ObservedState, ResolvedConfig> for ScopeReplace {
    fn name(&self) -> &'static str {
        "scope_replace"
    }

    fn description(&self) -> &'static str {
        "organization, module_name and module_provider cannot change in place"
    }

    fn evaluate(&self, prior: &ObservedState, proposed: &ResolvedConfig) -> ReplacementDecision {
        ReplacementDecision::from_bool(prior.scope != proposed.scope)
    }
}

/// The replacement policies, in evaluation order
pub fn policies() -> PolicySet<ObservedState, ResolvedConfig> {
    PolicySet::new()
        .with(KeyReplaceIfSensitive)
        .with(SensitiveDowngradeReplace)
        .with(SensitiveUpgradeReplace)
        .with(CategoryReplace)
        .with(ScopeReplace)
}

/// Planned `readable_value`
///
/// Known only when both sensitivity and value are unchanged, in which case
/// it is exactly the prior readable value (null for a sensitive variable).
pub fn derive_readable_value(
    prior: Option<&ObservedState>,
    proposed: &ResolvedConfig,
) -> PlanValue<Option<String>> {
    match prior {
        Some(p) if p.sensitive == proposed.sensitive && p.value == proposed.value => {
            PlanValue::Known(p.readable_value.clone())
        }
        _ => PlanValue::Unknown,
    }
}

/// Plan the change that moves `prior` to `desired`
pub fn plan(prior: Option<&ObservedState>, desired: &DesiredConfig) -> Result<PlannedChange> {
    let config = contract::resolve(desired)?;
    scope::resolve(&config.scope)?;

    let readable_value = derive_readable_value(prior, &config);

    let Some(prior) = prior else {
        let planned = PlannedState {
            id: PlanValue::Unknown,
            config,
            readable_value,
        };
        return Ok(PlannedChange {
            action: Action::Create,
            prior: None,
            changes: attribute_changes(None, Some(&planned), &PolicyOutcome::default()),
            planned: Some(planned),
            replace_reasons: Vec::new(),
        });
    };

    let outcome = policies().evaluate(prior, &config);
    let (action, id) = if outcome.requires_replace() {
        for reason in outcome.reasons() {
            log::info!("{} must be replaced: {reason}", config.key);
        }
        (Action::Replace, PlanValue::Unknown)
    } else if prior.matches(&config) {
        (Action::NoOp, PlanValue::Known(prior.id.clone()))
    } else {
        (Action::Update, PlanValue::Known(prior.id.clone()))
    };

    let planned = PlannedState {
        id,
        config,
        readable_value,
    };

    Ok(PlannedChange {
        action,
        changes: attribute_changes(Some(prior), Some(&planned), &outcome),
        prior: Some(prior.clone()),
        planned: Some(planned),
        replace_reasons: outcome.reasons(),
    })
}

/// Plan the removal of a recorded instance
pub fn plan_destroy(prior: &ObservedState) -> PlannedChange {
    PlannedChange {
        action: Action::Delete,
        changes: attribute_changes(Some(prior), None, &PolicyOutcome::default()),
        prior: Some(prior.clone()),
        planned: None,
        replace_reasons: Vec::new(),
    }
}

/// Attributes a policy guards
fn guarded_by(policy: &str) -> &'static [&'static str] {
    match policy {
        "key_replace_if_sensitive" => &["key"],
        "sensitive_downgrade_replace" | "sensitive_upgrade_replace" => &["sensitive"],
        "category_replace" => &["category"],
        "scope_replace" => &["organization", "module_name", "module_provider"],
        _ => &[],
    }
}

/// Attributes whose change is the reason replacement was forced
fn forced_attributes(outcome: &PolicyOutcome) -> Vec<&'static str> {
    outcome
        .triggered
        .iter()
        .flat_map(|t| guarded_by(t.name))
        .copied()
        .collect()
}

type Attributes = Vec<(&'static str, Option<String>)>;

fn observed_attributes(state: &ObservedState) -> Attributes {
    vec![
        ("key", Some(state.key.clone())),
        ("value", Some(state.value.clone())),
        ("category", Some(state.category.to_string())),
        ("description", Some(state.description.clone())),
        ("hcl", Some(state.hcl.to_string())),
        ("sensitive", Some(state.sensitive.to_string())),
        ("organization", Some(state.scope.organization.clone())),
        ("module_name", Some(state.scope.module_name.clone())),
        ("module_provider", Some(state.scope.module_provider.clone())),
    ]
}

fn planned_attributes(planned: &PlannedState) -> Attributes {
    let c = &planned.config;
    vec![
        ("key", Some(c.key.clone())),
        ("value", Some(c.value.clone())),
        ("category", Some(c.category.to_string())),
        ("description", Some(c.description.clone())),
        ("hcl", Some(c.hcl.to_string())),
        ("sensitive", Some(c.sensitive.to_string())),
        ("organization", Some(c.scope.organization.clone())),
        ("module_name", Some(c.scope.module_name.clone())),
        ("module_provider", Some(c.scope.module_provider.clone())),
    ]
}

/// Per-attribute transitions, redacted per the contract
///
/// Unchanged configurable attributes are omitted. `id` and `readable_value`
/// appear whenever their planned value differs from the prior one.
fn attribute_changes(
    prior: Option<&ObservedState>,
    planned: Option<&PlannedState>,
    outcome: &PolicyOutcome,
) -> Vec<AttributeChange> {
    let schema = contract::schema();
    let forced = forced_attributes(outcome);

    let before = prior.map(observed_attributes);
    let after = planned.map(planned_attributes);

    let names = before
        .as_ref()
        .or(after.as_ref())
        .map(|attrs| attrs.iter().map(|(name, _)| *name).collect::<Vec<_>>())
        .unwrap_or_default();

    let lookup = |attrs: &Option<Attributes>, name: &str| -> Option<String> {
        attrs
            .as_ref()
            .and_then(|a| a.iter().find(|(n, _)| *n == name))
            .and_then(|(_, v)| v.clone())
    };

    let mut changes = Vec::new();

    let prior_id = prior.map(|p| p.id.clone());
    let planned_id = planned.map_or(PlanValue::Known(None), |p| p.id.clone().map(Some));
    if planned_id.known() != Some(&prior_id) {
        changes.push(AttributeChange::new(
            "id",
            prior_id,
            planned_id,
            schema.is_sensitive("id"),
        ));
    }

    for name in names {
        let old = lookup(&before, name);
        let new = lookup(&after, name);
        if old != new {
            changes.push(
                AttributeChange::new(name, old, PlanValue::Known(new), schema.is_sensitive(name))
                    .forcing_replacement(forced.contains(&name)),
            );
        }
    }

    let prior_readable = prior.and_then(|p| p.readable_value.clone());
    let planned_readable = planned.map_or(PlanValue::Known(None), |p| p.readable_value.clone());
    if planned_readable.known() != Some(&prior_readable) {
        changes.push(AttributeChange::new(
            "readable_value",
            prior_readable,
            planned_readable,
            schema.is_sensitive("readable_value"),
        ));
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleScope, VariableCategory};
    use declarative::REDACTED;
    use varstore::Category;

    fn desired(key: &str, value: &str, sensitive: bool) -> DesiredConfig {
        DesiredConfig {
            key: key.to_string(),
            value: Some(value.to_string()),
            category: "env".to_string(),
            sensitive: Some(sensitive),
            organization: "acme".to_string(),
            module_name: "vpc".to_string(),
            module_provider: "aws".to_string(),
            ..Default::default()
        }
    }

    fn observed(key: &str, value: &str, sensitive: bool) -> ObservedState {
        ObservedState {
            id: "var-1".to_string(),
            key: key.to_string(),
            value: value.to_string(),
            category: Category::Env,
            description: String::new(),
            hcl: false,
            sensitive,
            readable_value: (!sensitive).then(|| value.to_string()),
            scope: ModuleScope::new("acme", "vpc", "aws"),
        }
    }

    fn resolved(key: &str, value: &str, sensitive: bool) -> ResolvedConfig {
        contract::resolve(&desired(key, value, sensitive)).unwrap()
    }

    #[test]
    fn test_key_policy_only_for_sensitive_prior() {
        let policy = KeyReplaceIfSensitive;
        assert!(
            policy
                .evaluate(&observed("A", "v", true), &resolved("B", "v", true))
                .requires_replace()
        );
        assert!(
            !policy
                .evaluate(&observed("A", "v", false), &resolved("B", "v", false))
                .requires_replace()
        );
        assert!(
            !policy
                .evaluate(&observed("A", "v", true), &resolved("A", "w", true))
                .requires_replace()
        );
    }

    #[test]
    fn test_sensitive_downgrade_policy() {
        let policy = SensitiveDowngradeReplace;
        assert!(
            policy
                .evaluate(&observed("A", "v", true), &resolved("A", "v", false))
                .requires_replace()
        );
        assert!(
            !policy
                .evaluate(&observed("A", "v", false), &resolved("A", "v", true))
                .requires_replace()
        );
    }

    #[test]
    fn test_category_and_scope_policies() {
        let mut prior = observed("A", "v", false);
        prior.category = Category::Terraform;
        assert!(
            CategoryReplace
                .evaluate(&prior, &resolved("A", "v", false))
                .requires_replace()
        );

        let mut moved = resolved("A", "v", false);
        moved.scope.module_provider = "gcp".to_string();
        assert!(
            ScopeReplace
                .evaluate(&observed("A", "v", false), &moved)
                .requires_replace()
        );
        assert_eq!(moved.category, VariableCategory::Env);
    }

    #[test]
    fn test_readable_value_derivation() {
        let prior = observed("A", "v", false);
        assert_eq!(
            derive_readable_value(Some(&prior), &resolved("A", "v", false)),
            PlanValue::Known(Some("v".to_string()))
        );
        assert_eq!(
            derive_readable_value(Some(&prior), &resolved("A", "w", false)),
            PlanValue::Unknown
        );
        assert_eq!(
            derive_readable_value(Some(&prior), &resolved("A", "v", true)),
            PlanValue::Unknown
        );
        assert_eq!(
            derive_readable_value(Some(&observed("A", "v", true)), &resolved("B", "v", true)),
            PlanValue::Known(None)
        );
        assert_eq!(
            derive_readable_value(None, &resolved("A", "v", false)),
            PlanValue::Unknown
        );
    }

    #[test]
    fn test_plan_create() {
        let change = plan(None, &desired("FOO", "bar", false)).unwrap();
        assert_eq!(change.action, Action::Create);
        let planned = change.planned.unwrap();
        assert!(planned.id.is_unknown());
        assert!(planned.readable_value.is_unknown());
        assert!(change.changes.iter().any(|c| c.name == "key"));
    }

    #[test]
    fn test_plan_noop_keeps_id() {
        let prior = observed("FOO", "bar", false);
        let change = plan(Some(&prior), &desired("FOO", "bar", false)).unwrap();
        assert_eq!(change.action, Action::NoOp);
        assert!(change.changes.is_empty());
        assert_eq!(
            change.planned.unwrap().id,
            PlanValue::Known("var-1".to_string())
        );
    }

    #[test]
    fn test_plan_rename_plain_is_update() {
        let prior = observed("FOO", "bar", false);
        let change = plan(Some(&prior), &desired("FOO2", "bar", false)).unwrap();
        assert_eq!(change.action, Action::Update);
        assert!(change.replace_reasons.is_empty());
        let key = change.changes.iter().find(|c| c.name == "key").unwrap();
        assert!(!key.forces_replacement);
    }

    #[test]
    fn test_plan_rename_sensitive_is_replace() {
        let prior = observed("FOO", "bar", true);
        let change = plan(Some(&prior), &desired("FOO2", "bar", true)).unwrap();
        assert_eq!(change.action, Action::Replace);
        assert_eq!(
            change.replace_reasons,
            vec!["key of a sensitive variable cannot change in place"]
        );
        let key = change.changes.iter().find(|c| c.name == "key").unwrap();
        assert!(key.forces_replacement);
        assert!(change.planned.unwrap().id.is_unknown());
    }

    #[test]
    fn test_plan_downgrade_is_replace_even_without_other_changes() {
        let prior = observed("FOO", "bar", true);
        let change = plan(Some(&prior), &desired("FOO", "bar", false)).unwrap();
        assert_eq!(change.action, Action::Replace);
        let sensitive = change
            .changes
            .iter()
            .find(|c| c.name == "sensitive")
            .unwrap();
        assert!(sensitive.forces_replacement);
    }

    #[test]
    fn test_plan_upgrade_to_sensitive_is_replace() {
        let prior = observed("FOO", "bar", false);
        let change = plan(Some(&prior), &desired("FOO", "bar", true)).unwrap();
        assert_eq!(change.action, Action::Replace);
        assert_eq!(
            change.replace_reasons,
            vec!["sensitive cannot change from false to true in place"]
        );
        assert!(change.planned.unwrap().readable_value.is_unknown());
    }

    #[test]
    fn test_sensitive_upgrade_policy() {
        let policy = SensitiveUpgradeReplace;
        assert!(
            policy
                .evaluate(&observed("A", "v", false), &resolved("A", "v", true))
                .requires_replace()
        );
        assert!(
            !policy
                .evaluate(&observed("A", "v", true), &resolved("A", "w", true))
                .requires_replace()
        );
    }

    #[test]
    fn test_value_change_is_redacted() {
        let prior = observed("FOO", "old-secret", true);
        let change = plan(Some(&prior), &desired("FOO", "new-secret", true)).unwrap();
        assert_eq!(change.action, Action::Update);
        let value = change.changes.iter().find(|c| c.name == "value").unwrap();
        assert_eq!(value.before.as_deref(), Some(REDACTED));
        assert!(!value.render().contains("new-secret"));
        assert!(!value.render().contains("old-secret"));
    }

    #[test]
    fn test_plan_rejects_invalid_config() {
        let mut config = desired("FOO", "bar", false);
        config.category = "terraform".to_string();
        assert!(plan(None, &config).is_err());

        let mut config = desired("FOO", "bar", false);
        config.module_name = String::new();
        assert!(plan(None, &config).is_err());
    }

    #[test]
    fn test_plan_destroy() {
        let prior = observed("FOO", "bar", false);
        let change = plan_destroy(&prior);
        assert_eq!(change.action, Action::Delete);
        assert!(change.planned.is_none());
        let readable = change
            .changes
            .iter()
            .find(|c| c.name == "readable_value")
            .unwrap();
        assert_eq!(readable.render(), "bar → null");
    }
}
