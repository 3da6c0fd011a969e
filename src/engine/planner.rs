//! Execution planner - turns config and recorded state into per-instance changes

use anyhow::{Context, Result, bail};
use declarative::{Action, DiffSummary};
use testvar::{PlannedChange, TestVariableResource};

use crate::schema::ModvarConfig;
use crate::state::ModvarState;

/// Which instances a command operates on
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    All,
    Named(String),
}

impl Target {
    /// Parse `tfe_test_variable`, `tfe_test_variable.<name>` or `<name>`
    pub fn parse(target: Option<&str>) -> Result<Self> {
        let Some(target) = target else {
            return Ok(Self::All);
        };

        match target.split_once('.') {
            None if target == TestVariableResource::TYPE_NAME => Ok(Self::All),
            None => Ok(Self::Named(target.to_string())),
            Some((resource_type, name)) => {
                if resource_type != TestVariableResource::TYPE_NAME {
                    bail!(
                        "Unknown resource type '{resource_type}' (expected {})",
                        TestVariableResource::TYPE_NAME
                    );
                }
                if name.is_empty() {
                    bail!("Missing instance name in target '{target}'");
                }
                Ok(Self::Named(name.to_string()))
            }
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(n) => n == name,
        }
    }
}

/// Planned change for one named instance
#[derive(Debug, Clone)]
pub struct InstancePlan {
    pub name: String,
    pub change: PlannedChange,
}

impl InstancePlan {
    /// Address shown to users, e.g. `tfe_test_variable.foo`
    pub fn address(&self) -> String {
        address(&self.name)
    }
}

pub fn address(name: &str) -> String {
    format!("{}.{}", TestVariableResource::TYPE_NAME, name)
}

/// Every planned instance, in name order
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub instances: Vec<InstancePlan>,
}

impl ExecutionPlan {
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_actions(self.instances.iter().map(|i| &i.change.action))
    }

    /// Instances that touch the store
    pub fn changes(&self) -> impl Iterator<Item = &InstancePlan> {
        self.instances.iter().filter(|i| i.change.action.is_change())
    }

    pub fn has_changes(&self) -> bool {
        self.changes().next().is_some()
    }
}

/// Plan convergence of the recorded state onto the config
///
/// Instances recorded in state but no longer declared are planned for
/// deletion.
pub fn plan_apply(
    config: &ModvarConfig,
    state: &ModvarState,
    resource: &TestVariableResource,
    target: &Target,
) -> Result<ExecutionPlan> {
    let mut plan = ExecutionPlan::default();

    for (name, desired) in config.desired_variables() {
        if !target.matches(name) {
            continue;
        }
        let change = resource
            .plan(state.instance(name), &desired)
            .with_context(|| format!("Invalid variable '{name}'"))?;
        log::debug!("Planned {}: {:?}", address(name), change.action);
        plan.instances.push(InstancePlan {
            name: name.to_string(),
            change,
        });
    }

    for (name, prior) in &state.instances {
        if !target.matches(name) || config.variables.contains_key(name) {
            continue;
        }
        log::debug!("{} is no longer declared", address(name));
        plan.instances.push(InstancePlan {
            name: name.clone(),
            change: resource.plan_destroy(prior),
        });
    }

    plan.instances.sort_by(|a, b| a.name.cmp(&b.name));
    ensure_target_found(&plan, target)?;
    Ok(plan)
}

/// Plan deletion of every recorded instance
pub fn plan_destroy(
    state: &ModvarState,
    resource: &TestVariableResource,
    target: &Target,
) -> Result<ExecutionPlan> {
    let instances = state
        .instances
        .iter()
        .filter(|(name, _)| target.matches(name))
        .map(|(name, prior)| InstancePlan {
            name: name.clone(),
            change: resource.plan_destroy(prior),
        })
        .collect();

    let plan = ExecutionPlan { instances };
    ensure_target_found(&plan, target)?;
    Ok(plan)
}

fn ensure_target_found(plan: &ExecutionPlan, target: &Target) -> Result<()> {
    if let Target::Named(name) = target
        && plan.instances.is_empty()
    {
        bail!("No variable named '{name}' in config or state");
    }
    Ok(())
}

/// Count of instances per planned action, for logging
pub fn action_counts(plan: &ExecutionPlan) -> Vec<(Action, usize)> {
    [
        Action::Create,
        Action::Update,
        Action::Replace,
        Action::Delete,
        Action::NoOp,
    ]
    .into_iter()
    .map(|action| {
        let n = plan
            .instances
            .iter()
            .filter(|i| i.change.action == action)
            .count();
        (action, n)
    })
    .filter(|(_, n)| *n > 0)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use testvar::DesiredConfig;
    use varstore::MockStore;

    fn config(toml: &str) -> ModvarConfig {
        toml::from_str(toml).unwrap()
    }

    const TWO_VARS: &str = r#"
[provider]
organization = "acme"

[variables.foo]
key = "FOO"
value = "bar"
category = "env"
module_name = "vpc"
module_provider = "aws"

[variables.token]
key = "TOKEN"
value = "s3cret"
category = "env"
sensitive = true
module_name = "vpc"
module_provider = "aws"
"#;

    fn applied_state(config: &ModvarConfig) -> ModvarState {
        let resource = TestVariableResource::with_store(Arc::new(MockStore::new()));
        let mut state = ModvarState::default();
        let plan = plan_apply(config, &state, &resource, &Target::All).unwrap();
        for instance in &plan.instances {
            let outcome = resource.apply(&declarative::ApplyContext::default(), &instance.change);
            state.record(&instance.name, &outcome);
        }
        state
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(Target::parse(None).unwrap(), Target::All);
        assert_eq!(Target::parse(Some("tfe_test_variable")).unwrap(), Target::All);
        assert_eq!(
            Target::parse(Some("tfe_test_variable.foo")).unwrap(),
            Target::Named("foo".to_string())
        );
        assert_eq!(
            Target::parse(Some("foo")).unwrap(),
            Target::Named("foo".to_string())
        );
        assert!(Target::parse(Some("tfe_variable.foo")).is_err());
        assert!(Target::parse(Some("tfe_test_variable.")).is_err());
    }

    #[test]
    fn test_target_matches_exact_names() {
        let target = Target::Named("foo".to_string());
        assert!(target.matches("foo"));
        assert!(!target.matches("foobar"));
        assert!(Target::All.matches("anything"));
    }

    #[test]
    fn test_fresh_state_plans_creates() {
        let config = config(TWO_VARS);
        let resource = TestVariableResource::new();
        let plan = plan_apply(&config, &ModvarState::default(), &resource, &Target::All).unwrap();

        assert_eq!(plan.instances.len(), 2);
        assert_eq!(plan.summary().additions, 2);
        assert_eq!(plan.instances[0].address(), "tfe_test_variable.foo");
    }

    #[test]
    fn test_converged_state_plans_nothing() {
        let config = config(TWO_VARS);
        let state = applied_state(&config);
        let plan = plan_apply(&config, &state, &TestVariableResource::new(), &Target::All).unwrap();

        assert!(!plan.has_changes());
        assert_eq!(action_counts(&plan), vec![(Action::NoOp, 2)]);
    }

    #[test]
    fn test_undeclared_instances_are_deleted() {
        let full = config(TWO_VARS);
        let state = applied_state(&full);

        let mut trimmed = config(TWO_VARS);
        trimmed.variables.remove("token");
        let plan = plan_apply(&trimmed, &state, &TestVariableResource::new(), &Target::All).unwrap();

        let token = plan.instances.iter().find(|i| i.name == "token").unwrap();
        assert_eq!(token.change.action, Action::Delete);
        assert_eq!(plan.summary().removals, 1);
    }

    #[test]
    fn test_target_restricts_plan() {
        let config = config(TWO_VARS);
        let target = Target::Named("token".to_string());
        let plan =
            plan_apply(&config, &ModvarState::default(), &TestVariableResource::new(), &target)
                .unwrap();

        assert_eq!(plan.instances.len(), 1);
        assert_eq!(plan.instances[0].name, "token");
    }

    #[test]
    fn test_unknown_target_is_an_error() {
        let config = config(TWO_VARS);
        let target = Target::Named("missing".to_string());
        let err = plan_apply(&config, &ModvarState::default(), &TestVariableResource::new(), &target)
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_invalid_variable_named_in_error() {
        let mut config = config(TWO_VARS);
        config.variables.insert(
            "broken".to_string(),
            DesiredConfig {
                key: "X".to_string(),
                category: "terraform".to_string(),
                ..Default::default()
            },
        );
        let err = plan_apply(&config, &ModvarState::default(), &TestVariableResource::new(), &Target::All)
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_plan_destroy_covers_recorded_instances() {
        let config = config(TWO_VARS);
        let state = applied_state(&config);
        let plan = plan_destroy(&state, &TestVariableResource::new(), &Target::All).unwrap();

        assert_eq!(plan.summary().removals, 2);
        assert!(plan.instances.iter().all(|i| i.change.action == Action::Delete));
    }
}
