//! Lifecycle operations of `tfe_test_variable`
//!
//! Each operation is a single attempt against the store. On failure the
//! prior recorded state stays authoritative; a remote call is only treated
//! as committed once it returned success.

use crate::contract;
use crate::error::{Error, Result};
use crate::handle::{ProviderHandle, TEST_VARIABLES};
use crate::model::{DesiredConfig, ObservedState, PlannedChange, PlannedState};
use crate::policy;
use crate::scope;
use crate::translate::translate;
use declarative::{Action, ApplyContext, ApplyResult, Schema};
use std::fmt;
use std::sync::Arc;
use varstore::{VariableCreateOptions, VariableStore, VariableUpdateOptions};

/// State after [`TestVariableResource::apply`], and how it got there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// What should be recorded; `None` means the instance is absent
    pub state: Option<ObservedState>,
    pub result: ApplyResult,
}

impl ApplyOutcome {
    fn new(state: Option<ObservedState>, result: ApplyResult) -> Self {
        Self { state, result }
    }

    fn failed(state: Option<ObservedState>, error: &Error) -> Self {
        let result = match error {
            Error::Cancelled { .. } => ApplyResult::Skipped {
                reason: error.to_string(),
            },
            _ => ApplyResult::Failed {
                error: error.to_string(),
            },
        };
        Self { state, result }
    }
}

/// The registry-module test variable resource
#[derive(Default)]
pub struct TestVariableResource {
    store: Option<Arc<dyn VariableStore>>,
}

impl TestVariableResource {
    pub const TYPE_NAME: &'static str = contract::TYPE_NAME;

    /// An unconfigured resource; it can plan but not apply
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource talking to `store` directly
    pub fn with_store(store: Arc<dyn VariableStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Take the store from the host's provider handle
    ///
    /// `None` leaves the resource unconfigured. A handle without the test
    /// variables capability is a host wiring defect and fails immediately.
    pub fn configure(&mut self, handle: Option<&dyn ProviderHandle>) -> Result<()> {
        let Some(handle) = handle else {
            return Ok(());
        };
        let store = handle
            .test_variables()
            .ok_or_else(|| Error::HostIntegration {
                expected: TEST_VARIABLES,
                actual: handle.kind(),
            })?;
        log::debug!("Configured {} with {}", Self::TYPE_NAME, handle.kind());
        self.store = Some(store);
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn schema(&self) -> Schema {
        contract::schema()
    }

    /// Plan the change from `prior` to `desired`
    pub fn plan(
        &self,
        prior: Option<&ObservedState>,
        desired: &DesiredConfig,
    ) -> Result<PlannedChange> {
        policy::plan(prior, desired)
    }

    /// Plan the removal of a recorded instance
    pub fn plan_destroy(&self, prior: &ObservedState) -> PlannedChange {
        policy::plan_destroy(prior)
    }

    /// The store, once cancellation has been ruled out
    fn store_for(
        &self,
        ctx: &ApplyContext,
        operation: &'static str,
    ) -> Result<&dyn VariableStore> {
        let store = self.store.as_deref().ok_or(Error::NotConfigured)?;
        if ctx.is_cancelled() {
            return Err(Error::Cancelled { operation });
        }
        Ok(store)
    }

    /// Create the variable described by `planned`
    pub fn create(&self, ctx: &ApplyContext, planned: &PlannedState) -> Result<ObservedState> {
        let config = &planned.config;
        let module = scope::resolve(&config.scope)?;
        let store = self.store_for(ctx, "create")?;

        let options = VariableCreateOptions {
            key: config.key.clone(),
            value: config.value.clone(),
            category: config.category.to_remote(),
            hcl: config.hcl,
            sensitive: config.sensitive,
            description: config.description.clone(),
        };

        log::debug!("Create {} variable: {}", config.category, config.key);
        let remote = store
            .create(&module, &options)
            .map_err(|source| Error::Remote {
                operation: "create",
                target: format!("{} variable {}", config.category, config.key),
                source,
            })?;

        Ok(translate(&remote, &config.value).with_scope(config.scope.clone()))
    }

    /// Refresh a recorded instance from the store
    ///
    /// Returns `None` when the variable no longer exists remotely.
    pub fn read(&self, ctx: &ApplyContext, prior: &ObservedState) -> Result<Option<ObservedState>> {
        let module = scope::resolve(&prior.scope)?;
        let store = self.store_for(ctx, "read")?;

        log::debug!("Read variable: {}", prior.id);
        match store.read(&module, &prior.id) {
            Ok(remote) => Ok(Some(
                translate(&remote, &prior.value).with_scope(prior.scope.clone()),
            )),
            Err(e) if e.is_not_found() => {
                log::warn!("Variable {} not found, removing it from state", prior.id);
                Ok(None)
            }
            Err(source) => Err(Error::Remote {
                operation: "read",
                target: format!("variable {}", prior.id),
                source,
            }),
        }
    }

    /// Update a recorded instance in place
    ///
    /// `value` is only sent when it differs from the recorded one, so an
    /// unchanged sensitive value is never rewritten.
    pub fn update(
        &self,
        ctx: &ApplyContext,
        prior: &ObservedState,
        planned: &PlannedState,
    ) -> Result<ObservedState> {
        let config = &planned.config;
        let module = scope::resolve(&config.scope)?;
        let store = self.store_for(ctx, "update")?;

        let options = VariableUpdateOptions {
            key: Some(config.key.clone()),
            value: (prior.value != config.value).then(|| config.value.clone()),
            description: Some(config.description.clone()),
            hcl: Some(config.hcl),
            sensitive: Some(config.sensitive),
        };

        log::debug!("Update variable: {}", prior.id);
        let remote = store
            .update(&module, &prior.id, &options)
            .map_err(|source| Error::Remote {
                operation: "update",
                target: format!("variable {}", prior.id),
                source,
            })?;

        Ok(translate(&remote, &config.value).with_scope(config.scope.clone()))
    }

    /// Delete a recorded instance
    ///
    /// A variable that is already gone counts as deleted.
    pub fn delete(&self, ctx: &ApplyContext, prior: &ObservedState) -> Result<()> {
        let module = scope::resolve(&prior.scope)?;
        let store = self.store_for(ctx, "delete")?;

        log::debug!("Delete variable: {}", prior.id);
        match store.delete(&module, &prior.id) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                log::warn!("Variable {} was already deleted", prior.id);
                Ok(())
            }
            Err(source) => Err(Error::Remote {
                operation: "delete",
                target: format!("variable {}", prior.id),
                source,
            }),
        }
    }

    /// Carry out a planned change
    ///
    /// Replacement deletes before creating. If the create then fails or is
    /// cancelled the instance is recorded as absent and the change fails.
    pub fn apply(&self, ctx: &ApplyContext, change: &PlannedChange) -> ApplyOutcome {
        let prior = change.prior.clone();

        if !change.action.is_change() {
            return ApplyOutcome::new(prior, ApplyResult::NoChange);
        }
        if ctx.dry_run {
            return ApplyOutcome::new(
                prior,
                ApplyResult::Skipped {
                    reason: "dry run".to_string(),
                },
            );
        }

        match (change.action, &change.prior, &change.planned) {
            (Action::Create, _, Some(planned)) => match self.create(ctx, planned) {
                Ok(state) => ApplyOutcome::new(Some(state), ApplyResult::Created),
                Err(e) => ApplyOutcome::failed(prior, &e),
            },
            (Action::Update, Some(old), Some(planned)) => match self.update(ctx, old, planned) {
                Ok(state) => ApplyOutcome::new(Some(state), ApplyResult::Modified),
                Err(e) => ApplyOutcome::failed(prior, &e),
            },
            (Action::Replace, Some(old), Some(planned)) => {
                if let Err(e) = self.delete(ctx, old) {
                    return ApplyOutcome::failed(prior, &e);
                }
                // The old variable is gone; an interrupted create is a failure
                match self.create(ctx, planned) {
                    Ok(state) => ApplyOutcome::new(Some(state), ApplyResult::Replaced),
                    Err(e) => ApplyOutcome::new(
                        None,
                        ApplyResult::Failed {
                            error: format!("replacement interrupted after destroy: {e}"),
                        },
                    ),
                }
            }
            (Action::Delete, Some(old), _) => match self.delete(ctx, old) {
                Ok(()) => ApplyOutcome::new(None, ApplyResult::Removed),
                Err(e) => ApplyOutcome::failed(prior, &e),
            },
            (action, _, _) => ApplyOutcome::new(
                prior,
                ApplyResult::Failed {
                    error: format!("malformed plan: {action:?} without the states it needs"),
                },
            ),
        }
    }
}

impl fmt::Debug for TestVariableResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestVariableResource")
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModuleScope;
    use declarative::CancelToken;
    use varstore::{Category, MockStore, Operation, RecordedCall};

    struct WorkspaceOnly;

    impl ProviderHandle for WorkspaceOnly {
        fn kind(&self) -> String {
            "workspace-only client".to_string()
        }

        fn test_variables(&self) -> Option<Arc<dyn VariableStore>> {
            None
        }
    }

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

    fn resource() -> (TestVariableResource, MockStore) {
        let store = MockStore::new();
        (
            TestVariableResource::with_store(Arc::new(store.clone())),
            store,
        )
    }

    fn create(
        resource: &TestVariableResource,
        key: &str,
        value: &str,
        sensitive: bool,
    ) -> ObservedState {
        let change = resource.plan(None, &desired(key, value, sensitive)).unwrap();
        resource
            .apply(&ApplyContext::default(), &change)
            .state
            .unwrap()
    }

    #[test]
    fn test_configure_rejects_handle_without_capability() {
        let mut resource = TestVariableResource::new();
        let err = resource.configure(Some(&WorkspaceOnly)).unwrap_err();
        assert!(matches!(err, Error::HostIntegration { .. }));
        assert!(!resource.is_configured());
    }

    #[test]
    fn test_configure_none_leaves_unconfigured() {
        let mut resource = TestVariableResource::new();
        resource.configure(None).unwrap();
        assert!(!resource.is_configured());

        let change = resource.plan(None, &desired("FOO", "bar", false)).unwrap();
        let err = resource
            .create(&ApplyContext::default(), change.planned.as_ref().unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::NotConfigured));
    }

    #[test]
    fn test_configure_with_client() {
        let store = MockStore::new();
        let client = varstore::Client::with_store(store.clone());
        let mut resource = TestVariableResource::new();
        resource.configure(Some(&client)).unwrap();
        assert!(resource.is_configured());

        create(&resource, "FOO", "bar", false);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_sends_submitted_attributes() {
        let (resource, store) = resource();
        let state = create(&resource, "FOO", "bar", false);

        assert_eq!(state.readable_value.as_deref(), Some("bar"));
        assert_eq!(state.scope, ModuleScope::new("acme", "vpc", "aws"));
        match &store.calls()[0] {
            RecordedCall::Create { module, options } => {
                assert_eq!(module.name, "vpc");
                assert_eq!(options.category, Category::Env);
                assert_eq!(options.value, "bar");
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn test_create_failure_reports_category_and_key() {
        let (resource, store) = resource();
        store.fail_next(
            Operation::Create,
            varstore::Error::Rejected("HTTP 422".to_string()),
        );
        let change = resource.plan(None, &desired("FOO", "bar", false)).unwrap();
        let outcome = resource.apply(&ApplyContext::default(), &change);

        assert_eq!(outcome.state, None);
        match outcome.result {
            ApplyResult::Failed { error } => {
                assert!(error.contains("create env variable FOO"), "{error}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_update_failure_keeps_prior_state() {
        let (resource, store) = resource();
        let prior = create(&resource, "FOO", "bar", false);
        store.fail_next(Operation::Update, varstore::Error::http("timeout", None));

        let change = resource
            .plan(Some(&prior), &desired("FOO", "baz", false))
            .unwrap();
        let outcome = resource.apply(&ApplyContext::default(), &change);

        assert_eq!(outcome.state, Some(prior.clone()));
        match outcome.result {
            ApplyResult::Failed { error } => assert!(error.contains(&prior.id)),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_failure_keeps_instance() {
        let (resource, store) = resource();
        let prior = create(&resource, "FOO", "bar", false);
        store.fail_next(
            Operation::Delete,
            varstore::Error::Unauthorized("HTTP 403".to_string()),
        );

        let outcome = resource.apply(&ApplyContext::default(), &resource.plan_destroy(&prior));
        assert_eq!(outcome.state, Some(prior));
        assert!(!outcome.result.is_success());
    }

    #[test]
    fn test_replace_create_failure_leaves_absent() {
        let (resource, store) = resource();
        let prior = create(&resource, "FOO", "bar", true);
        store.fail_next(
            Operation::Create,
            varstore::Error::Rejected("HTTP 422".to_string()),
        );

        let change = resource
            .plan(Some(&prior), &desired("FOO", "bar", false))
            .unwrap();
        assert_eq!(change.action, Action::Replace);
        let outcome = resource.apply(&ApplyContext::default(), &change);

        assert_eq!(outcome.state, None);
        assert!(!outcome.result.is_success());
        assert!(store.is_empty());
    }

    /// Trips the cancel token once a delete has gone through
    struct CancelAfterDelete {
        inner: MockStore,
        cancel: CancelToken,
    }

    impl VariableStore for CancelAfterDelete {
        fn create(
            &self,
            module: &varstore::RegistryModuleId,
            options: &VariableCreateOptions,
        ) -> varstore::Result<varstore::RemoteVariable> {
            self.inner.create(module, options)
        }

        fn read(
            &self,
            module: &varstore::RegistryModuleId,
            variable_id: &str,
        ) -> varstore::Result<varstore::RemoteVariable> {
            self.inner.read(module, variable_id)
        }

        fn update(
            &self,
            module: &varstore::RegistryModuleId,
            variable_id: &str,
            options: &VariableUpdateOptions,
        ) -> varstore::Result<varstore::RemoteVariable> {
            self.inner.update(module, variable_id, options)
        }

        fn delete(
            &self,
            module: &varstore::RegistryModuleId,
            variable_id: &str,
        ) -> varstore::Result<()> {
            let deleted = self.inner.delete(module, variable_id);
            self.cancel.cancel();
            deleted
        }
    }

    #[test]
    fn test_replace_cancelled_after_destroy_is_a_failure() {
        let store = MockStore::new();
        let cancel = CancelToken::new();
        let resource = TestVariableResource::with_store(Arc::new(CancelAfterDelete {
            inner: store.clone(),
            cancel: cancel.clone(),
        }));
        let prior = create(&resource, "FOO", "bar", true);

        let change = resource
            .plan(Some(&prior), &desired("FOO", "bar", false))
            .unwrap();
        assert_eq!(change.action, Action::Replace);
        let ctx = ApplyContext::with_cancel(false, false, cancel);
        let outcome = resource.apply(&ctx, &change);

        assert_eq!(outcome.state, None);
        assert!(store.is_empty());
        match outcome.result {
            ApplyResult::Failed { error } => {
                assert!(error.contains("interrupted after destroy"), "{error}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_remote_call() {
        let (resource, store) = resource();
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = ApplyContext::with_cancel(false, false, cancel);

        let change = resource.plan(None, &desired("FOO", "bar", false)).unwrap();
        let outcome = resource.apply(&ctx, &change);

        assert_eq!(outcome.state, None);
        assert!(matches!(outcome.result, ApplyResult::Skipped { .. }));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (resource, store) = resource();
        let change = resource.plan(None, &desired("FOO", "bar", false)).unwrap();
        let outcome = resource.apply(&ApplyContext::new(true, false), &change);
        assert!(matches!(outcome.result, ApplyResult::Skipped { .. }));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_read_keeps_sensitive_value_and_detects_drift() {
        let (resource, store) = resource();
        let prior = create(&resource, "TOKEN", "s3cret", true);
        let ctx = ApplyContext::default();

        let refreshed = resource.read(&ctx, &prior).unwrap().unwrap();
        assert_eq!(refreshed.value, "s3cret");
        assert_eq!(refreshed.readable_value, None);
        assert_eq!(refreshed.scope, prior.scope);

        store.remove_out_of_band(&prior.id);
        assert_eq!(resource.read(&ctx, &prior).unwrap(), None);
    }

    #[test]
    fn test_noop_makes_no_calls() {
        let (resource, store) = resource();
        let prior = create(&resource, "FOO", "bar", false);
        store.clear_calls();

        let change = resource
            .plan(Some(&prior), &desired("FOO", "bar", false))
            .unwrap();
        let outcome = resource.apply(&ApplyContext::default(), &change);
        assert_eq!(outcome.result, ApplyResult::NoChange);
        assert_eq!(outcome.state, Some(prior));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_debug_hides_store() {
        let (resource, _) = resource();
        assert_eq!(
            format!("{resource:?}"),
            "TestVariableResource { configured: true }"
        );
    }
}
