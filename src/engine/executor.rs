//! Execution engine - runs planned changes on a worker pool

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use declarative::{
    ApplyContext, ApplyResult, AutoConfirm, CancelToken, ConfirmCallback, ExecuteSummary,
    ProgressCallback,
};
use rayon::prelude::*;
use std::path::Path;
use std::sync::{Arc, Mutex};
use testvar::TestVariableResource;

use super::differ::display_plan;
use super::planner::{ExecutionPlan, InstancePlan, action_counts};
use crate::state::ModvarState;
use crate::ui;

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Show the plan but don't touch the store
    pub dry_run: bool,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            yes: false,
            verbose: false,
        }
    }
}

/// Interactive confirmation through `dialoguer`
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool> {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

/// Prints one line per finished instance
pub struct ConsoleProgress {
    pub verbose: bool,
}

impl ProgressCallback for ConsoleProgress {
    fn on_resource_start(&self, id: &str, description: &str) {
        log::info!("{id}: {description}");
        if self.verbose {
            ui::dim(&format!("{id}: {description}..."));
        }
    }

    fn on_resource_complete(&self, id: &str, result: &ApplyResult) {
        let symbol = match result {
            ApplyResult::NoChange => "○".dimmed(),
            ApplyResult::Created
            | ApplyResult::Modified
            | ApplyResult::Replaced
            | ApplyResult::Removed => "✓".green(),
            ApplyResult::Failed { .. } => "✗".red(),
            ApplyResult::Skipped { .. } => "⊘".yellow(),
        };
        println!("    {symbol} {id} {}", describe_result(result).dimmed());
    }
}

/// Past-tense description of a result
pub fn describe_result(result: &ApplyResult) -> String {
    match result {
        ApplyResult::NoChange => "unchanged".to_string(),
        ApplyResult::Created => "created".to_string(),
        ApplyResult::Modified => "updated in-place".to_string(),
        ApplyResult::Replaced => "replaced".to_string(),
        ApplyResult::Removed => "destroyed".to_string(),
        ApplyResult::Failed { error } => format!("failed: {error}"),
        ApplyResult::Skipped { reason } => format!("skipped: {reason}"),
    }
}

/// Show the plan, confirm, apply it and persist the resulting state
///
/// State is saved even when some instances fail, so completed transitions
/// are never lost.
pub fn execute(
    plan: &ExecutionPlan,
    resource: &TestVariableResource,
    state: &mut ModvarState,
    state_path: &Path,
    opts: &ExecuteOptions,
    cancel: &CancelToken,
) -> Result<ExecuteSummary> {
    display_plan(plan);

    let pending: Vec<&InstancePlan> = plan.changes().collect();
    let unchanged = plan.instances.len() - pending.len();
    let mut summary = ExecuteSummary {
        no_change: unchanged,
        ..Default::default()
    };

    if pending.is_empty() {
        return Ok(summary);
    }

    for (action, n) in action_counts(plan) {
        log::debug!("{n} x {action:?}");
    }

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        summary.skipped = pending.len();
        return Ok(summary);
    }

    let mut confirm: Box<dyn ConfirmCallback> = if opts.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm)
    };
    if !confirm.confirm("Apply these changes?")? {
        println!();
        println!("  {} Aborted", "✗".red());
        summary.skipped = pending.len();
        return Ok(summary);
    }

    println!();
    println!(
        "  {} Applying {}...",
        "→".cyan(),
        ui::count(pending.len(), "change")
    );

    let ctx = ApplyContext::with_cancel(false, opts.verbose, cancel.clone());
    let progress = ConsoleProgress {
        verbose: opts.verbose,
    };
    let outcomes = run_parallel(&pending, opts.jobs, |instance| {
        let address = instance.address();
        progress.on_resource_start(&address, &instance.change.action.to_string());
        let outcome = resource.apply(&ctx, &instance.change);
        progress.on_resource_complete(&address, &outcome.result);
        (instance.name.clone(), outcome)
    })?;

    for (name, outcome) in &outcomes {
        state.record(name, outcome);
        summary.add_result(&outcome.result);
    }
    state
        .touch(state_path)
        .context("Failed to save state after apply")?;

    if cancel.is_cancelled() {
        ui::warn("Interrupted: operations not yet started were skipped");
    }
    print_summary(&summary);

    Ok(summary)
}

/// Run `op` over `items` on a pool of `jobs` threads
///
/// Results come back in completion order.
pub fn run_parallel<T, R, F>(items: &[T], jobs: usize, op: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let results: Arc<Mutex<Vec<R>>> = Arc::new(Mutex::new(Vec::with_capacity(items.len())));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("Failed to create worker thread pool")?;

    pool.install(|| {
        items.par_iter().for_each(|item| {
            let result = op(item);
            push_result(&results, result);
        });
    });

    into_results(results)
}

fn push_result<R>(results: &Arc<Mutex<Vec<R>>>, result: R) {
    match results.lock() {
        Ok(mut locked) => locked.push(result),
        Err(poisoned) => poisoned.into_inner().push(result),
    }
}

fn into_results<R>(results: Arc<Mutex<Vec<R>>>) -> Result<Vec<R>> {
    let mutex = Arc::try_unwrap(results)
        .map_err(|_| anyhow::anyhow!("Failed to collect results: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Apply complete!", "✓".green().bold());
    } else {
        println!("  {} Apply finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", ui::count(summary.created, "variable"));
    }
    if summary.modified > 0 {
        println!("    • {} updated", ui::count(summary.modified, "variable"));
    }
    if summary.replaced > 0 {
        println!("    • {} replaced", ui::count(summary.replaced, "variable"));
    }
    if summary.removed > 0 {
        println!("    • {} destroyed", ui::count(summary.removed, "variable"));
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", ui::count(summary.skipped, "variable"));
    }
    if summary.failed > 0 {
        println!(
            "    • {} {}",
            ui::count(summary.failed, "variable"),
            "failed".red()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::planner::{Target, plan_apply};
    use crate::schema::ModvarConfig;
    use tempfile::TempDir;
    use varstore::{MockStore, Operation};

    const CONFIG: &str = r#"
[provider]
organization = "acme"

[variables.a]
key = "A"
value = "1"
category = "env"
module_name = "vpc"
module_provider = "aws"

[variables.b]
key = "B"
value = "2"
category = "env"
sensitive = true
module_name = "vpc"
module_provider = "aws"
"#;

    fn setup() -> (ModvarConfig, MockStore, TestVariableResource, TempDir) {
        let store = MockStore::new();
        let resource = TestVariableResource::with_store(Arc::new(store.clone()));
        (
            toml::from_str(CONFIG).unwrap(),
            store,
            resource,
            TempDir::new().unwrap(),
        )
    }

    fn yes() -> ExecuteOptions {
        ExecuteOptions {
            yes: true,
            jobs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_execute_applies_and_persists() {
        let (config, store, resource, dir) = setup();
        let path = dir.path().join("state.toml");
        let mut state = ModvarState::default();

        let plan = plan_apply(&config, &state, &resource, &Target::All).unwrap();
        let summary =
            execute(&plan, &resource, &mut state, &path, &yes(), &CancelToken::new()).unwrap();

        assert_eq!(summary.created, 2);
        assert!(summary.is_success());
        assert_eq!(store.len(), 2);

        let saved = ModvarState::load(&path).unwrap();
        assert_eq!(saved.instances.len(), 2);
        assert_eq!(saved.instance("b").unwrap().readable_value, None);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (config, store, resource, dir) = setup();
        let path = dir.path().join("state.toml");
        let mut state = ModvarState::default();

        let plan = plan_apply(&config, &state, &resource, &Target::All).unwrap();
        let opts = ExecuteOptions {
            dry_run: true,
            ..yes()
        };
        let summary =
            execute(&plan, &resource, &mut state, &path, &opts, &CancelToken::new()).unwrap();

        assert_eq!(summary.skipped, 2);
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_failure_still_saves_successes() {
        let (config, store, resource, dir) = setup();
        let path = dir.path().join("state.toml");
        let mut state = ModvarState::default();

        store.fail_next(Operation::Create, varstore::Error::Rejected("nope".to_string()));
        let plan = plan_apply(&config, &state, &resource, &Target::All).unwrap();
        let opts = ExecuteOptions { jobs: 1, ..yes() };
        let summary =
            execute(&plan, &resource, &mut state, &path, &opts, &CancelToken::new()).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);

        let saved = ModvarState::load(&path).unwrap();
        assert_eq!(saved.instances.len(), 1);
        assert_eq!(saved.failures.len(), 1);
    }

    #[test]
    fn test_cancelled_run_skips_everything() {
        let (config, store, resource, dir) = setup();
        let path = dir.path().join("state.toml");
        let mut state = ModvarState::default();

        let cancel = CancelToken::new();
        cancel.cancel();
        let plan = plan_apply(&config, &state, &resource, &Target::All).unwrap();
        let summary = execute(&plan, &resource, &mut state, &path, &yes(), &cancel).unwrap();

        assert_eq!(summary.skipped, 2);
        assert!(store.is_empty());
        assert!(state.instances.is_empty());
    }

    #[test]
    fn test_run_parallel_collects_everything() {
        let items: Vec<u32> = (0..20).collect();
        let mut doubled = run_parallel(&items, 4, |n| n * 2).unwrap();
        doubled.sort_unstable();
        assert_eq!(doubled, (0..20).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn push_result_handles_poisoned_mutex() {
        let results: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let poisoned = Arc::clone(&results);

        let _ = std::thread::spawn(move || {
            let _guard = poisoned
                .lock()
                .expect("lock should succeed before poisoning");
            panic!("intentional poison");
        })
        .join();

        push_result(&results, 1);

        let collected = into_results(results).expect("poisoned mutex should be recovered");
        assert_eq!(collected, vec![1]);
    }

    #[test]
    fn test_describe_result() {
        assert_eq!(describe_result(&ApplyResult::Removed), "destroyed");
        assert_eq!(
            describe_result(&ApplyResult::Skipped {
                reason: "dry run".to_string()
            }),
            "skipped: dry run"
        );
    }
}
