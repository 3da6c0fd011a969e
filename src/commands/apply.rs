//! `modvar apply` and `modvar destroy`

use anyhow::{Result, bail};
use declarative::ExecuteSummary;
use std::path::Path;

use crate::Context;
use crate::engine::{ExecuteOptions, ExecutionPlan, Target, execute, plan_apply, plan_destroy};
use crate::schema::ModvarConfig;
use crate::state::ModvarState;
use crate::ui;

use super::{connect, load_config, load_state, offline_resource};

pub fn run(
    ctx: &Context,
    target: Option<&str>,
    yes: bool,
    dry_run: bool,
    jobs: usize,
) -> Result<()> {
    ui::header("Applying Configuration");

    if dry_run {
        ui::warn("Dry run - no changes will be made");
    }

    let target = Target::parse(target)?;
    let config = load_config(ctx)?;
    config.validate()?;
    let (state, state_path) = load_state(ctx)?;

    let plan = plan_apply(&config, &state, &offline_resource()?, &target)?;
    let opts = ExecuteOptions {
        dry_run,
        jobs,
        yes,
        verbose: ctx.verbose > 0,
    };
    run_plan(ctx, &config, &plan, state, &state_path, &opts)
}

pub fn destroy(ctx: &Context, target: Option<&str>, yes: bool, jobs: usize) -> Result<()> {
    ui::header("Destroying Variables");

    let target = Target::parse(target)?;
    let config = load_config(ctx)?;
    let (state, state_path) = load_state(ctx)?;

    if state.instances.is_empty() {
        ui::info("No variables recorded in state");
        return Ok(());
    }

    let plan = plan_destroy(&state, &offline_resource()?, &target)?;
    let opts = ExecuteOptions {
        dry_run: false,
        jobs,
        yes,
        verbose: ctx.verbose > 0,
    };
    run_plan(ctx, &config, &plan, state, &state_path, &opts)
}

/// Connect only when the plan has work for the store
fn run_plan(
    ctx: &Context,
    config: &ModvarConfig,
    plan: &ExecutionPlan,
    mut state: ModvarState,
    state_path: &Path,
    opts: &ExecuteOptions,
) -> Result<()> {
    let resource = if plan.has_changes() && !opts.dry_run {
        connect(config)?
    } else {
        offline_resource()?
    };

    let summary = execute(plan, &resource, &mut state, state_path, opts, &ctx.cancel)?;
    check(&summary)
}

fn check(summary: &ExecuteSummary) -> Result<()> {
    if !summary.is_success() {
        bail!("{} failed", ui::count(summary.failed, "variable"));
    }
    Ok(())
}
