//! `modvar refresh` - re-read recorded variables from the service

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::ApplyContext;
use testvar::{ErrorKind, ObservedState};

use crate::Context;
use crate::engine::planner::address;
use crate::engine::{Target, run_parallel};
use crate::ui;

use super::{connect, load_config, load_state};

/// What a read told us about one instance
enum Refreshed {
    Unchanged,
    Drifted(ObservedState),
    Gone,
    Skipped(String),
    Failed(String),
}

pub fn run(ctx: &Context, target: Option<&str>, jobs: usize) -> Result<()> {
    ui::header("Refreshing State");

    let target = Target::parse(target)?;
    let config = load_config(ctx)?;
    let (mut state, state_path) = load_state(ctx)?;

    let recorded: Vec<(String, ObservedState)> = state
        .instances
        .iter()
        .filter(|(name, _)| target.matches(name))
        .map(|(name, prior)| (name.clone(), prior.clone()))
        .collect();

    if recorded.is_empty() {
        ui::info("No matching variables recorded in state");
        return Ok(());
    }

    let resource = connect(&config)?;
    let apply_ctx = ApplyContext::with_cancel(false, ctx.verbose > 0, ctx.cancel.clone());

    let mut results = run_parallel(&recorded, jobs, |(name, prior)| {
        let refreshed = match resource.read(&apply_ctx, prior) {
            Ok(Some(current)) if current == *prior => Refreshed::Unchanged,
            Ok(Some(current)) => Refreshed::Drifted(current),
            Ok(None) => Refreshed::Gone,
            Err(e) if e.kind() == ErrorKind::Cancelled => Refreshed::Skipped(e.to_string()),
            Err(e) => Refreshed::Failed(e.to_string()),
        };
        (name.clone(), refreshed)
    })?;
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut failed = 0;
    for (name, refreshed) in results {
        let address = address(&name);
        match refreshed {
            Refreshed::Unchanged => {
                if !ctx.quiet {
                    println!("  {} {} {}", "○".dimmed(), address, "unchanged".dimmed());
                }
            }
            Refreshed::Drifted(current) => {
                println!("  {} {} {}", "~".yellow(), address, "changed remotely".dimmed());
                state.instances.insert(name, current);
            }
            Refreshed::Gone => {
                println!("  {} {} {}", "-".red(), address, "no longer exists".dimmed());
                state.instances.remove(&name);
                state.failures.remove(&name);
            }
            Refreshed::Skipped(reason) => {
                println!("  {} {} {}", "⊘".yellow(), address, reason.dimmed());
            }
            Refreshed::Failed(error) => {
                failed += 1;
                println!("  {} {} {}", "✗".red(), address, error);
            }
        }
    }

    state
        .touch(&state_path)
        .context("Failed to save state after refresh")?;

    if failed > 0 {
        bail!("{} could not be refreshed", ui::count(failed, "variable"));
    }
    ui::success("State refreshed");
    Ok(())
}
