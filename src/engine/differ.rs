//! Plan display

use colored::{ColoredString, Colorize};
use declarative::{Action, AttributeChange, DiffSummary};

use super::planner::{ExecutionPlan, InstancePlan};

/// Colored plan symbol for an action
pub fn action_symbol(action: Action) -> ColoredString {
    let symbol = action.symbol();
    match action {
        Action::Create => symbol.green(),
        Action::Update => symbol.yellow(),
        Action::Replace => symbol.magenta(),
        Action::Delete => symbol.red(),
        Action::NoOp => symbol.dimmed(),
    }
}

/// One attribute line, e.g. `key: "A" → "B"  # forces replacement`
pub fn format_change(change: &AttributeChange) -> String {
    let line = format!("{}: {}", change.name, change.render());
    if change.forces_replacement {
        format!("{line}  # forces replacement")
    } else {
        line
    }
}

/// `2 to add, 1 to change, 0 to replace, 1 to destroy`
pub fn format_summary(summary: &DiffSummary) -> String {
    format!(
        "{} to add, {} to change, {} to replace, {} to destroy",
        summary.additions, summary.changes, summary.replacements, summary.removals
    )
}

/// Display the plan in a user-friendly format
pub fn display_plan(plan: &ExecutionPlan) {
    if !plan.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");

    for instance in plan.changes() {
        display_instance(instance);
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!("│ Plan: {}", format_summary(&plan.summary()).bold());
    println!("└─────────────────────────────────────────────────────┘");
}

fn display_instance(instance: &InstancePlan) {
    let change = &instance.change;
    println!(
        "│ {} {} {}",
        action_symbol(change.action),
        instance.address().bold(),
        change.action.to_string().dimmed()
    );

    for reason in &change.replace_reasons {
        println!("│     {} {}", "#".dimmed(), reason.dimmed());
    }

    for attribute in &change.changes {
        let line = format_change(attribute);
        if attribute.forces_replacement {
            println!("│     {}", line.red());
        } else {
            println!("│     {line}");
        }
    }
}
