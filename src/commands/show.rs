//! `modvar show` - print recorded state

use anyhow::Result;
use colored::Colorize;
use declarative::{REDACTED, Schema};
use testvar::{ObservedState, TestVariableResource};

use crate::Context;
use crate::engine::Target;
use crate::engine::planner::address;
use crate::ui;

use super::load_state;

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let target = Target::parse(target)?;
    let (state, state_path) = load_state(ctx)?;
    let schema = TestVariableResource::new().schema();

    ui::header("Recorded State");
    ui::kv("file", &state_path.display().to_string());
    ui::kv("last updated", &state.last_updated.to_rfc3339());

    let mut shown = 0;
    for (name, observed) in &state.instances {
        if !target.matches(name) {
            continue;
        }
        shown += 1;

        ui::section(&address(name));
        for (attribute, value) in render_attributes(&schema, observed) {
            ui::kv(attribute, &value);
        }
        if let Some(error) = state.failures.get(name) {
            println!("  {} last apply failed: {}", "✗".red(), error);
        }
    }

    if shown == 0 {
        println!();
        ui::info("No matching variables recorded in state");
    }
    Ok(())
}

/// Attribute rows in contract order, sensitive ones redacted
fn render_attributes(schema: &Schema, observed: &ObservedState) -> Vec<(&'static str, String)> {
    let rows: [(&'static str, Option<String>); 11] = [
        ("id", Some(observed.id.clone())),
        ("key", Some(observed.key.clone())),
        ("value", Some(observed.value.clone())),
        ("category", Some(observed.category.to_string())),
        ("description", Some(observed.description.clone())),
        ("hcl", Some(observed.hcl.to_string())),
        ("sensitive", Some(observed.sensitive.to_string())),
        ("organization", Some(observed.scope.organization.clone())),
        ("module_name", Some(observed.scope.module_name.clone())),
        ("module_provider", Some(observed.scope.module_provider.clone())),
        ("readable_value", observed.readable_value.clone()),
    ];

    rows.into_iter()
        .map(|(attribute, value)| {
            let rendered = match value {
                None => "null".to_string(),
                Some(_) if schema.is_sensitive(attribute) => REDACTED.to_string(),
                Some(v) => format!("{v:?}"),
            };
            (attribute, rendered)
        })
        .collect()
}
