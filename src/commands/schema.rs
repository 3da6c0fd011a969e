//! `modvar schema` - print the attribute contract

use anyhow::Result;
use colored::Colorize;
use declarative::AttributeSpec;
use testvar::TestVariableResource;

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let schema = TestVariableResource::new().schema();

    ui::header(&format!(
        "{} (schema version {})",
        schema.type_name, schema.version
    ));

    for attribute in &schema.attributes {
        println!();
        println!("  {} {}", attribute.name.bold(), summarize(attribute).dimmed());
        if !ctx.quiet && !attribute.description.is_empty() {
            ui::dim(&format!("  {}", attribute.description));
        }
    }
    Ok(())
}

/// `(string, required, replace if ...)`
fn summarize(attribute: &AttributeSpec) -> String {
    let mut parts = vec![attribute.attr_type.to_string(), attribute.cardinality.to_string()];
    if let Some(default) = &attribute.default {
        parts.push(format!("default {default}"));
    }
    if attribute.sensitive {
        parts.push("sensitive".to_string());
    }
    parts.push(attribute.mutability.to_string());
    format!("({})", parts.join(", "))
}
