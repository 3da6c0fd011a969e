//! `modvar validate` - check the config without contacting the service

use anyhow::{Result, bail};
use colored::Colorize;

use crate::Context;
use crate::engine::planner::address;
use crate::ui;

use super::load_config;

pub fn run(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    config.provider.validate()?;

    let mut invalid = 0;
    for (name, checked) in config.check_variables() {
        match checked {
            Ok(module) => {
                if !ctx.quiet {
                    println!(
                        "  {} {} {}",
                        "✓".green(),
                        address(name),
                        module.to_string().dimmed()
                    );
                }
            }
            Err(e) => {
                invalid += 1;
                println!("  {} {} {}", "✗".red(), address(name), e);
            }
        }
    }

    if invalid > 0 {
        bail!("{} invalid", ui::count(invalid, "variable"));
    }

    ui::success(&format!(
        "Configuration is valid ({})",
        ui::count(config.variables.len(), "variable")
    ));
    Ok(())
}
