//! `modvar plan` - show what apply would change

use anyhow::Result;

use crate::Context;
use crate::engine::differ::display_plan;
use crate::engine::{Target, plan_apply};
use crate::ui;

use super::{load_config, load_state, offline_resource};

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let target = Target::parse(target)?;
    let config = load_config(ctx)?;
    config.validate()?;
    let (state, _) = load_state(ctx)?;

    let plan = plan_apply(&config, &state, &offline_resource()?, &target)?;
    display_plan(&plan);

    if plan.has_changes() && !ctx.quiet {
        println!();
        ui::dim("Run `modvar apply` to make these changes.");
    }
    Ok(())
}
