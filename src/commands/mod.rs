pub mod apply;
pub mod plan;
pub mod refresh;
pub mod schema;
pub mod show;
pub mod validate;

use anyhow::{Context as AnyhowContext, Result};
use std::path::PathBuf;
use testvar::{ProviderHandle, TestVariableResource};

use crate::Context;
use crate::paths;
use crate::schema::ModvarConfig;
use crate::state::ModvarState;

/// Load the config file named by `--config` or the default location
pub fn load_config(ctx: &Context) -> Result<ModvarConfig> {
    let path = paths::config_file(ctx.config.as_deref())?;
    ModvarConfig::load(&path)
}

pub fn state_path(ctx: &Context) -> Result<PathBuf> {
    paths::state_file(ctx.state.as_deref())
}

/// Load the state file and return it with its path
pub fn load_state(ctx: &Context) -> Result<(ModvarState, PathBuf)> {
    let path = state_path(ctx)?;
    let state = ModvarState::load(&path)?;
    Ok((state, path))
}

/// A resource that can only plan
pub fn offline_resource() -> Result<TestVariableResource> {
    let mut resource = TestVariableResource::new();
    resource.configure(None)?;
    Ok(resource)
}

/// A resource wired to the service named in `[provider]`
pub fn connect(config: &ModvarConfig) -> Result<TestVariableResource> {
    let settings = config.provider.client_settings()?;
    let client = varstore::Client::new(&settings);
    log::debug!("Connecting to {}", client.hostname());

    let mut resource = TestVariableResource::new();
    resource
        .configure(Some(&client as &dyn ProviderHandle))
        .context("Provider client cannot manage test variables")?;
    Ok(resource)
}
