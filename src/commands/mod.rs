//! Command implementations

pub mod check;
pub mod list;
pub mod plan;
pub mod run;

use anyhow::Result;
use std::path::PathBuf;

use crate::Context;
use crate::config;
use crate::schema::OnboardConfig;

/// Resolve and load the declaration file for a command
pub fn load(ctx: &Context) -> Result<(PathBuf, OnboardConfig)> {
    let path = config::resolve_path(ctx.config.as_deref())?;
    let config = config::load(&path)?;
    Ok((path, config))
}
