//! `onboard check` - validate the declaration file without touching the host

use anyhow::Result;
use declarative::{EXIT_FAILED, EXIT_INTERNAL, EXIT_OK};

use crate::Context;
use crate::engine::{Services, planner};
use crate::ui;

pub fn run(ctx: &Context) -> Result<u8> {
    let (path, config) = match super::load(ctx) {
        Ok(loaded) => loaded,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            return Ok(EXIT_INTERNAL);
        }
    };

    let services = Services::offline(&config.settings);
    let plan = planner::build(&config, &services, None)?;

    if !ctx.quiet {
        ui::header("Onboard Check");
        ui::kv("File", &path.display().to_string());
        ui::kv("Declarations", &plan.len().to_string());
        ui::kv("Actions", &config.actions.len().to_string());
    }

    for name in config.unused_actions() {
        ui::warn(&format!("Action '{name}' is never triggered"));
    }

    let rejected: Vec<_> = plan.rejected().collect();
    if !rejected.is_empty() {
        for declaration in &rejected {
            ui::error(&format!(
                "{} ({}): {}",
                declaration.id(),
                declaration.resource_type(),
                declaration.rejection().unwrap_or_default()
            ));
        }
        ui::warn(&format!(
            "{} would fail on every run",
            ui::plural(rejected.len(), "declaration")
        ));
        return Ok(EXIT_FAILED);
    }

    ui::success(&format!("{} is valid", path.display()));
    Ok(EXIT_OK)
}
