//! `onboard plan` - probe the host and show what a run would change

use anyhow::Result;
use declarative::{DeclarationKind, compute_diffs};

use crate::Context;
use crate::cli::TargetArgs;
use crate::engine::{Services, differ, planner};
use crate::ui;

pub fn run(ctx: &Context, args: &TargetArgs) -> Result<u8> {
    let (path, config) = super::load(ctx)?;
    let services = Services::system(&config.settings);
    let plan = planner::build(&config, &services, args.only.as_deref())?;

    if !ctx.quiet {
        ui::header("Onboard Plan");
        ui::kv("Declarations", &path.display().to_string());
        ui::kv("Planned", &ui::plural(plan.len(), "declaration"));
    }

    let diffs = compute_diffs(&plan.declarations);
    differ::display_diff(&diffs);

    let manual: Vec<&str> = plan
        .declarations
        .iter()
        .filter(|d| d.kind() == DeclarationKind::ManualStep)
        .filter_map(|d| d.reminder())
        .collect();
    if !manual.is_empty() {
        ui::section("Manual steps");
        for step in &manual {
            println!("  • {step}");
        }
    }

    Ok(0)
}
