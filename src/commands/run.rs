//! `onboard run` - reconcile the host with the declaration file

use anyhow::Result;
use declarative::EXIT_INTERRUPTED;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::Context;
use crate::cli::RunArgs;
use crate::engine::{ExecuteOptions, Services, execute, executor, planner};
use crate::ui;

pub fn run(ctx: &Context, args: &RunArgs, cancel: Arc<AtomicBool>) -> Result<u8> {
    let (path, config) = super::load(ctx)?;
    let services = Services::system(&config.settings);
    let plan = planner::build(&config, &services, args.only.as_deref())?;

    let chatty = !args.json && !ctx.quiet;
    if chatty {
        let title = if args.dry_run {
            "Onboard (dry run)"
        } else {
            "Onboard"
        };
        ui::header(title);
        ui::kv("Declarations", &path.display().to_string());
        ui::kv("Planned", &ui::plural(plan.len(), "declaration"));
        if let Some(only) = &args.only {
            ui::kv("Only", only);
        }
        if args.tame {
            ui::kv("Mode", "tame (disruptive actions skipped)");
        }
    }

    if plan.is_empty() {
        if chatty {
            ui::warn("No declarations match");
        }
        return Ok(0);
    }

    if args.confirm && !args.dry_run && !executor::confirm_proceed(plan.len())? {
        ui::info("Cancelled");
        return Ok(EXIT_INTERRUPTED);
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        tame: args.tame,
        verbose: ctx.verbose > 0,
        hide_progress: args.json || ctx.quiet,
    };
    let report = execute(plan, &opts, cancel);

    if args.json {
        executor::print_json(&report)?;
    } else {
        executor::print_report(&report);
    }

    Ok(report.exit_code())
}
