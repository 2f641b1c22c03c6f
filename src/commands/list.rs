//! `onboard list` - show the declaration table without touching the host

use anyhow::Result;
use colored::Colorize;
use declarative::{BoxedDeclaration, Declaration, DeclarationKind};
use std::collections::BTreeMap;

use crate::Context;
use crate::cli::TargetArgs;
use crate::engine::{Services, differ, planner};
use crate::schema::OnboardConfig;
use crate::ui;

pub fn run(ctx: &Context, args: &TargetArgs) -> Result<u8> {
    let (path, config) = super::load(ctx)?;
    let services = Services::offline(&config.settings);
    let plan = planner::build(&config, &services, args.only.as_deref())?;

    if !ctx.quiet {
        ui::header("Onboard Declarations");
        ui::kv("File", &path.display().to_string());
    }

    if plan.is_empty() {
        ui::warn("No declarations match");
        return Ok(0);
    }

    for (resource_type, declarations) in group(&plan.declarations) {
        ui::section(differ::type_name(resource_type));
        for declaration in declarations {
            println!("  {}", row(declaration.as_ref()));
        }
    }

    if args.only.is_none() && !config.actions.is_empty() {
        print_actions(&config);
    }

    println!();
    println!(
        "  {} ({} rejected)",
        ui::plural(plan.len(), "declaration"),
        plan.rejected().count()
    );
    Ok(0)
}

/// Declarations grouped by resource type, keeping file order within a group
fn group(declarations: &[BoxedDeclaration]) -> BTreeMap<&'static str, Vec<&BoxedDeclaration>> {
    let mut groups: BTreeMap<&'static str, Vec<&BoxedDeclaration>> = BTreeMap::new();
    for declaration in declarations {
        groups
            .entry(declaration.resource_type())
            .or_default()
            .push(declaration);
    }
    groups
}

fn row(declaration: &dyn Declaration) -> String {
    if let Some(reason) = declaration.rejection() {
        return format!(
            "{} {:<36} {}",
            "✗".red(),
            declaration.id().red(),
            reason.red()
        );
    }

    if declaration.kind() == DeclarationKind::ManualStep {
        return format!("{} {}", "•".cyan(), declaration.id());
    }

    let mut line = format!(
        "{} {:<36} {}",
        "•".dimmed(),
        declaration.id(),
        declaration.description().dimmed()
    );
    if let Some(action) = declaration.triggers() {
        line.push_str(&format!(" → {action}").cyan().to_string());
    }
    if let Some(note) = declaration.reminder() {
        line.push_str(&format!("  ({note})").dimmed().to_string());
    }
    line
}

fn print_actions(config: &OnboardConfig) {
    ui::section("Actions");
    let unused = config.unused_actions();
    for (name, action) in &config.actions {
        let mut flags = Vec::new();
        if action.is_disruptive() {
            flags.push("disruptive");
        }
        if unused.contains(&name.as_str()) {
            flags.push("unused");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("[{}]", flags.join(", "))
        };
        println!(
            "  {:<24} {:<36} {}",
            name.bold(),
            action.summary(),
            flags.yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ManualStep, Rejected};

    #[test]
    fn test_group_keeps_file_order() {
        let declarations: Vec<BoxedDeclaration> = vec![
            Box::new(ManualStep::new("Sign in to iCloud")),
            Box::new(Rejected::new(
                "jq; rm",
                "brew_formula",
                DeclarationKind::Package,
                "invalid name",
            )),
            Box::new(ManualStep::new("Enable FileVault")),
        ];

        let groups = group(&declarations);
        assert_eq!(groups.len(), 2);
        let manual: Vec<String> = groups["manual_step"].iter().map(|d| d.id()).collect();
        assert_eq!(manual, vec!["Sign in to iCloud", "Enable FileVault"]);
    }

    #[test]
    fn test_rejected_row_shows_reason() {
        colored::control::set_override(false);
        let rejected = Rejected::new(
            "64",
            "symbolic_hotkey",
            DeclarationKind::PreferenceKey,
            "unknown modifier: hyper",
        );
        assert!(row(&rejected).contains("unknown modifier: hyper"));
    }
}
