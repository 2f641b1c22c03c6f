//! Plan display - what a run would change, grouped by type

use colored::Colorize;
use declarative::{DeclarationDiff, DiffSummary, ProbeState, group_by_type};

/// Section heading for a resource type
pub fn type_name(resource_type: &str) -> &str {
    match resource_type {
        "brew_formula" => "Packages (brew formulae)",
        "brew_cask" => "Packages (brew casks)",
        "brew_tap" => "Packages (brew taps)",
        "macos_default" => "Defaults (macOS)",
        "symbolic_hotkey" => "Hot keys",
        "app_shortcut" => "Menu shortcuts",
        other => other,
    }
}

/// One-line description of the pending change
pub fn state_desc(diff: &DeclarationDiff) -> String {
    match &diff.current {
        ProbeState::Absent if diff.resource_type.starts_with("brew") => {
            "(not installed)".to_string()
        }
        ProbeState::Absent => "(not set)".to_string(),
        ProbeState::Modified { from, to } => format!("{from} → {to}"),
        ProbeState::Unknown { reason } => format!("(unknown: {reason})"),
        ProbeState::Present { .. } => String::new(),
    }
}

/// Display a list of diffs in a user-friendly format
pub fn display_diff(diffs: &[DeclarationDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Pending Changes".bold()
    );
    println!("│");

    for (resource_type, type_diffs) in group_by_type(diffs) {
        println!("│ {}", type_name(resource_type).bold());

        for diff in type_diffs {
            let symbol = match &diff.current {
                ProbeState::Absent => "+".green(),
                ProbeState::Modified { .. } => "~".yellow(),
                _ => "?".dimmed(),
            };
            let action = diff
                .triggers
                .as_ref()
                .map(|a| format!(" → {a}").cyan().to_string())
                .unwrap_or_default();

            println!(
                "│   {} {:<36} {}{}",
                symbol,
                diff.id,
                state_desc(diff).dimmed(),
                action
            );
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} new, {} modified, {} unknown)",
        summary.total().to_string().bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.unknown.to_string().dimmed()
    );
    println!("└─────────────────────────────────────────────────────┘");
}
