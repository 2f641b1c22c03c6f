//! Execution - runs the reconciler with terminal progress and prints the report

use anyhow::Result;
use chrono::{DateTime, Local};
use colored::Colorize;
use declarative::{
    ActionStatus, Entry, EntryStatus, FailedEntry, ProgressCallback, ReconcileOptions, Reconciler,
    RunReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use super::planner::Plan;

/// Options for a run
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Probe only, report what would change
    pub dry_run: bool,
    /// Skip disruptive actions
    pub tame: bool,
    /// Print every declaration, not only failures
    pub verbose: bool,
    /// Hide the progress bar
    pub hide_progress: bool,
}

/// Progress bar over the declarations of a run
pub struct TerminalProgress {
    pb: ProgressBar,
    verbose: bool,
}

impl TerminalProgress {
    pub fn new(total: usize, hidden: bool, verbose: bool) -> Self {
        let pb = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { pb, verbose }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_declaration_start(&mut self, _index: usize, _total: usize, id: &str) {
        self.pb.set_message(id.to_string());
    }

    fn on_declaration_complete(&mut self, _index: usize, entry: &Entry) {
        self.pb.inc(1);
        let noteworthy = matches!(entry.status, EntryStatus::Failed { .. });
        if self.verbose || noteworthy {
            let line = entry_line(entry);
            self.pb.suspend(|| println!("  {line}"));
        }
    }

    fn on_flush_start(&mut self, pending: usize) {
        if pending > 0 {
            self.pb.set_message(format!("running {pending} action(s)"));
        }
    }
}

/// Status symbol for a report entry
pub fn symbol(status: &EntryStatus) -> &'static str {
    match status {
        EntryStatus::Changed => "✓",
        EntryStatus::WouldChange => "~",
        EntryStatus::Unchanged => "○",
        EntryStatus::Skipped { .. } => "⊘",
        EntryStatus::Failed { .. } => "✗",
        EntryStatus::Manual => "•",
    }
}

fn entry_line(entry: &Entry) -> String {
    let sym = symbol(&entry.status);
    match &entry.status {
        EntryStatus::Changed => format!("{} {}", sym.green(), entry.id),
        EntryStatus::WouldChange => format!("{} {} {}", sym.yellow(), entry.id, "(would change)".dimmed()),
        EntryStatus::Unchanged => format!("{} {}", sym.dimmed(), entry.id.dimmed()),
        EntryStatus::Skipped { reason } => {
            format!("{} {} {}", sym.yellow(), entry.id, format!("({reason})").dimmed())
        }
        EntryStatus::Failed { kind, error } => {
            format!("{} {} {} {}", sym.red(), entry.id, format!("[{kind}]").red(), error)
        }
        EntryStatus::Manual => format!("{} {}", sym.cyan(), entry.id),
    }
}

/// Run the plan
pub fn execute(plan: Plan, opts: &ExecuteOptions, cancel: Arc<AtomicBool>) -> RunReport {
    let total = plan.len();
    let reconciler = Reconciler::new(
        plan.declarations,
        plan.actions,
        ReconcileOptions {
            dry_run: opts.dry_run,
            tame: opts.tame,
            verbose: opts.verbose,
        },
    )
    .with_cancel(cancel);

    let mut progress = TerminalProgress::new(total, opts.hide_progress, opts.verbose);
    let report = reconciler.run(&mut progress);
    progress.finish();
    report
}

/// Machine-readable report
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub finished_at: DateTime<Local>,
    pub exit_code: u8,
    #[serde(flatten)]
    pub report: &'a RunReport,
}

impl<'a> JsonReport<'a> {
    pub fn new(report: &'a RunReport) -> Self {
        Self {
            finished_at: Local::now(),
            exit_code: report.exit_code(),
            report,
        }
    }
}

pub fn print_json(report: &RunReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&JsonReport::new(report))?);
    Ok(())
}

/// Print the human-readable report: counts, failures, actions, then the
/// manual checklist
pub fn print_report(report: &RunReport) {
    println!();
    let mode = if report.dry_run { " (dry run)" } else { "" };
    if report.interrupted {
        println!("  {} Interrupted{}", "⚠".yellow().bold(), mode);
    } else if report.is_success() {
        println!("  {} Reconciled{}", "✓".green().bold(), mode);
    } else {
        println!("  {} Reconciled with errors{}", "⚠".yellow().bold(), mode);
    }

    let changed_label = if report.dry_run { "would change" } else { "changed" };
    println!("    • {} {}", report.changed, changed_label);
    println!("    • {} unchanged", report.unchanged);
    if !report.skipped.is_empty() {
        println!("    • {} skipped", report.skipped.len());
    }
    if !report.failed.is_empty() {
        println!("    • {} {}", report.failed.len(), "failed".red());
    }

    let permanent: Vec<_> = report.permanent_failures().collect();
    if !permanent.is_empty() {
        println!();
        println!(
            "  {} {}",
            "Permanent failures".red().bold(),
            "(fix the declaration)".dimmed()
        );
        print_failures(&permanent);
    }

    let transient: Vec<_> = report.transient_failures().collect();
    if !transient.is_empty() {
        println!();
        println!(
            "  {} {}",
            "Transient failures".yellow().bold(),
            "(re-run later)".dimmed()
        );
        print_failures(&transient);
    }

    if !report.skipped.is_empty() {
        println!();
        println!("  {}", "Skipped".yellow().bold());
        for skipped in &report.skipped {
            println!("    {} {} {}", "⊘".yellow(), skipped.id, skipped.reason.dimmed());
        }
    }

    if !report.actions.is_empty() {
        println!();
        println!("  {}", "Actions".cyan().bold());
        for action in &report.actions {
            let status = match &action.status {
                ActionStatus::Ran => format!("{} ran", "✓".green()),
                ActionStatus::WouldRun => format!("{} would run", "~".yellow()),
                ActionStatus::Suppressed => format!("{} suppressed (tame)", "○".dimmed()),
                ActionStatus::Failed { error } => format!("{} {}", "✗".red(), error),
            };
            println!("    {:<24} {}", action.name, status);
        }
    }

    if !report.manual_steps.is_empty() {
        println!();
        println!("  {}", "Manual steps".bold());
        for step in &report.manual_steps {
            println!("{step}");
        }
    }
}

fn print_failures(failures: &[&FailedEntry]) {
    for failure in failures {
        println!(
            "    {} {} {} {}",
            "✗".red(),
            failure.id,
            format!("[{}]", failure.resource_type).dimmed(),
            failure.error
        );
    }
}

/// Confirm with user
pub fn confirm_proceed(pending: usize) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(format!("Apply {pending} declaration(s)?"))
        .default(true)
        .interact()?;

    Ok(confirmed)
}
