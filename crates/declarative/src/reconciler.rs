//! Reconciler - drives probe → apply → actions/reminders over an ordered list
//!
//! The run is a small state machine:
//!
//! ```text
//! Idle → Probing(i) → (Skipping(i) | Applying(i)) → Probing(i+1) → … → Flushing → Reporting → Done
//! ```
//!
//! A failing declaration never stops the loop; it is recorded and the next
//! one is probed. An interrupt stops before the next probe, but actions that
//! were already collected still flush and the report is still produced.

use crate::actions::{ActionCollector, ActionRegistry, FlushMode};
use crate::applier::{Applier, DryRunApplier, LiveApplier};
use crate::context::{ApplyContext, ProgressCallback};
use crate::declaration::{BoxedDeclaration, Declaration};
use crate::manual::ManualStepSink;
use crate::report::{Entry, EntryStatus, RunReport};
use crate::types::{ApplyOutcome, DeclarationKind, FailureKind, ProbeState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Reconciler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Probing(usize),
    Skipping(usize),
    Applying(usize),
    Flushing,
    Reporting,
    Done,
}

impl Phase {
    /// Whether `next` is a legal successor of this phase
    pub fn can_advance_to(&self, next: &Phase) -> bool {
        match (self, next) {
            (Self::Idle, Self::Probing(0) | Self::Flushing) => true,
            (Self::Probing(i), Self::Skipping(j) | Self::Applying(j)) => i == j,
            (Self::Skipping(i) | Self::Applying(i), Self::Probing(j)) => *j == i + 1,
            (Self::Skipping(_) | Self::Applying(_), Self::Flushing) => true,
            (Self::Flushing, Self::Reporting) | (Self::Reporting, Self::Done) => true,
            _ => false,
        }
    }
}

/// Options for a reconcile run
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Probe only; report what would change
    pub dry_run: bool,
    /// Suppress disruptive post-apply actions
    pub tame: bool,
    /// Verbose output
    pub verbose: bool,
}

/// Owns the declarations of a run and reconciles them in order
pub struct Reconciler {
    declarations: Vec<BoxedDeclaration>,
    actions: ActionRegistry,
    options: ReconcileOptions,
    cancel: Option<Arc<AtomicBool>>,
}

/// Per-run mutable state, owned by a single `run_with` call
struct RunState {
    phase: Phase,
    collector: ActionCollector,
    sink: ManualStepSink,
}

impl Reconciler {
    pub fn new(
        declarations: Vec<BoxedDeclaration>,
        actions: ActionRegistry,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            declarations,
            actions,
            options,
            cancel: None,
        }
    }

    /// Stop before the next declaration once `flag` is set
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn declarations(&self) -> &[BoxedDeclaration] {
        &self.declarations
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Run with the applier selected by the options
    pub fn run<P: ProgressCallback>(&self, progress: &mut P) -> RunReport {
        if self.options.dry_run {
            self.run_with(&DryRunApplier, progress)
        } else {
            self.run_with(&LiveApplier, progress)
        }
    }

    /// Run with an explicit applier
    pub fn run_with<A: Applier, P: ProgressCallback>(
        &self,
        applier: &A,
        progress: &mut P,
    ) -> RunReport {
        let mut report = RunReport {
            dry_run: self.options.dry_run,
            tame: self.options.tame,
            ..Default::default()
        };
        let mut state = RunState {
            phase: Phase::Idle,
            collector: ActionCollector::new(),
            sink: ManualStepSink::new(),
        };
        progress.on_phase(&state.phase);

        let ctx = ApplyContext::new(self.options.verbose);
        let total = self.declarations.len();

        for (index, declaration) in self.declarations.iter().enumerate() {
            if self.is_cancelled() {
                log::warn!(
                    "Interrupted: stopping before {} of {} declarations",
                    index + 1,
                    total
                );
                report.interrupted = true;
                break;
            }

            advance(&mut state.phase, Phase::Probing(index), progress);
            let id = declaration.id();
            progress.on_declaration_start(index, total, &id);

            let status = self.reconcile_one(
                declaration.as_ref(),
                applier,
                &ctx.at(index),
                &mut state,
                progress,
            );

            let entry = Entry {
                index,
                id,
                resource_type: declaration.resource_type().to_string(),
                status,
            };
            report.add_entry(&entry);
            progress.on_declaration_complete(index, &entry);
        }

        advance(&mut state.phase, Phase::Flushing, progress);
        progress.on_flush_start(state.collector.len());
        report.actions = state.collector.flush(FlushMode {
            execute: applier.executes_actions(),
            suppress_disruptive: self.options.tame,
        });

        advance(&mut state.phase, Phase::Reporting, progress);
        report.manual_steps = state.sink.drain();

        advance(&mut state.phase, Phase::Done, progress);
        report
    }

    fn reconcile_one<A: Applier, P: ProgressCallback>(
        &self,
        declaration: &dyn Declaration,
        applier: &A,
        ctx: &ApplyContext,
        state: &mut RunState,
        progress: &mut P,
    ) -> EntryStatus {
        let index = ctx.index;

        if declaration.kind() == DeclarationKind::ManualStep {
            let text = declaration
                .reminder()
                .map_or_else(|| declaration.description(), str::to_string);
            state.sink.record(text);
            advance(&mut state.phase, Phase::Skipping(index), progress);
            return EntryStatus::Manual;
        }

        if let Some(reason) = declaration.rejection() {
            advance(&mut state.phase, Phase::Applying(index), progress);
            return EntryStatus::Failed {
                kind: FailureKind::Permanent,
                error: reason.to_string(),
            };
        }

        let current = match declaration.probe() {
            Ok(current) => current,
            Err(e) => ProbeState::unknown(format!("{e:#}")),
        };

        if let ProbeState::Unknown { reason } = &current {
            log::warn!("Skipping {}: state unknown ({})", declaration.id(), reason);
            advance(&mut state.phase, Phase::Skipping(index), progress);
            return EntryStatus::Skipped {
                reason: reason.clone(),
            };
        }

        if !current.needs_apply() {
            log::debug!("{} already satisfied", declaration.id());
            advance(&mut state.phase, Phase::Skipping(index), progress);
            return EntryStatus::Unchanged;
        }

        advance(&mut state.phase, Phase::Applying(index), progress);
        log::debug!("Applying {} ({:?})", declaration.id(), current);

        match applier.apply(declaration, &current, ctx) {
            Ok(outcome) => {
                if outcome.is_change() {
                    self.on_change(declaration, state);
                }
                match outcome {
                    ApplyOutcome::Changed => EntryStatus::Changed,
                    ApplyOutcome::WouldChange => EntryStatus::WouldChange,
                    ApplyOutcome::Unchanged => EntryStatus::Unchanged,
                }
            }
            Err(e) => {
                log::debug!("{} failed ({}): {}", declaration.id(), e.kind(), e);
                EntryStatus::Failed {
                    kind: e.kind(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Enqueue the triggered action and record the declaration's note
    fn on_change(&self, declaration: &dyn Declaration, state: &mut RunState) {
        if let Some(name) = declaration.triggers() {
            match self.actions.get(name) {
                Some(action) => {
                    if state.collector.enqueue(action.clone()) {
                        log::debug!("Queued action {} (from {})", name, declaration.id());
                    }
                }
                None => log::warn!(
                    "{} triggers unknown action {}; ignoring",
                    declaration.id(),
                    name
                ),
            }
        }

        if let Some(note) = declaration.reminder() {
            state.sink.record(note);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

fn advance<P: ProgressCallback>(phase: &mut Phase, next: Phase, progress: &mut P) {
    debug_assert!(
        phase.can_advance_to(&next),
        "illegal transition {phase:?} -> {next:?}"
    );
    log::trace!("{:?} -> {:?}", phase, next);
    *phase = next;
    progress.on_phase(phase);
}
