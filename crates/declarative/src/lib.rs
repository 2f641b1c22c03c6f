//! # Declarative
//!
//! Probe, converge and report on a list of host declarations.
//!
//! ## Core Concepts
//!
//! - **Declaration**: One unit of desired state (a package, a preference key,
//!   a manual step) that can probe the host and converge it
//! - **ProbeState**: What a probe found: present, absent, modified or unknown
//! - **Reconciler**: Walks declarations in order, collects failures instead of
//!   stopping, and runs each triggered action once at the end
//! - **RunReport**: Counts, failures by kind, actions and manual steps
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ActionRegistry, NoProgress, ReconcileOptions, Reconciler};
//!
//! let reconciler = Reconciler::new(declarations, ActionRegistry::new(), ReconcileOptions {
//!     dry_run: true,
//!     ..Default::default()
//! });
//! let report = reconciler.run(&mut NoProgress);
//! std::process::exit(report.exit_code().into());
//! ```
//!
//! ## Seams
//!
//! - [`Applier`]: live vs. dry-run apply, chosen once per run
//! - [`ProgressCallback`]: receives phase and per-declaration progress
//!
//! The crate has no knowledge of Homebrew or the preference store; those
//! live behind [`Declaration`] implementations in the binary.

pub mod actions;
pub mod applier;
pub mod context;
pub mod declaration;
pub mod diff;
pub mod error;
pub mod manual;
pub mod reconciler;
pub mod report;
pub mod types;

// Re-export main types at crate root
pub use actions::{ActionCollector, ActionOutcome, ActionRef, ActionRegistry, ActionStatus, FlushMode};
pub use applier::{Applier, DryRunApplier, LiveApplier};
pub use context::{ApplyContext, NoProgress, ProgressCallback};
pub use declaration::{BoxedDeclaration, Declaration};
pub use diff::{DeclarationDiff, DiffSummary, compute_diffs, group_by_type};
pub use error::ApplyError;
pub use manual::ManualStepSink;
pub use reconciler::{Phase, ReconcileOptions, Reconciler};
pub use report::{
    EXIT_FAILED, EXIT_INTERNAL, EXIT_INTERRUPTED, EXIT_OK, Entry, EntryStatus, FailedEntry,
    RunReport, SkippedEntry,
};
pub use types::{ApplyOutcome, DeclarationKind, FailureKind, ProbeState};
