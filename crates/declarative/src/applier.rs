//! Applier variants
//!
//! The reconciler never checks a dry-run flag inside declarations. It is
//! handed one of these instead, selected from the run options.

use crate::context::ApplyContext;
use crate::declaration::Declaration;
use crate::error::ApplyError;
use crate::types::{ApplyOutcome, ProbeState};

/// Strategy for turning a pending declaration into an outcome
pub trait Applier {
    fn apply(
        &self,
        declaration: &dyn Declaration,
        current: &ProbeState,
        ctx: &ApplyContext,
    ) -> Result<ApplyOutcome, ApplyError>;

    /// Whether post-apply actions really execute under this applier
    fn executes_actions(&self) -> bool;
}

/// Performs the declaration's mutating call
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveApplier;

impl Applier for LiveApplier {
    fn apply(
        &self,
        declaration: &dyn Declaration,
        current: &ProbeState,
        ctx: &ApplyContext,
    ) -> Result<ApplyOutcome, ApplyError> {
        declaration.apply(current, ctx)
    }

    fn executes_actions(&self) -> bool {
        true
    }
}

/// Reports what would change without touching the host
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunApplier;

impl Applier for DryRunApplier {
    fn apply(
        &self,
        declaration: &dyn Declaration,
        current: &ProbeState,
        _ctx: &ApplyContext,
    ) -> Result<ApplyOutcome, ApplyError> {
        log::debug!(
            "dry run: would apply {} ({:?})",
            declaration.id(),
            current
        );
        Ok(ApplyOutcome::WouldChange)
    }

    fn executes_actions(&self) -> bool {
        false
    }
}
