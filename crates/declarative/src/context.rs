//! Apply context and progress callbacks
//!
//! These let the engine report progress without depending on a specific
//! terminal UI.

use crate::reconciler::Phase;
use crate::report::Entry;

/// Context passed to apply operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    /// Whether to output verbose information
    pub verbose: bool,
    /// Zero-based position of the declaration in the run
    pub index: usize,
}

impl ApplyContext {
    pub fn new(verbose: bool) -> Self {
        Self { verbose, index: 0 }
    }

    pub(crate) fn at(self, index: usize) -> Self {
        Self { index, ..self }
    }
}

/// Progress callback for a reconcile run
///
/// Implement this trait to receive progress updates during a run.
pub trait ProgressCallback {
    /// Called on every state machine transition
    fn on_phase(&mut self, _phase: &Phase) {}

    /// Called before a declaration is probed
    fn on_declaration_start(&mut self, index: usize, total: usize, id: &str);

    /// Called once a declaration has been fully handled
    fn on_declaration_complete(&mut self, index: usize, entry: &Entry);

    /// Called before post-apply actions run
    fn on_flush_start(&mut self, _pending: usize) {}
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_declaration_start(&mut self, _index: usize, _total: usize, _id: &str) {}
    fn on_declaration_complete(&mut self, _index: usize, _entry: &Entry) {}
}
