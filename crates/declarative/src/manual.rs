//! Operator reminders collected during a run

/// Ordered list of steps the operator has to perform by hand.
///
/// Repeated entries are kept: two declarations may produce similar text in
/// different contexts.
#[derive(Debug, Clone, Default)]
pub struct ManualStepSink {
    steps: Vec<String>,
}

impl ManualStepSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, text: impl Into<String>) {
        self.steps.push(text.into());
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Take all recorded steps in record order
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.steps)
    }
}
