//! Manual steps - things only a human can do

use anyhow::Result;
use declarative::{
    ApplyContext, ApplyError, ApplyOutcome, Declaration, DeclarationKind, ProbeState,
};

/// A checklist entry printed at the end of every run
#[derive(Debug, Clone)]
pub struct ManualStep {
    pub text: String,
}

impl ManualStep {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl Declaration for ManualStep {
    fn id(&self) -> String {
        self.text.clone()
    }

    fn description(&self) -> String {
        format!("Manual: {}", self.text)
    }

    fn kind(&self) -> DeclarationKind {
        DeclarationKind::ManualStep
    }

    fn resource_type(&self) -> &'static str {
        "manual_step"
    }

    fn probe(&self) -> Result<ProbeState> {
        Ok(ProbeState::unknown("manual step"))
    }

    fn apply(&self, _current: &ProbeState, _ctx: &ApplyContext) -> Result<ApplyOutcome, ApplyError> {
        Ok(ApplyOutcome::Unchanged)
    }

    fn reminder(&self) -> Option<&str> {
        Some(&self.text)
    }
}
