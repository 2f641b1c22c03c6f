//! Declarations that failed validation at load time
//!
//! A rejected declaration keeps its place in the run so the problem shows up
//! in the report as a permanent failure, while the other declarations still
//! apply.

use anyhow::Result;
use declarative::{
    ApplyContext, ApplyError, ApplyOutcome, Declaration, DeclarationKind, ProbeState,
};

#[derive(Debug, Clone)]
pub struct Rejected {
    pub id: String,
    pub resource_type: &'static str,
    pub kind: DeclarationKind,
    pub reason: String,
}

impl Rejected {
    pub fn new(
        id: impl Into<String>,
        resource_type: &'static str,
        kind: DeclarationKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            resource_type,
            kind,
            reason: reason.into(),
        }
    }
}

impl Declaration for Rejected {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn description(&self) -> String {
        format!("Invalid {}: {}", self.resource_type, self.reason)
    }

    fn kind(&self) -> DeclarationKind {
        self.kind
    }

    fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    fn probe(&self) -> Result<ProbeState> {
        Ok(ProbeState::unknown(self.reason.clone()))
    }

    fn apply(&self, _current: &ProbeState, _ctx: &ApplyContext) -> Result<ApplyOutcome, ApplyError> {
        Err(ApplyError::permanent(self.reason.clone()))
    }

    fn rejection(&self) -> Option<&str> {
        Some(&self.reason)
    }
}
