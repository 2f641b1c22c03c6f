//! Apply errors, classified for the run report

use crate::types::FailureKind;
use std::time::Duration;
use thiserror::Error;

/// Error returned by an applier.
///
/// Every variant maps onto exactly one [`FailureKind`] so the reconciler can
/// tell the operator whether to re-run or to edit the declaration.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Retryable on a later run
    #[error("{message}")]
    Transient { message: String },

    /// The declaration is invalid
    #[error("{message}")]
    Permanent { message: String },

    /// The external call did not finish in time
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

impl ApplyError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent {
            message: message.into(),
        }
    }

    /// Failure kind recorded in the report. Timeouts are transient.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transient { .. } | Self::TimedOut(_) => FailureKind::Transient,
            Self::Permanent { .. } => FailureKind::Permanent,
        }
    }
}
