//! Core types for declarative host reconciliation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Family a declaration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// Something a package manager installs
    Package,
    /// A key in the host preference store
    PreferenceKey,
    /// A step only a human can perform
    ManualStep,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package => write!(f, "package"),
            Self::PreferenceKey => write!(f, "preference"),
            Self::ManualStep => write!(f, "manual"),
        }
    }
}

/// Current state of a declaration as observed by its probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeState {
    /// Present and already matching the desired state
    Present { details: Option<String> },
    /// Does not exist yet
    Absent,
    /// Exists but differs from desired
    Modified { from: String, to: String },
    /// State cannot be determined (store unreadable, tool missing)
    Unknown { reason: String },
}

impl ProbeState {
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::Unknown {
            reason: reason.into(),
        }
    }

    /// Check if state already matches the desired state
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Check if state represents absence
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Check if the probe could not tell
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// Whether an applier has work to do. `Unknown` never qualifies.
    pub fn needs_apply(&self) -> bool {
        matches!(self, Self::Absent | Self::Modified { .. })
    }
}

/// Successful result of running an applier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// The host was mutated
    Changed,
    /// The host already matched, nothing was done
    Unchanged,
    /// Dry run: the host would have been mutated
    WouldChange,
}

impl ApplyOutcome {
    /// Whether the outcome counts as a change in the report
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed | Self::WouldChange)
    }
}

/// Classification of a failed apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Worth retrying on a later run (network, lock contention, tool missing)
    Transient,
    /// The declaration itself is wrong; retrying without editing it won't help
    Permanent,
}

impl FailureKind {
    /// Short advice shown next to failures of this kind
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transient => "re-run later",
            Self::Permanent => "fix the declaration",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_apply() {
        assert!(ProbeState::Absent.needs_apply());
        assert!(
            ProbeState::Modified {
                from: "bottom".into(),
                to: "left".into()
            }
            .needs_apply()
        );
        assert!(!ProbeState::Present { details: None }.needs_apply());
        assert!(!ProbeState::unknown("defaults missing").needs_apply());
    }

    #[test]
    fn test_outcome_is_change() {
        assert!(ApplyOutcome::Changed.is_change());
        assert!(ApplyOutcome::WouldChange.is_change());
        assert!(!ApplyOutcome::Unchanged.is_change());
    }
}
