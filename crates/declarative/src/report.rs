//! Run report and per-declaration entries

use crate::actions::{ActionOutcome, ActionStatus};
use crate::types::FailureKind;
use serde::{Deserialize, Serialize};

/// Every declaration reconciled or already satisfied
pub const EXIT_OK: u8 = 0;
/// One or more declarations failed
pub const EXIT_FAILED: u8 = 1;
/// Unexpected internal error (bad config, I/O)
pub const EXIT_INTERNAL: u8 = 2;
/// The operator interrupted the run
pub const EXIT_INTERRUPTED: u8 = 3;

/// How a single declaration ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Changed,
    Unchanged,
    WouldChange,
    /// Probe could not tell; left for the next run
    Skipped { reason: String },
    Failed { kind: FailureKind, error: String },
    /// Recorded as a manual step
    Manual,
}

/// Progress record for one declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub index: usize,
    pub id: String,
    pub resource_type: String,
    #[serde(flatten)]
    pub status: EntryStatus,
}

/// A declaration whose apply failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedEntry {
    pub index: usize,
    pub id: String,
    pub resource_type: String,
    pub kind: FailureKind,
    pub error: String,
}

/// A declaration skipped because its probe was inconclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub index: usize,
    pub id: String,
    pub reason: String,
}

/// Summary of a reconcile run
///
/// Carries no timestamps or durations so that two dry runs against the same
/// host compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub tame: bool,
    pub interrupted: bool,
    /// Declarations changed (or, in a dry run, that would change)
    pub changed: usize,
    /// Declarations already satisfied
    pub unchanged: usize,
    pub failed: Vec<FailedEntry>,
    pub skipped: Vec<SkippedEntry>,
    pub actions: Vec<ActionOutcome>,
    pub manual_steps: Vec<String>,
}

impl RunReport {
    /// Fold one entry into the counters
    pub fn add_entry(&mut self, entry: &Entry) {
        match &entry.status {
            EntryStatus::Changed | EntryStatus::WouldChange => self.changed += 1,
            EntryStatus::Unchanged => self.unchanged += 1,
            EntryStatus::Skipped { reason } => self.skipped.push(SkippedEntry {
                index: entry.index,
                id: entry.id.clone(),
                reason: reason.clone(),
            }),
            EntryStatus::Failed { kind, error } => self.failed.push(FailedEntry {
                index: entry.index,
                id: entry.id.clone(),
                resource_type: entry.resource_type.clone(),
                kind: *kind,
                error: error.clone(),
            }),
            EntryStatus::Manual => {}
        }
    }

    /// Indices of failed declarations, in run order
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed.iter().map(|f| f.index).collect()
    }

    pub fn permanent_failures(&self) -> impl Iterator<Item = &FailedEntry> {
        self.failed
            .iter()
            .filter(|f| f.kind == FailureKind::Permanent)
    }

    pub fn transient_failures(&self) -> impl Iterator<Item = &FailedEntry> {
        self.failed
            .iter()
            .filter(|f| f.kind == FailureKind::Transient)
    }

    pub fn has_permanent_failures(&self) -> bool {
        self.permanent_failures().next().is_some()
    }

    /// Names of actions that ran (or would run)
    pub fn fired_actions(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter(|a| matches!(a.status, ActionStatus::Ran | ActionStatus::WouldRun))
            .map(|a| a.name.as_str())
            .collect()
    }

    /// Check if the run completed without failures or interruption
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }

    /// Process exit code for this report
    pub fn exit_code(&self) -> u8 {
        if self.interrupted {
            EXIT_INTERRUPTED
        } else if self.failed.is_empty() {
            EXIT_OK
        } else {
            EXIT_FAILED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: usize, status: EntryStatus) -> Entry {
        Entry {
            index,
            id: format!("decl-{index}"),
            resource_type: "test".into(),
            status,
        }
    }

    #[test]
    fn test_add_entry_counts() {
        let mut report = RunReport::default();
        report.add_entry(&entry(0, EntryStatus::Changed));
        report.add_entry(&entry(1, EntryStatus::Unchanged));
        report.add_entry(&entry(2, EntryStatus::WouldChange));
        report.add_entry(&entry(3, EntryStatus::Manual));
        report.add_entry(&entry(
            4,
            EntryStatus::Skipped {
                reason: "store unreadable".into(),
            },
        ));

        assert_eq!(report.changed, 2);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.failed.is_empty());
        assert_eq!(report.exit_code(), EXIT_OK);
    }

    #[test]
    fn test_exit_codes() {
        let mut report = RunReport::default();
        report.add_entry(&entry(
            0,
            EntryStatus::Failed {
                kind: FailureKind::Transient,
                error: "network".into(),
            },
        ));
        assert_eq!(report.exit_code(), EXIT_FAILED);
        assert!(!report.has_permanent_failures());

        report.add_entry(&entry(
            1,
            EntryStatus::Failed {
                kind: FailureKind::Permanent,
                error: "no such formula".into(),
            },
        ));
        assert!(report.has_permanent_failures());
        assert_eq!(report.failed_indices(), vec![0, 1]);
        assert_eq!(report.exit_code(), EXIT_FAILED);

        report.interrupted = true;
        assert_eq!(report.exit_code(), EXIT_INTERRUPTED);
    }
}
