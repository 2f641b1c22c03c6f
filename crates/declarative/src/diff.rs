//! Probe-only diffs for previewing a run

use crate::declaration::{BoxedDeclaration, Declaration};
use crate::types::{DeclarationKind, ProbeState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pending work for one declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationDiff {
    pub index: usize,
    pub id: String,
    pub resource_type: String,
    pub description: String,
    /// Probed state; never `Present`
    pub current: ProbeState,
    /// Action queued if this declaration changes
    pub triggers: Option<String>,
}

impl DeclarationDiff {
    /// Probe a declaration, returning None when it is already satisfied.
    ///
    /// Manual steps never produce a diff. Probe errors and rejected
    /// declarations produce an `Unknown` diff.
    pub fn probe(index: usize, declaration: &dyn Declaration) -> Option<Self> {
        if declaration.kind() == DeclarationKind::ManualStep {
            return None;
        }

        let current = match declaration.rejection() {
            Some(reason) => ProbeState::unknown(format!("rejected: {reason}")),
            None => declaration
                .probe()
                .unwrap_or_else(|e| ProbeState::unknown(format!("{e:#}"))),
        };
        if current.is_present() {
            return None;
        }

        Some(Self {
            index,
            id: declaration.id(),
            resource_type: declaration.resource_type().to_string(),
            description: declaration.description(),
            current,
            triggers: declaration.triggers().map(str::to_string),
        })
    }

    pub fn is_addition(&self) -> bool {
        self.current.is_absent()
    }

    pub fn is_modification(&self) -> bool {
        matches!(self.current, ProbeState::Modified { .. })
    }
}

/// Probe every declaration and keep the ones with pending work
pub fn compute_diffs(declarations: &[BoxedDeclaration]) -> Vec<DeclarationDiff> {
    declarations
        .iter()
        .enumerate()
        .filter_map(|(i, d)| DeclarationDiff::probe(i, d.as_ref()))
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub additions: usize,
    pub modifications: usize,
    /// Declarations whose state could not be determined
    pub unknown: usize,
}

impl DiffSummary {
    pub fn from_diffs(diffs: &[DeclarationDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_addition() {
                summary.additions += 1;
            } else if diff.is_modification() {
                summary.modifications += 1;
            } else {
                summary.unknown += 1;
            }
        }
        summary
    }

    /// Total number of pending changes
    pub fn total(&self) -> usize {
        self.additions + self.modifications
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type, sorted by type name
pub fn group_by_type(diffs: &[DeclarationDiff]) -> BTreeMap<&str, Vec<&DeclarationDiff>> {
    let mut groups: BTreeMap<&str, Vec<&DeclarationDiff>> = BTreeMap::new();
    for diff in diffs {
        groups
            .entry(diff.resource_type.as_str())
            .or_default()
            .push(diff);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::error::ApplyError;
    use crate::types::ApplyOutcome;

    #[derive(Debug)]
    struct Fixed {
        id: &'static str,
        kind: DeclarationKind,
        state: Option<ProbeState>,
    }

    impl Declaration for Fixed {
        fn id(&self) -> String {
            self.id.to_string()
        }
        fn description(&self) -> String {
            format!("Fixed {}", self.id)
        }
        fn kind(&self) -> DeclarationKind {
            self.kind
        }
        fn resource_type(&self) -> &'static str {
            match self.kind {
                DeclarationKind::Package => "brew_formula",
                _ => "macos_default",
            }
        }
        fn probe(&self) -> anyhow::Result<ProbeState> {
            self.state
                .clone()
                .ok_or_else(|| anyhow::anyhow!("defaults export failed"))
        }
        fn apply(&self, _: &ProbeState, _: &ApplyContext) -> Result<ApplyOutcome, ApplyError> {
            Ok(ApplyOutcome::Changed)
        }
    }

    fn boxed(id: &'static str, kind: DeclarationKind, state: Option<ProbeState>) -> BoxedDeclaration {
        Box::new(Fixed { id, kind, state })
    }

    #[test]
    fn test_compute_diffs_skips_satisfied_and_manual() {
        let declarations = vec![
            boxed("jq", DeclarationKind::Package, Some(ProbeState::Absent)),
            boxed(
                "git",
                DeclarationKind::Package,
                Some(ProbeState::Present { details: None }),
            ),
            boxed("Enable FileVault", DeclarationKind::ManualStep, None),
            boxed(
                "com.apple.dock/orientation",
                DeclarationKind::PreferenceKey,
                Some(ProbeState::Modified {
                    from: "bottom".into(),
                    to: "left".into(),
                }),
            ),
            boxed("com.apple.finder/ShowPathbar", DeclarationKind::PreferenceKey, None),
        ];

        let diffs = compute_diffs(&declarations);
        let indices: Vec<_> = diffs.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![0, 3, 4]);

        let summary = DiffSummary::from_diffs(&diffs);
        assert_eq!(
            summary,
            DiffSummary {
                additions: 1,
                modifications: 1,
                unknown: 1,
            }
        );
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn test_group_by_type_is_sorted() {
        let declarations = vec![
            boxed(
                "com.apple.dock/orientation",
                DeclarationKind::PreferenceKey,
                Some(ProbeState::Absent),
            ),
            boxed("jq", DeclarationKind::Package, Some(ProbeState::Absent)),
        ];
        let diffs = compute_diffs(&declarations);
        let groups = group_by_type(&diffs);
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["brew_formula", "macos_default"]);
    }
}
