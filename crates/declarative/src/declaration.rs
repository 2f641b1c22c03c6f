//! Declaration trait for desired host state
//!
//! A Declaration describes one unit of desired state: a package that should
//! be installed, a preference key that should hold a value, or a reminder for
//! something only a human can do.

use crate::context::ApplyContext;
use crate::error::ApplyError;
use crate::types::{ApplyOutcome, DeclarationKind, ProbeState};
use anyhow::Result;
use std::fmt;

/// Core trait for declarations
///
/// Every declaration provides:
/// - Identity (id, description, kind, type)
/// - A read-only probe of the current host state
/// - An idempotent apply that converges the host
/// - An optional post-apply action and reminder
///
/// # Example
///
/// ```ignore
/// use declarative::{ApplyContext, ApplyError, ApplyOutcome, Declaration, DeclarationKind, ProbeState};
///
/// #[derive(Debug)]
/// struct MarkerFile { path: String }
///
/// impl Declaration for MarkerFile {
///     fn id(&self) -> String { self.path.clone() }
///     fn description(&self) -> String { format!("Create {}", self.path) }
///     fn kind(&self) -> DeclarationKind { DeclarationKind::PreferenceKey }
///     fn resource_type(&self) -> &'static str { "file" }
///
///     fn probe(&self) -> anyhow::Result<ProbeState> {
///         if std::path::Path::new(&self.path).exists() {
///             Ok(ProbeState::Present { details: None })
///         } else {
///             Ok(ProbeState::Absent)
///         }
///     }
///
///     fn apply(&self, current: &ProbeState, _ctx: &ApplyContext) -> Result<ApplyOutcome, ApplyError> {
///         if current.is_present() {
///             return Ok(ApplyOutcome::Unchanged);
///         }
///         std::fs::write(&self.path, b"").map_err(|e| ApplyError::transient(e.to_string()))?;
///         Ok(ApplyOutcome::Changed)
///     }
/// }
/// ```
pub trait Declaration: fmt::Debug {
    /// Stable identifier, unique within its type. Examples:
    /// - "jq" for a brew formula
    /// - "com.apple.dock/orientation" for a preference key
    fn id(&self) -> String;

    /// Human-readable description of the desired state
    fn description(&self) -> String;

    /// Which family this declaration belongs to
    fn kind(&self) -> DeclarationKind;

    /// Finer grained type used for grouping and filtering, e.g.
    /// "brew_formula", "brew_cask", "macos_default", "symbolic_hotkey"
    fn resource_type(&self) -> &'static str;

    /// Query the current host state without mutating anything.
    ///
    /// Errors are treated as [`ProbeState::Unknown`] by the reconciler.
    fn probe(&self) -> Result<ProbeState>;

    /// Converge the host to the desired state.
    ///
    /// Only called when `current` needs work. Must be idempotent: calling it
    /// again once the host matches returns [`ApplyOutcome::Unchanged`].
    fn apply(&self, current: &ProbeState, ctx: &ApplyContext) -> Result<ApplyOutcome, ApplyError>;

    /// Name of the action to enqueue when this declaration changes
    fn triggers(&self) -> Option<&str> {
        None
    }

    /// Reminder for the operator.
    ///
    /// For [`DeclarationKind::ManualStep`] this is the step itself and is
    /// always recorded. For other kinds it is recorded only on change.
    fn reminder(&self) -> Option<&str> {
        None
    }

    /// Why this declaration can never apply, if it was rejected at load time.
    ///
    /// A rejected declaration fails with a permanent error in live and dry
    /// runs alike, without being probed.
    fn rejection(&self) -> Option<&str> {
        None
    }
}

/// A boxed declaration for type-erased storage
pub type BoxedDeclaration = Box<dyn Declaration>;
