//! Declarations onboard knows how to reconcile
//!
//! Every declaration implements [`declarative::Declaration`]:
//! - Probe (current host state, never mutating)
//! - Apply (converge current to desired)
//! - Hooks (post-apply action, operator note)

pub mod app_shortcut;
pub mod brew_package;
pub mod macos_default;
pub mod manual_step;
pub mod prefs;
pub mod rejected;
pub mod service;
pub mod symbolic_hotkey;

pub use app_shortcut::AppShortcut;
pub use brew_package::BrewPackage;
pub use macos_default::MacOSDefault;
pub use manual_step::ManualStep;
pub use rejected::Rejected;
pub use symbolic_hotkey::SymbolicHotkey;

/// What a declaration does besides converging its own state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hooks {
    /// Action to run at the end of the run if this declaration changed
    pub action: Option<String>,
    /// Reminder recorded when this declaration changed
    pub note: Option<String>,
}
