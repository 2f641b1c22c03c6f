//! macOS defaults declaration - one key in a preference domain

use anyhow::Result;
use declarative::{
    ApplyContext, ApplyError, ApplyOutcome, Declaration, DeclarationKind, ProbeState,
};
use std::rc::Rc;

use super::Hooks;
use super::prefs::{self, PrefValue, PreferenceStore};

/// A macOS default preference
#[derive(Debug, Clone)]
pub struct MacOSDefault {
    /// Domain (e.g., "com.apple.finder")
    pub domain: String,
    /// Key (e.g., "ShowPathbar")
    pub key: String,
    /// Desired value
    pub value: PrefValue,
    /// Write through `defaults -currentHost`
    pub current_host: bool,
    pub hooks: Hooks,
    store: Rc<dyn PreferenceStore>,
}

impl MacOSDefault {
    pub fn new(
        domain: &str,
        key: &str,
        value: PrefValue,
        store: Rc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            domain: domain.to_string(),
            key: key.to_string(),
            value,
            current_host: false,
            hooks: Hooks::default(),
            store,
        }
    }

    pub fn current_host(mut self, current_host: bool) -> Self {
        self.current_host = current_host;
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

impl Declaration for MacOSDefault {
    fn id(&self) -> String {
        format!("{}/{}", self.domain, self.key)
    }

    fn description(&self) -> String {
        let host = if self.current_host { " (current host)" } else { "" };
        format!("Set {} {} = {}{}", self.domain, self.key, self.value, host)
    }

    fn kind(&self) -> DeclarationKind {
        DeclarationKind::PreferenceKey
    }

    fn resource_type(&self) -> &'static str {
        "macos_default"
    }

    fn probe(&self) -> Result<ProbeState> {
        let stored = prefs::read_key(
            self.store.as_ref(),
            &self.domain,
            &self.key,
            self.current_host,
        )?;

        Ok(match stored {
            None => ProbeState::Absent,
            Some(v) if self.value.matches(&v) => ProbeState::Present {
                details: Some(prefs::describe(&v)),
            },
            Some(v) => ProbeState::Modified {
                from: prefs::describe(&v),
                to: self.value.to_string(),
            },
        })
    }

    fn apply(&self, current: &ProbeState, _ctx: &ApplyContext) -> Result<ApplyOutcome, ApplyError> {
        if current.is_present() {
            return Ok(ApplyOutcome::Unchanged);
        }

        log::debug!("defaults write {} {} {}", self.domain, self.key, self.value);
        self.store
            .write(&self.domain, &self.key, &self.value, self.current_host)?;
        Ok(ApplyOutcome::Changed)
    }

    fn triggers(&self) -> Option<&str> {
        self.hooks.action.as_deref()
    }

    fn reminder(&self) -> Option<&str> {
        self.hooks.note.as_deref()
    }
}
