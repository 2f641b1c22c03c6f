//! Per-application menu shortcuts (`NSUserKeyEquivalents`)
//!
//! Keys use the Cocoa key-equivalent notation: `@` command, `^` control,
//! `~` option, `$` shift, followed by the key, e.g. `@~h`.

use anyhow::Result;
use declarative::{
    ApplyContext, ApplyError, ApplyOutcome, Declaration, DeclarationKind, ProbeState,
};
use plist::Value;
use std::rc::Rc;

use super::Hooks;
use super::prefs::{self, PreferenceStore};

pub const KEY: &str = "NSUserKeyEquivalents";

/// A menu shortcut for one application (or `NSGlobalDomain` for every app)
#[derive(Debug, Clone)]
pub struct AppShortcut {
    pub domain: String,
    /// Menu item title, exactly as it appears in the menu
    pub menu: String,
    pub keys: String,
    pub hooks: Hooks,
    store: Rc<dyn PreferenceStore>,
}

impl AppShortcut {
    pub fn new(
        domain: &str,
        menu: &str,
        keys: &str,
        store: Rc<dyn PreferenceStore>,
    ) -> Result<Self, String> {
        if menu.trim().is_empty() {
            return Err("shortcut menu title is empty".to_string());
        }
        let key = keys.trim_start_matches(['@', '^', '~', '$']);
        if key.chars().count() != 1 {
            return Err(format!("invalid key equivalent: {keys:?}"));
        }

        Ok(Self {
            domain: domain.to_string(),
            menu: menu.to_string(),
            keys: keys.to_string(),
            hooks: Hooks::default(),
            store,
        })
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

impl Declaration for AppShortcut {
    fn id(&self) -> String {
        format!("{}/{}", self.domain, self.menu)
    }

    fn description(&self) -> String {
        format!("Bind \"{}\" to {} in {}", self.menu, self.keys, self.domain)
    }

    fn kind(&self) -> DeclarationKind {
        DeclarationKind::PreferenceKey
    }

    fn resource_type(&self) -> &'static str {
        "app_shortcut"
    }

    fn probe(&self) -> Result<ProbeState> {
        let stored = prefs::read_key(self.store.as_ref(), &self.domain, KEY, false)?;
        let current = stored
            .as_ref()
            .and_then(Value::as_dictionary)
            .and_then(|shortcuts| shortcuts.get(&self.menu));

        Ok(match current {
            None => ProbeState::Absent,
            Some(Value::String(keys)) if *keys == self.keys => ProbeState::Present {
                details: Some(keys.clone()),
            },
            Some(other) => ProbeState::Modified {
                from: prefs::describe(other),
                to: format!("\"{}\"", self.keys),
            },
        })
    }

    fn apply(&self, current: &ProbeState, _ctx: &ApplyContext) -> Result<ApplyOutcome, ApplyError> {
        if current.is_present() {
            return Ok(ApplyOutcome::Unchanged);
        }

        self.store.dict_add(
            &self.domain,
            KEY,
            &self.menu,
            &Value::String(self.keys.clone()),
            false,
        )?;
        Ok(ApplyOutcome::Changed)
    }

    fn triggers(&self) -> Option<&str> {
        self.hooks.action.as_deref()
    }

    fn reminder(&self) -> Option<&str> {
        self.hooks.note.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::prefs::memory::MemoryStore;

    #[test]
    fn test_validates_keys() {
        let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
        assert!(AppShortcut::new("com.apple.Safari", "Show Sidebar", "@~s", store.clone()).is_ok());
        assert!(AppShortcut::new("com.apple.Safari", "Show Sidebar", "@~", store.clone()).is_err());
        assert!(AppShortcut::new("com.apple.Safari", "Show Sidebar", "@ab", store.clone()).is_err());
        assert!(AppShortcut::new("com.apple.Safari", " ", "@s", store).is_err());
    }

    #[test]
    fn test_apply_then_probe() {
        let store = Rc::new(MemoryStore::new());
        let shortcut =
            AppShortcut::new("com.apple.mail", "Send", "@\u{21a9}", store.clone()).unwrap();
        let ctx = ApplyContext::default();

        assert_eq!(shortcut.probe().unwrap(), ProbeState::Absent);
        assert_eq!(
            shortcut.apply(&ProbeState::Absent, &ctx).unwrap(),
            ApplyOutcome::Changed
        );
        assert!(shortcut.probe().unwrap().is_present());
        assert_eq!(
            store.get("com.apple.mail", KEY, false),
            Some(Value::Dictionary(
                [("Send".to_string(), Value::String("@\u{21a9}".into()))]
                    .into_iter()
                    .collect()
            ))
        );
    }

    #[test]
    fn test_probe_modified() {
        let store = Rc::new(MemoryStore::new());
        let ctx = ApplyContext::default();
        AppShortcut::new("com.apple.finder", "Show Package Contents", "@$o", store.clone())
            .unwrap()
            .apply(&ProbeState::Absent, &ctx)
            .unwrap();

        let rebound =
            AppShortcut::new("com.apple.finder", "Show Package Contents", "@~o", store.clone())
                .unwrap();
        assert_eq!(
            rebound.probe().unwrap(),
            ProbeState::Modified {
                from: "\"@$o\"".into(),
                to: "\"@~o\"".into(),
            }
        );
        assert_eq!(rebound.id(), "com.apple.finder/Show Package Contents");
    }
}
