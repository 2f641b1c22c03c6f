//! Symbolic hot keys - system keyboard shortcuts in `com.apple.symbolichotkeys`
//!
//! Each hot key is an entry of the `AppleSymbolicHotKeys` dictionary keyed by
//! its numeric id:
//!
//! ```text
//! 64 = { enabled = 1; value = { parameters = (32, 49, 1048576); type = standard; }; }
//! ```
//!
//! The record stays typed until it is written; it becomes a plist value only
//! inside [`SymbolicHotkey::to_plist`].

use anyhow::Result;
use declarative::{
    ApplyContext, ApplyError, ApplyOutcome, Declaration, DeclarationKind, ProbeState,
};
use plist::{Dictionary, Value};
use std::fmt;
use std::rc::Rc;

use super::Hooks;
use super::prefs::{self, PreferenceStore};

pub const DOMAIN: &str = "com.apple.symbolichotkeys";
pub const KEY: &str = "AppleSymbolicHotKeys";

/// `parameters[0]` when the shortcut has no printable character
pub const NO_CHARACTER: u32 = 65535;

/// Modifier key held with a hot key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Modifier {
    Shift,
    Control,
    Option,
    Command,
    Function,
}

impl Modifier {
    /// Bit in the modifier mask
    pub fn mask(self) -> u32 {
        match self {
            Self::Shift => 1 << 17,
            Self::Control => 1 << 18,
            Self::Option => 1 << 19,
            Self::Command => 1 << 20,
            Self::Function => 1 << 23,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "shift" => Some(Self::Shift),
            "control" | "ctrl" => Some(Self::Control),
            "option" | "opt" | "alt" => Some(Self::Option),
            "command" | "cmd" => Some(Self::Command),
            "fn" | "function" => Some(Self::Function),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Shift => "shift",
            Self::Control => "control",
            Self::Option => "option",
            Self::Command => "command",
            Self::Function => "fn",
        };
        write!(f, "{s}")
    }
}

/// Key binding of a hot key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub character: u32,
    pub key_code: u32,
    pub modifiers: Vec<Modifier>,
}

impl Binding {
    pub fn mask(&self) -> u32 {
        self.modifiers.iter().fold(0, |acc, m| acc | m.mask())
    }

    fn parameters(&self) -> [u32; 3] {
        [self.character, self.key_code, self.mask()]
    }
}

/// A symbolic hot key declaration
#[derive(Debug, Clone)]
pub struct SymbolicHotkey {
    pub id: u32,
    pub enabled: bool,
    /// None keeps whatever binding is stored and only toggles `enabled`
    pub binding: Option<Binding>,
    pub hooks: Hooks,
    store: Rc<dyn PreferenceStore>,
}

/// What a stored entry holds, as far as a hot key cares
#[derive(Debug, PartialEq, Eq)]
struct StoredHotkey {
    enabled: Option<bool>,
    parameters: Option<Vec<i64>>,
}

impl StoredHotkey {
    fn from_plist(value: &Value) -> Self {
        let Some(dict) = value.as_dictionary() else {
            return Self {
                enabled: None,
                parameters: None,
            };
        };

        let enabled = match dict.get("enabled") {
            Some(Value::Boolean(b)) => Some(*b),
            Some(Value::Integer(i)) => i.as_signed().map(|i| i != 0),
            _ => None,
        };
        let parameters = dict
            .get("value")
            .and_then(Value::as_dictionary)
            .and_then(|v| v.get("parameters"))
            .and_then(Value::as_array)
            .map(|params| {
                params
                    .iter()
                    .filter_map(Value::as_signed_integer)
                    .collect()
            });

        Self {
            enabled,
            parameters,
        }
    }

    fn describe(&self) -> String {
        let state = match self.enabled {
            Some(true) => "enabled",
            Some(false) => "disabled",
            None => "unset",
        };
        match &self.parameters {
            Some(p) => format!("{state} {p:?}"),
            None => state.to_string(),
        }
    }
}

impl SymbolicHotkey {
    /// Build a hot key from declaration fields.
    ///
    /// Fails on an unknown modifier name or a modifier list without a key code.
    pub fn new(
        id: u32,
        enabled: bool,
        key_code: Option<u32>,
        character: Option<u32>,
        modifiers: &[String],
        store: Rc<dyn PreferenceStore>,
    ) -> Result<Self, String> {
        let mut parsed = modifiers
            .iter()
            .map(|m| Modifier::parse(m).ok_or_else(|| format!("unknown modifier: {m}")))
            .collect::<Result<Vec<_>, _>>()?;
        parsed.sort();
        parsed.dedup();

        let binding = match key_code {
            Some(key_code) => Some(Binding {
                character: character.unwrap_or(NO_CHARACTER),
                key_code,
                modifiers: parsed,
            }),
            None if !parsed.is_empty() || character.is_some() => {
                return Err(format!("hot key {id} has modifiers but no key_code"));
            }
            None => None,
        };

        Ok(Self {
            id,
            enabled,
            binding,
            hooks: Hooks::default(),
            store,
        })
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Plist entry written under `AppleSymbolicHotKeys`
    pub fn to_plist(&self) -> Value {
        let mut entry = Dictionary::new();
        entry.insert("enabled".into(), Value::Boolean(self.enabled));

        if let Some(binding) = &self.binding {
            let parameters = binding
                .parameters()
                .iter()
                .map(|p| Value::Integer(u64::from(*p).into()))
                .collect();
            let mut value = Dictionary::new();
            value.insert("parameters".into(), Value::Array(parameters));
            value.insert("type".into(), Value::String("standard".into()));
            entry.insert("value".into(), Value::Dictionary(value));
        }

        Value::Dictionary(entry)
    }

    fn matches(&self, stored: &StoredHotkey) -> bool {
        if stored.enabled != Some(self.enabled) {
            return false;
        }
        match &self.binding {
            None => true,
            Some(binding) => {
                let wanted: Vec<i64> = binding.parameters().iter().map(|p| i64::from(*p)).collect();
                stored.parameters.as_ref() == Some(&wanted)
            }
        }
    }

    /// This hot key's entry in `AppleSymbolicHotKeys`, if any
    fn stored_entry(&self) -> Result<Option<Value>, prefs::StoreError> {
        let stored = prefs::read_key(self.store.as_ref(), DOMAIN, KEY, false)?;
        Ok(stored
            .as_ref()
            .and_then(Value::as_dictionary)
            .and_then(|hotkeys| hotkeys.get(&self.id.to_string()))
            .cloned())
    }

    /// Entry to write: `dict-add` replaces the whole entry, so a toggle-only
    /// hot key carries the stored binding over
    fn entry_to_write(&self) -> Result<Value, prefs::StoreError> {
        let mut entry = self.to_plist();
        if self.binding.is_some() {
            return Ok(entry);
        }

        let stored_binding = self.stored_entry()?.and_then(|stored| {
            stored
                .as_dictionary()
                .and_then(|d| d.get("value"))
                .cloned()
        });
        if let (Some(binding), Value::Dictionary(dict)) = (stored_binding, &mut entry) {
            dict.insert("value".into(), binding);
        }
        Ok(entry)
    }

    fn describe_desired(&self) -> String {
        let state = if self.enabled { "enabled" } else { "disabled" };
        match &self.binding {
            Some(b) => format!("{state} {:?}", b.parameters()),
            None => state.to_string(),
        }
    }
}

impl Declaration for SymbolicHotkey {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn description(&self) -> String {
        let action = if self.enabled { "Enable" } else { "Disable" };
        match &self.binding {
            Some(b) if !b.modifiers.is_empty() => {
                let mods: Vec<String> = b.modifiers.iter().map(ToString::to_string).collect();
                format!(
                    "{action} hot key {} as {}+{}",
                    self.id,
                    mods.join("+"),
                    b.key_code
                )
            }
            Some(b) => format!("{action} hot key {} as key code {}", self.id, b.key_code),
            None => format!("{action} hot key {}", self.id),
        }
    }

    fn kind(&self) -> DeclarationKind {
        DeclarationKind::PreferenceKey
    }

    fn resource_type(&self) -> &'static str {
        "symbolic_hotkey"
    }

    fn probe(&self) -> Result<ProbeState> {
        Ok(match self.stored_entry()? {
            None => ProbeState::Absent,
            Some(entry) => {
                let stored = StoredHotkey::from_plist(&entry);
                if self.matches(&stored) {
                    ProbeState::Present {
                        details: Some(stored.describe()),
                    }
                } else {
                    ProbeState::Modified {
                        from: stored.describe(),
                        to: self.describe_desired(),
                    }
                }
            }
        })
    }

    fn apply(&self, current: &ProbeState, _ctx: &ApplyContext) -> Result<ApplyOutcome, ApplyError> {
        if current.is_present() {
            return Ok(ApplyOutcome::Unchanged);
        }

        let entry = self.entry_to_write()?;
        self.store
            .dict_add(DOMAIN, KEY, &self.id.to_string(), &entry, false)?;
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

    fn spotlight(store: &Rc<MemoryStore>, enabled: bool) -> SymbolicHotkey {
        SymbolicHotkey::new(
            64,
            enabled,
            Some(49),
            Some(32),
            &["command".to_string()],
            store.clone(),
        )
        .unwrap()
    }

    #[test]
    fn test_modifier_masks() {
        let binding = Binding {
            character: NO_CHARACTER,
            key_code: 49,
            modifiers: vec![Modifier::Control, Modifier::Option],
        };
        assert_eq!(binding.mask(), 262_144 | 524_288);
        assert_eq!(Modifier::Shift.mask(), 131_072);
        assert_eq!(Modifier::Command.mask(), 1_048_576);
        assert_eq!(Modifier::Function.mask(), 8_388_608);
    }

    #[test]
    fn test_unknown_modifier_rejected() {
        let store = Rc::new(MemoryStore::new());
        let err = SymbolicHotkey::new(64, true, Some(49), None, &["hyper".into()], store).unwrap_err();
        assert!(err.contains("hyper"));
    }

    #[test]
    fn test_modifiers_without_key_code_rejected() {
        let store = Rc::new(MemoryStore::new());
        assert!(SymbolicHotkey::new(64, true, None, None, &["cmd".into()], store).is_err());
    }

    #[test]
    fn test_to_plist() {
        let store = Rc::new(MemoryStore::new());
        let hotkey = spotlight(&store, true);
        let value = hotkey.to_plist();
        let dict = value.as_dictionary().unwrap();

        assert_eq!(dict.get("enabled"), Some(&Value::Boolean(true)));
        let inner = dict["value"].as_dictionary().unwrap();
        assert_eq!(inner.get("type"), Some(&Value::String("standard".into())));
        let params: Vec<_> = inner["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p.as_signed_integer().unwrap())
            .collect();
        assert_eq!(params, vec![32, 49, 1_048_576]);
    }

    #[test]
    fn test_disable_only_has_no_value() {
        let store = Rc::new(MemoryStore::new());
        let hotkey = SymbolicHotkey::new(32, false, None, None, &[], store).unwrap();
        let value = hotkey.to_plist();
        assert!(value.as_dictionary().unwrap().get("value").is_none());
        assert_eq!(hotkey.description(), "Disable hot key 32");
    }

    #[test]
    fn test_apply_then_probe_is_present() {
        let store = Rc::new(MemoryStore::new());
        let hotkey = spotlight(&store, true);
        let ctx = ApplyContext::default();

        let state = hotkey.probe().unwrap();
        assert_eq!(state, ProbeState::Absent);
        assert_eq!(hotkey.apply(&state, &ctx).unwrap(), ApplyOutcome::Changed);
        assert!(hotkey.probe().unwrap().is_present());
    }

    #[test]
    fn test_dict_add_keeps_other_entries() {
        let store = Rc::new(MemoryStore::new());
        let ctx = ApplyContext::default();
        let first = spotlight(&store, false);
        let second = SymbolicHotkey::new(32, false, None, None, &[], store.clone()).unwrap();

        first.apply(&ProbeState::Absent, &ctx).unwrap();
        second.apply(&ProbeState::Absent, &ctx).unwrap();

        assert!(first.probe().unwrap().is_present());
        assert!(second.probe().unwrap().is_present());
    }

    #[test]
    fn test_probe_detects_toggle() {
        let store = Rc::new(MemoryStore::new());
        let ctx = ApplyContext::default();
        spotlight(&store, true)
            .apply(&ProbeState::Absent, &ctx)
            .unwrap();

        let disabled = spotlight(&store, false);
        assert!(matches!(
            disabled.probe().unwrap(),
            ProbeState::Modified { .. }
        ));
    }

    #[test]
    fn test_integer_enabled_flag() {
        let store = Rc::new(MemoryStore::new());
        let mut entry = Dictionary::new();
        entry.insert("enabled".into(), Value::Integer(0.into()));
        let mut hotkeys = Dictionary::new();
        hotkeys.insert("32".into(), Value::Dictionary(entry));
        store.set(DOMAIN, KEY, Value::Dictionary(hotkeys));

        let hotkey = SymbolicHotkey::new(32, false, None, None, &[], store.clone()).unwrap();
        assert!(hotkey.probe().unwrap().is_present());
    }

    #[test]
    fn test_toggle_keeps_stored_binding() {
        let store = Rc::new(MemoryStore::new());
        let ctx = ApplyContext::default();
        spotlight(&store, true)
            .apply(&ProbeState::Absent, &ctx)
            .unwrap();

        let toggle = SymbolicHotkey::new(64, false, None, None, &[], store.clone()).unwrap();
        let state = toggle.probe().unwrap();
        assert!(matches!(state, ProbeState::Modified { .. }));
        assert_eq!(toggle.apply(&state, &ctx).unwrap(), ApplyOutcome::Changed);
        assert!(toggle.probe().unwrap().is_present());

        let hotkeys = store.get(DOMAIN, KEY, false).unwrap();
        let stored = StoredHotkey::from_plist(&hotkeys.as_dictionary().unwrap()["64"]);
        assert_eq!(stored.enabled, Some(false));
        assert_eq!(stored.parameters, Some(vec![32, 49, 1_048_576]));

        // The same binding declared explicitly is already satisfied
        let bound_disabled = spotlight(&store, false);
        assert!(bound_disabled.probe().unwrap().is_present());
    }
}
