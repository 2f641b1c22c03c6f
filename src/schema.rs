use anyhow::{Context, Result, bail};
use brewkit::RetryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

// ============================================================================
// Main Config Schema
// ============================================================================

/// The declaration file: settings, named actions and the ordered declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardConfig {
    /// Timeouts and retry behaviour
    #[serde(default)]
    pub settings: Settings,

    /// Post-apply actions, referenced by name from declarations
    #[serde(default)]
    pub actions: BTreeMap<String, ActionConfig>,

    /// Desired state, applied in file order
    #[serde(default)]
    pub declarations: Vec<DeclarationEntry>,
}

impl OnboardConfig {
    /// Check everything that would make the whole file unusable.
    ///
    /// Problems local to a single declaration are not reported here; those
    /// declarations are rejected individually when the plan is built.
    pub fn validate(&self) -> Result<()> {
        for (name, action) in &self.actions {
            action
                .validate()
                .with_context(|| format!("Invalid action '{name}'"))?;
        }

        for (i, entry) in self.declarations.iter().enumerate() {
            if let Some(action) = entry.action()
                && !self.actions.contains_key(action)
            {
                bail!(
                    "Declaration #{} ({}) triggers unknown action '{}'",
                    i + 1,
                    entry.label(),
                    action
                );
            }
        }

        Ok(())
    }

    /// Names of actions no declaration triggers
    pub fn unused_actions(&self) -> Vec<&str> {
        self.actions
            .keys()
            .filter(|name| {
                !self
                    .declarations
                    .iter()
                    .any(|d| d.action() == Some(name.as_str()))
            })
            .map(String::as_str)
            .collect()
    }
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Budget for `defaults`, `killall` and other short commands
    pub command_timeout_secs: u64,
    /// Budget for a single `brew install`
    pub install_timeout_secs: u64,
    /// Attempts per install when brew fails transiently (1 = no retry)
    pub install_attempts: u32,
    /// First backoff delay between install attempts
    pub retry_delay_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_timeout_secs: 120,
            install_timeout_secs: 1800,
            install_attempts: 1,
            retry_delay_secs: 10,
        }
    }
}

impl Settings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.install_attempts.max(1),
            Duration::from_secs(self.retry_delay_secs),
            2.0,
        )
    }
}

// ============================================================================
// Actions
// ============================================================================

/// A post-apply action: restart a process or run a command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Process to `killall` (launchd restarts it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,

    /// Command to run, as argv
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// Interrupts the operator's session; skipped by `--tame`.
    /// Defaults to true for restarts, false for commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disruptive: Option<bool>,
}

impl ActionConfig {
    pub fn validate(&self) -> Result<()> {
        match (&self.restart, &self.command) {
            (Some(process), None) if process.trim().is_empty() => bail!("restart process is empty"),
            (Some(_), None) => Ok(()),
            (None, Some(argv)) if argv.is_empty() => bail!("command is empty"),
            (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => bail!("set either restart or command, not both"),
            (None, None) => bail!("set restart or command"),
        }
    }

    pub fn is_disruptive(&self) -> bool {
        self.disruptive.unwrap_or(self.restart.is_some())
    }

    /// Short rendering for listings
    pub fn summary(&self) -> String {
        match (&self.restart, &self.command) {
            (Some(process), _) => format!("killall {process}"),
            (None, Some(argv)) => argv.join(" "),
            (None, None) => String::new(),
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclarationEntry {
    Package(PackageEntry),
    Default(DefaultEntry),
    Hotkey(HotkeyEntry),
    Shortcut(ShortcutEntry),
    Manual(ManualEntry),
}

impl DeclarationEntry {
    /// Action this entry triggers on change
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::Package(p) => p.action.as_deref(),
            Self::Default(d) => d.action.as_deref(),
            Self::Hotkey(h) => h.action.as_deref(),
            Self::Shortcut(s) => s.action.as_deref(),
            Self::Manual(_) => None,
        }
    }

    /// Short human label used in error messages
    pub fn label(&self) -> String {
        match self {
            Self::Package(p) => format!("package {}", p.name),
            Self::Default(d) => format!("default {}/{}", d.domain, d.key),
            Self::Hotkey(h) => format!("hotkey {}", h.id),
            Self::Shortcut(s) => format!("shortcut {}/{}", s.domain, s.menu),
            Self::Manual(m) => format!("manual \"{}\"", m.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub name: String,

    /// formula (default), cask or tap
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultEntry {
    pub domain: String,
    pub key: String,
    pub value: serde_json::Value,

    /// bool, int, float or string; inferred from `value` when omitted
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    #[serde(default)]
    pub current_host: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyEntry {
    /// Numeric id in AppleSymbolicHotKeys (e.g. 64 = Spotlight)
    pub id: u32,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_code: Option<u32>,

    /// ASCII code of the key, 65535 when none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutEntry {
    /// Application domain, or NSGlobalDomain for every app
    pub domain: String,
    pub menu: String,
    pub keys: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    pub text: String,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
[settings]
install_attempts = 3

[actions.restart-dock]
restart = "Dock"

[actions.rebuild-launch-services]
command = ["/usr/bin/true"]

[[declarations]]
kind = "package"
name = "jq"

[[declarations]]
kind = "package"
name = "firefox"
type = "cask"

[[declarations]]
kind = "default"
domain = "com.apple.dock"
key = "orientation"
value = "left"
action = "restart-dock"

[[declarations]]
kind = "default"
domain = "com.apple.screensaver"
key = "idleTime"
value = 0
type = "int"
current_host = true
note = "Lock screen settings apply after logging out"

[[declarations]]
kind = "hotkey"
id = 64
key_code = 49
character = 32
modifiers = ["command"]

[[declarations]]
kind = "shortcut"
domain = "com.apple.Safari"
menu = "Show Sidebar"
keys = "@~s"

[[declarations]]
kind = "manual"
text = "Sign in to iCloud"
"#;

    #[test]
    fn test_parse_example_config() {
        let config: OnboardConfig = toml::from_str(EXAMPLE).expect("Failed to parse config");

        assert_eq!(config.settings.install_attempts, 3);
        assert_eq!(config.settings.command_timeout_secs, 120);
        assert_eq!(config.actions.len(), 2);
        assert_eq!(config.declarations.len(), 7);

        match &config.declarations[1] {
            DeclarationEntry::Package(p) => assert_eq!(p.package_type.as_deref(), Some("cask")),
            other => panic!("unexpected {other:?}"),
        }
        match &config.declarations[3] {
            DeclarationEntry::Default(d) => {
                assert_eq!(d.value, serde_json::json!(0));
                assert!(d.current_host);
                assert!(d.note.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
        match &config.declarations[4] {
            DeclarationEntry::Hotkey(h) => {
                assert!(h.enabled);
                assert_eq!(h.key_code, Some(49));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(config.declarations[2].action(), Some("restart-dock"));
        assert!(config.validate().is_ok());
        assert_eq!(config.unused_actions(), vec!["rebuild-launch-services"]);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "actions": { "restart-finder": { "restart": "Finder", "disruptive": false } },
            "declarations": [
                { "kind": "default", "domain": "com.apple.finder", "key": "ShowPathbar",
                  "value": true, "action": "restart-finder" },
                { "kind": "manual", "text": "Enable FileVault" }
            ]
        }"#;
        let config: OnboardConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert!(!config.actions["restart-finder"].is_disruptive());
    }

    #[test]
    fn test_unknown_action_is_invalid() {
        let mut config: OnboardConfig = toml::from_str(EXAMPLE).unwrap();
        config.actions.remove("restart-dock");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("restart-dock"));
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let toml = r#"
[[declarations]]
kind = "symlink"
from = "a"
"#;
        assert!(toml::from_str::<OnboardConfig>(toml).is_err());
    }

    #[test]
    fn test_action_validation() {
        let both = ActionConfig {
            restart: Some("Dock".into()),
            command: Some(vec!["true".into()]),
            disruptive: None,
        };
        assert!(both.validate().is_err());
        assert!(ActionConfig::default().validate().is_err());

        let restart = ActionConfig {
            restart: Some("Dock".into()),
            ..Default::default()
        };
        assert!(restart.validate().is_ok());
        assert!(restart.is_disruptive());
        assert_eq!(restart.summary(), "killall Dock");
    }

    #[test]
    fn test_retry_config() {
        let settings = Settings {
            install_attempts: 0,
            ..Default::default()
        };
        assert_eq!(settings.retry_config().max_attempts, 1);
        assert_eq!(settings.install_timeout(), Duration::from_secs(1800));
    }
}
