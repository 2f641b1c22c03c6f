//! Planner - turns the declaration file into declarations and actions

use anyhow::{Context, Result};
use brewkit::backend::brew::BrewBackend;
use brewkit::{Client, Package, PackageType};
use declarative::{ActionRegistry, BoxedDeclaration, Declaration, DeclarationKind};
use std::rc::Rc;

use crate::resource::brew_package::{self, MissingBrew};
use crate::resource::prefs::{DefaultsCli, PrefValue, PreferenceStore};
use crate::resource::{
    AppShortcut, BrewPackage, Hooks, MacOSDefault, ManualStep, Rejected, SymbolicHotkey, service,
};
use crate::schema::{
    DeclarationEntry, DefaultEntry, HotkeyEntry, OnboardConfig, PackageEntry, Settings,
    ShortcutEntry,
};

/// Host tools the declarations talk to
#[derive(Debug, Clone)]
pub struct Services {
    pub brew: Client,
    pub store: Rc<dyn PreferenceStore>,
}

impl Services {
    /// The real `brew` and `defaults` commands.
    ///
    /// A host without Homebrew still gets a plan; its package declarations
    /// are skipped at probe time.
    pub fn system(settings: &Settings) -> Self {
        let brew = match BrewBackend::new() {
            Ok(backend) => Client::with_backend(
                backend.with_timeouts(settings.command_timeout(), settings.install_timeout()),
            ),
            Err(e) => {
                log::warn!("{e}; package declarations will be skipped");
                Client::with_backend(MissingBrew)
            }
        };

        Self {
            brew,
            store: Rc::new(DefaultsCli::new(settings.command_timeout())),
        }
    }

    /// Services for commands that never probe the host
    pub fn offline(settings: &Settings) -> Self {
        Self {
            brew: Client::with_backend(MissingBrew),
            store: Rc::new(DefaultsCli::new(settings.command_timeout())),
        }
    }
}

/// Everything a reconcile run needs
#[derive(Debug)]
pub struct Plan {
    pub declarations: Vec<BoxedDeclaration>,
    pub actions: ActionRegistry,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Declarations rejected while building the plan
    pub fn rejected(&self) -> impl Iterator<Item = &BoxedDeclaration> {
        self.declarations.iter().filter(|d| d.rejection().is_some())
    }
}

/// Build the plan, keeping declarations that match `only`
pub fn build(config: &OnboardConfig, services: &Services, only: Option<&str>) -> Result<Plan> {
    let mut actions = ActionRegistry::new();
    for (name, action) in &config.actions {
        actions.register(
            service::action(name, action, config.settings.command_timeout())
                .with_context(|| format!("Invalid action '{name}'"))?,
        );
    }

    let (resource_type, name) = only.map(parse_target).unwrap_or((None, None));
    let declarations: Vec<BoxedDeclaration> = config
        .declarations
        .iter()
        .map(|entry| declaration(entry, &config.settings, services))
        .filter(|d| matches_filter(d.as_ref(), resource_type.as_deref(), name.as_deref()))
        .collect();

    log::debug!(
        "Planned {} of {} declarations",
        declarations.len(),
        config.declarations.len()
    );
    Ok(Plan {
        declarations,
        actions,
    })
}

/// Build one declaration; invalid entries become [`Rejected`]
pub fn declaration(
    entry: &DeclarationEntry,
    settings: &Settings,
    services: &Services,
) -> BoxedDeclaration {
    let built = match entry {
        DeclarationEntry::Package(p) => package(p, settings, services),
        DeclarationEntry::Default(d) => default(d, services),
        DeclarationEntry::Hotkey(h) => hotkey(h, services),
        DeclarationEntry::Shortcut(s) => shortcut(s, services),
        DeclarationEntry::Manual(m) => Ok(Box::new(ManualStep::new(&m.text)) as BoxedDeclaration),
    };

    built.unwrap_or_else(|rejected| {
        log::warn!("Rejected {}: {}", entry.label(), rejected.reason);
        Box::new(rejected) as BoxedDeclaration
    })
}

fn hooks(action: Option<&String>, note: Option<&String>) -> Hooks {
    Hooks {
        action: action.cloned(),
        note: note.cloned(),
    }
}

fn package(
    entry: &PackageEntry,
    settings: &Settings,
    services: &Services,
) -> Result<BoxedDeclaration, Rejected> {
    let declared = entry.package_type.as_deref().unwrap_or("formula");
    let reject = |resource_type, reason: String| {
        Rejected::new(&entry.name, resource_type, DeclarationKind::Package, reason)
    };

    let package_type = PackageType::parse(declared)
        .ok_or_else(|| reject("brew_formula", format!("unknown package type: {declared}")))?;
    let resource_type = match package_type {
        PackageType::Formula => "brew_formula",
        PackageType::Cask => "brew_cask",
        PackageType::Tap => "brew_tap",
    };
    brew_package::validate_name(&entry.name, package_type)
        .map_err(|reason| reject(resource_type, reason))?;

    Ok(Box::new(
        BrewPackage::new(
            Package::new(&entry.name, package_type),
            services.brew.clone(),
        )
        .with_retry(settings.retry_config())
        .with_hooks(hooks(entry.action.as_ref(), entry.note.as_ref())),
    ))
}

fn default(entry: &DefaultEntry, services: &Services) -> Result<BoxedDeclaration, Rejected> {
    let value = PrefValue::coerce(&entry.value, entry.value_type.as_deref()).map_err(|reason| {
        Rejected::new(
            format!("{}/{}", entry.domain, entry.key),
            "macos_default",
            DeclarationKind::PreferenceKey,
            reason,
        )
    })?;

    Ok(Box::new(
        MacOSDefault::new(&entry.domain, &entry.key, value, services.store.clone())
            .current_host(entry.current_host)
            .with_hooks(hooks(entry.action.as_ref(), entry.note.as_ref())),
    ))
}

fn hotkey(entry: &HotkeyEntry, services: &Services) -> Result<BoxedDeclaration, Rejected> {
    let hotkey = SymbolicHotkey::new(
        entry.id,
        entry.enabled,
        entry.key_code,
        entry.character,
        &entry.modifiers,
        services.store.clone(),
    )
    .map_err(|reason| {
        Rejected::new(
            entry.id.to_string(),
            "symbolic_hotkey",
            DeclarationKind::PreferenceKey,
            reason,
        )
    })?;

    Ok(Box::new(hotkey.with_hooks(hooks(
        entry.action.as_ref(),
        entry.note.as_ref(),
    ))))
}

fn shortcut(entry: &ShortcutEntry, services: &Services) -> Result<BoxedDeclaration, Rejected> {
    let shortcut = AppShortcut::new(
        &entry.domain,
        &entry.menu,
        &entry.keys,
        services.store.clone(),
    )
    .map_err(|reason| {
        Rejected::new(
            format!("{}/{}", entry.domain, entry.menu),
            "app_shortcut",
            DeclarationKind::PreferenceKey,
            reason,
        )
    })?;

    Ok(Box::new(shortcut.with_hooks(hooks(
        entry.action.as_ref(),
        entry.note.as_ref(),
    ))))
}

/// Parse a target string like "defaults.dock" into (resource_type, name)
pub fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((kind, name)) if !kind.is_empty() => (Some(kind.to_string()), Some(name.to_string())),
        Some(_) => (None, Some(target.to_string())),
    }
}

/// Check if a declaration matches the filter
pub fn matches_filter(
    declaration: &dyn Declaration,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    if let Some(rt) = resource_type {
        let actual = declaration.resource_type();
        let matches_type = match rt {
            "packages" | "brew" => actual.starts_with("brew"),
            "formulae" | "formulas" => actual == "brew_formula",
            "casks" => actual == "brew_cask",
            "taps" => actual == "brew_tap",
            "defaults" => actual == "macos_default",
            "hotkeys" => actual == "symbolic_hotkey",
            "shortcuts" => actual == "app_shortcut",
            "manual" => actual == "manual_step",
            _ => actual == rt,
        };
        if !matches_type {
            return false;
        }
    }

    if let Some(n) = name
        && !declaration.id().contains(n)
    {
        return false;
    }

    true
}
