//! Homebrew package declaration - formula, cask or tap

use anyhow::Result;
use brewkit::backend::Backend;
use brewkit::{Client, Package, PackageType, RetryConfig};
use declarative::{
    ApplyContext, ApplyError, ApplyOutcome, Declaration, DeclarationKind, ProbeState,
};
use regex::Regex;
use std::sync::LazyLock;

use super::Hooks;

static RE_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9][a-z0-9_-]*/[a-z0-9][a-z0-9_-]*/)?[a-z0-9][a-z0-9@._+-]*$").unwrap()
});
static RE_TAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*/[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap());

/// Check a package identifier before it ever reaches `brew`
pub fn validate_name(name: &str, package_type: PackageType) -> Result<(), String> {
    let valid = match package_type {
        PackageType::Tap => RE_TAP.is_match(name),
        PackageType::Formula | PackageType::Cask => RE_PACKAGE.is_match(name),
    };
    if valid {
        Ok(())
    } else {
        Err(format!("malformed {package_type} name: {name:?}"))
    }
}

/// A Homebrew package
#[derive(Debug, Clone)]
pub struct BrewPackage {
    pub package: Package,
    pub retry: RetryConfig,
    pub hooks: Hooks,
    client: Client,
}

impl BrewPackage {
    pub fn new(package: Package, client: Client) -> Self {
        Self {
            package,
            retry: RetryConfig::no_retry(),
            hooks: Hooks::default(),
            client,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// Map a brew failure onto the run's two failure kinds
fn classify(e: brewkit::Error) -> ApplyError {
    match e {
        brewkit::Error::Timeout { after, .. } => ApplyError::TimedOut(after),
        e if e.category().is_permanent() => ApplyError::permanent(e.to_string()),
        e => ApplyError::transient(e.to_string()),
    }
}

impl Declaration for BrewPackage {
    fn id(&self) -> String {
        self.package.name.clone()
    }

    fn description(&self) -> String {
        match self.package.package_type {
            PackageType::Tap => format!("Tap {}", self.package.name),
            t => format!("Install {} {} via brew", t, self.package.name),
        }
    }

    fn kind(&self) -> DeclarationKind {
        DeclarationKind::Package
    }

    fn resource_type(&self) -> &'static str {
        match self.package.package_type {
            PackageType::Formula => "brew_formula",
            PackageType::Cask => "brew_cask",
            PackageType::Tap => "brew_tap",
        }
    }

    fn probe(&self) -> Result<ProbeState> {
        let installed = match self.package.package_type {
            PackageType::Tap => self
                .client
                .is_installed(&self.package)?
                .then_some(None),
            PackageType::Formula | PackageType::Cask => {
                self.client.installed_version(&self.package)?.map(Some)
            }
        };

        Ok(match installed {
            Some(version) => ProbeState::Present { details: version },
            None => ProbeState::Absent,
        })
    }

    fn apply(&self, current: &ProbeState, _ctx: &ApplyContext) -> Result<ApplyOutcome, ApplyError> {
        if current.is_present() {
            return Ok(ApplyOutcome::Unchanged);
        }

        log::info!("Installing {} {}", self.package.package_type, self.package.name);
        match self.client.install_with_retry(&self.package, &self.retry) {
            Ok(true) => Ok(ApplyOutcome::Changed),
            Ok(false) => {
                log::debug!("brew reports {} as already installed", self.package.name);
                Ok(ApplyOutcome::Unchanged)
            }
            Err(e) => Err(classify(e)),
        }
    }

    fn triggers(&self) -> Option<&str> {
        self.hooks.action.as_deref()
    }

    fn reminder(&self) -> Option<&str> {
        self.hooks.note.as_deref()
    }
}

/// Backend standing in for a host without Homebrew.
///
/// Every query fails with [`brewkit::Error::BrewNotFound`], so package
/// declarations are skipped instead of aborting the whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingBrew;

impl Backend for MissingBrew {
    fn install(&self, _package: &Package) -> brewkit::Result<()> {
        Err(brewkit::Error::BrewNotFound)
    }

    fn is_installed(&self, _package: &Package) -> brewkit::Result<bool> {
        Err(brewkit::Error::BrewNotFound)
    }

    fn installed_version(&self, _package: &Package) -> brewkit::Result<Option<String>> {
        Err(brewkit::Error::BrewNotFound)
    }
}

#[cfg(test)]
pub mod fake {
    //! Scripted brew backend for tests

    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// Installs into an in-memory set; failures are scripted per package name
    #[derive(Debug, Clone, Default)]
    pub struct FakeBrew {
        pub installed: Arc<Mutex<HashSet<String>>>,
        pub failures: Arc<Mutex<HashMap<String, Vec<brewkit::Error>>>>,
        pub installs: Arc<Mutex<Vec<String>>>,
    }

    impl FakeBrew {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue an error for the next install of `name`
        pub fn fail(&self, name: &str, error: brewkit::Error) {
            self.failures
                .lock()
                .unwrap()
                .entry(name.to_string())
                .or_default()
                .push(error);
        }

        pub fn install_count(&self) -> usize {
            self.installs.lock().unwrap().len()
        }
    }

    impl Backend for FakeBrew {
        fn install(&self, package: &Package) -> brewkit::Result<()> {
            self.installs.lock().unwrap().push(package.name.clone());
            if let Some(queue) = self.failures.lock().unwrap().get_mut(&package.name) {
                if !queue.is_empty() {
                    return Err(queue.remove(0));
                }
            }
            if !self.installed.lock().unwrap().insert(package.name.clone()) {
                return Err(brewkit::Error::AlreadyInstalled {
                    name: package.name.clone(),
                });
            }
            Ok(())
        }

        fn is_installed(&self, package: &Package) -> brewkit::Result<bool> {
            Ok(self.installed.lock().unwrap().contains(&package.name))
        }

        fn installed_version(&self, package: &Package) -> brewkit::Result<Option<String>> {
            Ok(self
                .installed
                .lock()
                .unwrap()
                .contains(&package.name)
                .then(|| "1.0".to_string()))
        }
    }
}
