//! Real Homebrew CLI backend using `brew` commands.

use crate::backend::Backend;
use crate::error::{Error, ErrorCategory, Result};
use crate::process::output_with_timeout;
use crate::types::{Package, PackageType};
use std::path::Path;
use std::process::{Command, Output};
use std::time::Duration;

/// Default budget for read-only queries (`brew info`, `brew tap`).
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(120);
/// Default budget for installs, which may download and build.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(1800);

/// Backend that executes real `brew` commands.
#[derive(Debug, Clone)]
pub struct BrewBackend {
    /// Path to the brew executable
    brew_path: String,
    query_timeout: Duration,
    install_timeout: Duration,
}

impl BrewBackend {
    /// Create a new `BrewBackend`.
    ///
    /// Returns an error if Homebrew is not installed.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(find_brew()?))
    }

    /// Use an explicit brew executable.
    pub fn with_path(brew_path: impl Into<String>) -> Self {
        Self {
            brew_path: brew_path.into(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
        }
    }

    /// Override the query and install time budgets.
    #[must_use]
    pub fn with_timeouts(mut self, query: Duration, install: Duration) -> Self {
        self.query_timeout = query;
        self.install_timeout = install;
        self
    }

    /// Run a brew command and return output.
    fn run_brew(&self, args: &[&str], timeout: Duration) -> Result<Output> {
        log::debug!("Running: brew {}", args.join(" "));
        let output = output_with_timeout(
            Command::new(&self.brew_path)
                .args(args)
                .env("HOMEBREW_NO_AUTO_UPDATE", "1")
                .env("HOMEBREW_NO_ENV_HINTS", "1"),
            timeout,
        )
        .map_err(|e| Error::CommandFailed {
            message: "failed to execute brew".to_string(),
            stderr: e.to_string(),
        })?;

        output.ok_or_else(|| Error::Timeout {
            command: args.first().copied().unwrap_or_default().to_string(),
            after: timeout,
        })
    }

    /// Run a brew command and check for success.
    fn run_brew_checked(
        &self,
        args: &[&str],
        timeout: Duration,
        package_name: Option<&str>,
    ) -> Result<String> {
        let output = self.run_brew(args, timeout)?;

        if !output.status.success() {
            return Err(failure(&output, package_name));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// `brew info --json=v2` for a single formula or cask.
    ///
    /// None only when brew reports the package as unknown; any other failure
    /// is an error so the caller never mistakes it for "not installed".
    fn info(&self, package: &Package) -> Result<Option<serde_json::Value>> {
        let Some(flag) = package.package_type.type_flag() else {
            return Ok(None);
        };
        let output = self.run_brew(&["info", "--json=v2", flag, &package.name], self.query_timeout)?;
        if !output.status.success() {
            let err = failure(&output, Some(&package.name));
            if err.category() == ErrorCategory::NotFound {
                log::debug!("brew does not know {}", package.name);
                return Ok(None);
            }
            return Err(err);
        }
        Ok(Some(serde_json::from_slice(&output.stdout)?))
    }
}

impl Backend for BrewBackend {
    fn install(&self, package: &Package) -> Result<()> {
        let args = match package.package_type {
            PackageType::Tap => vec!["tap", package.name.as_str()],
            PackageType::Formula => vec!["install", "--formula", package.name.as_str()],
            PackageType::Cask => vec!["install", "--cask", package.name.as_str()],
        };

        self.run_brew_checked(&args, self.install_timeout, Some(&package.name))?;
        Ok(())
    }

    fn is_installed(&self, package: &Package) -> Result<bool> {
        match package.package_type {
            PackageType::Tap => {
                let stdout = self.run_brew_checked(&["tap"], self.query_timeout, None)?;
                Ok(tap_listed(&stdout, &package.name))
            }
            PackageType::Formula | PackageType::Cask => {
                Ok(self.installed_version(package)?.is_some())
            }
        }
    }

    fn installed_version(&self, package: &Package) -> Result<Option<String>> {
        Ok(self
            .info(package)?
            .and_then(|json| installed_version(&json, package.package_type)))
    }
}

/// Error for a brew command that exited unsuccessfully
fn failure(output: &Output, package_name: Option<&str>) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if output.status.code().is_none() {
        return Error::CommandFailed {
            message: "brew was terminated by a signal".to_string(),
            stderr: stderr.trim().to_string(),
        };
    }
    Error::from_brew_output(&stderr, package_name)
}

/// Find the brew executable path.
fn find_brew() -> Result<String> {
    let paths = [
        "/opt/homebrew/bin/brew",              // Apple Silicon
        "/usr/local/bin/brew",                 // Intel
        "/home/linuxbrew/.linuxbrew/bin/brew", // Linux
    ];

    for path in &paths {
        if Path::new(path).exists() {
            return Ok((*path).to_string());
        }
    }

    let output = Command::new("which")
        .arg("brew")
        .output()
        .map_err(|_| Error::BrewNotFound)?;

    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Ok(path);
        }
    }

    Err(Error::BrewNotFound)
}

/// Whether `brew tap` output lists the tap. Tap names are case-insensitive.
fn tap_listed(stdout: &str, name: &str) -> bool {
    stdout.lines().any(|t| t.trim().eq_ignore_ascii_case(name))
}

/// Extract the installed version from `brew info --json=v2` output.
fn installed_version(json: &serde_json::Value, package_type: PackageType) -> Option<String> {
    match package_type {
        PackageType::Cask => json["casks"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["installed"].as_str())
            .map(str::to_string),
        PackageType::Formula => json["formulae"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|f| f["installed"].as_array())
            .and_then(|arr| arr.first())
            .and_then(|i| i["version"].as_str())
            .map(str::to_string),
        PackageType::Tap => None,
    }
}
