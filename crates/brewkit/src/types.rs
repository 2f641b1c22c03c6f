//! Core types for Homebrew package management.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Type of Homebrew package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    /// Homebrew tap (third-party repository)
    Tap,
    /// Homebrew formula (CLI tool)
    Formula,
    /// Homebrew cask (GUI application)
    Cask,
}

impl PackageType {
    /// Short name used in identifiers and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::Formula => "formula",
            Self::Cask => "cask",
        }
    }

    /// Parse a package type from its config name.
    ///
    /// `brew` is accepted as an alias for `formula`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tap" => Some(Self::Tap),
            "formula" | "brew" => Some(Self::Formula),
            "cask" => Some(Self::Cask),
            _ => None,
        }
    }

    /// `brew` flag selecting this type, if any.
    pub fn type_flag(&self) -> Option<&'static str> {
        match self {
            Self::Tap => None,
            Self::Formula => Some("--formula"),
            Self::Cask => Some("--cask"),
        }
    }
}

impl std::fmt::Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package to install.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    /// Package name (e.g., "git", "homebrew/cask-fonts")
    pub name: String,
    /// Type of package
    pub package_type: PackageType,
}

impl Package {
    /// Create a new package with the given name and type.
    pub fn new(name: impl Into<String>, package_type: PackageType) -> Self {
        Self {
            name: name.into(),
            package_type,
        }
    }

    /// Create a tap package.
    pub fn tap(name: impl Into<String>) -> Self {
        Self::new(name, PackageType::Tap)
    }

    /// Create a formula package.
    pub fn formula(name: impl Into<String>) -> Self {
        Self::new(name, PackageType::Formula)
    }

    /// Create a cask package.
    pub fn cask(name: impl Into<String>) -> Self {
        Self::new(name, PackageType::Cask)
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.package_type)
    }
}

/// Configuration for retry logic.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_type_parse() {
        assert_eq!(PackageType::parse("tap"), Some(PackageType::Tap));
        assert_eq!(PackageType::parse("Formula"), Some(PackageType::Formula));
        assert_eq!(PackageType::parse("brew"), Some(PackageType::Formula));
        assert_eq!(PackageType::parse("CASK"), Some(PackageType::Cask));
        assert_eq!(PackageType::parse("mas"), None);
    }

    #[test]
    fn test_package_display() {
        assert_eq!(Package::formula("jq").to_string(), "jq (formula)");
        assert_eq!(Package::tap("homebrew/cask-fonts").to_string(), "homebrew/cask-fonts (tap)");
        assert_eq!(PackageType::Cask.type_flag(), Some("--cask"));
        assert_eq!(PackageType::Tap.type_flag(), None);
    }

    #[test]
    fn test_retry_config_delay() {
        let config = RetryConfig::new(5, Duration::from_secs(10), 2.0);

        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(10));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(20));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(40));
    }

    #[test]
    fn test_retry_config_max_delay() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(30),
            ..RetryConfig::new(5, Duration::from_secs(10), 2.0)
        };

        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(30));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(30));
    }
}
