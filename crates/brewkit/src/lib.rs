//! # brewkit
//!
//! Small Rust library for driving Homebrew.
//!
//! This crate provides:
//! - Probing whether a tap, formula or cask is installed
//! - Installing packages with bounded run time
//! - Classifying brew failures (network, lock, not found, ...) from stderr
//! - Retrying transient failures with exponential backoff
//!
//! ## Example
//!
//! ```no_run
//! use brewkit::{Client, Package};
//!
//! let client = Client::new().expect("Homebrew not available");
//! let jq = Package::formula("jq");
//! if !client.is_installed(&jq).expect("probe failed") {
//!     client.install(&jq).expect("install failed");
//! }
//! ```
//!
//! ## Retry Logic
//!
//! Network errors, lock contention and timeouts are retried with
//! exponential backoff. Configure retry behavior with [`RetryConfig`].
//!
//! ```no_run
//! use brewkit::{Client, Package, RetryConfig};
//! use std::time::Duration;
//!
//! let client = Client::new().unwrap();
//! let config = RetryConfig::new(3, Duration::from_secs(5), 2.0);
//! client.install_with_retry(&Package::cask("firefox"), &config).unwrap();
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod process;
pub mod retry;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{Package, PackageType, RetryConfig};

use backend::{Backend, brew::BrewBackend};
use std::sync::Arc;

/// High-level client for Homebrew operations.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct Client {
    backend: Arc<dyn Backend>,
}

impl Client {
    /// Create a new Client with the default backend.
    ///
    /// Returns an error if Homebrew is not installed.
    pub fn new() -> Result<Self> {
        Ok(Self::with_backend(BrewBackend::new()?))
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Install a package.
    ///
    /// Returns `false` when brew reports the package as already installed.
    pub fn install(&self, package: &Package) -> Result<bool> {
        match self.backend.install(package) {
            Ok(()) => Ok(true),
            Err(e) if e.is_ignorable() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Install a package, retrying transient failures.
    pub fn install_with_retry(&self, package: &Package, config: &RetryConfig) -> Result<bool> {
        retry::with_retry(config, Some(&retry::LogCallback), || self.install(package))
    }

    /// Check if a package is installed.
    pub fn is_installed(&self, package: &Package) -> Result<bool> {
        self.backend.is_installed(package)
    }

    /// Get the installed version of a package.
    pub fn installed_version(&self, package: &Package) -> Result<Option<String>> {
        self.backend.installed_version(package)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        installs: Mutex<Vec<Result<()>>>,
    }

    impl Backend for Scripted {
        fn install(&self, _package: &Package) -> Result<()> {
            self.installs.lock().unwrap().remove(0)
        }
        fn is_installed(&self, _package: &Package) -> Result<bool> {
            Ok(false)
        }
        fn installed_version(&self, _package: &Package) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn test_already_installed_is_success() {
        let client = Client::with_backend(Scripted {
            installs: Mutex::new(vec![Err(Error::AlreadyInstalled { name: "git".into() })]),
        });
        assert!(!client.install(&Package::formula("git")).unwrap());
    }

    #[test]
    fn test_install_with_retry_recovers_from_lock() {
        let client = Client::with_backend(Scripted {
            installs: Mutex::new(vec![
                Err(Error::Locked {
                    message: "Another active Homebrew process".into(),
                }),
                Ok(()),
            ]),
        });
        let config = RetryConfig::new(2, std::time::Duration::from_millis(1), 1.0);
        assert!(client.install_with_retry(&Package::formula("jq"), &config).unwrap());
    }
}
