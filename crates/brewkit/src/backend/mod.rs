//! Backend abstraction for Homebrew operations.
//!
//! The [`Backend`] trait defines the interface for interacting with Homebrew,
//! allowing for different implementations (real CLI, fakes for testing).

pub mod brew;

use crate::error::Result;
use crate::types::Package;

/// Backend trait for Homebrew operations.
pub trait Backend: Send + Sync {
    /// Install a package (or add a tap).
    fn install(&self, package: &Package) -> Result<()>;

    /// Check if a package is installed (or a tap is added).
    fn is_installed(&self, package: &Package) -> Result<bool>;

    /// Installed version of a formula or cask.
    fn installed_version(&self, package: &Package) -> Result<Option<String>>;
}
