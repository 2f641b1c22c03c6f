//! Error types for Homebrew operations.
//!
//! Errors are categorized so callers can decide whether to retry now, retry
//! on a later run, or ask the user to fix their input.

use std::time::Duration;
use thiserror::Error;

/// Categories of Homebrew errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (download, DNS, TLS)
    Network,
    /// Another brew process holds the lock
    Locked,
    /// The brew command ran past its time budget
    Timeout,
    /// Package not found in any tap
    NotFound,
    /// Version or dependency conflict
    Conflict,
    /// Permission denied
    Permission,
    /// Package is already installed
    AlreadyInstalled,
    /// Homebrew not found or not configured
    BrewNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether an immediate retry has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Locked | Self::Timeout)
    }

    /// Whether the failure is caused by the request itself, so repeating it
    /// unchanged will never succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::NotFound | Self::Conflict | Self::Permission)
    }

    /// Whether this error can be safely ignored (operation already done).
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::AlreadyInstalled)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Locked => "Homebrew is busy",
            Self::Timeout => "Timed out",
            Self::NotFound => "Package not found",
            Self::Conflict => "Package conflict",
            Self::Permission => "Permission denied",
            Self::AlreadyInstalled => "Already installed",
            Self::BrewNotFound => "Homebrew not installed",
            Self::Other => "Unexpected error",
        }
    }
}

/// Errors that can occur during Homebrew operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error (connection, DNS, download)
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from brew
        message: String,
    },

    /// Another brew process is running
    #[error("homebrew is locked by another process: {message}")]
    Locked {
        /// Detailed error message from brew
        message: String,
    },

    /// The command was killed after exceeding its timeout
    #[error("brew {command} timed out after {}s", .after.as_secs())]
    Timeout {
        /// The brew subcommand that timed out
        command: String,
        /// Time budget that was exceeded
        after: Duration,
    },

    /// Package not found in any configured tap
    #[error("package not found: {name}")]
    NotFound {
        /// Name of the package that could not be found
        name: String,
    },

    /// Version or dependency conflict
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission {
        /// Details about what permission was denied
        message: String,
    },

    /// Package is already installed
    #[error("already installed: {name}")]
    AlreadyInstalled {
        /// Name of the already-installed package
        name: String,
    },

    /// Homebrew is not installed or not found in PATH
    #[error("Homebrew not found. Install it from https://brew.sh")]
    BrewNotFound,

    /// Command execution failed
    #[error("{message}: {stderr}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network { .. } => ErrorCategory::Network,
            Self::Locked { .. } => ErrorCategory::Locked,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Permission { .. } => ErrorCategory::Permission,
            Self::AlreadyInstalled { .. } => ErrorCategory::AlreadyInstalled,
            Self::BrewNotFound => ErrorCategory::BrewNotFound,
            Self::CommandFailed { .. } | Self::Io(_) | Self::Json(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether this error can be safely ignored.
    pub fn is_ignorable(&self) -> bool {
        self.category().is_ignorable()
    }

    /// Create an error from brew command output.
    ///
    /// Analyzes stderr to categorize the error. Order matters: "already
    /// installed" wins over anything else in the message, and lock contention
    /// is checked before generic network wording.
    pub fn from_brew_output(stderr: &str, package_name: Option<&str>) -> Self {
        let lower = stderr.to_lowercase();
        let name = || package_name.unwrap_or("unknown").to_string();
        let message = || stderr.trim().to_string();

        if lower.contains("already installed") || lower.contains("is already an installed") {
            return Self::AlreadyInstalled { name: name() };
        }

        if lower.contains("another active homebrew")
            || lower.contains("already locked")
            || lower.contains("has already locked")
        {
            return Self::Locked { message: message() };
        }

        if lower.contains("curl")
            || lower.contains("could not resolve")
            || lower.contains("connection refused")
            || lower.contains("connection reset")
            || lower.contains("timed out")
            || lower.contains("network")
            || lower.contains("ssl")
            || lower.contains("failed to download")
            || lower.contains("sha256 mismatch")
        {
            return Self::Network { message: message() };
        }

        if lower.contains("no available formula")
            || lower.contains("no formulae found")
            || lower.contains("no available cask")
            || lower.contains("no cask with this name")
            || lower.contains("repository not found")
            || lower.contains("invalid tap name")
            || lower.contains("couldn't find")
        {
            return Self::NotFound { name: name() };
        }

        if lower.contains("conflict") || lower.contains("cannot install") {
            return Self::Conflict { message: message() };
        }

        if lower.contains("permission denied")
            || lower.contains("operation not permitted")
            || lower.contains("not writable")
        {
            return Self::Permission { message: message() };
        }

        Self::CommandFailed {
            message: format!(
                "brew command failed{}",
                package_name.map(|n| format!(" for {n}")).unwrap_or_default()
            ),
            stderr: message(),
        }
    }
}

/// Result type for Homebrew operations.
pub type Result<T> = std::result::Result<T, Error>;
