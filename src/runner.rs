//! External command execution with a time budget

use anyhow::Result;
use brewkit::process::output_with_timeout;
use std::process::{Command, Output};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", .after.as_secs())]
    Timeout { program: String, after: Duration },
}

/// Run a command and capture its output, killing it after `timeout`
pub fn output(program: &str, args: &[&str], timeout: Duration) -> Result<Output, RunError> {
    log::debug!("Running: {} {}", program, args.join(" "));
    output_with_timeout(Command::new(program).args(args), timeout)
        .map_err(|source| RunError::Spawn {
            program: program.to_string(),
            source,
        })?
        .ok_or_else(|| RunError::Timeout {
            program: program.to_string(),
            after: timeout,
        })
}

/// Run a command and return trimmed stdout, failing on a non-zero exit
pub fn run_checked(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let output = output(program, args, timeout)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_checked_returns_stdout() {
        let out = run_checked("sh", &["-c", "echo '  hi  '"], Duration::from_secs(10)).unwrap();
        assert_eq!(out, "hi");
    }

    #[test]
    fn test_run_checked_reports_stderr() {
        let err = run_checked("sh", &["-c", "echo nope >&2; exit 2"], Duration::from_secs(10))
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_timeout() {
        let err = output("sh", &["-c", "exec sleep 30"], Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, RunError::Timeout { .. }));
    }

    #[test]
    fn test_missing_program() {
        let err = output("onboard-no-such-program", &[], Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }
}
