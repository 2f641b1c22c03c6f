//! Post-apply actions - restart macOS services or run a command

use anyhow::{Context, Result, bail};
use declarative::ActionRef;
use std::time::Duration;

use crate::runner;
use crate::schema::ActionConfig;

/// Build the action registered under `name`
pub fn action(name: &str, config: &ActionConfig, timeout: Duration) -> Result<ActionRef> {
    match (&config.restart, &config.command) {
        (Some(process), None) => {
            Ok(restart(name, process, timeout).disruptive(config.disruptive.unwrap_or(true)))
        }
        (None, Some(argv)) if !argv.is_empty() => {
            Ok(command(name, argv, timeout).disruptive(config.disruptive.unwrap_or(false)))
        }
        (None, Some(_)) => bail!("action '{name}' has an empty command"),
        (Some(_), Some(_)) => bail!("action '{name}' sets both restart and command"),
        (None, None) => bail!("action '{name}' needs either restart or command"),
    }
}

/// Restart a service via killall; launchd brings it back
pub fn restart(name: &str, process: &str, timeout: Duration) -> ActionRef {
    let process = process.to_string();
    ActionRef::new(name, move || {
        let output = runner::output("killall", &[&process], timeout)?;
        if output.status.success() {
            log::info!("Restarted {process}");
            Ok(())
        } else {
            bail!("{process} may not be running")
        }
    })
}

/// Run an arbitrary command
pub fn command(name: &str, argv: &[String], timeout: Duration) -> ActionRef {
    let argv = argv.to_vec();
    let label = name.to_string();
    ActionRef::new(name, move || {
        let (program, args) = argv
            .split_first()
            .context("empty command")?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        runner::run_checked(program, &args, timeout)
            .with_context(|| format!("action '{label}' failed"))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(restart: Option<&str>, command: Option<&[&str]>) -> ActionConfig {
        ActionConfig {
            restart: restart.map(str::to_string),
            command: command.map(|c| c.iter().map(|s| (*s).to_string()).collect()),
            disruptive: None,
        }
    }

    #[test]
    fn test_restart_is_disruptive_by_default() {
        let a = action("restart-dock", &config(Some("Dock"), None), Duration::from_secs(5)).unwrap();
        assert_eq!(a.name(), "restart-dock");
        assert!(a.is_disruptive());
    }

    #[test]
    fn test_command_is_not_disruptive_by_default() {
        let a = action(
            "rebuild-launch-services",
            &config(None, Some(&["true"])),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(!a.is_disruptive());
    }

    #[test]
    fn test_explicit_disruptive() {
        let mut c = config(None, Some(&["true"]));
        c.disruptive = Some(true);
        assert!(action("x", &c, Duration::from_secs(5)).unwrap().is_disruptive());
    }

    #[test]
    fn test_invalid_configs() {
        let t = Duration::from_secs(5);
        assert!(action("x", &config(None, None), t).is_err());
        assert!(action("x", &config(Some("Dock"), Some(&["true"])), t).is_err());
        assert!(action("x", &config(None, Some(&[])), t).is_err());
    }

    #[test]
    fn test_command_runs() {
        let ok = command("ok", &["true".to_string()], Duration::from_secs(5));
        assert!(ok.run().is_ok());

        let failing = command("bad", &["false".to_string()], Duration::from_secs(5));
        let err = failing.run().unwrap_err();
        assert!(format!("{err:#}").contains("action 'bad' failed"));
    }
}
