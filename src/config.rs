use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::OnboardConfig;

/// Environment variable naming the declaration file
pub const CONFIG_ENV: &str = "ONBOARD_CONFIG";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("onboard"))
}

/// Declaration file format, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Resolve the declaration file.
///
/// An explicit path (from `--config` or `ONBOARD_CONFIG`) wins. Otherwise
/// `onboard.toml` in the config dir, then `onboard.json`.
pub fn resolve_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(path));
    }

    let dir = config_dir()?;
    Ok(default_in(&dir))
}

fn default_in(dir: &Path) -> PathBuf {
    let toml = dir.join("onboard.toml");
    let json = dir.join("onboard.json");
    if !toml.exists() && json.exists() {
        json
    } else {
        toml
    }
}

/// Expand `~` in a user-supplied path
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Parse declaration file content
pub fn parse(content: &str, format: Format) -> Result<OnboardConfig> {
    match format {
        Format::Toml => toml::from_str(content).context("Invalid TOML in declaration file"),
        Format::Json => serde_json::from_str(content).context("Invalid JSON in declaration file"),
    }
}

/// Load and validate the declaration file
pub fn load(path: &Path) -> Result<OnboardConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;

    let config = parse(&content, Format::from_path(path))
        .with_context(|| format!("Could not load {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid declarations in {}", path.display()))?;

    log::debug!(
        "Loaded {} declarations and {} actions from {}",
        config.declarations.len(),
        config.actions.len(),
        path.display()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a/onboard.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/onboard.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/onboard.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("a/onboard")), Format::Toml);
    }

    #[test]
    fn test_default_prefers_toml() {
        let dir = TempDir::new().unwrap();
        assert_eq!(default_in(dir.path()), dir.path().join("onboard.toml"));

        fs::write(dir.path().join("onboard.json"), "{}").unwrap();
        assert_eq!(default_in(dir.path()), dir.path().join("onboard.json"));

        fs::write(dir.path().join("onboard.toml"), "").unwrap();
        assert_eq!(default_in(dir.path()), dir.path().join("onboard.toml"));
    }

    #[test]
    fn test_load_toml_and_json() {
        let dir = TempDir::new().unwrap();

        let toml_path = dir.path().join("onboard.toml");
        fs::write(
            &toml_path,
            "[[declarations]]\nkind = \"package\"\nname = \"jq\"\n",
        )
        .unwrap();
        assert_eq!(load(&toml_path).unwrap().declarations.len(), 1);

        let json_path = dir.path().join("onboard.json");
        fs::write(
            &json_path,
            r#"{"declarations": [{"kind": "manual", "text": "Sign in to iCloud"}]}"#,
        )
        .unwrap();
        assert_eq!(load(&json_path).unwrap().declarations.len(), 1);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        assert!(load(&dir.path().join("missing.toml")).is_err());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[[declarations]\n").unwrap();
        let err = load(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid TOML"));

        let dangling = dir.path().join("dangling.toml");
        fs::write(
            &dangling,
            "[[declarations]]\nkind = \"package\"\nname = \"jq\"\naction = \"nope\"\n",
        )
        .unwrap();
        assert!(load(&dangling).is_err());
    }

    #[test]
    fn test_example_file_is_valid() {
        let config = parse(
            include_str!("../config/onboard.example.toml"),
            Format::Toml,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.settings.install_attempts, 3);
        assert_eq!(config.actions.len(), 3);
        assert!(config.unused_actions().is_empty());
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/onboard.toml"), home.join("onboard.toml"));
        assert_eq!(expand("/tmp/onboard.toml"), PathBuf::from("/tmp/onboard.toml"));
    }
}
