use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::completion::CompletionKind;
use crate::error::Error;

const DEFAULT_CONFIG_DIR: &str = "~/.ssh/config.d/";
const DEFAULT_CONFIG_MAIN: &str = "~/.ssh/config";

/// Optional user defaults, read from `<config dir>/ssh-inventory/config.toml`.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub config_dir: String,
    pub config_main: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_dir: DEFAULT_CONFIG_DIR.to_string(),
            config_main: DEFAULT_CONFIG_MAIN.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    pub fn new() -> Self {
        let config_file = dirs::config_dir().map(|dir| dir.join("ssh-inventory").join("config.toml"));
        Self { config_file }
    }

    #[cfg(test)]
    fn with_file(path: PathBuf) -> Self {
        Self {
            config_file: Some(path),
        }
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        let Some(config_file) = self.config_file.as_ref().filter(|path| path.exists()) else {
            return Ok(AppConfig::default());
        };

        tracing::debug!("Loading defaults from {}", config_file.display());
        let content = fs::read_to_string(config_file)
            .with_context(|| format!("Failed to read config file {}", config_file.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_file.display()))
    }
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Completion(CompletionKind),
    SshString(String),
    UpdateConfig,
}

/// Everything an invocation needs, resolved once from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub inventory: PathBuf,
    pub client: Option<String>,
    pub config_dir: PathBuf,
    pub config_main: PathBuf,
    pub quote_opts_quotes: bool,
    pub action: Action,
}

impl Settings {
    pub fn resolve(cli: Cli, defaults: &AppConfig) -> Result<Self> {
        let inventory = expand_tilde(&cli.inventory);
        if !inventory.exists() {
            return Err(Error::InventoryNotFound(cli.inventory).into());
        }

        let action = match (cli.completion, cli.string) {
            (Some(kind), _) => Action::Completion(kind),
            (None, Some(host)) => Action::SshString(host),
            (None, None) => Action::UpdateConfig,
        };

        let config_dir = cli
            .config_dir
            .unwrap_or_else(|| PathBuf::from(&defaults.config_dir));
        let config_main = cli
            .config_main
            .unwrap_or_else(|| PathBuf::from(&defaults.config_main));

        Ok(Self {
            inventory,
            client: cli.client,
            config_dir: expand_tilde(&config_dir),
            config_main: expand_tilde(&config_main),
            quote_opts_quotes: cli.quote_opts_quotes,
            action,
        })
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ssh-inventory").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_file(temp.path().join("config.toml"));
        assert_eq!(manager.load_config().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "config_dir = \"/etc/ssh/clients\"\n").unwrap();

        let config = ConfigManager::with_file(path).load_config().unwrap();
        assert_eq!(config.config_dir, "/etc/ssh/clients");
        assert_eq!(config.config_main, DEFAULT_CONFIG_MAIN);
    }

    #[test]
    fn test_invalid_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "config_dir = [\n").unwrap();
        assert!(ConfigManager::with_file(path).load_config().is_err());
    }

    #[test]
    fn test_resolve_settings() {
        let temp = TempDir::new().unwrap();
        let inventory = temp.path().to_str().unwrap();
        let defaults = AppConfig {
            config_dir: "/srv/ssh/config.d".to_string(),
            config_main: DEFAULT_CONFIG_MAIN.to_string(),
        };

        let settings = Settings::resolve(
            cli(&["--inventory", inventory, "--string", "web1", "--client", "prod"]),
            &defaults,
        )
        .unwrap();
        assert_eq!(settings.action, Action::SshString("web1".to_string()));
        assert_eq!(settings.client.as_deref(), Some("prod"));
        assert_eq!(settings.config_dir, PathBuf::from("/srv/ssh/config.d"));

        let settings = Settings::resolve(
            cli(&["--inventory", inventory, "--config", "--config-main", "/tmp/main"]),
            &defaults,
        )
        .unwrap();
        assert_eq!(settings.action, Action::UpdateConfig);
        assert_eq!(settings.config_main, PathBuf::from("/tmp/main"));
    }

    #[test]
    fn test_missing_inventory_is_fatal() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let err = Settings::resolve(
            cli(&["--inventory", missing.to_str().unwrap(), "--completion", "clients"]),
            &AppConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InventoryNotFound(_))
        ));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde(Path::new("/etc/ssh")), PathBuf::from("/etc/ssh"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/.ssh/config")), home.join(".ssh/config"));
            assert_eq!(expand_tilde(Path::new("~")), home);
        }
    }
}
