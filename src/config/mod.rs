pub mod settings;

pub use settings::{Config, DebugLogRotation, ProviderSettings, ProvidersConfig};

use crate::search::providers::ProviderKind;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory (`~/.config/newsdesk`)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Failed to get config directory")?
        .join("newsdesk");

    // Create config directory if it doesn't exist
    fs::create_dir_all(&config_dir)
        .context("Failed to create config directory")?;

    Ok(config_dir)
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load configuration from file, or create default if not exists.
/// Environment key overrides are applied to the returned value only.
pub fn load_or_create_config() -> Result<Config> {
    let path = config_path()?;
    let mut config = load_or_create_config_at(&path)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Load configuration from `path`, writing the default template there first if
/// the file does not exist
pub fn load_or_create_config_at(path: &Path) -> Result<Config> {
    if path.exists() {
        // Load existing config
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    } else {
        // Create default config
        let config = Config::default();
        save_config_at(&config, path)?;

        eprintln!("Created default config at: {}", path.display());
        eprintln!("Please edit this file to add your news API keys.");

        Ok(config)
    }
}

/// Save configuration to the default location
pub fn save_config(config: &Config) -> Result<()> {
    save_config_at(config, &config_path()?)
}

pub fn save_config_at(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config)
        .context("Failed to serialize config")?;
    fs::write(path, content)
        .context("Failed to write config file")?;
    Ok(())
}

/// Replace provider keys with non-empty `NEWSDESK_<PROVIDER>_KEY` values
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    for kind in ProviderKind::ALL {
        let Some(value) = lookup(kind.env_var()) else { continue };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        tracing::debug!(provider = %kind, var = kind.env_var(), "api key taken from environment");
        config.providers.get_mut(kind).api_key = value.to_string();
    }
}

pub(crate) fn expand_tilde(raw: &str) -> String {
    if raw == "~" || raw.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let suffix = raw.strip_prefix('~').unwrap_or("");
            return format!("{}{}", home.display(), suffix);
        }
    }
    raw.to_string()
}
