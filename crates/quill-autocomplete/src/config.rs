//! Autocomplete configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `QUILL_`-prefixed environment variables. Nested keys use a double
//! underscore, e.g. `QUILL_PROVIDER__MODEL=gpt-4o`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::keymap::KeyCombo;

/// Default debounce after the last edit before a fetch starts
pub const DEFAULT_DEBOUNCE_MS: u64 = 3000;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "QUILL";

/// Top-level autocomplete settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteConfig {
    /// Master switch for ghost suggestions
    pub enabled: bool,
    /// Quiet period after the last edit, in milliseconds
    pub debounce_ms: u64,
    /// Abort in-flight requests once superseded instead of letting them finish
    pub abort_superseded_fetches: bool,
    /// Completion endpoint settings
    pub provider: ProviderConfig,
    /// Key bindings for the autocomplete commands
    pub keymap: KeymapConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl AutocompleteConfig {
    /// [`Self::debounce_ms`] as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check value ranges and key binding syntax
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::validation(
                "debounce_ms must be greater than 0",
            ));
        }
        self.provider.validate()?;
        self.keymap.validate()?;
        Ok(())
    }
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            abort_superseded_fetches: true,
            provider: ProviderConfig::default(),
            keymap: KeymapConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Settings for the OpenAI-compatible completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the API, without the `/chat/completions` suffix
    pub base_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Upper bound on tokens generated per suggestion
    pub max_tokens: u32,
    /// Sampling temperature, 0.0 to 2.0
    pub temperature: f32,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl ProviderConfig {
    /// [`Self::timeout_ms`] as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::validation(format!(
                "provider.base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::validation("provider.model must not be empty"));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::validation(
                "provider.max_tokens must be greater than 0",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::validation(format!(
                "provider.temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::validation(
                "provider.timeout_ms must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 32,
            temperature: 0.3,
            timeout_ms: 10_000,
        }
    }
}

/// Key bindings for the autocomplete commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeymapConfig {
    /// Accept the visible suggestion
    pub commit: String,
    /// Accept, or request a suggestion
    pub advance: String,
    /// Request a suggestion now
    pub trigger: String,
    /// Hide the visible suggestion
    pub dismiss: String,
}

impl KeymapConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for binding in [&self.commit, &self.advance, &self.trigger, &self.dismiss] {
            binding.parse::<KeyCombo>()?;
        }
        Ok(())
    }
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self {
            commit: "Tab".to_string(),
            advance: "Right".to_string(),
            trigger: "Ctrl+Space".to_string(),
            dismiss: "Escape".to_string(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `quill_autocomplete=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Loads and saves [`AutocompleteConfig`]
pub struct ConfigLoader {
    /// Configuration file path
    path: PathBuf,
    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Loader for the default per-user config file
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Loader for a specific file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment variable prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// `<config dir>/quill/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
            .join("config.toml")
    }

    /// Path of the configuration file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load defaults, the file (if present) and environment overrides, then validate
    pub fn load(&self) -> Result<AutocompleteConfig, ConfigError> {
        debug!(path = %self.path.display(), prefix = %self.env_prefix, "Loading configuration");

        let builder = Config::builder()
            .add_source(File::from(self.path.clone()).required(false))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AutocompleteConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate and write the configuration as TOML, creating parent directories
    pub fn save(&self, config: &AutocompleteConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let toml = toml::to_string_pretty(config)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml)?;
        debug!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AutocompleteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce(), Duration::from_millis(3000));
        assert!(config.enabled);
        assert!(config.abort_superseded_fetches);
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let config = AutocompleteConfig {
            debounce_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_bad_temperature_rejected() {
        let mut config = AutocompleteConfig::default();
        config.provider.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_binding_rejected() {
        let mut config = AutocompleteConfig::default();
        config.keymap.trigger = "Ctrl+".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidKeyBinding { .. })
        ));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: AutocompleteConfig = toml::from_str("debounce_ms = 750\n").unwrap();
        assert_eq!(config.debounce_ms, 750);
        assert_eq!(config.provider, ProviderConfig::default());
    }
}
