//! Configuration source loading and composition

use crate::validation::Validate;
use crate::{ApplicationConfig, ConfigResult, process_env};
use std::path::{Path, PathBuf};

/// A layer that can be applied on top of an existing configuration
pub trait ConfigurationSource: Send + Sync {
    /// Apply this source's values onto `config`
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = higher priority)
    fn priority(&self) -> u8;
}

/// Environment variable overrides
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()> {
        config.apply_env(&process_env);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100 // Highest priority - environment variables override everything
    }
}

/// TOML file; sections and fields missing from the file keep their defaults
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for TomlFileSource {
    fn apply(&self, config: &mut ApplicationConfig) -> ConfigResult<()> {
        let content = std::fs::read_to_string(&self.path)?;
        *config = toml::from_str(&content)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "toml_file"
    }

    fn priority(&self) -> u8 {
        50 // Medium priority - below env vars, above defaults
    }
}

/// Type alias for configuration sources
type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Configuration loader that combines multiple sources
///
/// Sources are applied lowest priority first on top of the built-in defaults,
/// then the result is validated. The loader is reusable, which is how the
/// server reloads its redirect allowlist.
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Loader for the server: optional TOML file, then the environment
    pub fn standard(config_file: Option<&Path>) -> Self {
        let loader = Self::new().add_source(Box::new(EnvironmentSource));
        match config_file {
            Some(path) => loader.add_source(Box::new(TomlFileSource::new(path))),
            None => loader,
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Load configuration from all sources with priority ordering
    ///
    /// Every source was asked for explicitly, so one that fails to load
    /// fails the whole load rather than quietly falling back to defaults.
    ///
    /// # Errors
    /// Returns the first source error, or configuration validation errors
    pub fn load(&self) -> ConfigResult<ApplicationConfig> {
        let mut config = ApplicationConfig::default();

        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            match source.apply(&mut config) {
                Ok(()) => {
                    tracing::debug!("Loaded configuration from source: {}", source.name());
                }
                Err(e) => {
                    tracing::warn!("Failed to load from source {}: {}", source.name(), e);
                    return Err(e);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}
