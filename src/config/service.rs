//! Configuration service system for dependency injection and test
//! isolation.
//!
//! All configuration access goes through the [`ConfigService`] trait, so
//! commands can be driven by the production file/env-backed service or by
//! a fully controlled in-memory one in tests.

use crate::{Result, config::Config, config::validate_config, error::CutterError};
use config::{Config as ConfigCrate, Environment, File};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Configuration service trait for dependency injection.
pub trait ConfigService: Send + Sync {
    /// Get the current configuration.
    fn get_config(&self) -> Result<Config>;

    /// Reload configuration from sources, discarding cached values.
    fn reload(&self) -> Result<()>;

    /// Save the current configuration to the default file location.
    fn save_config(&self) -> Result<()>;

    /// Get the default configuration file path.
    fn get_config_file_path(&self) -> Result<PathBuf>;

    /// Get a configuration value by dot-separated key path.
    fn get_config_value(&self, key: &str) -> Result<String>;

    /// Set and persist a configuration value by dot-separated key path.
    fn set_config_value(&self, key: &str, value: &str) -> Result<()>;
}

/// Production configuration service.
///
/// Sources, lowest priority first: built-in defaults, the user TOML file,
/// `CUTTER_*` environment variables (`__` separates key segments), and an
/// `OPENAI_API_KEY` fallback for the two credentials.
pub struct ProductionConfigService {
    config_path: PathBuf,
    cached_config: RwLock<Option<Config>>,
}

impl ProductionConfigService {
    /// Create a service reading the default user configuration path.
    ///
    /// `CUTTER_CONFIG_PATH` overrides the file location.
    pub fn new() -> Result<Self> {
        let config_path = match std::env::var("CUTTER_CONFIG_PATH") {
            Ok(custom) => PathBuf::from(custom),
            Err(_) => Self::user_config_path(),
        };
        Ok(Self {
            config_path,
            cached_config: RwLock::new(None),
        })
    }

    /// Create a service reading a specific configuration file.
    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self {
            config_path,
            cached_config: RwLock::new(None),
        }
    }

    fn user_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("silence-cutter")
            .join("config.toml")
    }

    fn load(&self) -> Result<Config> {
        let defaults = ConfigCrate::try_from(&Config::default())?;
        let builder = ConfigCrate::builder()
            .add_source(defaults)
            .add_source(File::from(self.config_path.clone()).required(false))
            .add_source(
                Environment::with_prefix("CUTTER")
                    .separator("__")
                    .try_parsing(true),
            );
        let mut config: Config = builder.build()?.try_deserialize()?;
        config.loaded_from = self.config_path.exists().then(|| self.config_path.clone());

        // Credential fallback shared with the rest of the OpenAI tooling.
        if config.scoring.api_key.is_none() || config.transcription.api_key.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                if !key.is_empty() {
                    config.scoring.api_key.get_or_insert_with(|| key.clone());
                    config.transcription.api_key.get_or_insert(key);
                }
            }
        }

        validate_config(&config)?;
        debug!(
            "configuration loaded (file present: {})",
            config.loaded_from.is_some()
        );
        Ok(config)
    }

    fn write_config_file(&self, config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(config)
            .map_err(|e| CutterError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

impl ConfigService for ProductionConfigService {
    fn get_config(&self) -> Result<Config> {
        {
            let cached = self
                .cached_config
                .read()
                .map_err(|_| CutterError::config("Config cache lock poisoned"))?;
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }
        let config = self.load()?;
        let mut cached = self
            .cached_config
            .write()
            .map_err(|_| CutterError::config("Config cache lock poisoned"))?;
        *cached = Some(config.clone());
        Ok(config)
    }

    fn reload(&self) -> Result<()> {
        let config = self.load()?;
        let mut cached = self
            .cached_config
            .write()
            .map_err(|_| CutterError::config("Config cache lock poisoned"))?;
        *cached = Some(config);
        Ok(())
    }

    fn save_config(&self) -> Result<()> {
        let config = self.get_config()?;
        self.write_config_file(&config, &self.config_path)
    }

    fn get_config_file_path(&self) -> Result<PathBuf> {
        Ok(self.config_path.clone())
    }

    fn get_config_value(&self, key: &str) -> Result<String> {
        self.get_config()?.get_value(key)
    }

    fn set_config_value(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.get_config()?;
        config.set_value(key, value)?;
        self.write_config_file(&config, &self.config_path)?;
        let mut cached = self
            .cached_config
            .write()
            .map_err(|_| CutterError::config("Config cache lock poisoned"))?;
        *cached = Some(config);
        Ok(())
    }
}

/// In-memory configuration service for tests.
pub struct TestConfigService {
    config: RwLock<Config>,
}

impl TestConfigService {
    /// Service with the built-in defaults.
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    /// Service with a caller-provided configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

impl ConfigService for TestConfigService {
    fn get_config(&self) -> Result<Config> {
        Ok(self
            .config
            .read()
            .map_err(|_| CutterError::config("Config lock poisoned"))?
            .clone())
    }

    fn reload(&self) -> Result<()> {
        Ok(())
    }

    fn save_config(&self) -> Result<()> {
        Ok(())
    }

    fn get_config_file_path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/dev/null"))
    }

    fn get_config_value(&self, key: &str) -> Result<String> {
        self.get_config()?.get_value(key)
    }

    fn set_config_value(&self, key: &str, value: &str) -> Result<()> {
        self.config
            .write()
            .map_err(|_| CutterError::config("Config lock poisoned"))?
            .set_value(key, value)
    }
}
