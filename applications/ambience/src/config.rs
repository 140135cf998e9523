/// Application configuration
use crate::error::{AppError, Result};
use ambience_resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "ambience.toml";

/// Prefix for environment overrides, e.g. `AMBIENCE_RESOLVER__PROGRAM`
pub const ENV_PREFIX: &str = "AMBIENCE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// JSON file holding resources and the last played entry
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// Fallback log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub resolver: ResolverSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolverSettings {
    #[serde(default = "default_program")]
    pub program: PathBuf,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default = "default_locate_program")]
    pub locate_program: PathBuf,

    /// Seconds before a running helper is killed; unset waits forever
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            log_filter: default_log_filter(),
            resolver: ResolverSettings::default(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            format: default_format(),
            locate_program: default_locate_program(),
            timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default `ambience.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        settings = match path {
            Some(path) => settings.add_source(config::File::from(path).required(true)),
            None => settings
                .add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        // Override with environment variables (prefixed with AMBIENCE_)
        settings = settings.add_source(env);

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.resolver.program.as_os_str().is_empty() {
            return Err(AppError::Config(
                "resolver.program must not be empty".to_string(),
            ));
        }

        if self.resolver.locate_program.as_os_str().is_empty() {
            return Err(AppError::Config(
                "resolver.locate_program must not be empty".to_string(),
            ));
        }

        if self.resolver.format.trim().is_empty() {
            return Err(AppError::Config(
                "resolver.format must not be empty".to_string(),
            ));
        }

        if self.resolver.timeout_secs == Some(0) {
            return Err(AppError::Config(
                "resolver.timeout_secs must be positive (omit it to disable the timeout)"
                    .to_string(),
            ));
        }

        if self.settings_path.as_os_str().is_empty() {
            return Err(AppError::Config(
                "settings_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            program: self.resolver.program.clone(),
            format: self.resolver.format.clone(),
            locate_program: self.resolver.locate_program.clone(),
            timeout: self.resolver.timeout_secs.map(Duration::from_secs),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

// Default values
fn default_settings_path() -> PathBuf {
    PathBuf::from("ambience.json")
}

fn default_log_filter() -> String {
    "ambience=info".to_string()
}

fn default_program() -> PathBuf {
    PathBuf::from(ambience_resolver::DEFAULT_PROGRAM)
}

fn default_format() -> String {
    ambience_resolver::DEFAULT_FORMAT.to_string()
}

fn default_locate_program() -> PathBuf {
    PathBuf::from(ambience_resolver::DEFAULT_LOCATE_PROGRAM)
}
