use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_BUSY_TIMEOUT_SECS, DEFAULT_CONFIG_FILE, DEFAULT_DATABASE_URL, DEFAULT_MAX_WORKERS,
    ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Run settings, layered: defaults, then the TOML file, then `INMET_*`
/// environment variables, then command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub max_workers: usize,
    pub file_pattern: String,
    pub busy_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
            file_pattern: String::new(),
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings. An explicit `config_file` must exist; the default
    /// `inmet-processor.toml` is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_file, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(config_file: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ProcessingError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                File::from(path).required(true)
            }
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("max_workers", DEFAULT_MAX_WORKERS as i64)?
            .set_default("file_pattern", "")?
            .set_default("busy_timeout_secs", DEFAULT_BUSY_TIMEOUT_SECS as i64)?
            .add_source(file)
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Apply flags given on the command line; `None` keeps the loaded value.
    pub fn with_overrides(
        mut self,
        database_url: Option<String>,
        max_workers: Option<usize>,
        file_pattern: Option<String>,
    ) -> Result<Self> {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(workers) = max_workers {
            self.max_workers = workers;
        }
        if let Some(pattern) = file_pattern {
            self.file_pattern = pattern;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    /// Pool size: one connection per file worker plus one for station lookups.
    pub fn max_connections(&self) -> u32 {
        u32::try_from(self.max_workers + 1).unwrap_or(u32::MAX)
    }

    fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(ProcessingError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(ProcessingError::Config(
                "database_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
