//! Configuration loading utilities

use crate::schema::Config;
use covid_figs_common::{FigsError, Result as FigsResult};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "COVID_FIGS_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for FigsError {
    fn from(err: ConfigError) -> Self {
        FigsError::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the environment and optional files, then validate it.
    ///
    /// Lookup order: `COVID_FIGS_CONFIG_PATH`, `config.yaml`, `config.yml`,
    /// built-in defaults. Environment overrides are applied last.
    pub fn load() -> FigsResult<Config> {
        Self::load_with(None, |var| env::var(var).ok())
    }

    /// Like [`ConfigLoader::load`], reading variables through `lookup`.
    ///
    /// An explicit `path` takes the place of the file lookup. Environment
    /// overrides apply either way.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> FigsResult<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.map(Path::to_path_buf).or_else(|| {
            lookup(CONFIG_PATH_VAR).map(PathBuf::from).or_else(|| {
                ["config.yaml", "config.yml"]
                    .into_iter()
                    .map(PathBuf::from)
                    .find(|p| p.exists())
            })
        });

        let mut config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::read_file(&path)?
            }
            None => {
                info!("No configuration file found, using defaults");
                Config::default()
            }
        };

        Self::apply_env_overrides(&mut config, lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a specific file, without environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> FigsResult<Config> {
        let config = Self::read_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Config, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn read_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// The `NSP_S3_*` names are accepted for deployments that predate the
    /// `COVID_FIGS_*` names; the latter win when both are set.
    pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |vars: &[&str]| vars.iter().find_map(|v| lookup(*v));

        if let Some(bucket) = first(&["COVID_FIGS_S3_BUCKET", "NSP_S3_BUCKET_NAME"]) {
            debug!("Overriding storage.bucket_name from environment");
            config.storage.bucket_name = bucket;
        }

        if let Some(prefix) = first(&["COVID_FIGS_S3_PREFIX", "NSP_S3_PREFIX"]) {
            debug!("Overriding storage.prefix from environment");
            config.storage.prefix = prefix;
        }

        if let Some(region) = lookup("COVID_FIGS_S3_REGION") {
            config.storage.region = Some(region);
        }

        if let Some(public) = lookup("COVID_FIGS_S3_PUBLIC_READ") {
            config.storage.public_read =
                public.trim().parse().map_err(|e| ConfigError::EnvParseError {
                    var: "COVID_FIGS_S3_PUBLIC_READ".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Some(save_csv) = lookup("COVID_FIGS_SAVE_CSV") {
            config.output.save_csv =
                save_csv.trim().parse().map_err(|e| ConfigError::EnvParseError {
                    var: "COVID_FIGS_SAVE_CSV".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Some(save_figures) = lookup("COVID_FIGS_SAVE_FIGURES") {
            config.output.save_figures =
                save_figures.trim().parse().map_err(|e| ConfigError::EnvParseError {
                    var: "COVID_FIGS_SAVE_FIGURES".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Some(level) = lookup("COVID_FIGS_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ConfigLoader::from_yaml_str(
            r"
storage:
  bucket_name: figs
  prefix: covid/
charts:
  window: 5
",
        )
        .unwrap();

        assert_eq!(config.storage.bucket_name, "figs");
        assert!(config.storage.public_read);
        assert_eq!(config.charts.window, 5);
        assert_eq!(config.charts.span, 3);
        assert_eq!(config.areas.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_prefer_new_names() {
        let mut config = Config::default();
        let lookup = lookup_from(&[
            ("NSP_S3_BUCKET_NAME", "legacy-bucket"),
            ("COVID_FIGS_S3_BUCKET", "new-bucket"),
            ("NSP_S3_PREFIX", "figs"),
            ("COVID_FIGS_S3_PUBLIC_READ", "false"),
        ]);

        ConfigLoader::apply_env_overrides(&mut config, lookup).unwrap();

        assert_eq!(config.storage.bucket_name, "new-bucket");
        assert_eq!(config.storage.prefix, "figs");
        assert!(!config.storage.public_read);
    }

    #[test]
    fn test_env_override_parse_error() {
        let mut config = Config::default();
        let err = ConfigLoader::apply_env_overrides(
            &mut config,
            lookup_from(&[("COVID_FIGS_SAVE_CSV", "sometimes")]),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::EnvParseError { ref var, .. } if var == "COVID_FIGS_SAVE_CSV"));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ConfigLoader::from_yaml_str("charts: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
