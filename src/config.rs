//! Layered runtime configuration
//!
//! Precedence, lowest to highest: built-in defaults, TOML configuration
//! file, environment variables, CLI arguments. The merged configuration is
//! validated once before anything network-facing is constructed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::{Cli, UriSeverityArg};
use crate::error::{ConfigError, ConfigResult};

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub vocabulary: VocabularyConfig,
    pub checks: ChecksConfig,
    pub output: OutputConfig,
}

/// API connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API, e.g. `https://omeka.example.org/api`
    pub base_url: Option<String>,
    /// Restrict item queries to one item set
    pub item_set_id: Option<u64>,
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum concurrent API requests
    pub max_concurrent_requests: usize,
}

/// Vocabulary dataset settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Path to the JSON vocabulary dataset
    pub path: PathBuf,
}

/// Optional check settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ChecksConfig {
    /// Probe URI-typed field values over HTTP
    pub check_uris: bool,
    /// Report cross-domain redirects during URI checks
    pub check_redirects: bool,
    /// Severity for failed URI checks (404 is always an error)
    pub uri_check_severity: UriSeverityArg,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
    /// Plain-text report destination
    pub report_path: Option<PathBuf>,
    /// Export findings as CSV files
    pub export_csv: bool,
    /// Directory for CSV exports
    pub csv_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            item_set_id: None,
            timeout_seconds: 30,
            max_concurrent_requests: 10,
        }
    }
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/vocabularies.json"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            quiet: false,
            report_path: None,
            export_csv: false,
            csv_dir: PathBuf::from("reports"),
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> ConfigResult<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path).await?;
            config = file_config;
        }

        config = Self::apply_environment_overrides(config)?;
        config = Self::merge_with_cli(config, cli);
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Config> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> ConfigResult<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> ConfigResult<Config> {
        if let Some(base_url) = env.get("OMEKA_URL") {
            config.api.base_url = Some(base_url);
        }

        if let Some(item_set_id) = env.get("OMEKA_ITEM_SET_ID") {
            config.api.item_set_id = Some(item_set_id.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid OMEKA_ITEM_SET_ID value: {item_set_id}"
                ))
            })?);
        }

        if let Some(timeout) = env.get("OMEKA_TIMEOUT") {
            config.api.timeout_seconds = timeout.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid OMEKA_TIMEOUT value: {timeout}"))
            })?;
        }

        if let Some(path) = env.get("OMEKA_VOCABULARIES") {
            config.vocabulary.path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration. Only flags the user actually
    /// passed override the lower layers; unset flags leave file and
    /// environment values in place.
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if cli.base_url.is_some() {
            config.api.base_url = cli.base_url.clone();
        }
        if cli.item_set_id.is_some() {
            config.api.item_set_id = cli.item_set_id;
        }
        if let Some(timeout) = cli.timeout {
            config.api.timeout_seconds = timeout;
        }
        if let Some(concurrency) = cli.concurrency {
            config.api.max_concurrent_requests = concurrency;
        }

        if let Some(vocabularies) = &cli.vocabularies {
            config.vocabulary.path = vocabularies.clone();
        }

        if cli.check_uris {
            config.checks.check_uris = true;
        }
        if cli.check_redirects {
            config.checks.check_redirects = true;
        }
        if let Some(severity) = cli.uri_check_severity {
            config.checks.uri_check_severity = severity;
        }

        if cli.verbose {
            config.output.verbose = true;
        }
        if cli.quiet {
            config.output.quiet = true;
        }
        if cli.output.is_some() {
            config.output.report_path = cli.output.clone();
        }
        if cli.export_csv {
            config.output.export_csv = true;
        }
        if let Some(csv_dir) = &cli.csv_dir {
            config.output.csv_dir = csv_dir.clone();
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> ConfigResult<()> {
        let Some(base_url) = &config.api.base_url else {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                value: "<unset>".to_string(),
                reason: "base URL is required (flag, config file or OMEKA_URL)".to_string(),
            });
        };
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                value: base_url.clone(),
                reason: "must start with http:// or https://".to_string(),
            });
        }

        if config.api.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_seconds".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if config.api.max_concurrent_requests == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.max_concurrent_requests".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::InvalidValue {
                field: "output".to_string(),
                value: "verbose + quiet".to_string(),
                reason: "cannot enable both verbose and quiet modes".to_string(),
            });
        }

        Ok(())
    }
}
