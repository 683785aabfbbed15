//! Configuration loading.
//!
//! Configuration comes either from a YAML file or from the process
//! environment. Both paths end in the same validation.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{
    ConfigError, EmptyDispatchTargetSnafu, EmptyLogPathSnafu, MissingBucketPlaceholderSnafu,
    MissingEnvSnafu, ReadFileSnafu, YamlParseSnafu,
};

/// Placeholder substituted with the notification's bucket name.
pub const BUCKET_PLACEHOLDER: &str = "{bucket}";

pub const ENV_SOURCE_URL_TEMPLATE: &str = "INGEST_SOURCE_URL_TEMPLATE";
pub const ENV_DISPATCH_TARGET: &str = "INGEST_DISPATCH_TARGET";
pub const ENV_LOG_PATH: &str = "INGEST_LOG_PATH";
pub const ENV_STORE_ONLY_ERRORS: &str = "STORE_ONLY_ERRORS";

/// Main configuration structure for the intake pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    pub dispatch: DispatchConfig,
    pub diagnostics: DiagnosticsConfig,
}

/// Where uploaded event files are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Storage URL with a `{bucket}` placeholder, e.g. "s3://{bucket}" or
    /// "/var/drop/{bucket}".
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Storage options (credentials, region, etc.)
    #[serde(default)]
    pub storage_options: HashMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            storage_options: HashMap::new(),
        }
    }
}

fn default_url_template() -> String {
    format!("s3://{BUCKET_PLACEHOLDER}")
}

impl SourceConfig {
    /// Resolve the storage URL for a bucket.
    pub fn url_for_bucket(&self, bucket: &str) -> String {
        self.url_template.replace(BUCKET_PLACEHOLDER, bucket)
    }
}

/// Downstream dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Identifier of the downstream consumer batches are addressed to.
    pub target: String,

    /// Capacity of the in-process dispatch channel (default: 64).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    64
}

/// Diagnostic log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Storage URL under which log entries are written.
    pub log_path: String,

    /// Storage options for the log location.
    #[serde(default)]
    pub storage_options: HashMap<String, String>,

    /// Drop every diagnostic whose type is not `error`.
    #[serde(default)]
    pub store_only_errors: bool,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).context(ReadFileSnafu)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).context(YamlParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &str| {
            lookup(name).context(MissingEnvSnafu {
                name: name.to_string(),
            })
        };

        let config = Config {
            source: SourceConfig {
                url_template: lookup(ENV_SOURCE_URL_TEMPLATE)
                    .unwrap_or_else(default_url_template),
                storage_options: HashMap::new(),
            },
            dispatch: DispatchConfig {
                target: required(ENV_DISPATCH_TARGET)?,
                channel_capacity: default_channel_capacity(),
            },
            diagnostics: DiagnosticsConfig {
                log_path: required(ENV_LOG_PATH)?,
                storage_options: HashMap::new(),
                // Only the exact string "true" enables the filter.
                store_only_errors: lookup(ENV_STORE_ONLY_ERRORS).as_deref() == Some("true"),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.dispatch.target.is_empty(), EmptyDispatchTargetSnafu);
        ensure!(!self.diagnostics.log_path.is_empty(), EmptyLogPathSnafu);
        ensure!(
            self.source.url_template.contains(BUCKET_PLACEHOLDER),
            MissingBucketPlaceholderSnafu {
                template: self.source.url_template.clone(),
            }
        );
        Ok(())
    }
}
