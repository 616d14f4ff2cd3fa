//! Configuration management.
//!
//! postflow configuration can come from:
//! - Config file (~/.config/postflow/config.toml)
//! - Environment variables (POSTFLOW_*)
//!
//! Only the CLI loads configuration. Library functions take every setting
//! as an explicit argument.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::templates::DEFAULT_HTTP_METHOD;

/// postflow configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Template defaults
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Output formatting
    #[serde(default)]
    pub output: OutputConfig,
}

/// Template defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// HTTP method used by `webhook-forward` when none is given
    #[serde(default = "default_http_method")]
    pub http_method: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            http_method: default_http_method(),
        }
    }
}

fn default_http_method() -> String {
    DEFAULT_HTTP_METHOD.to_string()
}

/// Serialization format for emitted graphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(Error::Config(format!(
                "Unknown output format '{}'. Expected json or yaml",
                other
            ))),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from default locations.
    pub fn load() -> Self {
        let mut config = Self::default();

        let path = Self::config_dir().join("config.toml");
        match Self::load_partial_from_path(&path) {
            Ok(Some(partial)) => config.apply_partial(partial),
            Ok(None) => {}
            Err(e) => tracing::warn!(path = %path.display(), "ignoring config file: {}", e),
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Get the config directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("postflow"))
            .unwrap_or_else(|| PathBuf::from(".postflow"))
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(method) = var("POSTFLOW_HTTP_METHOD") {
            if !method.trim().is_empty() {
                self.templates.http_method = method.trim().to_uppercase();
            }
        }
        if let Some(format) = var("POSTFLOW_OUTPUT_FORMAT") {
            match format.parse() {
                Ok(parsed) => self.output.format = parsed,
                Err(e) => tracing::warn!("ignoring POSTFLOW_OUTPUT_FORMAT: {}", e),
            }
        }
        if let Some(pretty) = var("POSTFLOW_OUTPUT_PRETTY") {
            if let Ok(parsed) = pretty.parse::<bool>() {
                self.output.pretty = parsed;
            }
        }
    }

    /// Read a partial config; `Ok(None)` when the file does not exist.
    fn load_partial_from_path(path: &Path) -> Result<Option<PartialConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let partial = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(Some(partial))
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(templates) = partial.templates {
            self.templates = templates;
        }
        if let Some(output) = partial.output {
            self.output = output;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    templates: Option<TemplatesConfig>,
    output: Option<OutputConfig>,
}
