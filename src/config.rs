//! OpenAPIA Configuration Module
//!
//! Settings live in `openapia.toml`, found in the working directory or the
//! nearest ancestor that has one, or passed explicitly with `--config`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Command-line flags
//! 2. Environment variables (`OPENAPIA_MAX_DEPTH`, `OPENAPIA_FORMAT`)
//! 3. Config file (`openapia.toml`)
//! 4. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SpecError};
use crate::resolver::DEFAULT_MAX_DEPTH;
use crate::store::Format;

/// File name searched for by [`Config::discover`]
pub const CONFIG_FILE_NAME: &str = "openapia.toml";

/// How `validate` prints its report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResolverSettings {
    /// Maximum inheritance chain length
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_true")]
    pub show_warnings: bool,

    /// Used by `merge` when the output extension names no format
    #[serde(default = "default_merge_format")]
    pub merge_format: Format,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            show_warnings: true,
            merge_format: default_merge_format(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_merge_format() -> Format {
    Format::Yaml
}

impl Config {
    /// Parse a config from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SpecError::Config {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Load configuration from an explicit file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SpecError::Config {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "loaded config");
        Self::from_toml(&content).map_err(|e| match e {
            SpecError::Config { reason } => SpecError::Config {
                reason: format!("{} ({})", reason, path.display()),
            },
            other => other,
        })
    }

    /// Nearest `openapia.toml` at or above `start`
    pub fn find(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load the nearest config at or above `start`, or defaults when none
    /// exists. A config that exists but is malformed is an error.
    pub fn discover(start: &Path) -> Result<Self> {
        match Self::find(start) {
            Some(path) => Self::load(&path),
            None => {
                debug!(start = %start.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// [`Config::with_env`] over an arbitrary variable lookup
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(depth) = lookup("OPENAPIA_MAX_DEPTH").filter(|v| !v.is_empty()) {
            self.resolver.max_depth = depth.trim().parse().map_err(|_| SpecError::Config {
                reason: format!("OPENAPIA_MAX_DEPTH must be a positive integer, got '{}'", depth),
            })?;
        }

        if let Some(format) = lookup("OPENAPIA_FORMAT").filter(|v| !v.is_empty()) {
            self.output.format = match format.trim().to_ascii_lowercase().as_str() {
                "text" => OutputFormat::Text,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(SpecError::Config {
                        reason: format!("OPENAPIA_FORMAT must be text or json, got '{}'", format),
                    })
                }
            };
        }

        if self.resolver.max_depth == 0 {
            return Err(SpecError::Config {
                reason: "resolver.max_depth must be at least 1".to_string(),
            });
        }

        Ok(self)
    }
}
