//! Configuration for avahictl.
//!
//! Read from `<config_dir>/avahictl/config.toml` when present, or from the
//! path given with `--config`. Every section is optional.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AvahiError, Result};

/// Platform config directory for avahictl
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("avahictl")
}

pub fn default_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
    /// Extra or replacement service type descriptions, e.g.
    /// `"_foo._tcp" = "Foo Server"`
    #[serde(default)]
    pub service_types: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    System,
    Session,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BusConfig {
    #[serde(default)]
    pub kind: BusKind,
    /// Explicit D-Bus address; wins over `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowseConfig {
    /// Empty means the daemon's default domain
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub resolve: bool,
    #[serde(default)]
    pub ignore_local: bool,
    #[serde(default)]
    pub terminate: bool,
    /// Show service type descriptions instead of raw types
    #[serde(default = "default_true")]
    pub lookup_types: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            resolve: false,
            ignore_local: false,
            terminate: false,
            lookup_types: true,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AvahiError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, or the default one if it exists, or
    /// fall back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let path = default_config_path();
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "Loading default config");
                    Self::load_from_file(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(AvahiError::Config(format!(
                    "unknown logging format {:?} (expected \"pretty\" or \"json\")",
                    other
                )))
            }
        }
        if let Some(address) = &self.bus.address {
            if address.trim().is_empty() {
                return Err(AvahiError::Config("bus.address is empty".to_string()));
            }
        }
        Ok(())
    }
}
