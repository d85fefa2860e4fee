//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path to the site file (default: ./site.yml).
    pub site_file: PathBuf,

    /// Directory holding config entities such as tile placements
    /// (default: ./config).
    pub config_dir: PathBuf,

    /// Directory of template overrides. When None, only the built-in
    /// templates are used.
    pub template_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let site_file = lookup("SITE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./site.yml"));

        let config_dir = lookup("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./config"));

        let template_dir = lookup("TEMPLATE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        if site_file.as_os_str().is_empty() {
            anyhow::bail!("SITE_FILE must not be empty");
        }
        if config_dir.as_os_str().is_empty() {
            anyhow::bail!("CONFIG_DIR must not be empty");
        }
        let config_dir = if config_dir.is_relative() {
            env::current_dir()
                .context("failed to resolve the current directory")?
                .join(config_dir)
        } else {
            config_dir
        };

        Ok(Self {
            site_file,
            config_dir,
            template_dir,
        })
    }
}
