// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for shelf-rs.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. shelf.toml (cwd, optional)
//! 3. --ini files, in order
//! 4. SHELF_* env vars
//! 5. --set overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! SHELF_GLOBAL__LOG_LEVEL=4             → global.log_level = 4
//! SHELF_RELEASE__PACKAGES_PATH=/pkgs    → release.packages_path = "/pkgs"
//! SHELF_VCS__GIT__ALLOW_NO_UPSTREAM=1   → vcs.git.allow_no_upstream = true
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
use types::{GlobalConfig, NotifyConfig, ReleaseConfig, VcsConfig};

/// Local configuration file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "shelf.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SHELF";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub global: GlobalConfig,
    pub release: ReleaseConfig,
    pub notify: NotifyConfig,
    pub vcs: VcsConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shelf_rs::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("shelf.toml")
    ///     .with_env_prefix("SHELF")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Standard loader: local file, `--ini` files, environment, then
    /// `--set` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an override is malformed.
    pub fn standard_loader(ini_files: &[PathBuf], overrides: &[String]) -> Result<ConfigLoader> {
        let mut loader = Self::builder().add_toml_file_optional(LOCAL_CONFIG_FILE);
        for file in ini_files {
            loader = loader.add_toml_file(file);
        }
        loader = loader.with_env_prefix(ENV_PREFIX);
        for assignment in overrides {
            loader = loader.set_assignment(assignment)?;
        }
        Ok(loader)
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Checks values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an absolute scratch directory
    /// or an empty build tool.
    pub fn validate(&self) -> Result<()> {
        if self.release.scratch_dir.is_absolute()
            || self.release.scratch_dir.as_os_str().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                section: "release".to_string(),
                key: "scratch_dir".to_string(),
                message: format!(
                    "must be a non-empty path relative to the package, got '{}'",
                    self.release.scratch_dir.display()
                ),
            }
            .into());
        }
        if self.release.build_tool.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                section: "release".to_string(),
                key: "build_tool".to_string(),
                message: "must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Every effective option as `section.key = value`, sorted by key.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        if let Ok(value) = serde_json::to_value(self) {
            flatten_value(String::new(), &value, &mut options);
        }

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }
}

fn flatten_value(prefix: String, value: &serde_json::Value, out: &mut BTreeMap<String, String>) {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_value(path, child, out);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), String::from))
                .collect::<Vec<_>>()
                .join(", ");
            out.insert(prefix, joined);
        }
        Value::String(s) => {
            out.insert(prefix, s.clone());
        }
        Value::Null => {
            out.insert(prefix, String::new());
        }
        other => {
            out.insert(prefix, other.to_string());
        }
    }
}
