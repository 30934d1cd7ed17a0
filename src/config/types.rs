// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration sections.
//!
//! ```text
//! Config
//!   global   GlobalConfig   log levels, log file
//!   release  ReleaseConfig  central root, scratch dir, build tool, editor
//!   notify   NotifyConfig   sender, recipients, SMTP endpoint
//!   vcs.git  GitConfig      upstream policy, releasable branches
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::logging::LogLevel;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for console output (0-5).
    pub log_level: LogLevel,
    /// Log level for file output (0-5).
    pub file_log_level: LogLevel,
    /// Path to log file. No file log when unset.
    pub log_file: Option<PathBuf>,
    /// Write the file log as JSON lines.
    pub log_json: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
            log_json: false,
        }
    }
}

/// Release pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Central release root holding every package family.
    pub packages_path: Option<PathBuf>,
    /// Scratch build root, relative to the package directory.
    pub scratch_dir: PathBuf,
    /// External build/install tool.
    pub build_tool: String,
    /// Editor command for interactive commit messages.
    pub editor: Option<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            packages_path: None,
            scratch_dir: PathBuf::from("build/release"),
            build_tool: "rez-build".to_string(),
            editor: None,
        }
    }
}

/// Release notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub from: String,
    /// Recipients separated by `:`, `;`, `,` or whitespace. Empty disables
    /// notification.
    pub to: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            from: "shelf".to_string(),
            to: String::new(),
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
        }
    }
}

impl NotifyConfig {
    /// Individual recipient addresses.
    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        split_recipients(&self.to)
    }
}

/// Splits an address list on `:`, `;`, `,` and whitespace.
#[must_use]
pub fn split_recipients(list: &str) -> Vec<String> {
    list.split(|c: char| matches!(c, ':' | ';' | ',') || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Per-backend VCS settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VcsConfig {
    pub git: GitConfig,
}

/// Git release policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Release without a tracking branch.
    pub allow_no_upstream: bool,
    /// Branch name patterns (regex) releases may be cut from. Empty allows
    /// any branch.
    pub releasable_branches: Vec<String>,
    /// `git log --pretty` format for notification commit details.
    pub commit_details_format: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            allow_no_upstream: false,
            releasable_branches: Vec::new(),
            commit_details_format: "%h %an: %s".to_string(),
        }
    }
}
