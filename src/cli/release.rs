// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release command arguments.

use clap::Args;
use std::path::PathBuf;

use crate::release::ReleaseRequest;

/// Arguments for the `release` command.
#[derive(Debug, Clone, Args)]
pub struct ReleaseArgs {
    /// Package directory holding package.yaml.
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Commit message. Opens the configured editor when omitted.
    #[arg(short = 'm', long = "message", value_name = "MSG")]
    pub message: Option<String>,

    /// Parallel jobs for the build tool.
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Build time in epoch seconds shared by all variants, 0 for now.
    #[arg(short = 't', long = "time", value_name = "EPOCH", default_value_t = 0)]
    pub build_time: i64,

    /// Allows releasing a version that is not greater than the latest tag.
    #[arg(long = "allow-not-latest")]
    pub allow_not_latest: bool,

    /// Release mode (base, svn, git, hg). Auto-detected when omitted.
    #[arg(long = "vcs", value_name = "NAME")]
    pub vcs: Option<String>,
}

impl ReleaseArgs {
    /// Pipeline request for these arguments.
    #[must_use]
    pub fn to_request(&self) -> ReleaseRequest {
        ReleaseRequest::builder()
            .with_path(self.path.clone())
            .maybe_with_message(self.message.clone())
            .with_jobs(usize::from(self.jobs))
            .with_build_time(self.build_time)
            .with_allow_not_latest(self.allow_not_latest)
            .maybe_with_backend(self.vcs.clone())
            .build()
    }
}
