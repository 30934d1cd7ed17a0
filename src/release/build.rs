// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! External build/install tool contract.
//!
//! ```text
//! <tool> --time <epoch> [--variant N] --jobs N [--vcs-tag LOC] [--changelog FILE]
//! <tool> ... --install      prints the central install path on stdout
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bon::Builder;
use futures_util::future::BoxFuture;
use tracing::info;

use crate::core::process::builder::{ProcessBuilder, StreamFlags};
use crate::error::Result;

/// Everything the build tool needs for one variant.
#[derive(Debug, Clone, Builder)]
pub struct BuildInvocation {
    #[builder(setters(name = with_source_dir), into)]
    source_dir: PathBuf,
    #[builder(setters(name = with_build_time))]
    build_time: i64,
    #[builder(setters(name = with_variant))]
    variant: Option<usize>,
    #[builder(setters(name = with_jobs), default = 1)]
    jobs: usize,
    #[builder(setters(name = with_tag_locator))]
    tag_locator: Option<String>,
    #[builder(setters(name = with_changelog_file))]
    changelog_file: Option<PathBuf>,
}

impl BuildInvocation {
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    #[must_use]
    pub const fn build_time(&self) -> i64 {
        self.build_time
    }

    #[must_use]
    pub const fn variant(&self) -> Option<usize> {
        self.variant
    }

    #[must_use]
    pub const fn jobs(&self) -> usize {
        self.jobs
    }

    #[must_use]
    pub fn tag_locator(&self) -> Option<&str> {
        self.tag_locator.as_deref()
    }

    #[must_use]
    pub fn changelog_file(&self) -> Option<&Path> {
        self.changelog_file.as_deref()
    }

    /// Command-line arguments shared by build and install.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--time".to_string(), self.build_time.to_string()];
        if let Some(variant) = self.variant {
            args.push("--variant".to_string());
            args.push(variant.to_string());
        }
        args.push("--jobs".to_string());
        args.push(self.jobs.to_string());
        if let Some(locator) = &self.tag_locator {
            args.push("--vcs-tag".to_string());
            args.push(locator.clone());
        }
        if let Some(changelog) = &self.changelog_file {
            args.push("--changelog".to_string());
            args.push(changelog.display().to_string());
        }
        args
    }
}

/// Builds and installs one variant from an exported source tree.
///
/// Methods return `BoxFuture` so the pipeline can hold a `dyn BuildTool`.
pub trait BuildTool: Send + Sync {
    /// Builds the variant in `invocation.source_dir()`.
    fn build<'a>(&'a self, invocation: &'a BuildInvocation) -> BoxFuture<'a, Result<()>>;

    /// Installs the built variant centrally and returns the install path.
    fn install<'a>(&'a self, invocation: &'a BuildInvocation) -> BoxFuture<'a, Result<PathBuf>>;
}

/// Runs a build tool executable such as `rez-build`.
#[derive(Debug, Clone)]
pub struct ExternalBuildTool {
    program: String,
}

impl ExternalBuildTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Fails with `ProcessError::ExecutableNotFound` when the tool is missing.
    fn command(&self, invocation: &BuildInvocation) -> Result<ProcessBuilder> {
        Ok(ProcessBuilder::which(&self.program)?
            .args(invocation.to_args())
            .cwd(invocation.source_dir())
            .stderr_flags(StreamFlags::FORWARD_TO_LOG | StreamFlags::KEEP_IN_STRING))
    }
}

/// Last non-empty stdout line: the tool may log before printing the path.
pub(crate) fn parse_install_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
}

impl BuildTool for ExternalBuildTool {
    fn build<'a>(&'a self, invocation: &'a BuildInvocation) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            info!(tool = %self.program, dir = %invocation.source_dir().display(), "Building");
            self.command(invocation)?.name("build").run().await?;
            Ok(())
        })
    }

    fn install<'a>(&'a self, invocation: &'a BuildInvocation) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(async move {
            info!(tool = %self.program, dir = %invocation.source_dir().display(), "Installing");
            let output = self
                .command(invocation)?
                .arg("--install")
                .name("install")
                .capture_stdout()
                .run()
                .await?;
            parse_install_path(output.stdout())
                .with_context(|| format!("{} --install printed no install path", self.program))
        })
    }
}
