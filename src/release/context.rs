// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release request, phase state and the per-run context.

use std::fmt;
use std::path::{Path, PathBuf};

use bon::Builder;
use serde::Serialize;

use super::central::CentralStore;
use super::metadata::{PackageMetadata, Variant};
use crate::vcs::RevisionHandle;
use crate::version::Version;

/// Pipeline state. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Created,
    PreBuild,
    Build,
    Install,
    PostInstall,
    Done,
    Failed,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::PreBuild => "pre_build",
            Self::Build => "build",
            Self::Install => "install",
            Self::PostInstall => "post_install",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of one release run.
#[derive(Debug, Clone, Builder)]
pub struct ReleaseRequest {
    /// Package directory holding `package.yaml`.
    #[builder(setters(name = with_path), into)]
    path: PathBuf,
    /// Commit message. Prompted for when absent.
    #[builder(setters(name = with_message), into)]
    message: Option<String>,
    /// Parallelism hint for the build tool.
    #[builder(setters(name = with_jobs), default = 1)]
    jobs: usize,
    /// Pinned build time in epoch seconds, 0 meaning "now".
    #[builder(setters(name = with_build_time), default = 0)]
    build_time: i64,
    #[builder(setters(name = with_allow_not_latest), default = false)]
    allow_not_latest: bool,
    /// Release mode name. Auto-detected when absent.
    #[builder(setters(name = with_backend), into)]
    backend: Option<String>,
}

impl ReleaseRequest {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub const fn jobs(&self) -> usize {
        self.jobs
    }

    #[must_use]
    pub const fn build_time(&self) -> i64 {
        self.build_time
    }

    #[must_use]
    pub const fn allow_not_latest(&self) -> bool {
        self.allow_not_latest
    }

    #[must_use]
    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }
}

/// State gathered by pre-build. Read-only for the later phases.
#[derive(Debug, Clone)]
pub struct ReleaseContext {
    pub metadata: PackageMetadata,
    pub store: CentralStore,
    /// Whether the family uuid file already existed.
    pub uuid_recorded: bool,
    pub variants: Vec<Variant>,
    pub scratch_root: PathBuf,
    /// Build time shared by every variant.
    pub build_time: i64,
    pub jobs: usize,
    pub allow_not_latest: bool,
    /// Computed once from the backend's tags.
    pub last_tagged_version: Option<Version>,
    pub previous_revision: Option<RevisionHandle>,
    /// Source state being released.
    pub revision: RevisionHandle,
    pub changelog: String,
    pub changelog_file: Option<PathBuf>,
    pub commit_message: String,
    pub tag_locator: Option<String>,
}

impl ReleaseContext {
    /// Tag created for this release.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        self.metadata.version.as_str()
    }

    #[must_use]
    pub fn variant_dir(&self, variant: &Variant) -> PathBuf {
        self.scratch_root.join(variant.index.to_string())
    }
}

/// Outcome of a successful release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseSummary {
    pub package: String,
    pub version: String,
    pub backend: String,
    pub tag: String,
    pub revision: RevisionHandle,
    pub install_paths: Vec<PathBuf>,
    pub release_time: i64,
}
