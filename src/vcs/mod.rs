// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Version-control backends for the release pipeline.
//!
//! ```text
//!            BackendRegistry
//!     register(name, factory) / probe_available(path)
//!                   |
//!                   v
//!           dyn VcsBackend
//!   +--------+--------+--------+--------+
//!   |        |        |        |        |
//! base      svn      git       hg    (custom)
//! copy     svn CLI  gix+CLI  hg CLI
//! ```
//!
//! Construction is the probe: a factory either returns a backend bound to
//! the working copy or fails with [`VcsError::Unsupported`], which the
//! registry treats as "does not apply" rather than as an error.

pub mod baseline;
pub mod export;
pub mod git;
pub mod hg;
pub mod registry;
pub(crate) mod shell;
pub mod svn;

#[cfg(test)]
mod test_utils;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{VcsError, VcsResult};
use crate::version::{self, Version};

pub use registry::{BackendFactory, BackendRegistry};

/// Opaque pointer to the source state of a previous release.
///
/// Only used to bound changelog queries. `id` is the backend's native
/// identifier (commit hash, svn revision, hg node); `details` carries
/// extra facts such as branch or remote URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevisionHandle {
    pub id: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl RevisionHandle {
    /// Creates a handle with no extra details.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            details: BTreeMap::new(),
        }
    }

    /// Adds a detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Release note embedded in a commit message between `<release>` markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseNote {
    pub author: String,
    pub message: String,
}

/// Capabilities every version-control backend provides to the pipeline.
///
/// Implementations are bound to one working copy at construction time.
/// Operations run external tools synchronously and surface failures as
/// [`VcsError`]; repository-state problems use [`VcsError::Validation`].
pub trait VcsBackend: Send + Sync {
    /// Registry name of this backend (`base`, `svn`, `git`, `hg`).
    fn name(&self) -> &'static str;

    /// Working copy this backend is bound to.
    fn path(&self) -> &Path;

    /// Rejects working copies that are not in a releasable state.
    fn validate_clean(&self) -> VcsResult<()>;

    /// Every tag visible to this backend.
    fn list_tags(&self) -> VcsResult<Vec<String>>;

    /// Highest parsable version among [`VcsBackend::list_tags`].
    fn last_tagged_version(&self) -> VcsResult<Option<Version>> {
        Ok(version::last_tagged_version(self.list_tags()?))
    }

    /// Fails if a tag for `tag` cannot be created later in the release.
    fn check_tag_available(&self, _tag: &str) -> VcsResult<()> {
        Ok(())
    }

    /// Identifier passed to the build tool so it can record where the
    /// released source lives.
    fn tag_locator(&self, version: &Version) -> VcsResult<Option<String>>;

    /// Writes a clean copy of the source tree into `dest`, which must not exist.
    fn export_source(&self, dest: &Path) -> VcsResult<()>;

    /// Change text between `previous` and the current tip, merges excluded.
    fn changelog(&self, previous: Option<&RevisionHandle>) -> VcsResult<String>;

    /// Resolves a tag name to the revision it was created from.
    fn revision_for_tag(&self, _tag: &str) -> VcsResult<Option<RevisionHandle>> {
        Ok(None)
    }

    /// Current source state of the working copy.
    fn current_revision(&self) -> VcsResult<RevisionHandle>;

    /// Records the release in the VCS. Called last, after every install.
    fn create_tag(&self, name: &str, message: &str) -> VcsResult<()>;

    /// Per-commit summaries since `previous`, used in notifications.
    fn commit_details(&self, _previous: Option<&RevisionHandle>) -> VcsResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// `<release>` notes embedded in commit messages since `previous`.
    fn release_notes(&self, _previous: Option<&RevisionHandle>) -> VcsResult<Vec<ReleaseNote>> {
        Ok(Vec::new())
    }
}

impl std::fmt::Debug for dyn VcsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcsBackend")
            .field("name", &self.name())
            .field("path", &self.path())
            .finish()
    }
}

/// Maps a missing executable to "this backend does not apply".
pub(crate) fn probe_failure(path: &Path, err: VcsError) -> VcsError {
    match err {
        VcsError::ToolNotFound { program } => {
            VcsError::unsupported(path, format!("'{program}' is not installed"))
        }
        VcsError::CommandFailed { message, .. } => VcsError::unsupported(path, message),
        other => other,
    }
}
