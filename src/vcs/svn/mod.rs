// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Subversion release mode.
//!
//! Tags live next to the `trunk`/`branches` directory of the working copy
//! URL:
//!
//! ```text
//! https://svn/proj/pkg/trunk           --> https://svn/proj/pkg/tags
//! https://svn/proj/pkg/branches/1.2    --> https://svn/proj/pkg/tags
//!                                          https://svn/proj/pkg/tags/1.3.0
//! ```
//!
//! Tagging is a server-side `svn copy` from the working URL, and export
//! reads from the server so local edits never reach a build.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{RevisionHandle, VcsBackend, export, probe_failure, shell};
use crate::error::{ValidationError, VcsError, VcsResult};
use crate::version::Version;

const METADATA_FILE: &str = "package.yaml";

/// Subversion backend bound to one working copy.
#[derive(Debug)]
pub struct SvnBackend {
    path: PathBuf,
    url: String,
    program: String,
}

impl SvnBackend {
    pub const NAME: &'static str = "svn";

    /// Binds to the working copy at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Unsupported`] if `path` is not an svn working copy
    /// or `svn` is not installed.
    pub fn probe(path: &Path) -> VcsResult<Self> {
        Self::probe_with_program(path, "svn")
    }

    /// Like [`SvnBackend::probe`], running `program` instead of `svn`.
    ///
    /// # Errors
    ///
    /// Same as [`SvnBackend::probe`].
    pub fn probe_with_program(path: &Path, program: impl Into<String>) -> VcsResult<Self> {
        let program = program.into();
        let url = svn(&program, path, &["info", "--show-item", "url", "."])
            .map_err(|e| probe_failure(path, e))?;
        if url.is_empty() {
            return Err(VcsError::unsupported(path, "working copy has no URL"));
        }
        Ok(Self {
            path: path.to_path_buf(),
            url,
            program,
        })
    }

    /// URL of the working copy.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Tags directory, or the tag for `version` inside it.
    ///
    /// # Errors
    ///
    /// Fails if the working copy URL is neither trunk nor a branch.
    pub fn tag_url(&self, version: Option<&str>) -> VcsResult<String> {
        let base = tags_base_url(&self.url).ok_or_else(|| VcsError::CommandFailed {
            command: "svn tag url".to_string(),
            message: format!("{} is not in a branch or trunk", self.url),
        })?;
        Ok(match version {
            Some(version) => format!("{base}/tags/{version}"),
            None => format!("{base}/tags"),
        })
    }

    fn svn(&self, args: &[&str]) -> VcsResult<String> {
        svn(&self.program, &self.path, args)
    }

    /// Whether `url` exists on the server.
    fn url_exists(&self, url: &str) -> VcsResult<bool> {
        match self.svn(&["info", "--depth", "empty", url]) {
            Ok(_) => Ok(true),
            Err(VcsError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn svn(program: &str, cwd: &Path, args: &[&str]) -> VcsResult<String> {
    let mut full = Vec::with_capacity(args.len() + 1);
    full.push("--non-interactive");
    full.extend_from_slice(args);
    shell::run(program, &full, cwd)
}

/// Repository directory holding `trunk`, `branches` and `tags`.
pub(crate) fn tags_base_url(url: &str) -> Option<&str> {
    let pos = [url.find("/trunk"), url.find("/branches")]
        .into_iter()
        .flatten()
        .max()?;
    Some(&url[..pos])
}

/// Version floor implied by releasing off `.../branches/<name>`.
pub(crate) fn branch_seed(url: &str) -> Option<&str> {
    if url.contains("/branches/") {
        url.trim_end_matches('/').rsplit('/').next()
    } else {
        None
    }
}

/// Entries from `svn status -u` that block a release.
///
/// Only versioned items count. Unversioned (`?`) and ignored (`I`) paths,
/// such as the scratch root, never reach an export.
pub(crate) fn blocking_status_entries(status: &str) -> Vec<String> {
    shell::lines(status)
        .into_iter()
        .filter(|line| !line.starts_with("Status against revision"))
        .filter(|line| !matches!(line.chars().next(), Some('?' | 'I')))
        .collect()
}

impl VcsBackend for SvnBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn validate_clean(&self) -> VcsResult<()> {
        let metadata_url = format!("{}/{METADATA_FILE}", self.url);
        if !self.url_exists(&metadata_url)? {
            return Err(ValidationError::NotVersioned {
                path: self.path.join(METADATA_FILE).display().to_string(),
            }
            .into());
        }

        let entries = blocking_status_entries(&self.svn(&["status", "-u", "."])?);
        if !entries.is_empty() {
            return Err(ValidationError::UncommittedChanges {
                path: self.path.display().to_string(),
                status: entries.join("\n"),
            }
            .into());
        }

        info!(path = %self.path.display(), "svn-updating");
        self.svn(&["update", "."])?;
        Ok(())
    }

    /// Tag names under the tags directory. A missing tags directory means
    /// nothing has been released yet.
    fn list_tags(&self) -> VcsResult<Vec<String>> {
        let tags_url = self.tag_url(None)?;
        if !self.url_exists(&tags_url)? {
            debug!(url = %tags_url, "No tags directory");
            return Ok(Vec::new());
        }
        Ok(shell::lines(&self.svn(&["ls", &tags_url])?)
            .into_iter()
            .map(|entry| entry.trim_end_matches('/').to_string())
            .collect())
    }

    /// On a branch, the branch name acts as a floor: only tags above it
    /// count, and if none do there is no last tag.
    fn last_tagged_version(&self) -> VcsResult<Option<Version>> {
        let Some(seed) = branch_seed(&self.url) else {
            return Ok(crate::version::last_tagged_version(self.list_tags()?));
        };
        let floor = Version::parse(seed)?;
        let tags = self.list_tags()?;
        Ok(crate::version::last_tagged_version(tags).filter(|latest| *latest > floor))
    }

    fn check_tag_available(&self, tag: &str) -> VcsResult<()> {
        let url = self.tag_url(Some(tag))?;
        if self.url_exists(&url)? {
            return Err(ValidationError::TagExists { tag: url }.into());
        }
        Ok(())
    }

    fn tag_locator(&self, version: &Version) -> VcsResult<Option<String>> {
        self.tag_url(Some(version.as_str())).map(Some)
    }

    fn export_source(&self, dest: &Path) -> VcsResult<()> {
        let dest_str = dest.display().to_string();
        self.svn(&["export", "--quiet", &self.url, &dest_str])?;
        export::remove_hidden_entries(dest).map_err(|e| VcsError::io(dest, e))
    }

    fn changelog(&self, previous: Option<&RevisionHandle>) -> VcsResult<String> {
        match previous {
            Some(handle) => {
                let range = format!("HEAD:{}", handle.id);
                self.svn(&["log", "-r", &range, &self.url])
            }
            None => self.svn(&["log", "--stop-on-copy", &self.url]),
        }
    }

    fn revision_for_tag(&self, tag: &str) -> VcsResult<Option<RevisionHandle>> {
        let url = self.tag_url(Some(tag))?;
        let revision = self.svn(&["info", "--show-item", "last-changed-revision", &url])?;
        if revision.is_empty() {
            return Ok(None);
        }
        Ok(Some(RevisionHandle::new(revision).with_detail("url", url)))
    }

    fn current_revision(&self) -> VcsResult<RevisionHandle> {
        let revision = self.svn(&["info", "--show-item", "revision", "."])?;
        Ok(RevisionHandle::new(revision).with_detail("url", self.url.clone()))
    }

    fn create_tag(&self, name: &str, message: &str) -> VcsResult<()> {
        let tag_url = self.tag_url(Some(name))?;
        info!(tag = %tag_url, "Creating project tag");
        self.svn(&["copy", "--parents", "-m", message, &self.url, &tag_url])?;
        Ok(())
    }
}
