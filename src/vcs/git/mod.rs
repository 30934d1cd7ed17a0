// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git release mode.
//!
//! ```text
//!   probe / branch / HEAD      status / tags / push / archive
//!        (gix, read)                 (git CLI, write)
//!             \                           /
//!              '-------- GitBackend -----'
//!
//! validate_clean
//!   bare? --> untracked? --> uncommitted? --> upstream? --> branch allowed?
//!   --> remote update --> ahead/behind?
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info};

use super::{ReleaseNote, RevisionHandle, VcsBackend, export, shell};
use crate::config::types::GitConfig;
use crate::error::{GixError, RemoteDistance, ValidationError, VcsError, VcsResult};
use crate::version::Version;

/// Marker pair delimiting a release note inside a commit message.
const RELEASE_NOTE_PATTERN: &str = r"(?s)<release>(.*?)</release>";

/// Maximum number of commits inspected for notification details.
const COMMIT_DETAILS_LIMIT: &str = "100";

/// Remote-tracking branch of the current local branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub remote: String,
    pub branch: String,
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.remote, self.branch)
    }
}

/// Git backend bound to one working tree.
#[derive(Debug)]
pub struct GitBackend {
    path: PathBuf,
    settings: GitConfig,
    releasable: Vec<Regex>,
}

impl GitBackend {
    pub const NAME: &'static str = "git";

    /// Binds to the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Unsupported`] if `path` is not inside a git
    /// repository, or [`VcsError::InvalidPattern`] if a releasable-branch
    /// pattern does not compile.
    pub fn probe(path: &Path, settings: GitConfig) -> VcsResult<Self> {
        if let Err(e) = gix::discover(path) {
            return Err(VcsError::unsupported(
                path,
                format!("not a git repository: {e}"),
            ));
        }

        let releasable = settings
            .releasable_branches
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| VcsError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<VcsResult<Vec<_>>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            settings,
            releasable,
        })
    }

    fn git(&self, args: &[&str]) -> VcsResult<String> {
        shell::run("git", args, &self.path)
    }

    fn repo(&self) -> VcsResult<gix::Repository> {
        gix::discover(&self.path).map_err(|e| GixError::Discover(Box::new(e)).into())
    }

    /// Short name of the checked-out branch, or `HEAD` when detached.
    ///
    /// # Errors
    ///
    /// Returns a gix error if the repository or HEAD cannot be read.
    pub fn local_branch(&self) -> VcsResult<String> {
        let repo = self.repo()?;
        let head = repo.head_name().map_err(GixError::Head)?;
        Ok(head.map_or_else(|| "HEAD".to_string(), |name| name.shorten().to_string()))
    }

    /// Full hash of the HEAD commit.
    ///
    /// # Errors
    ///
    /// Returns a gix error if HEAD does not point at a commit.
    pub fn head_commit(&self) -> VcsResult<String> {
        let repo = self.repo()?;
        let id = repo
            .head_id()
            .map_err(|e| GixError::HeadId(e.to_string()))?;
        Ok(id.to_string())
    }

    /// Upstream of the current branch, if one is configured.
    ///
    /// # Errors
    ///
    /// Propagates git failures other than "no upstream".
    pub fn tracking_branch(&self) -> VcsResult<Option<Upstream>> {
        match self.git(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"]) {
            Ok(uri) => Ok(uri.split_once('/').map(|(remote, branch)| Upstream {
                remote: remote.to_string(),
                branch: branch.to_string(),
            })),
            Err(VcsError::CommandFailed { message, .. }) if is_missing_upstream(&message) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Distance between the local branch and its upstream, from
    /// `git status --short -b`.
    fn relative_to_remote(&self) -> VcsResult<Option<RemoteDistance>> {
        let status = self.git(&["status", "--short", "-b"])?;
        let first = status.lines().next().unwrap_or_default();
        parse_remote_distance(first).ok_or_else(|| VcsError::CommandFailed {
            command: "git status --short -b".to_string(),
            message: format!("could not parse branch line: {first}"),
        })
    }

    fn remote_url(&self, remote: &str, op: &str) -> VcsResult<Option<String>> {
        let listing = self.git(&["remote", "-v"])?;
        let marker = format!("({op})");
        Ok(listing.lines().find_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [name, url, kind] if *name == remote && *kind == marker => Some((*url).to_string()),
                _ => None,
            }
        }))
    }

    fn commits_since(&self, previous: Option<&RevisionHandle>) -> VcsResult<Vec<String>> {
        let Some(commit) = previous.map(previous_commit) else {
            return Ok(Vec::new());
        };
        let range = format!("{commit}..");
        let hashes = self.git(&[
            "log",
            "-n",
            COMMIT_DETAILS_LIMIT,
            &range,
            "--no-merges",
            "--reverse",
            "--pretty=%H",
            ".",
        ])?;
        Ok(shell::lines(&hashes))
    }
}

impl VcsBackend for GitBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn validate_clean(&self) -> VcsResult<()> {
        if self.repo()?.is_bare() {
            return Err(ValidationError::BareRepository {
                path: self.path.display().to_string(),
            }
            .into());
        }

        let untracked = shell::lines(&self.git(&["ls-files", "--other", "--exclude-standard"])?);
        if !untracked.is_empty() {
            return Err(ValidationError::UntrackedFiles { files: untracked }.into());
        }

        if !self.git(&["status", "--porcelain"])?.is_empty() {
            return Err(ValidationError::UncommittedChanges {
                path: self.path.display().to_string(),
                status: self.git(&["status"])?,
            }
            .into());
        }

        let upstream = self.tracking_branch()?;
        if upstream.is_none() && !self.settings.allow_no_upstream {
            return Err(ValidationError::NoUpstream.into());
        }

        if !self.releasable.is_empty() {
            let branch = self.local_branch()?;
            if !self.releasable.iter().any(|re| re.is_match(&branch)) {
                return Err(ValidationError::BranchNotReleasable {
                    branch,
                    allowed: self.settings.releasable_branches.clone(),
                }
                .into());
            }
        }

        if let Some(upstream) = upstream {
            self.git(&["remote", "update", &upstream.remote])?;
            if let Some(distance) = self.relative_to_remote()? {
                return Err(ValidationError::Diverged {
                    distance,
                    remote: upstream.to_string(),
                }
                .into());
            }
        }

        debug!(path = %self.path.display(), "Working tree is clean");
        Ok(())
    }

    fn list_tags(&self) -> VcsResult<Vec<String>> {
        Ok(shell::lines(&self.git(&["tag"])?))
    }

    fn tag_locator(&self, _version: &Version) -> VcsResult<Option<String>> {
        self.head_commit().map(Some)
    }

    /// Archives the committed tree below this path, so uncommitted and
    /// ignored files never reach the build.
    fn export_source(&self, dest: &Path) -> VcsResult<()> {
        let prefix = self.git(&["rev-parse", "--show-prefix"])?;
        let toplevel = PathBuf::from(self.git(&["rev-parse", "--show-toplevel"])?);
        let tree = format!("HEAD:{}", prefix.trim_end_matches('/'));
        // Tree paths are resolved against the cwd, so archive from the top level.
        let archive = shell::run_bytes("git", &["archive", "--format=tar", &tree], &toplevel)?;
        export::unpack_archive(&archive, dest).map_err(|e| VcsError::io(dest, e))?;
        debug!(tree = %tree, dest = %dest.display(), "Exported git tree");
        Ok(())
    }

    fn changelog(&self, previous: Option<&RevisionHandle>) -> VcsResult<String> {
        match previous.map(previous_commit) {
            Some(commit) => {
                let range = format!("{commit}..HEAD");
                self.git(&["log", "--no-merges", &range])
            }
            None => self.git(&["log", "--no-merges"]),
        }
    }

    fn revision_for_tag(&self, tag: &str) -> VcsResult<Option<RevisionHandle>> {
        let commit = self.git(&["rev-list", "-n", "1", tag])?;
        if commit.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            RevisionHandle::new(commit.clone())
                .with_detail("commit", commit)
                .with_detail("tag", tag),
        ))
    }

    fn current_revision(&self) -> VcsResult<RevisionHandle> {
        let commit = self.head_commit()?;
        let mut handle = RevisionHandle::new(commit.clone())
            .with_detail("commit", commit)
            .with_detail("branch", self.local_branch()?);

        if let Some(upstream) = self.tracking_branch()? {
            if let Some(url) = self.remote_url(&upstream.remote, "fetch")? {
                handle = handle.with_detail("fetch_url", url);
            }
            if let Some(url) = self.remote_url(&upstream.remote, "push")? {
                handle = handle.with_detail("push_url", url);
            }
            handle = handle.with_detail("tracking_branch", upstream.to_string());
        }
        Ok(handle)
    }

    /// Creates an annotated tag and pushes it upstream. Existing tags are
    /// left untouched.
    fn create_tag(&self, name: &str, message: &str) -> VcsResult<()> {
        if !self.git(&["tag", "--list", name])?.is_empty() {
            info!(tag = %name, "Tag already exists, skipping");
            return Ok(());
        }

        info!(tag = %name, "Creating tag");
        self.git(&["tag", "-a", name, "-m", message])?;

        if let Some(upstream) = self.tracking_branch()? {
            info!(tag = %name, remote = %upstream, "Pushing tag");
            self.git(&["push", &upstream.remote, name])?;
        }
        Ok(())
    }

    fn commit_details(&self, previous: Option<&RevisionHandle>) -> VcsResult<Vec<String>> {
        let pretty = format!("--pretty={}", self.settings.commit_details_format);
        self.commits_since(previous)?
            .iter()
            .map(|hash| self.git(&["log", hash, "--name-only", "--no-merges", "-1", &pretty]))
            .collect()
    }

    fn release_notes(&self, previous: Option<&RevisionHandle>) -> VcsResult<Vec<ReleaseNote>> {
        let marker = Regex::new(RELEASE_NOTE_PATTERN).map_err(|e| VcsError::InvalidPattern {
            pattern: RELEASE_NOTE_PATTERN.to_string(),
            message: e.to_string(),
        })?;

        let mut notes = Vec::new();
        for hash in self.commits_since(previous)? {
            let log = self.git(&["log", &hash, "--no-merges", "-1", "--pretty=format:%an: %B"])?;
            if let Some(note) = extract_release_note(&marker, &log) {
                notes.push(note);
            }
        }
        Ok(notes)
    }
}

/// Commit recorded in a handle, falling back to its id.
fn previous_commit(handle: &RevisionHandle) -> &str {
    handle
        .details
        .get("commit")
        .map_or(handle.id.as_str(), String::as_str)
}

fn is_missing_upstream(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("no upstream") || message.contains("does not point to a branch")
}

/// Parses the `[ahead N, behind M]` suffix of `git status --short -b`.
///
/// Returns `Some(None)` when the branch is in sync, and reports only the
/// first entry when both directions are present.
pub(crate) fn parse_remote_distance(branch_line: &str) -> Option<Option<RemoteDistance>> {
    let Some(open) = branch_line.rfind('[') else {
        return Some(None);
    };
    let inner = branch_line[open + 1..].split(']').next()?;
    let first = inner.split(',').next()?.trim();
    let (direction, count) = first.split_once(' ')?;
    let count: u32 = count.trim().parse().ok()?;
    match direction {
        "ahead" => Some(Some(RemoteDistance::Ahead(count))),
        "behind" => Some(Some(RemoteDistance::Behind(count))),
        _ => None,
    }
}

/// Pulls the `<release>` note and author out of one `Name: message` log entry.
pub(crate) fn extract_release_note(marker: &Regex, log: &str) -> Option<ReleaseNote> {
    let message = marker
        .captures_iter(log)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    if message.is_empty() {
        return None;
    }
    let author = log
        .split_once(": ")
        .map(|(author, _)| author.to_string())
        .unwrap_or_default();
    Some(ReleaseNote { author, message })
}

#[cfg(test)]
mod tests;
