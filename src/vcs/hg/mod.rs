// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mercurial release mode.
//!
//! Supports repositories managed with a patch queue (`.hg/patches`). The
//! queue tip is mutable, so a release tags the queue repository and moves a
//! bookmark on the main repository instead of tagging it:
//!
//! ```text
//! plain:  hg tag -f <version>
//! mq:     hg tag -f <version> --mq   +   hg bookmark -f <version>
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{RevisionHandle, VcsBackend, export, probe_failure, shell};
use crate::error::{ValidationError, VcsError, VcsResult};
use crate::version::Version;

/// Mercurial backend bound to a repository root.
#[derive(Debug)]
pub struct HgBackend {
    path: PathBuf,
    patch_path: Option<PathBuf>,
    program: String,
}

impl HgBackend {
    pub const NAME: &'static str = "hg";

    /// Binds to the repository rooted at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Unsupported`] unless `path` contains `.hg` and is
    /// the root reported by `hg root`.
    pub fn probe(path: &Path) -> VcsResult<Self> {
        Self::probe_with_program(path, "hg")
    }

    /// Like [`HgBackend::probe`], running `program` instead of `hg`.
    ///
    /// # Errors
    ///
    /// Same as [`HgBackend::probe`].
    pub fn probe_with_program(path: &Path, program: impl Into<String>) -> VcsResult<Self> {
        let program = program.into();
        let hg_dir = path.join(".hg");
        if !hg_dir.is_dir() {
            return Err(VcsError::unsupported(path, "not a mercurial working copy"));
        }

        let root = shell::run(&program, &["root"], path).map_err(|e| probe_failure(path, e))?;
        if !same_path(Path::new(&root), path) {
            return Err(VcsError::unsupported(
                path,
                "not the root of a mercurial working copy",
            ));
        }

        let patch_path = Some(hg_dir.join("patches")).filter(|p| p.is_dir());
        Ok(Self {
            path: path.to_path_buf(),
            patch_path,
            program,
        })
    }

    /// Whether releases go through the patch queue.
    #[must_use]
    pub const fn uses_patch_queue(&self) -> bool {
        self.patch_path.is_some()
    }

    fn hg(&self, args: &[&str]) -> VcsResult<String> {
        shell::run(&self.program, args, &self.path)
    }

    fn check_status(&self, extra: &[&str], path: &Path) -> VcsResult<()> {
        let mut args = vec!["status", "-m", "-a"];
        args.extend_from_slice(extra);
        let modified = modified_files(&self.hg(&args)?);
        if modified.is_empty() {
            return Ok(());
        }
        Err(ValidationError::UncommittedChanges {
            path: path.display().to_string(),
            status: modified.join(", "),
        }
        .into())
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// File names from `hg status` lines (`M path`).
pub(crate) fn modified_files(status: &str) -> Vec<String> {
    shell::lines(status)
        .iter()
        .filter_map(|line| line.split_whitespace().last().map(String::from))
        .collect()
}

/// Tag names from `hg tags` (`name   rev:node`), without the moving `tip`.
pub(crate) fn parse_tags(output: &str) -> Vec<String> {
    shell::lines(output)
        .iter()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|name| *name != "tip")
        .map(String::from)
        .collect()
}

/// Bookmark names from `hg bookmarks` (` * name   rev:node`).
pub(crate) fn parse_bookmarks(output: &str) -> Vec<String> {
    shell::lines(output)
        .iter()
        .filter(|line| !line.trim().starts_with("no bookmarks set"))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            fields.len().checked_sub(2).map(|i| fields[i].to_string())
        })
        .collect()
}

impl VcsBackend for HgBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn validate_clean(&self) -> VcsResult<()> {
        self.check_status(&[], &self.path)?;
        if let Some(patch_path) = &self.patch_path {
            self.check_status(&["--mq"], patch_path)?;
        }
        Ok(())
    }

    /// Tags plus bookmarks, since patch-queue releases are bookmarked.
    fn list_tags(&self) -> VcsResult<Vec<String>> {
        let mut tags = parse_tags(&self.hg(&["tags"])?);
        tags.extend(parse_bookmarks(&self.hg(&["bookmarks"])?));
        Ok(tags)
    }

    fn tag_locator(&self, _version: &Version) -> VcsResult<Option<String>> {
        if self.patch_path.is_some() {
            let qparent = self.hg(&["log", "-r", "qparent", "--template", "{node}"])?;
            let mq_parent = self.hg(&["parent", "--mq", "--template", "{node}"])?;
            Ok(Some(format!("{qparent}#{mq_parent}")))
        } else {
            self.hg(&["parent", "--template", "{node}"]).map(Some)
        }
    }

    fn export_source(&self, dest: &Path) -> VcsResult<()> {
        let dest_str = dest.display().to_string();
        self.hg(&["archive", &dest_str])?;
        export::remove_hidden_entries(dest).map_err(|e| VcsError::io(dest, e))
    }

    /// Log from the last tag (or the first revision) to the tip, or to the
    /// queue parent in patch-queue mode.
    fn changelog(&self, previous: Option<&RevisionHandle>) -> VcsResult<String> {
        let start = previous.map_or("0", |handle| handle.id.as_str());
        let end = if self.patch_path.is_some() { "qparent" } else { "tip" };
        let revset = format!("{start}::{end} and not merge()");
        self.hg(&["log", "-r", &revset, "--template", "{desc}\n\n"])
    }

    fn revision_for_tag(&self, tag: &str) -> VcsResult<Option<RevisionHandle>> {
        let node = self.hg(&["log", "-r", tag, "--template", "{node}"])?;
        if node.is_empty() {
            return Ok(None);
        }
        Ok(Some(RevisionHandle::new(node).with_detail("tag", tag)))
    }

    fn current_revision(&self) -> VcsResult<RevisionHandle> {
        let node = self.hg(&["parent", "--template", "{node}"])?;
        let branch = self.hg(&["branch"])?;
        Ok(RevisionHandle::new(node).with_detail("branch", branch))
    }

    fn create_tag(&self, name: &str, message: &str) -> VcsResult<()> {
        if self.patch_path.is_some() {
            info!(tag = %name, "Tagging patch queue");
            self.hg(&["tag", "-f", name, "--message", message, "--mq"])?;
            debug!(bookmark = %name, "Moving bookmark on main repository");
            self.hg(&["bookmark", "-f", name])?;
        } else {
            info!(tag = %name, "Creating tag");
            self.hg(&["tag", "-f", name, "--message", message])?;
        }
        Ok(())
    }
}
