// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Source export helpers shared by the backends.
//!
//! ```text
//! copy_tree()              working copy --> dest (baseline)
//! unpack_archive()         `git archive` tar stream --> dest
//! remove_hidden_entries()  post-pass after `svn export` / `hg archive`
//! ```
//!
//! Hidden entries (names starting with `.`) never reach an export, at any
//! depth.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, trace};

use crate::error::{VcsError, VcsResult};

/// Whether a file name marks a hidden entry.
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Copies `src` into `dest`, skipping hidden entries and every path in `skip`.
///
/// Symlinks are recreated, not followed. Ignore files are not consulted:
/// everything visible in the working copy is exported.
///
/// # Errors
///
/// Returns [`VcsError::Io`] on the first filesystem failure.
pub fn copy_tree(src: &Path, dest: &Path, skip: &[PathBuf]) -> VcsResult<()> {
    let skip = skip.to_vec();
    let walker = WalkBuilder::new(src)
        .hidden(true)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .follow_links(false)
        .filter_entry(move |entry| !skip.iter().any(|s| entry.path() == s))
        .build();

    let mut copied = 0_usize;
    for entry in walker {
        let entry = entry.map_err(|e| VcsError::io(src, io::Error::other(e)))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| VcsError::io(entry.path(), io::Error::other(e)))?;
        let target = dest.join(relative);

        let Some(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_symlink() {
            let link = fs::read_link(entry.path()).map_err(|e| VcsError::io(entry.path(), e))?;
            symlink(&link, &target).map_err(|e| VcsError::io(&target, e))?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| VcsError::io(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| VcsError::io(&target, e))?;
            copied += 1;
        }
        trace!(path = %relative.display(), "exported");
    }

    debug!(src = %src.display(), dest = %dest.display(), files = copied, "Copied source tree");
    Ok(())
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(not(unix))]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    fs::copy(original, link).map(|_| ())
}

/// Unpacks a tar stream into `dest`, dropping hidden entries.
///
/// # Errors
///
/// Returns an I/O error if the stream is malformed or an entry cannot be
/// written.
pub fn unpack_archive(bytes: &[u8], dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    let mut archive = tar::Archive::new(bytes);
    archive.set_preserve_permissions(true);

    for entry in archive.entries()? {
        let mut entry = entry?;
        if matches!(
            entry.header().entry_type(),
            tar::EntryType::XGlobalHeader | tar::EntryType::XHeader
        ) {
            continue;
        }
        let path = entry.path()?.into_owned();
        let hidden = path.components().any(|component| match component {
            Component::Normal(name) => is_hidden(name),
            _ => false,
        });
        if hidden {
            trace!(path = %path.display(), "Skipping hidden archive entry");
            continue;
        }
        entry.unpack_in(dest)?;
    }
    Ok(())
}

/// Removes every hidden file or directory below `root`, at any depth.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be read or an entry cannot be
/// removed.
pub fn remove_hidden_entries(root: &Path) -> io::Result<()> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if is_hidden(&entry.file_name()) {
            if file_type.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
            trace!(path = %path.display(), "Removed hidden entry");
        } else if file_type.is_dir() {
            remove_hidden_entries(&path)?;
        }
    }
    Ok(())
}
