// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Changelog assembly and folding into the commit message.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ReleaseError, ReleaseResult, VcsResult};
use crate::vcs::{RevisionHandle, VcsBackend};

/// Side file handed to the build tool.
pub const CHANGELOG_FILE: &str = "changelog.txt";

/// Change text between `previous` and the current tip, without merges.
/// From the beginning of history when there is no previous release.
///
/// # Errors
///
/// Propagates backend failures.
pub fn assemble(
    backend: &dyn VcsBackend,
    previous: Option<&RevisionHandle>,
) -> VcsResult<String> {
    let log = backend.changelog(previous)?;
    let log = log.trim_end().to_string();
    debug!(
        backend = backend.name(),
        since = previous.map_or("<start>", |p| p.id.as_str()),
        bytes = log.len(),
        "Assembled changelog"
    );
    Ok(log)
}

/// How the commit message is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSeed {
    /// The operator supplied a message; no prompt.
    Final(String),
    /// Default text for the commit-message provider.
    Prompt(String),
}

/// Folds the changelog into the supplied message, or seeds the prompt
/// with it.
#[must_use]
pub fn fold(message: Option<&str>, changelog: &str) -> MessageSeed {
    match (message, changelog.is_empty()) {
        (Some(message), true) => MessageSeed::Final(message.to_string()),
        (Some(message), false) => MessageSeed::Final(format!("{message}\n{changelog}")),
        (None, true) => MessageSeed::Prompt(String::new()),
        (None, false) => MessageSeed::Prompt(format!("\n\n{changelog}")),
    }
}

/// Writes `<scratch_root>/changelog.txt` when there is anything to write.
///
/// # Errors
///
/// Fails if the file cannot be written.
pub fn write_side_file(scratch_root: &Path, changelog: &str) -> ReleaseResult<Option<PathBuf>> {
    if changelog.is_empty() {
        return Ok(None);
    }
    let path = scratch_root.join(CHANGELOG_FILE);
    std::fs::write(&path, changelog).map_err(|e| ReleaseError::io(&path, e))?;
    Ok(Some(path))
}
