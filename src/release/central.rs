// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Central release directory layout.
//!
//! ```text
//! <packages_path>/
//!   <name>/
//!     package.uuid                       family uuid, written once
//!     <version>/
//!       .metadata/release_time.txt       epoch seconds, written once
//!       ... installed variants ...
//! ```

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::error::{ReleaseError, ReleaseResult, ValidationError};

pub const UUID_FILE: &str = "package.uuid";
pub const RELEASE_TIME_FILE: &str = "release_time.txt";
const METADATA_DIR: &str = ".metadata";

/// One package family inside the central release root.
#[derive(Debug, Clone)]
pub struct CentralStore {
    family_dir: PathBuf,
}

impl CentralStore {
    #[must_use]
    pub fn new(packages_path: &Path, name: &str) -> Self {
        Self {
            family_dir: packages_path.join(name),
        }
    }

    #[must_use]
    pub fn family_dir(&self) -> &Path {
        &self.family_dir
    }

    #[must_use]
    pub fn uuid_file(&self) -> PathBuf {
        self.family_dir.join(UUID_FILE)
    }

    #[must_use]
    pub fn release_time_file(&self, version: &str) -> PathBuf {
        self.family_dir
            .join(version)
            .join(METADATA_DIR)
            .join(RELEASE_TIME_FILE)
    }

    /// Compares the recorded family uuid with `uuid`.
    ///
    /// Returns whether a uuid file exists. A first release has none and is
    /// never a conflict.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UuidMismatch`] if the recorded uuid differs.
    pub fn check_uuid(&self, uuid: &str) -> ReleaseResult<bool> {
        let path = self.uuid_file();
        let existing = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(ReleaseError::io(&path, e)),
        };
        let existing = existing.trim();
        if existing != uuid {
            return Err(ValidationError::UuidMismatch {
                path: path.display().to_string(),
                expected: uuid.to_string(),
                found: existing.to_string(),
            }
            .into());
        }
        Ok(true)
    }

    /// Creates the family directory and records `uuid`. Never overwrites.
    ///
    /// # Errors
    ///
    /// Fails if the uuid file already exists or cannot be written.
    pub fn write_uuid(&self, uuid: &str) -> ReleaseResult<PathBuf> {
        std::fs::create_dir_all(&self.family_dir)
            .map_err(|e| ReleaseError::io(&self.family_dir, e))?;
        let path = self.uuid_file();
        write_once(&path, &format!("{uuid}\n"))?;
        debug!(path = %path.display(), "Wrote family uuid");
        Ok(path)
    }

    /// Records when `version` officially came into existence.
    ///
    /// # Errors
    ///
    /// Fails if the marker already exists or cannot be written.
    pub fn write_release_time(&self, version: &str, epoch: i64) -> ReleaseResult<PathBuf> {
        let path = self.release_time_file(version);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ReleaseError::io(parent, e))?;
        }
        write_once(&path, &format!("{epoch}\n"))?;
        debug!(path = %path.display(), epoch, "Wrote release time");
        Ok(path)
    }
}

fn write_once(path: &Path, content: &str) -> ReleaseResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| ReleaseError::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| ReleaseError::io(path, e))
}

fn is_byproduct_dir(name: &str) -> bool {
    name == "__pycache__"
}

fn is_byproduct_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext == "pyc")
}

/// Purges compiled byproducts from an installed variant and makes every
/// remaining file read-only. Directories stay writable.
///
/// # Errors
///
/// Fails if an entry cannot be removed or its permissions changed.
pub fn seal_installed(install_path: &Path) -> ReleaseResult<()> {
    if !install_path.exists() {
        warn!(path = %install_path.display(), "Install path does not exist, nothing to seal");
        return Ok(());
    }

    let walker = WalkBuilder::new(install_path)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .follow_links(false)
        .build();

    let mut purge_dirs = Vec::new();
    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| ReleaseError::Io {
            path: install_path.display().to_string(),
            source: std::io::Error::other(e),
        })?;
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let name = entry.file_name().to_string_lossy();
        if file_type.is_dir() && is_byproduct_dir(&name) {
            purge_dirs.push(entry.into_path());
        } else if file_type.is_file() {
            files.push(entry.into_path());
        }
    }

    for dir in &purge_dirs {
        if dir.exists() {
            std::fs::remove_dir_all(dir).map_err(|e| ReleaseError::io(dir, e))?;
        }
    }

    let mut sealed = 0usize;
    for file in files {
        if purge_dirs.iter().any(|dir| file.starts_with(dir)) {
            continue;
        }
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_byproduct_file(&name) {
            std::fs::remove_file(&file).map_err(|e| ReleaseError::io(&file, e))?;
            continue;
        }
        strip_write_bits(&file)?;
        sealed += 1;
    }

    debug!(
        path = %install_path.display(),
        sealed,
        purged_dirs = purge_dirs.len(),
        "Sealed installed variant"
    );
    Ok(())
}

fn strip_write_bits(path: &Path) -> ReleaseResult<()> {
    let mut permissions = std::fs::metadata(path)
        .map_err(|e| ReleaseError::io(path, e))?
        .permissions();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        permissions.set_mode(permissions.mode() & !0o222);
    }
    #[cfg(not(unix))]
    permissions.set_readonly(true);

    std::fs::set_permissions(path, permissions).map_err(|e| ReleaseError::io(path, e))
}
