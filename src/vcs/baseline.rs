// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release without version control.

use std::path::{Path, PathBuf};

use super::{RevisionHandle, VcsBackend, export};
use crate::error::{VcsError, VcsResult};
use crate::version::Version;

/// Backend that applies to any directory and records nothing.
///
/// Source export is a plain copy of the working directory.
#[derive(Debug)]
pub struct BaselineBackend {
    path: PathBuf,
}

impl BaselineBackend {
    pub const NAME: &'static str = "base";

    /// Binds to `path`. Only fails if `path` is not a directory.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Unsupported`] if `path` is not a directory.
    pub fn probe(path: &Path) -> VcsResult<Self> {
        if !path.is_dir() {
            return Err(VcsError::unsupported(path, "not a directory"));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl VcsBackend for BaselineBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn validate_clean(&self) -> VcsResult<()> {
        Ok(())
    }

    fn list_tags(&self) -> VcsResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn tag_locator(&self, _version: &Version) -> VcsResult<Option<String>> {
        Ok(None)
    }

    /// Copies the working directory, leaving out the scratch root that
    /// holds `dest` so a release never copies its own build area.
    fn export_source(&self, dest: &Path) -> VcsResult<()> {
        let mut skip = vec![dest.to_path_buf()];
        if let Some(scratch) = dest.parent()
            && scratch != self.path
        {
            skip.push(scratch.to_path_buf());
        }
        export::copy_tree(&self.path, dest, &skip)
    }

    fn changelog(&self, _previous: Option<&RevisionHandle>) -> VcsResult<String> {
        Ok(String::new())
    }

    fn current_revision(&self) -> VcsResult<RevisionHandle> {
        Ok(RevisionHandle::default())
    }

    fn create_tag(&self, _name: &str, _message: &str) -> VcsResult<()> {
        Ok(())
    }
}
