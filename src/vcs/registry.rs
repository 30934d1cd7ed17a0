// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backend registry for resolving release modes against a working copy.
//!
//! ```text
//! register("base") register("svn") register("git") register("hg")
//!            |
//!            v
//! priority: [hg, git, svn, base]     (latest registration first)
//!            |
//! probe_available(path)
//!   factory(path) ok          --> keep name
//!   factory(path) Unsupported --> skip
//!   factory(path) other error --> propagate
//! ```

use std::path::Path;

use tracing::{debug, trace};

use super::VcsBackend;
use super::baseline::BaselineBackend;
use super::git::GitBackend;
use super::hg::HgBackend;
use super::svn::SvnBackend;
use crate::config::types::VcsConfig;
use crate::error::{ConfigError, ShelfResult, VcsResult};

/// Constructs a backend bound to a path, or reports it does not apply.
pub type BackendFactory = Box<dyn Fn(&Path) -> VcsResult<Box<dyn VcsBackend>> + Send + Sync>;

/// Registry of known backends, kept in probing priority order.
#[derive(Default)]
pub struct BackendRegistry {
    entries: Vec<(String, BackendFactory)>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl BackendRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in backends.
    ///
    /// Registration order is `base`, `svn`, `git`, `hg`, so probing tries
    /// Mercurial first and falls back to the baseline last.
    #[must_use]
    pub fn with_builtins(vcs: &VcsConfig) -> Self {
        let mut registry = Self::new();
        let git_settings = vcs.git.clone();

        let builtins: [(&str, BackendFactory); 4] = [
            (BaselineBackend::NAME, Box::new(baseline_factory)),
            (SvnBackend::NAME, Box::new(svn_factory)),
            (
                GitBackend::NAME,
                Box::new(move |path: &Path| -> VcsResult<Box<dyn VcsBackend>> {
                    Ok(Box::new(GitBackend::probe(path, git_settings.clone())?))
                }),
            ),
            (HgBackend::NAME, Box::new(hg_factory)),
        ];

        for (name, factory) in builtins {
            registry.entries.insert(0, (name.to_string(), factory));
        }
        registry
    }

    /// Registers a backend factory. Later registrations probe first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateBackend`] if `name` is already registered.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), ConfigError>
    where
        F: Fn(&Path) -> VcsResult<Box<dyn VcsBackend>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.entries.iter().any(|(existing, _)| *existing == name) {
            return Err(ConfigError::DuplicateBackend { name });
        }
        trace!(backend = %name, "Registered release mode");
        self.entries.insert(0, (name, Box::new(factory)));
        Ok(())
    }

    /// Registered names in probing priority order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Names of the backends that accept `path`, in priority order.
    ///
    /// # Errors
    ///
    /// Propagates any construction failure other than
    /// [`VcsError::Unsupported`](crate::error::VcsError::Unsupported).
    pub fn probe_available(&self, path: &Path) -> VcsResult<Vec<String>> {
        let mut available = Vec::new();
        for (name, factory) in &self.entries {
            match factory(path) {
                Ok(_) => available.push(name.clone()),
                Err(e) if e.is_unsupported() => {
                    trace!(backend = %name, reason = %e, "Release mode does not apply");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(path = %path.display(), modes = ?available, "Probed release modes");
        Ok(available)
    }

    /// Constructs the backend registered under `name` for `path`.
    ///
    /// # Errors
    ///
    /// Returns a config error for unknown names and the backend's own error
    /// (including `Unsupported`) if construction fails.
    pub fn create(&self, name: &str, path: &Path) -> ShelfResult<Box<dyn VcsBackend>> {
        let Some((_, factory)) = self.entries.iter().find(|(n, _)| n == name) else {
            return Err(ConfigError::UnknownBackend {
                name: name.to_string(),
                known: self.names().into_iter().map(String::from).collect(),
            }
            .into());
        };
        Ok(factory(path)?)
    }
}

fn baseline_factory(path: &Path) -> VcsResult<Box<dyn VcsBackend>> {
    Ok(Box::new(BaselineBackend::probe(path)?))
}

fn svn_factory(path: &Path) -> VcsResult<Box<dyn VcsBackend>> {
    Ok(Box::new(SvnBackend::probe(path)?))
}

fn hg_factory(path: &Path) -> VcsResult<Box<dyn VcsBackend>> {
    Ok(Box::new(HgBackend::probe(path)?))
}
