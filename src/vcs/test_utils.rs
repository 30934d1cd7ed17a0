// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shared test utilities for backend tests.
//!
//! Provides a scripted stand-in for a VCS executable that records every
//! command line it receives.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Shell script acting as `svn` or `hg`.
///
/// `body` is the inside of a `case "$*" in ... esac` block, matched against
/// the space-joined arguments. Unmatched calls succeed with no output.
pub(super) struct FakeCli {
    dir: TempDir,
    program: PathBuf,
    log: PathBuf,
}

impl FakeCli {
    pub(super) fn new(name: &str, body: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let program = dir.path().join(name);
        let log = dir.path().join("calls.log");
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$*\" >> '{}'\ncase \"$*\" in\n{body}\nesac\nexit 0\n",
            log.display()
        );
        std::fs::write(&program, script).expect("write fake cli");
        make_executable(&program);
        Self { dir, program, log }
    }

    /// Absolute path to pass as the backend's program.
    pub(super) fn program(&self) -> String {
        self.program.display().to_string()
    }

    /// Scratch directory owned by the fake, usable as a working copy.
    pub(super) fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Every recorded invocation, in order.
    pub(super) fn calls(&self) -> String {
        std::fs::read_to_string(&self.log).unwrap_or_default()
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
