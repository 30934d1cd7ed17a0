// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process builder with configuration options.
//!
//! ```text
//! ProcessBuilder
//!  • which/raw
//!  • args/cwd/env/name
//!  • capture_stdout, stderr_flags, inherit_stdio
//!
//! StreamFlags: FORWARD_TO_LOG (default), KEEP_IN_STRING, INHERIT
//! ```

use bitflags::bitflags;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};

/// Static cache for executable paths resolved via `which`.
static EXECUTABLE_CACHE: OnceLock<RwLock<BTreeMap<String, PathBuf>>> = OnceLock::new();

fn exe_cache() -> &'static RwLock<BTreeMap<String, PathBuf>> {
    EXECUTABLE_CACHE.get_or_init(|| RwLock::new(BTreeMap::new()))
}

bitflags! {
    /// Flags controlling stream handling for stdout/stderr.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StreamFlags: u32 {
        /// Forward output to tracing logs
        const FORWARD_TO_LOG = 0x01;
        /// Keep output in a string for later retrieval
        const KEEP_IN_STRING = 0x04;
        /// Inherit from parent process
        const INHERIT = 0x08;
    }
}

impl Default for StreamFlags {
    fn default() -> Self {
        Self::FORWARD_TO_LOG
    }
}

/// Output from a completed process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl ProcessOutput {
    pub(super) const fn new(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
        }
    }

    /// Returns the process exit code (0 = success).
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Returns captured stdout (if `KEEP_IN_STRING` was set).
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Returns captured stderr (if `KEEP_IN_STRING` was set).
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Returns true if the process exited successfully (code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Builder for configuring and running a process.
#[derive(Debug)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    /// Extra variables layered over the inherited environment
    env: BTreeMap<String, String>,
    stdout: StreamFlags,
    stderr: StreamFlags,
    name: Option<String>,
}

impl ProcessBuilder {
    fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            stdout: StreamFlags::default(),
            stderr: StreamFlags::default(),
            name: None,
        }
    }

    /// Creates a `ProcessBuilder` after resolving the program via PATH.
    ///
    /// Names containing a path separator are checked as paths instead.
    /// Results are cached for subsequent lookups of the same program.
    ///
    /// # Errors
    ///
    /// Returns a `ProcessError::ExecutableNotFound` if the executable is not found.
    pub fn which(program: &str) -> std::result::Result<Self, crate::error::ProcessError> {
        find(program).map(Self::new).ok_or_else(|| {
            crate::error::ProcessError::ExecutableNotFound {
                name: program.to_string(),
            }
        })
    }

    /// Creates a `ProcessBuilder` that runs `command` through `/bin/sh -c`.
    ///
    /// Used for operator-supplied command lines such as `$EDITOR` values
    /// that carry their own arguments.
    pub fn raw(command: impl Into<String>) -> Self {
        let mut builder = Self::new("/bin/sh");
        builder.args = vec!["-c".to_string(), command.into()];
        builder
    }

    /// Adds an argument to the command.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Adds multiple arguments to the command.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string_lossy().into_owned());
        }
        self
    }

    /// Sets the working directory for the process.
    #[must_use]
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets one environment variable on top of the inherited environment.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Configures stderr handling.
    #[must_use]
    pub const fn stderr_flags(mut self, flags: StreamFlags) -> Self {
        self.stderr = flags;
        self
    }

    /// Convenience: capture stdout to string.
    #[must_use]
    pub const fn capture_stdout(mut self) -> Self {
        self.stdout = StreamFlags::KEEP_IN_STRING;
        self
    }

    /// Convenience: inherit stdout/stderr from parent.
    ///
    /// Stdin is inherited too, so interactive programs such as editors work.
    #[must_use]
    pub const fn inherit_stdio(mut self) -> Self {
        self.stdout = StreamFlags::INHERIT;
        self.stderr = StreamFlags::INHERIT;
        self
    }

    /// Sets a display name for logging.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns a reference to the program path.
    #[must_use]
    pub const fn program(&self) -> &PathBuf {
        &self.program
    }

    pub(super) fn args_slice(&self) -> &[String] {
        &self.args
    }

    pub(super) const fn working_dir(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    pub(super) const fn environment(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub(super) const fn stdout_stream(&self) -> StreamFlags {
        self.stdout
    }

    pub(super) const fn stderr_stream(&self) -> StreamFlags {
        self.stderr
    }

    pub(super) fn name_override(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Resolves `program` to a full path, caching the result.
fn find(program: &str) -> Option<PathBuf> {
    {
        let cache = exe_cache()
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(path) = cache.get(program) {
            return Some(path.clone());
        }
    }

    let path = which::which(program).ok()?;
    exe_cache()
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .insert(program.to_string(), path.clone());
    Some(path)
}
