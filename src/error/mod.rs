// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!              ShelfError (~24 bytes)
//!                     |
//!   +------+------+---+---+------+----+----+
//!   |      |      |       |      |    |    |
//!   v      v      v       v      v    v    v
//! Bail    Vcs  Release  Config  Proc  Fs  Io/Other
//!         Box    Box     Box    Box   Box  Box<str>
//!
//! Sub-errors (unboxed internally):
//!   Vcs        Unsupported, ToolNotFound, CommandFailed, Gix, Validation, Io
//!   Validation dirty copy, upstream, branch, version, uuid, metadata
//!   Release    Validation, Vcs, Build, Install, Tag, Cancelled, Io
//!   Config     ParseError, MissingKey, InvalidValue
//!   Process    ExecutableNotFound, SpawnFailed, NonZeroExit
//!   Fs         NotFound, PermissionDenied, IoError
//! ```
//!
//! `VcsError::Unsupported` is the only non-fatal condition: the backend
//! registry filters it out while probing.

use std::fmt;

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`ShelfError`].
pub type ShelfResult<T> = std::result::Result<T, ShelfError>;

/// Result type for VCS backend operations.
pub type VcsResult<T> = std::result::Result<T, VcsError>;

/// Result type for release pipeline operations.
pub type ReleaseResult<T> = std::result::Result<T, ReleaseError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum ShelfError {
    /// Fatal error that should terminate the application.
    #[error("fatal error: {0}")]
    Bailed(Box<str>),

    /// VCS backend failure.
    #[error("vcs error: {0}")]
    Vcs(#[from] Box<VcsError>),

    /// Release pipeline failure.
    #[error("release error: {0}")]
    Release(#[from] Box<ReleaseError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Process execution error.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// Filesystem error.
    #[error("filesystem error: {0}")]
    Fs(#[from] Box<FsError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

/// Create a fatal [`ShelfError::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> ShelfError {
    ShelfError::Bailed(message.into().into_boxed_str())
}

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for ShelfError {
                fn from(err: $error) -> Self {
                    ShelfError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    VcsError => Vcs,
    ReleaseError => Release,
    ConfigError => Config,
    ProcessError => Process,
    FsError => Fs,
    std::io::Error => Io,
}

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to discover repository from path.
    #[error("failed to discover repository: {0}")]
    Discover(#[from] Box<gix::discover::Error>),

    /// Failed to get HEAD reference.
    #[error("failed to get head reference: {0}")]
    Head(#[from] gix::reference::find::existing::Error),

    /// HEAD does not point at a commit yet.
    #[error("failed to resolve HEAD commit: {0}")]
    HeadId(String),
}

// --- VCS Errors ---

/// Errors raised by VCS backends.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The backend does not apply to this path. Filtered out by the registry.
    #[error("unsupported mode for '{path}': {reason}")]
    Unsupported { path: String, reason: String },

    /// The VCS executable is not installed.
    #[error("executable not found: '{program}'")]
    ToolNotFound { program: String },

    /// A VCS command failed.
    #[error("{command} failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Error from the gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),

    /// Repository state does not allow a release.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A configured pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Filesystem failure while exporting source.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl VcsError {
    /// Builds an [`VcsError::Unsupported`] for `path`.
    pub fn unsupported(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Whether this is the non-fatal "backend does not apply" condition.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// How far the local branch is from its tracking branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDistance {
    Ahead(u32),
    Behind(u32),
}

impl fmt::Display for RemoteDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ahead(n) => write!(f, "{n} commits ahead of"),
            Self::Behind(n) => write!(f, "{n} commits behind"),
        }
    }
}

// --- Validation Errors ---

/// Problems detected before any build or install work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("could not release: bare repository at {path}")]
    BareRepository { path: String },

    #[error("could not release: there are untracked files:\n{}", files.join("\n"))]
    UntrackedFiles { files: Vec<String> },

    #[error("could not release: there are uncommitted changes in {path}:\n{status}")]
    UncommittedChanges { path: String, status: String },

    #[error(
        "release cancelled: there is no upstream branch. Set vcs.git.allow_no_upstream \
         to release without one"
    )]
    NoUpstream,

    #[error("could not release: current branch is {branch}, must match one of: {}", allowed.join(", "))]
    BranchNotReleasable {
        branch: String,
        allowed: Vec<String>,
    },

    #[error("could not release: {distance} {remote}")]
    Diverged {
        distance: RemoteDistance,
        remote: String,
    },

    #[error("cannot release: the tag '{tag}' already exists. Bump the version and try again")]
    TagExists { tag: String },

    #[error("{path} is not under source control")]
    NotVersioned { path: String },

    #[error(
        "cannot release: current version '{version}' is not greater than the latest tag \
         '{latest}'. Version up or pass --allow-not-latest"
    )]
    VersionNotLatest { version: String, latest: String },

    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error(
        "the uuid in '{path}' does not match this package's uuid - you may have a package \
         name clash. All package names must be unique"
    )]
    UuidMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("{path} not found")]
    MetadataNotFound { path: String },

    #[error("{path} is missing {field}")]
    MissingField { path: String, field: &'static str },

    #[error("missing required config key '{key}'")]
    MissingConfig { key: String },
}

// --- Release Errors ---

/// Release pipeline failures, ordered by how much damage they can leave behind.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Raised before any build or install mutation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A backend operation failed.
    #[error(transparent)]
    Vcs(VcsError),

    /// A variant failed to build. The central store is untouched.
    #[error("build failed for {variant}: {message}")]
    Build { variant: String, message: String },

    /// A variant failed to install. Earlier variants may already be installed.
    #[error(
        "install failed for {variant}: {message}\nA partial central installation may have \
         resulted, please see to this immediately - it should probably be removed"
    )]
    Install { variant: String, message: String },

    /// Tagging failed after every artifact was released.
    #[error("failed to create tag '{tag}': {message}")]
    Tag { tag: String, message: String },

    /// The commit-message provider failed (editor exited non-zero, etc).
    #[error("error getting commit message: {message}")]
    CommitMessage { message: String },

    /// The operator aborted the release.
    #[error("release cancelled by user")]
    Cancelled,

    /// Filesystem failure in the scratch area or central store.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<VcsError> for ReleaseError {
    fn from(err: VcsError) -> Self {
        match err {
            VcsError::Validation(validation) => Self::Validation(validation),
            other => Self::Vcs(other),
        }
    }
}

impl ReleaseError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("failed to parse config '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// Unknown VCS backend name.
    #[error("unknown release mode '{name}' (known: {})", known.join(", "))]
    UnknownBackend { name: String, known: Vec<String> },

    /// A backend was registered twice.
    #[error("release mode '{name}' has already been registered")]
    DuplicateBackend { name: String },
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Executable not found in PATH.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with non-zero status.
    #[error("process '{command}' exited with code {code}{}", fmt_output(output))]
    NonZeroExit {
        command: String,
        code: i32,
        output: String,
    },
}

fn fmt_output(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(":\n{output}")
    }
}

// --- Filesystem Errors ---

/// Filesystem operation errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path not found.
    #[error("path not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// General I/O error.
    #[error("I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
