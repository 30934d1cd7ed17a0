// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Async process spawning for external collaborators (build tool, editor).
//!
//! ```text
//! ProcessBuilder::which("rez-build")?
//!   .args() .cwd() .env() .capture_stdout()
//!   .run()
//!       --> tokio::process::Command
//!           stream stdout/stderr to the log
//!       --> ProcessOutput { exit_code, stdout, stderr }
//! ```
//!
//! VCS command lines do not go through here; they use the synchronous
//! runner in `crate::vcs::shell`.

pub mod builder;
mod io;
mod runner;
#[cfg(test)]
mod tests;
