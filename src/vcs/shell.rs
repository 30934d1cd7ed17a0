// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Synchronous runner for VCS command lines.
//!
//! Every command runs with prompts disabled and a C locale, so output is
//! parseable and nothing blocks waiting on a terminal.

use std::path::Path;
use std::process::{Command, Output};

use tracing::{debug, trace};

use crate::error::{VcsError, VcsResult};

/// Runs `program args..` in `cwd` and returns trimmed stdout.
pub(crate) fn run(program: &str, args: &[&str], cwd: &Path) -> VcsResult<String> {
    let output = execute(program, args, cwd)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Runs `program args..` in `cwd` and returns raw stdout.
pub(crate) fn run_bytes(program: &str, args: &[&str], cwd: &Path) -> VcsResult<Vec<u8>> {
    Ok(execute(program, args, cwd)?.stdout)
}

/// Splits command output into non-empty lines.
pub(crate) fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn execute(program: &str, args: &[&str], cwd: &Path) -> VcsResult<Output> {
    let command_line = format!("{program} {}", args.join(" "));
    debug!(cwd = %cwd.display(), cmd = %command_line, "vcs exec");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .env("GCM_INTERACTIVE", "never")
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("HGPLAIN", "1")
        .env("LC_ALL", "C")
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VcsError::ToolNotFound {
                    program: program.to_string(),
                }
            } else {
                VcsError::CommandFailed {
                    command: command_line.clone(),
                    message: format!("failed to execute {program}: {e}"),
                }
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!(
                "exited with code {}",
                output.status.code().unwrap_or(-1)
            )
        } else {
            stderr
        };
        return Err(VcsError::CommandFailed {
            command: command_line,
            message,
        });
    }

    trace!(cmd = %command_line, bytes = output.stdout.len(), "vcs done");
    Ok(output)
}
