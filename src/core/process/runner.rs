// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution and exit-status validation.
//!
//! ```text
//! run()
//!   build_command()   args, cwd, env, stdio
//!   spawn()
//!   run_child()       stream stdout/stderr
//!   validate exit_code
//!   --> ProcessOutput
//! ```

use crate::error::{ProcessError, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, trace};

use super::builder::{ProcessBuilder, ProcessOutput, StreamFlags};

impl ProcessBuilder {
    /// Returns the display name for this process.
    fn display_name(&self) -> String {
        self.name_override().map_or_else(
            || {
                self.program().file_stem().map_or_else(
                    || "process".to_string(),
                    |s| s.to_string_lossy().into_owned(),
                )
            },
            String::from,
        )
    }

    /// Returns the full command line as a string (for logging).
    pub(crate) fn command_line(&self) -> String {
        use std::fmt::Write as _;

        let mut cmd = format!("{}", self.program().display());
        for arg in self.args_slice() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Spawns and runs the process, waiting for completion.
    ///
    /// There is no timeout: the call blocks until the child exits.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Spawning the child process fails.
    /// - The process exits with a non-zero status.
    ///   Captured output is folded into the [`ProcessError::NonZeroExit`].
    /// - IO error occurs during output streaming.
    pub async fn run(self) -> Result<ProcessOutput> {
        let name = self.display_name();
        let cmd_line = self.command_line();

        if let Some(cwd) = self.working_dir() {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %cmd_line, "exec");

        let mut command = self.build_command();

        let mut child = command
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                command: cmd_line.clone(),
                source,
            })?;

        trace!(process = %name, pid = ?child.id(), "spawned");

        let output = self.run_child(&name, &mut child).await?;

        if !output.success() {
            if !output.stderr().is_empty() {
                error!(process = %name, stderr = %output.stderr(), "process error output");
            }
            let captured = if output.stderr().is_empty() {
                output.stdout()
            } else {
                output.stderr()
            };
            return Err(ProcessError::NonZeroExit {
                command: name,
                code: output.exit_code(),
                output: captured.trim().to_string(),
            }
            .into());
        }
        if !output.stderr().is_empty() {
            debug!(process = %name, stderr = %output.stderr(), "process diagnostics");
        }

        trace!(process = %name, exit_code = output.exit_code(), "completed");
        Ok(output)
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program());

        command.args(self.args_slice());

        if let Some(cwd) = self.working_dir() {
            command.current_dir(cwd);
        }

        for (key, value) in self.environment() {
            command.env(key, value);
        }

        if self.stdout_stream().contains(StreamFlags::INHERIT) {
            command.stdin(Stdio::inherit());
        } else {
            command.stdin(Stdio::null());
        }

        command.stdout(Self::stdio_from_flags(self.stdout_stream()));
        command.stderr(Self::stdio_from_flags(self.stderr_stream()));

        command.kill_on_drop(true);

        command
    }

    fn stdio_from_flags(flags: StreamFlags) -> Stdio {
        if flags.contains(StreamFlags::INHERIT) {
            Stdio::inherit()
        } else {
            Stdio::piped()
        }
    }
}
