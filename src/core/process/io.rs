// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Output streaming and capture for child processes.
//!
//! ```text
//! run_child()
//!   stdout/stderr reader tasks --> mpsc channels
//!   wait
//!   --> ProcessOutput { exit_code, stdout, stderr }
//! ```

use crate::error::Result;
use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use super::builder::{ProcessBuilder, ProcessOutput, StreamFlags};

/// Spawns a line reader for one child stream when its flags ask for output.
fn spawn_reader<R>(
    stream: Option<R>,
    flags: StreamFlags,
    process_name: &str,
    stream_name: &'static str,
    tx: mpsc::UnboundedSender<String>,
) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    if !flags.intersects(StreamFlags::FORWARD_TO_LOG | StreamFlags::KEEP_IN_STRING) {
        return None;
    }
    stream.map(|stream| {
        let name = process_name.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if flags.contains(StreamFlags::FORWARD_TO_LOG) {
                    trace!(process = %name, stream = stream_name, line = %line, "output");
                }
                if flags.contains(StreamFlags::KEEP_IN_STRING) {
                    let _ = tx.send(line);
                }
            }
        })
    })
}

/// Drains a channel into a newline-joined string.
fn collect_output(rx: &mut mpsc::UnboundedReceiver<String>, flags: StreamFlags) -> String {
    if !flags.contains(StreamFlags::KEEP_IN_STRING) {
        return String::new();
    }
    let mut output = String::new();
    while let Ok(line) = rx.try_recv() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&line);
    }
    output
}

impl ProcessBuilder {
    /// Runs the child process, handling I/O streaming and waiting for completion.
    pub(super) async fn run_child(&self, name: &str, child: &mut Child) -> Result<ProcessOutput> {
        let (stdout_tx, mut stdout_rx) = mpsc::unbounded_channel::<String>();
        let (stderr_tx, mut stderr_rx) = mpsc::unbounded_channel::<String>();

        let stdout_handle = spawn_reader(
            child.stdout.take(),
            self.stdout_stream(),
            name,
            "stdout",
            stdout_tx,
        );
        let stderr_handle = spawn_reader(
            child.stderr.take(),
            self.stderr_stream(),
            name,
            "stderr",
            stderr_tx,
        );

        let exit_status = child
            .wait()
            .await
            .with_context(|| format!("failed waiting for process {name}"))?;

        for handle in [stdout_handle, stderr_handle].into_iter().flatten() {
            let _ = handle.await;
        }

        Ok(ProcessOutput::new(
            exit_status.code().unwrap_or(-1),
            collect_output(&mut stdout_rx, self.stdout_stream()),
            collect_output(&mut stderr_rx, self.stderr_stream()),
        ))
    }
}
