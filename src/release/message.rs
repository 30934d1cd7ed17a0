// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Commit-message providers.
//!
//! ```text
//! default text --> provider --> Accepted(text) | Cancelled
//!
//! FixedMessage   always accepts a preset text
//! EditorPrompt   temp file --> $editor --> unchanged? --> (a)bort/(c)ontinue
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use futures_util::future::BoxFuture;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
use tracing::{debug, info, warn};

use crate::core::process::builder::ProcessBuilder;
use crate::error::Result;

/// Result of asking for a commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Accepted(String),
    Cancelled,
}

/// Produces the final commit message from a default text.
pub trait CommitMessageProvider: Send + Sync {
    /// `scratch_root` is the run's scratch build root, usable for temp files.
    fn provide<'a>(
        &'a self,
        default_text: &'a str,
        scratch_root: &'a Path,
    ) -> BoxFuture<'a, Result<MessageOutcome>>;
}

/// Accepts a preset message, ignoring the default text.
#[derive(Debug, Clone)]
pub struct FixedMessage {
    message: String,
}

impl FixedMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl CommitMessageProvider for FixedMessage {
    fn provide<'a>(
        &'a self,
        _default_text: &'a str,
        _scratch_root: &'a Path,
    ) -> BoxFuture<'a, Result<MessageOutcome>> {
        Box::pin(async move { Ok(MessageOutcome::Accepted(self.message.clone())) })
    }
}

/// Opens the operator's editor on the default text.
#[derive(Debug, Clone)]
pub struct EditorPrompt {
    editor: String,
}

impl EditorPrompt {
    pub fn new(editor: impl Into<String>) -> Self {
        Self {
            editor: editor.into(),
        }
    }

    async fn edit(&self, default_text: &str, path: &Path) -> Result<MessageOutcome> {
        tokio::fs::write(path, default_text)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        let command = format!("{} {}", self.editor, shell_quote(&path.display().to_string()));
        info!(editor = %self.editor, "Opening editor for the commit message");
        ProcessBuilder::raw(command)
            .name("editor")
            .inherit_stdio()
            .run()
            .await
            .context("error getting commit message")?;

        let edited = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        if edited != default_text {
            debug!("Got commit message");
            return Ok(MessageOutcome::Accepted(edited));
        }

        if confirm_unchanged().await? {
            Ok(MessageOutcome::Accepted(edited))
        } else {
            Ok(MessageOutcome::Cancelled)
        }
    }
}

/// Asks whether to continue with an unedited message. EOF aborts.
async fn confirm_unchanged() -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Commit message unchanged - (a)bort or (c)ontinue? ")
        .await?;
    stdout.flush().await?;

    let mut reply = String::new();
    let read = BufReader::new(tokio::io::stdin())
        .read_line(&mut reply)
        .await?;
    Ok(read > 0 && reply.trim() == "c")
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

impl CommitMessageProvider for EditorPrompt {
    fn provide<'a>(
        &'a self,
        default_text: &'a str,
        scratch_root: &'a Path,
    ) -> BoxFuture<'a, Result<MessageOutcome>> {
        Box::pin(async move {
            let temp = tempfile::Builder::new()
                .prefix("commit-message-")
                .suffix(".txt")
                .tempfile_in(scratch_root)
                .with_context(|| {
                    format!("failed to create temp file in {}", scratch_root.display())
                })?;
            let path: PathBuf = temp.path().to_path_buf();

            let outcome = self.edit(default_text, &path).await;

            // The editor may have replaced the file, so remove by path.
            if let Err(e) = temp.close()
                && path.exists()
            {
                warn!(path = %path.display(), error = %e, "Failed to remove commit message file");
            }
            outcome
        })
    }
}
