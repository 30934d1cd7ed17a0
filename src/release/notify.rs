// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release notifications.
//!
//! ```text
//! SMTP dialogue (plain, no auth):
//!   S: 220            C: HELO <host>
//!   S: 250            C: MAIL FROM:<from>
//!   S: 250            C: RCPT TO:<to>   (per recipient)
//!   S: 250            C: DATA
//!   S: 354            C: headers, body, "."
//!   S: 250            C: QUIT
//! ```
//!
//! Delivery failures are reported to the caller, which logs them; a
//! release never fails because mail could not be sent.

use anyhow::{Context as _, bail};
use futures_util::future::BoxFuture;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::types::NotifyConfig;
use crate::error::Result;
use crate::vcs::ReleaseNote;

/// A rendered release announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// `[release] <user> released <name>-<version>`, with the variant count
    /// when there is more than one.
    #[must_use]
    pub fn for_release(user: &str, qualified_name: &str, variants: usize, body: String) -> Self {
        let mut subject = format!("[release] {user} released {qualified_name}");
        if variants > 1 {
            subject.push_str(&format!(" ({variants} variants)"));
        }
        Self { subject, body }
    }
}

/// Commit message, then per-commit details, then `<release>` notes.
#[must_use]
pub fn release_body(commit_message: &str, details: &[String], notes: &[ReleaseNote]) -> String {
    let mut body = commit_message.trim_end().to_string();
    if !details.is_empty() {
        body.push_str("\n\n");
        body.push_str(&details.join("\n"));
    }
    if !notes.is_empty() {
        body.push_str("\n\nRelease notes:");
        for note in notes {
            body.push_str(&format!("\n- {}: {}", note.author, note.message));
        }
    }
    body
}

/// Delivers release announcements.
pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>>;
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            debug!(subject = %notification.subject, "No recipients configured, skipping notification");
            Ok(())
        })
    }
}

/// Sends mail through a plain SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    from: String,
    recipients: Vec<String>,
    host: String,
    port: u16,
}

impl SmtpNotifier {
    #[must_use]
    pub fn new(from: String, recipients: Vec<String>, host: String, port: u16) -> Self {
        Self {
            from,
            recipients,
            host,
            port,
        }
    }

    /// SMTP notifier for the configured recipients, or `None` when there
    /// are none.
    #[must_use]
    pub fn from_config(config: &NotifyConfig) -> Option<Self> {
        let recipients = config.recipients();
        if recipients.is_empty() {
            return None;
        }
        Some(Self::new(
            config.from.clone(),
            recipients,
            config.smtp_host.clone(),
            config.smtp_port,
        ))
    }

    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("failed to connect to {}:{}", self.host, self.port))?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        expect_reply(&mut reader, 220).await?;
        command(&mut writer, &format!("HELO {}", local_hostname())).await?;
        expect_reply(&mut reader, 250).await?;
        command(&mut writer, &format!("MAIL FROM:<{}>", self.from)).await?;
        expect_reply(&mut reader, 250).await?;
        for recipient in &self.recipients {
            command(&mut writer, &format!("RCPT TO:<{recipient}>")).await?;
            expect_reply(&mut reader, 250).await?;
        }
        command(&mut writer, "DATA").await?;
        expect_reply(&mut reader, 354).await?;
        writer
            .write_all(render_message(&self.from, &self.recipients, notification).as_bytes())
            .await?;
        expect_reply(&mut reader, 250).await?;
        debug!("SMTP server accepted the message");

        // The message is queued at this point; a relay that hangs up on
        // QUIT does not undo delivery.
        let quit = async {
            command(&mut writer, "QUIT").await?;
            expect_reply(&mut reader, 221).await
        };
        if let Err(e) = quit.await {
            debug!(error = %format!("{e:#}"), "SMTP QUIT not acknowledged");
        }
        Ok(())
    }
}

fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

async fn command<W>(writer: &mut W, line: &str) -> Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    writer.write_all(format!("{line}\r\n").as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads a possibly multi-line reply (`250-...` continues, `250 ...` ends).
async fn expect_reply<R>(reader: &mut R, expected: u16) -> Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            bail!("SMTP server closed the connection, expected {expected}");
        }
        let line = line.trim_end();
        let code: u16 = line
            .get(..3)
            .and_then(|c| c.parse().ok())
            .with_context(|| format!("malformed SMTP reply: {line}"))?;
        if code != expected && !(expected == 250 && code == 251) {
            bail!("SMTP server replied '{line}', expected {expected}");
        }
        if line.as_bytes().get(3) != Some(&b'-') {
            return Ok(());
        }
    }
}

/// Headers, dot-stuffed body and the terminating `.` line.
pub(crate) fn render_message(from: &str, to: &[String], notification: &Notification) -> String {
    let mut message = format!(
        "From: {from}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n",
        to.join(","),
        notification.subject
    );
    for line in notification.body.lines() {
        if line.starts_with('.') {
            message.push('.');
        }
        message.push_str(line);
        message.push_str("\r\n");
    }
    message.push_str(".\r\n");
    message
}

impl Notifier for SmtpNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            info!(
                recipients = %self.recipients.join(", "),
                host = %self.host,
                "Sending release notification"
            );
            self.send(notification).await
        })
    }
}
