// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release command: wires configuration into the release pipeline.
//!
//! ```text
//! config.vcs      --> BackendRegistry --> select_backend
//! config.release  --> ExternalBuildTool, EditorPrompt, packages_path
//! config.notify   --> SmtpNotifier (or none)
//! ```

use anyhow::Context;
use tracing::info;

use crate::cli::release::ReleaseArgs;
use crate::config::Config;
use crate::error::Result;
use crate::release::build::ExternalBuildTool;
use crate::release::message::{CommitMessageProvider, EditorPrompt};
use crate::release::notify::{NoopNotifier, Notifier, SmtpNotifier};
use crate::release::{ReleasePipeline, ReleaseSummary, select_backend};
use crate::vcs::BackendRegistry;

/// Main handler for the release command.
///
/// # Errors
///
/// Returns an error if no release mode applies to the package, or if any
/// pipeline phase fails.
pub async fn run_release_command(args: &ReleaseArgs, config: &Config) -> Result<()> {
    let request = args.to_request();
    let registry = BackendRegistry::with_builtins(&config.vcs);
    let backend = select_backend(&registry, request.path(), request.backend())
        .with_context(|| format!("Cannot release {}", request.path().display()))?;

    let message_provider = config
        .release
        .editor
        .as_deref()
        .map(|editor| Box::new(EditorPrompt::new(editor)) as Box<dyn CommitMessageProvider>);

    let notifier: Box<dyn Notifier> = match SmtpNotifier::from_config(&config.notify) {
        Some(smtp) => Box::new(smtp),
        None => Box::new(NoopNotifier),
    };

    let mut pipeline = ReleasePipeline::builder()
        .with_backend(backend)
        .with_build_tool(Box::new(ExternalBuildTool::new(
            config.release.build_tool.clone(),
        )))
        .maybe_with_message_provider(message_provider)
        .with_notifier(notifier)
        .maybe_with_packages_path(config.release.packages_path.clone())
        .with_scratch_dir(config.release.scratch_dir.clone())
        .build();

    let summary = pipeline.run(&request).await?;
    info!(
        package = %summary.package,
        version = %summary.version,
        mode = %summary.backend,
        "Release complete"
    );
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &ReleaseSummary) {
    println!(
        "Released {}-{} via {} (tag '{}')",
        summary.package, summary.version, summary.backend, summary.tag
    );
    if !summary.revision.id.is_empty() {
        println!("  from revision {}", summary.revision.id);
    }
    for path in &summary.install_paths {
        println!("  {}", path.display());
    }
}
