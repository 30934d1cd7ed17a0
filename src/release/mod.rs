// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release pipeline.
//!
//! ```text
//! created --> pre_build --> build --> install --> post_install --> done
//!                 |           |          |             |
//!                 +-----------+----------+-------------+--> failed
//!
//! pre_build     metadata, uuid check, scratch root, build time,
//!               validate_clean, tag check, version check, changelog,
//!               commit message
//! build         per variant: export into <scratch>/<n>, build
//! install       family uuid (first release), per variant: install, seal
//! post_install  release time, notification, tag (last)
//! ```
//!
//! Variants are processed one at a time. Nothing touches the central store
//! before the install phase, and the tag is created only after every
//! variant installed.

pub mod build;
pub mod central;
pub mod changelog;
pub mod context;
pub mod message;
pub mod metadata;
pub mod notify;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use bon::Builder;
use tracing::{Instrument as _, debug, error, info, info_span, warn};

use crate::error::{ReleaseError, ReleaseResult, ShelfResult, ValidationError, VcsError};
use crate::vcs::{BackendRegistry, VcsBackend};
use crate::version;

use build::{BuildInvocation, BuildTool};
use central::{CentralStore, seal_installed};
use changelog::MessageSeed;
use message::{CommitMessageProvider, MessageOutcome};
use metadata::{MetadataSource, Variant, YamlMetadata};
use notify::{NoopNotifier, Notification, Notifier};

pub use context::{Phase, ReleaseContext, ReleaseRequest, ReleaseSummary};

/// Default scratch build root, relative to the package directory.
pub const DEFAULT_SCRATCH_DIR: &str = "build/release";

fn current_user() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "unknown.user".to_string())
}

/// Picks the release mode for `path`: `name` if given, otherwise the
/// highest-priority backend that accepts the path.
///
/// # Errors
///
/// Fails if `name` is unknown or does not apply to `path`, or if probing
/// hits a real backend failure.
pub fn select_backend(
    registry: &BackendRegistry,
    path: &Path,
    name: Option<&str>,
) -> ShelfResult<Box<dyn VcsBackend>> {
    let name = match name {
        Some(name) => name.to_string(),
        None => registry
            .probe_available(path)?
            .into_iter()
            .next()
            .ok_or_else(|| VcsError::unsupported(path, "no release mode applies"))?,
    };
    info!(mode = %name, path = %path.display(), "Selected release mode");
    registry.create(&name, path)
}

/// Drives one release through its phases.
#[derive(Builder)]
pub struct ReleasePipeline {
    #[builder(setters(name = with_backend))]
    backend: Box<dyn VcsBackend>,
    #[builder(setters(name = with_build_tool))]
    build_tool: Box<dyn BuildTool>,
    #[builder(
        setters(name = with_metadata_source),
        default = Box::new(YamlMetadata) as Box<dyn MetadataSource>
    )]
    metadata_source: Box<dyn MetadataSource>,
    /// Needed only when the request carries no commit message.
    #[builder(setters(name = with_message_provider))]
    message_provider: Option<Box<dyn CommitMessageProvider>>,
    #[builder(
        setters(name = with_notifier),
        default = Box::new(NoopNotifier) as Box<dyn Notifier>
    )]
    notifier: Box<dyn Notifier>,
    /// Central release root.
    #[builder(setters(name = with_packages_path), into)]
    packages_path: Option<PathBuf>,
    #[builder(setters(name = with_scratch_dir), into, default = PathBuf::from(DEFAULT_SCRATCH_DIR))]
    scratch_dir: PathBuf,
    /// Name used in the notification subject.
    #[builder(setters(name = with_user), into, default = current_user())]
    user: String,
    #[builder(skip = Phase::Created)]
    phase: Phase,
}

impl ReleasePipeline {
    /// Current phase. `Done` after success, `Failed` after any error.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn backend(&self) -> &dyn VcsBackend {
        self.backend.as_ref()
    }

    /// Runs all phases in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the [`ReleaseError`] of the failing phase. Validation errors
    /// always happen before any build or install work.
    pub async fn run(&mut self, request: &ReleaseRequest) -> ReleaseResult<ReleaseSummary> {
        let result = self.run_phases(request).await;
        if let Err(e) = &result {
            error!(phase = %self.phase, error = %e, "Release failed");
            self.phase = Phase::Failed;
        }
        result
    }

    fn enter(&mut self, phase: Phase) {
        info!(from = %self.phase, to = %phase, "Release phase");
        self.phase = phase;
    }

    async fn run_phases(&mut self, request: &ReleaseRequest) -> ReleaseResult<ReleaseSummary> {
        self.enter(Phase::PreBuild);
        let ctx = self
            .pre_build(request)
            .instrument(info_span!("release_phase", phase = %Phase::PreBuild))
            .await?;

        self.enter(Phase::Build);
        self.build(&ctx)
            .instrument(info_span!("release_phase", phase = %Phase::Build))
            .await?;

        self.enter(Phase::Install);
        let install_paths = self
            .install(&ctx)
            .instrument(info_span!("release_phase", phase = %Phase::Install))
            .await?;

        self.enter(Phase::PostInstall);
        let release_time = self
            .post_install(&ctx)
            .instrument(info_span!("release_phase", phase = %Phase::PostInstall))
            .await?;

        self.enter(Phase::Done);
        info!(
            package = %ctx.metadata.qualified_name(),
            variants = ctx.variants.len(),
            "Release complete"
        );
        Ok(ReleaseSummary {
            package: ctx.metadata.name.clone(),
            version: ctx.metadata.version.as_str().to_string(),
            backend: self.backend.name().to_string(),
            tag: ctx.tag_name().to_string(),
            revision: ctx.revision.clone(),
            install_paths,
            release_time,
        })
    }

    async fn pre_build(&self, request: &ReleaseRequest) -> ReleaseResult<ReleaseContext> {
        let metadata = self.metadata_source.load(request.path())?;
        info!(package = %metadata.qualified_name(), mode = self.backend.name(), "Preparing release");

        let packages_path =
            self.packages_path
                .as_deref()
                .ok_or_else(|| ValidationError::MissingConfig {
                    key: "release.packages_path".to_string(),
                })?;
        let store = CentralStore::new(packages_path, &metadata.name);
        let uuid_recorded = store.check_uuid(&metadata.uuid)?;

        let variants = metadata.resolved_variants();

        let scratch_root = request.path().join(&self.scratch_dir);
        recreate_dir(&scratch_root)?;

        // Every variant resolves dependencies against the same instant.
        let build_time = match request.build_time() {
            0 => chrono::Utc::now().timestamp(),
            pinned => pinned,
        };

        if request.message().is_none() && self.message_provider.is_none() {
            return Err(ValidationError::MissingConfig {
                key: "release.editor".to_string(),
            }
            .into());
        }

        self.backend.validate_clean()?;
        self.backend.check_tag_available(metadata.version.as_str())?;
        let revision = self.backend.current_revision()?;
        debug!(revision = %revision.id, "Releasing from revision");

        let last_tagged_version = self.backend.last_tagged_version()?;
        version::validate(
            &metadata.version,
            last_tagged_version.as_ref(),
            request.allow_not_latest(),
        )?;

        let previous_revision = match &last_tagged_version {
            Some(last) => self.backend.revision_for_tag(last.as_str())?,
            None => None,
        };
        let changelog = changelog::assemble(self.backend.as_ref(), previous_revision.as_ref())?;
        let changelog_file = changelog::write_side_file(&scratch_root, &changelog)?;

        let commit_message = match changelog::fold(request.message(), &changelog) {
            MessageSeed::Final(message) => message,
            MessageSeed::Prompt(default_text) => {
                self.prompt_message(&default_text, &scratch_root).await?
            }
        };

        let tag_locator = self.backend.tag_locator(&metadata.version)?;

        Ok(ReleaseContext {
            metadata,
            store,
            uuid_recorded,
            variants,
            scratch_root,
            build_time,
            jobs: request.jobs(),
            allow_not_latest: request.allow_not_latest(),
            last_tagged_version,
            previous_revision,
            revision,
            changelog,
            changelog_file,
            commit_message,
            tag_locator,
        })
    }

    async fn prompt_message(&self, default_text: &str, scratch_root: &Path) -> ReleaseResult<String> {
        let Some(provider) = &self.message_provider else {
            return Err(ValidationError::MissingConfig {
                key: "release.editor".to_string(),
            }
            .into());
        };
        let outcome = provider
            .provide(default_text, scratch_root)
            .await
            .map_err(|e| ReleaseError::CommitMessage {
                message: format!("{e:#}"),
            })?;
        match outcome {
            MessageOutcome::Accepted(message) => Ok(message),
            MessageOutcome::Cancelled => Err(ReleaseError::Cancelled),
        }
    }

    fn invocation(&self, ctx: &ReleaseContext, variant: &Variant) -> BuildInvocation {
        BuildInvocation::builder()
            .with_source_dir(ctx.variant_dir(variant))
            .with_build_time(ctx.build_time)
            .maybe_with_variant(variant.build_index())
            .with_jobs(ctx.jobs)
            .maybe_with_tag_locator(ctx.tag_locator.clone())
            .maybe_with_changelog_file(ctx.changelog_file.clone())
            .build()
    }

    async fn build(&self, ctx: &ReleaseContext) -> ReleaseResult<()> {
        for variant in &ctx.variants {
            let dir = ctx.variant_dir(variant);
            remove_path(&dir)?;
            info!(variant = %variant.label(), dir = %dir.display(), "Creating clean copy");
            self.backend.export_source(&dir)?;

            info!(variant = %variant.label(), "Building");
            let invocation = self.invocation(ctx, variant);
            self.build_tool
                .build(&invocation)
                .await
                .map_err(|e| ReleaseError::Build {
                    variant: variant.label(),
                    message: format!("{e:#}"),
                })?;
        }
        Ok(())
    }

    async fn install(&self, ctx: &ReleaseContext) -> ReleaseResult<Vec<PathBuf>> {
        if !ctx.uuid_recorded {
            ctx.store.write_uuid(&ctx.metadata.uuid)?;
        }

        let mut install_paths = Vec::with_capacity(ctx.variants.len());
        for variant in &ctx.variants {
            let invocation = self.invocation(ctx, variant);
            let install_failed = |message: String| ReleaseError::Install {
                variant: variant.label(),
                message,
            };

            let path = self
                .build_tool
                .install(&invocation)
                .await
                .map_err(|e| install_failed(format!("{e:#}")))?;
            info!(variant = %variant.label(), path = %path.display(), "Installed");

            seal_installed(&path).map_err(|e| install_failed(e.to_string()))?;
            install_paths.push(path);
        }
        Ok(install_paths)
    }

    async fn post_install(&self, ctx: &ReleaseContext) -> ReleaseResult<i64> {
        let release_time = chrono::Utc::now().timestamp();
        ctx.store
            .write_release_time(ctx.metadata.version.as_str(), release_time)?;

        self.send_notification(ctx).await;

        let tag = ctx.tag_name();
        info!(tag = %tag, "Tagging release");
        self.backend
            .create_tag(tag, &ctx.commit_message)
            .map_err(|e| ReleaseError::Tag {
                tag: tag.to_string(),
                message: e.to_string(),
            })?;
        Ok(release_time)
    }

    async fn send_notification(&self, ctx: &ReleaseContext) {
        let details = self
            .backend
            .commit_details(ctx.previous_revision.as_ref())
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not collect commit details");
                Vec::new()
            });
        let notes = self
            .backend
            .release_notes(ctx.previous_revision.as_ref())
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not collect release notes");
                Vec::new()
            });

        let notification = Notification::for_release(
            &self.user,
            &ctx.metadata.qualified_name(),
            ctx.variants.len(),
            notify::release_body(&ctx.commit_message, &details, &notes),
        );
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(error = %format!("{e:#}"), "Release notification failed");
        }
    }
}

/// Removes whatever is at `path`: directory, file or link.
fn remove_path(path: &Path) -> ReleaseResult<()> {
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return Ok(());
    };
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| ReleaseError::io(path, e))
}

fn recreate_dir(path: &Path) -> ReleaseResult<()> {
    remove_path(path)?;
    std::fs::create_dir_all(path).map_err(|e| ReleaseError::io(path, e))
}
