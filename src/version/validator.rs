// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Version monotonicity checks against previously tagged releases.

use tracing::{debug, trace};

use super::Version;
use crate::error::ValidationError;

/// Returns the highest parsable version among `tags`.
///
/// Tags that do not parse are skipped. Returns `None` when nothing parses.
/// Among equal versions a dotted tag wins over a legacy one, so an existing
/// release is never hidden behind the legacy exemption.
pub fn last_tagged_version<I, S>(tags: I) -> Option<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .filter_map(|tag| match Version::parse(tag.as_ref()) {
            Ok(version) => Some(version),
            Err(e) => {
                trace!(tag = tag.as_ref(), error = %e, "Skipping unparsable tag");
                None
            }
        })
        .max_by(|a, b| a.cmp(b).then_with(|| b.is_legacy().cmp(&a.is_legacy())))
}

/// Checks that `this_version` is newer than the last tagged release.
///
/// Passes when `allow_not_latest` is set, when there is no previous tag, or
/// when the previous tag uses the legacy `vN_N_N` shape.
///
/// # Errors
///
/// Returns [`ValidationError::VersionNotLatest`] when `this_version` does not
/// exceed `last`.
pub fn validate(
    this_version: &Version,
    last: Option<&Version>,
    allow_not_latest: bool,
) -> Result<(), ValidationError> {
    if allow_not_latest {
        debug!(version = %this_version, "Version check skipped (allow-not-latest)");
        return Ok(());
    }
    let Some(last) = last else {
        return Ok(());
    };
    if last.is_legacy() {
        debug!(last = last.as_str(), "Last tag uses legacy format, version check skipped");
        return Ok(());
    }
    if this_version > last {
        Ok(())
    } else {
        Err(ValidationError::VersionNotLatest {
            version: this_version.to_string(),
            latest: last.as_str().to_string(),
        })
    }
}
