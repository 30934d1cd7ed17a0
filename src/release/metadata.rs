// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Package metadata (`package.yaml`).
//!
//! ```yaml
//! name: foo
//! version: 1.2.0
//! uuid: 5d9e3ba4-7c36-4f2e-a7ab-0a3c2e3b6a11
//! description: Foo tools
//! authors: [alice, bob]
//! variants:
//!   - [python-2.7]
//!   - [python-3.9]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{ReleaseError, ReleaseResult, ValidationError};
use crate::version::Version;

/// Metadata file read from the package root.
pub const METADATA_FILE: &str = "package.yaml";

/// Loads package metadata for a release.
pub trait MetadataSource: Send + Sync {
    /// Reads and validates the metadata of the package at `package_dir`.
    ///
    /// # Errors
    ///
    /// Fails with a [`ValidationError`] when the metadata is missing or
    /// incomplete.
    fn load(&self, package_dir: &Path) -> ReleaseResult<PackageMetadata>;
}

/// One build configuration of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub index: usize,
    pub args: Vec<String>,
    /// Stands in for a package that declares no variants. The build tool is
    /// not given a variant index for it.
    pub implicit: bool,
}

impl Variant {
    #[must_use]
    pub const fn implicit() -> Self {
        Self {
            index: 0,
            args: Vec::new(),
            implicit: true,
        }
    }

    /// Index passed to the build tool, `None` for the implicit variant.
    #[must_use]
    pub const fn build_index(&self) -> Option<usize> {
        if self.implicit { None } else { Some(self.index) }
    }

    /// Human-readable label for logs and errors.
    #[must_use]
    pub fn label(&self) -> String {
        if self.implicit {
            "project".to_string()
        } else {
            format!("variant #{}", self.index)
        }
    }
}

/// Validated package metadata.
#[derive(Debug, Clone)]
pub struct PackageMetadata {
    pub name: String,
    pub version: Version,
    pub uuid: String,
    pub description: String,
    pub authors: Vec<String>,
    pub variants: Vec<Variant>,
}

impl PackageMetadata {
    /// Declared variants, or the single implicit one.
    #[must_use]
    pub fn resolved_variants(&self) -> Vec<Variant> {
        if self.variants.is_empty() {
            vec![Variant::implicit()]
        } else {
            self.variants.clone()
        }
    }

    /// `<name>-<version>`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Reads `package.yaml` with `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlMetadata;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    name: Option<String>,
    version: Option<serde_yaml::Value>,
    uuid: Option<String>,
    description: Option<String>,
    authors: Option<OneOrMany>,
    variants: Vec<OneOrMany>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Version scalars may be written unquoted (`version: 1.2`).
fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl YamlMetadata {
    /// Parses metadata text. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for the first required
    /// field that is absent or empty, or [`ValidationError::InvalidVersion`].
    pub fn parse(path: &Path, content: &str) -> ReleaseResult<PackageMetadata> {
        let display = path.display().to_string();
        let raw: RawMetadata =
            serde_yaml::from_str(content).map_err(|e| ReleaseError::Io {
                path: display.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?;

        let missing = |field: &'static str| ValidationError::MissingField {
            path: display.clone(),
            field,
        };

        let version_text = raw
            .version
            .as_ref()
            .and_then(scalar_to_string)
            .ok_or_else(|| missing("version"))?;
        let version = Version::parse(&version_text)?;
        let name = non_empty(raw.name).ok_or_else(|| missing("name"))?;
        let uuid = non_empty(raw.uuid).ok_or_else(|| missing("uuid"))?;
        let description = non_empty(raw.description).ok_or_else(|| missing("description"))?;
        let authors: Vec<String> = raw
            .authors
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect();
        if authors.is_empty() {
            return Err(missing("authors").into());
        }

        let variants = raw
            .variants
            .into_iter()
            .enumerate()
            .map(|(index, args)| Variant {
                index,
                args: args.into_vec(),
                implicit: false,
            })
            .collect();

        Ok(PackageMetadata {
            name,
            version,
            uuid,
            description,
            authors,
            variants,
        })
    }
}

impl MetadataSource for YamlMetadata {
    fn load(&self, package_dir: &Path) -> ReleaseResult<PackageMetadata> {
        let path = package_dir.join(METADATA_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ValidationError::MetadataNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => return Err(ReleaseError::io(&path, e)),
        };
        Self::parse(&path, &content)
    }
}
