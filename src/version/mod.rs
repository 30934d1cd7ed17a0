// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Package version value type.
//!
//! A version is a dotted sequence of components. Numeric components compare
//! by value, text components lexicographically, and every number orders
//! before every text component. A version that is a strict prefix of another
//! orders first, which makes `0` the global minimum:
//!
//! ```text
//! 0 < 0.1 < 1 < 1.1 < 1.1.9 < 1.2.0 < 1.2.alpha
//! ```
//!
//! The legacy tag shape `v<digits>_<digits>_<digits>` is recognized,
//! normalized to its dotted form and flagged with [`Version::is_legacy`].

mod validator;

pub use validator::{last_tagged_version, validate};

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// One dotted component of a [`Version`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    /// All-digit component. Declared first so numbers order before text.
    Number(u64),
    /// Alphanumeric component containing at least one non-digit.
    Text(String),
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Parsed, immutable package version.
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<Component>,
    raw: String,
    legacy: bool,
}

impl Version {
    /// Parses a version string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidVersion`] for empty input, empty
    /// components, or characters outside `[A-Za-z0-9_]`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if let Some(components) = parse_legacy(input) {
            return Ok(Self {
                components,
                raw: input.to_string(),
                legacy: true,
            });
        }

        let invalid = |reason: &str| ValidationError::InvalidVersion {
            version: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("empty version string"));
        }

        let components = input
            .split('.')
            .map(|token| {
                if token.is_empty() {
                    return Err(invalid("empty component"));
                }
                if !token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(invalid(&format!("invalid character in component '{token}'")));
                }
                if token.chars().all(|c| c.is_ascii_digit()) {
                    token
                        .parse::<u64>()
                        .map(Component::Number)
                        .map_err(|_| invalid(&format!("component '{token}' is out of range")))
                } else {
                    Ok(Component::Text(token.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            components,
            raw: input.to_string(),
            legacy: false,
        })
    }

    /// Whether this version was parsed from the legacy `vN_N_N` tag shape.
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        self.legacy
    }

    /// The string this version was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed components, in order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }
}

/// Recognizes exactly `v<digits>_<digits>_<digits>`.
fn parse_legacy(input: &str) -> Option<Vec<Component>> {
    let body = input.strip_prefix('v')?;
    let parts: Vec<&str> = body.split('_').collect();
    if parts.len() != 3 {
        return None;
    }
    parts
        .into_iter()
        .map(|part| {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            part.parse::<u64>().ok().map(Component::Number)
        })
        .collect()
}

impl FromStr for Version {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}
