//! Semantic Versions
//!
//! A [`Version`] is a `major.minor.patch` triple of non-negative integers.
//! Versions only move forward: [`Version::bump`] increments one component
//! and resets the lower ones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Which component of a version to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    /// `(major + 1, 0, 0)`
    Major,
    /// `(major, minor + 1, 0)`
    Minor,
    /// `(major, minor, patch + 1)`
    Patch,
}

/// A semantic version value.
///
/// Ordering is component-wise, so a bumped version always compares greater
/// than the version it was bumped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Create a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// The version a newly created component starts at.
    pub const fn initial() -> Self {
        Self::new(1, 0, 0)
    }

    /// Parse a canonical `major.minor.patch` string.
    ///
    /// Each component must be a non-empty run of ASCII digits that fits in a
    /// `u32`; signs, whitespace, and pre-release suffixes are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let format_error = |reason: &str| Error::Format {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = input.split('.');
        let mut next = |name: &str| -> Result<u32> {
            let part = parts
                .next()
                .ok_or_else(|| format_error(&format!("missing {name} component")))?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format_error(&format!("{name} component `{part}` is not a number")));
            }
            part.parse::<u32>()
                .map_err(|_| format_error(&format!("{name} component `{part}` is out of range")))
        };

        let major = next("major")?;
        let minor = next("minor")?;
        let patch = next("patch")?;

        if parts.next().is_some() {
            return Err(format_error("expected exactly three components"));
        }

        Ok(Self::new(major, minor, patch))
    }

    /// Return the next version for the given bump kind.
    ///
    /// Fails with [`Error::Format`] when the component to increment is
    /// already at `u32::MAX`.
    pub fn bump(self, kind: BumpKind) -> Result<Self> {
        let overflow = |name: &str| Error::Format {
            input: self.to_string(),
            reason: format!("{name} component cannot be incremented past {}", u32::MAX),
        };
        let next = match kind {
            BumpKind::Major => {
                Self::new(self.major.checked_add(1).ok_or_else(|| overflow("major"))?, 0, 0)
            }
            BumpKind::Minor => Self::new(
                self.major,
                self.minor.checked_add(1).ok_or_else(|| overflow("minor"))?,
                0,
            ),
            BumpKind::Patch => Self::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(|| overflow("patch"))?,
            ),
        };
        Ok(next)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
