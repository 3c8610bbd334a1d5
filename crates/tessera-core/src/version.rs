use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Remote API version, ordered semantically rather than lexically.
///
/// Accepts `"7.0.1"`, `"v7.2"` and `"6.4.0-build1234"`. Missing components
/// are zero and any pre-release or build suffix is ignored for ordering, so
/// `"7.2"` and `"7.2.0-build9"` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u32,
    minor: u32,
    patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let core = trimmed
            .split(['-', '+'])
            .next()
            .unwrap_or_default();

        if core.is_empty() {
            return Err(CoreError::invalid_version(s));
        }

        let mut parts = [0u32; 3];
        for (i, component) in core.split('.').enumerate() {
            if i >= parts.len() {
                return Err(CoreError::invalid_version(format!(
                    "{s}: more than three components"
                )));
            }
            parts[i] = component
                .parse::<u32>()
                .map_err(|e| CoreError::invalid_version(format!("{s}: {e}")))?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl TryFrom<String> for Version {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}
