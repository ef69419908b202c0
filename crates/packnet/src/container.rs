//! Container identifiers.

use crate::error::PacknetError;
use std::fmt;
use std::str::FromStr;

/// Length of the id prefix used for controller names and device names
pub const SHORT_ID_LEN: usize = 10;

/// Validated container identifier
///
/// Only ASCII alphanumerics, `-`, `_` and `.` are accepted, so the id can be
/// embedded in device names and command lines without quoting. The first
/// character must be alphanumeric so the id is never parsed as an option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    /// Validate and wrap a container id
    pub fn new(id: impl Into<String>) -> Result<Self, PacknetError> {
        let id = id.into();
        let valid = id.starts_with(|c: char| c.is_ascii_alphanumeric())
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(PacknetError::InvalidContainerId(id));
        }
        Ok(Self(id))
    }

    /// Full identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First ten characters (the whole id when shorter)
    pub fn short(&self) -> &str {
        // ASCII only, so byte and char offsets agree
        &self.0[..self.0.len().min(SHORT_ID_LEN)]
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContainerId {
    type Err = PacknetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
