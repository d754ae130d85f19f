//! Access modes for reaching a container

use std::fmt;
use std::str::FromStr;

use crate::error::ResolveError;

/// Where the caller sits relative to the target container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    /// The test-runner process, outside any container network.
    /// Reaches the container through its host-mapped ports.
    #[default]
    Local,
    /// Another container on the same user-defined network.
    /// Reaches the container through its network alias and internal port.
    Network,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Local => "local",
            AccessMode::Network => "network",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "network" => Ok(Self::Network),
            _ => Err(ResolveError::UnsupportedAccessMode(s.to_string())),
        }
    }
}

/// Numeric form, `0` for local and `1` for network.
impl TryFrom<i32> for AccessMode {
    type Error = ResolveError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Local),
            1 => Ok(Self::Network),
            other => Err(ResolveError::UnsupportedAccessMode(other.to_string())),
        }
    }
}

impl TryFrom<&str> for AccessMode {
    type Error = ResolveError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
