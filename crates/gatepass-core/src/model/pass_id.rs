// ── Pass identity ──
//
// A pass is known locally before the backend has assigned it an id, so
// the key is either a client-minted UUID or the backend's opaque string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for a visitor pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PassId {
    /// Assigned by the backend. Opaque (often a Mongo ObjectId).
    Remote(String),
    /// Minted locally; the backend has not echoed an id yet.
    Local(Uuid),
}

impl PassId {
    pub fn local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    /// The backend id, if one exists.
    pub fn as_remote(&self) -> Option<&str> {
        match self {
            Self::Remote(s) => Some(s),
            Self::Local(_) => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(s) => write!(f, "{s}"),
            Self::Local(u) => write!(f, "local:{u}"),
        }
    }
}

impl FromStr for PassId {
    type Err = std::convert::Infallible;

    /// `local:<uuid>` round-trips a local id; anything else is a backend id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<String> for PassId {
    fn from(s: String) -> Self {
        match s.strip_prefix("local:").map(Uuid::parse_str) {
            Some(Ok(u)) => Self::Local(u),
            _ => Self::Remote(s),
        }
    }
}

impl From<&str> for PassId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}
