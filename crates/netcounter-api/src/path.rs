// ── Object paths ──
//
// Counters and network services are addressed on the bus by object
// path. A counter's path doubles as its identity towards the manager,
// so it must be unique among counters running on the same host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// A validated bus object path (`/net/connman/service/wifi_1`).
///
/// Rules: starts with `/`, elements are non-empty and made of
/// `[A-Za-z0-9_]`, no trailing slash unless the path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Validate and wrap a path.
    pub fn parse(raw: impl Into<String>) -> Result<Self, Error> {
        let raw = raw.into();
        validate(&raw).map_err(|reason| Error::InvalidPath {
            path: raw.clone(),
            reason: reason.into(),
        })?;
        Ok(Self(raw))
    }

    /// Generate a fresh path under `prefix` with a random suffix.
    ///
    /// `"/ConnectivityCounter"` becomes something like
    /// `"/ConnectivityCounter4f9c0e7a2b8d4c61a3e5f7b9d1c3e5a7"`. Each call
    /// draws new v4 UUID entropy, so concurrent counters in one process
    /// (or across processes) never collide in practice.
    pub fn unique(prefix: &str) -> Result<Self, Error> {
        let suffix = Uuid::new_v4().simple().to_string();
        Self::parse(format!("{prefix}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(raw: &str) -> Result<(), &'static str> {
    let Some(rest) = raw.strip_prefix('/') else {
        return Err("must start with '/'");
    };
    if rest.is_empty() {
        return Ok(());
    }
    for element in rest.split('/') {
        if element.is_empty() {
            return Err("empty path element");
        }
        if !element
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            return Err("elements may only contain [A-Za-z0-9_]");
        }
    }
    Ok(())
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<ObjectPath> for String {
    fn from(p: ObjectPath) -> Self {
        p.0
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_service_path() {
        let p = ObjectPath::parse("/net/connman/service/wifi_1234_managed_psk").unwrap();
        assert_eq!(p.as_str(), "/net/connman/service/wifi_1234_managed_psk");
    }

    #[test]
    fn accepts_root() {
        assert!(ObjectPath::parse("/").is_ok());
    }

    #[test]
    fn rejects_relative_path() {
        let err = ObjectPath::parse("net/connman").unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn rejects_trailing_slash_and_double_slash() {
        assert!(ObjectPath::parse("/net/").is_err());
        assert!(ObjectPath::parse("/net//connman").is_err());
    }

    #[test]
    fn rejects_punctuation_in_elements() {
        assert!(ObjectPath::parse("/net/conn-man").is_err());
        assert!(ObjectPath::parse("/net/conn.man").is_err());
    }

    #[test]
    fn unique_paths_keep_prefix_and_differ() {
        let a = ObjectPath::unique("/ConnectivityCounter").unwrap();
        let b = ObjectPath::unique("/ConnectivityCounter").unwrap();
        assert!(a.as_str().starts_with("/ConnectivityCounter"));
        assert!(a.as_str().len() > "/ConnectivityCounter".len());
        assert_ne!(a, b);
    }

    #[test]
    fn unique_rejects_bad_prefix() {
        assert!(ObjectPath::unique("ConnectivityCounter").is_err());
        assert!(ObjectPath::unique("/Connectivity-Counter").is_err());
    }

    #[test]
    fn serde_round_trips_through_string() {
        let p = ObjectPath::parse("/net/connman/service/ethernet_1").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"/net/connman/service/ethernet_1\"");
        let back: ObjectPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<ObjectPath>("\"no-slash\"").is_err());
    }
}
