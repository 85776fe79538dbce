//! Client configuration: timeouts and named profiles.
//!
//! Timeouts default to the documented per-family values; a
//! [`ConfigProfile`] overrides only the fields it names. Profiles can come
//! from the built-in set or from a YAML file.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, ErrorKind};
use crate::Result;

/// Per-family operation timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
    pub analytics_timeout: Duration,
    pub search_timeout: Duration,
    pub management_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            query_timeout: Duration::from_secs(75),
            analytics_timeout: Duration::from_secs(75),
            search_timeout: Duration::from_secs(75),
            management_timeout: Duration::from_secs(75),
        }
    }
}

/// Options for constructing a [`Cluster`](crate::Cluster).
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    pub timeouts: TimeoutConfig,
}

impl ClusterOptions {
    /// Applies a profile on top of the current timeouts.
    pub fn apply_profile(mut self, profile: &ConfigProfile) -> Self {
        profile.apply(&mut self.timeouts);
        self
    }
}

/// A named set of timeout overrides. Fields left out keep their current
/// values; durations are expressed in milliseconds in profile files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigProfile {
    pub connect_timeout_ms: Option<u64>,
    pub query_timeout_ms: Option<u64>,
    pub analytics_timeout_ms: Option<u64>,
    pub search_timeout_ms: Option<u64>,
    pub management_timeout_ms: Option<u64>,
}

impl ConfigProfile {
    /// The built-in profile for development across a WAN: generous
    /// timeouts everywhere.
    pub fn wan_development() -> Self {
        Self {
            connect_timeout_ms: Some(20_000),
            query_timeout_ms: Some(120_000),
            analytics_timeout_ms: Some(120_000),
            search_timeout_ms: Some(120_000),
            management_timeout_ms: Some(120_000),
        }
    }

    /// Loads a profile from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::with_message(
                ErrorKind::InvalidArgument,
                format!("cannot read profile {}: {}", path.as_ref().display(), e),
            )
        })?;
        Self::from_yaml(&text)
    }

    /// Parses a profile from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| {
            Error::with_message(
                ErrorKind::InvalidArgument,
                format!("malformed profile: {}", e),
            )
        })
    }

    /// Applies this profile's overrides to a timeout configuration.
    pub fn apply(&self, timeouts: &mut TimeoutConfig) {
        if let Some(ms) = self.connect_timeout_ms {
            timeouts.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.query_timeout_ms {
            timeouts.query_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.analytics_timeout_ms {
            timeouts.analytics_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.search_timeout_ms {
            timeouts.search_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.management_timeout_ms {
            timeouts.management_timeout = Duration::from_millis(ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_overrides_only_named_fields() {
        let mut timeouts = TimeoutConfig::default();
        let profile = ConfigProfile {
            query_timeout_ms: Some(120_000),
            ..Default::default()
        };
        profile.apply(&mut timeouts);

        assert_eq!(timeouts.query_timeout, Duration::from_secs(120));
        assert_eq!(timeouts.search_timeout, Duration::from_secs(75));
    }

    #[test]
    fn wan_development_profile() {
        let mut timeouts = TimeoutConfig::default();
        ConfigProfile::wan_development().apply(&mut timeouts);
        assert_eq!(timeouts.connect_timeout, Duration::from_secs(20));
        assert_eq!(timeouts.analytics_timeout, Duration::from_secs(120));
    }

    #[test]
    fn profiles_parse_from_yaml() {
        let profile =
            ConfigProfile::from_yaml("query_timeout_ms: 30000\nsearch_timeout_ms: 5000\n")
                .unwrap();
        assert_eq!(profile.query_timeout_ms, Some(30_000));
        assert_eq!(profile.search_timeout_ms, Some(5_000));
        assert_eq!(profile.connect_timeout_ms, None);
    }

    #[test]
    fn malformed_yaml_is_invalid_argument() {
        let err = ConfigProfile::from_yaml(": not yaml :").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
