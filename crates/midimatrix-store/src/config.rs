//! Store configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the store can be opened with zero
//! configuration for local development.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// What happens to a user's records when the user is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Remove the user's profile and matrices together with the user.
    #[default]
    Cascade,
    /// Refuse to remove a user that still owns records.
    Restrict,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(Self::Cascade),
            "restrict" => Ok(Self::Restrict),
            other => Err(format!("unknown delete policy: {other}")),
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cascade => f.write_str("cascade"),
            Self::Restrict => f.write_str("restrict"),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database file.
    /// Env: `MIDIMATRIX_DB_PATH`
    /// Default: `None`, meaning `midimatrix.db` in the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Policy applied by [`Database::delete_user`](crate::Database::delete_user).
    /// Env: `MIDIMATRIX_ON_USER_DELETE` (cascade/restrict)
    /// Default: `cascade`
    pub on_user_delete: DeletePolicy,

    /// How long SQLite waits on a locked database before failing.
    /// Env: `MIDIMATRIX_BUSY_TIMEOUT_MS`
    /// Default: 5 seconds
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            on_user_delete: DeletePolicy::Cascade,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("MIDIMATRIX_DB_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("MIDIMATRIX_ON_USER_DELETE") {
            match val.parse::<DeletePolicy>() {
                Ok(policy) => config.on_user_delete = policy,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Invalid MIDIMATRIX_ON_USER_DELETE, using default"
                    );
                }
            }
        }

        if let Some(val) = lookup("MIDIMATRIX_BUSY_TIMEOUT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.busy_timeout = Duration::from_millis(ms);
            } else {
                tracing::warn!(value = %val, "Invalid MIDIMATRIX_BUSY_TIMEOUT_MS, using default");
            }
        }

        config
    }

    /// Builder-style override of the delete policy.
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.on_user_delete = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert!(config.database_path.is_none());
        assert_eq!(config.on_user_delete, DeletePolicy::Cascade);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_env_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("MIDIMATRIX_DB_PATH", "/tmp/mm.db"),
            ("MIDIMATRIX_ON_USER_DELETE", "Restrict"),
            ("MIDIMATRIX_BUSY_TIMEOUT_MS", "250"),
        ]));
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/mm.db")));
        assert_eq!(config.on_user_delete, DeletePolicy::Restrict);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("MIDIMATRIX_ON_USER_DELETE", "set-null"),
            ("MIDIMATRIX_BUSY_TIMEOUT_MS", "soon"),
        ]));
        assert_eq!(config.on_user_delete, DeletePolicy::Cascade);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_policy_display_parses_back() {
        for policy in [DeletePolicy::Cascade, DeletePolicy::Restrict] {
            assert_eq!(policy.to_string().parse::<DeletePolicy>().unwrap(), policy);
        }
    }
}
