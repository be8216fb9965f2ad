//! Configuration module
//!
//! Pipeline limits and switches, read from `PICKPREP_*` environment variables.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

// Defaults
const PRELOAD_CONCURRENCY: usize = 2;
const MAX_BATCH_SIZE: usize = 100;
const PRELOAD_TIMEOUT_SECS: u64 = 0;

/// How the caller's selection behaves; single-selection callers lose their
/// selection when a preparation is cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    Single,
    #[default]
    Multiple,
}

impl FromStr for SelectionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(SelectionMode::Single),
            "multiple" | "multi" => Ok(SelectionMode::Multiple),
            _ => Err(anyhow::anyhow!("Invalid selection mode: {}", s)),
        }
    }
}

impl Display for SelectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SelectionMode::Single => write!(f, "single"),
            SelectionMode::Multiple => write!(f, "multiple"),
        }
    }
}

/// Preparation pipeline configuration
#[derive(Clone, Debug)]
pub struct PrepareConfig {
    /// Maximum preload operations in flight at once.
    pub preload_concurrency: usize,
    /// Largest batch accepted; also the transcode queue bound.
    pub max_batch_size: usize,
    /// Global transcoding switch, combined with the per-request flag.
    pub transcode_enabled: bool,
    pub selection_mode: SelectionMode,
    /// Per-attempt preload timeout in seconds. 0 = disabled.
    pub preload_timeout_secs: u64,
    /// Root directory of the local storage backend.
    pub storage_root: Option<String>,
    pub environment: String,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            preload_concurrency: PRELOAD_CONCURRENCY,
            max_batch_size: MAX_BATCH_SIZE,
            transcode_enabled: true,
            selection_mode: SelectionMode::default(),
            preload_timeout_secs: PRELOAD_TIMEOUT_SECS,
            storage_root: None,
            environment: "development".to_string(),
        }
    }
}

impl PrepareConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let selection_mode = match lookup("PICKPREP_SELECTION_MODE") {
            Some(mode) => mode.parse()?,
            None => SelectionMode::default(),
        };

        let config = PrepareConfig {
            preload_concurrency: lookup("PICKPREP_PRELOAD_CONCURRENCY")
                .unwrap_or_else(|| PRELOAD_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(PRELOAD_CONCURRENCY),
            max_batch_size: lookup("PICKPREP_MAX_BATCH_SIZE")
                .unwrap_or_else(|| MAX_BATCH_SIZE.to_string())
                .parse()
                .unwrap_or(MAX_BATCH_SIZE),
            transcode_enabled: lookup("PICKPREP_TRANSCODE_ENABLED")
                .unwrap_or_else(|| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            selection_mode,
            preload_timeout_secs: lookup("PICKPREP_PRELOAD_TIMEOUT_SECS")
                .unwrap_or_else(|| PRELOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(PRELOAD_TIMEOUT_SECS),
            storage_root: lookup("PICKPREP_STORAGE_ROOT").filter(|s| !s.is_empty()),
            environment: lookup("PICKPREP_ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.preload_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "PICKPREP_PRELOAD_CONCURRENCY must be at least 1"
            ));
        }

        if self.max_batch_size == 0 {
            return Err(anyhow::anyhow!("PICKPREP_MAX_BATCH_SIZE must be at least 1"));
        }

        Ok(())
    }

    pub fn preload_timeout(&self) -> Option<Duration> {
        (self.preload_timeout_secs > 0).then(|| Duration::from_secs(self.preload_timeout_secs))
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = PrepareConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.preload_concurrency, 2);
        assert_eq!(config.max_batch_size, 100);
        assert!(config.transcode_enabled);
        assert_eq!(config.selection_mode, SelectionMode::Multiple);
        assert!(config.preload_timeout().is_none());
        assert!(config.storage_root.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_reads_overrides() {
        let config = PrepareConfig::from_lookup(lookup_from(&[
            ("PICKPREP_PRELOAD_CONCURRENCY", "4"),
            ("PICKPREP_MAX_BATCH_SIZE", "20"),
            ("PICKPREP_TRANSCODE_ENABLED", "FALSE"),
            ("PICKPREP_SELECTION_MODE", "single"),
            ("PICKPREP_PRELOAD_TIMEOUT_SECS", "30"),
            ("PICKPREP_STORAGE_ROOT", "/tmp/media"),
            ("PICKPREP_ENVIRONMENT", "prod"),
        ]))
        .unwrap();
        assert_eq!(config.preload_concurrency, 4);
        assert_eq!(config.max_batch_size, 20);
        assert!(!config.transcode_enabled);
        assert_eq!(config.selection_mode, SelectionMode::Single);
        assert_eq!(config.preload_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.storage_root.as_deref(), Some("/tmp/media"));
        assert!(config.is_production());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let result =
            PrepareConfig::from_lookup(lookup_from(&[("PICKPREP_PRELOAD_CONCURRENCY", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_selection_mode() {
        let result = PrepareConfig::from_lookup(lookup_from(&[("PICKPREP_SELECTION_MODE", "some")]));
        assert!(result.is_err());
    }
}
