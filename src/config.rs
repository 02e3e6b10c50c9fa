use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::filtering::engine::PolicyConfig;
use crate::filtering::severity::{SeverityLevels, DEFAULT_SEVERITY_LEVELS};
use crate::filtering::thresholds::{ThresholdTable, DEFAULT_DISMISSALS_TO_RESTORE, DEFAULT_REPORTS_TO_HIDE};
use crate::filtering::types::ContentType;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every value
/// has a default, so an empty environment gives a working setup.
pub struct Config {
    /// Moderation policy, shared read-only by every request.
    pub policy: Arc<PolicyConfig>,
    pub db_path: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    ///
    /// Threshold variables: unset means the default, an explicitly empty
    /// value removes the threshold (that content type is then never
    /// filtered), anything else must be an integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let severity = match lookup("VEIL_SEVERITY_LEVELS") {
            Some(raw) => SeverityLevels::new(
                raw.split(',')
                    .map(str::trim)
                    .filter(|level| !level.is_empty()),
            ),
            None => SeverityLevels::new(DEFAULT_SEVERITY_LEVELS),
        };

        let mut thresholds = ThresholdTable::empty();
        for content_type in ContentType::ALL {
            let key = content_type.config_key();
            let reports = threshold(&lookup, &format!("VEIL_REPORTS_TO_HIDE_{key}"), DEFAULT_REPORTS_TO_HIDE)?;
            let dismissals = threshold(
                &lookup,
                &format!("VEIL_DISMISSALS_TO_RESTORE_{key}"),
                DEFAULT_DISMISSALS_TO_RESTORE,
            )?;
            thresholds.set(content_type, reports, dismissals);
        }

        Ok(Self {
            policy: Arc::new(PolicyConfig::new(severity, thresholds)),
            db_path: lookup("VEIL_DB_PATH").unwrap_or_else(|| "./veil.db".to_string()),
        })
    }
}

fn threshold<F>(lookup: &F, key: &str, default: i64) -> Result<Option<i64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(Some(default)),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .with_context(|| format!("{key} must be an integer, got {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db_path, "./veil.db");
        assert_eq!(config.policy.severity.strictest(), Some("MYGRANDMALIKES"));
        for content_type in ContentType::ALL {
            let t = config.policy.thresholds.get(content_type).unwrap();
            assert_eq!(t.reports_to_hide, 5);
            assert_eq!(t.dismissals_to_restore, 3);
        }
    }

    #[test]
    fn test_overrides_and_removal() {
        let config = config_from(&[
            ("VEIL_SEVERITY_LEVELS", "STRICT, LOOSE"),
            ("VEIL_REPORTS_TO_HIDE_POST", "10"),
            ("VEIL_DISMISSALS_TO_RESTORE_COMMENT", ""),
            ("VEIL_DB_PATH", "/tmp/x.db"),
        ])
        .unwrap();
        assert_eq!(config.policy.severity.levels(), ["STRICT", "LOOSE"]);
        assert_eq!(config.policy.thresholds.get(ContentType::Post).unwrap().reports_to_hide, 10);
        assert!(config.policy.thresholds.get(ContentType::Comment).is_none());
        assert_eq!(config.db_path, "/tmp/x.db");
    }

    #[test]
    fn test_non_integer_threshold_is_an_error() {
        let err = config_from(&[("VEIL_REPORTS_TO_HIDE_USER", "five")])
            .err()
            .unwrap();
        assert!(err.to_string().contains("VEIL_REPORTS_TO_HIDE_USER"));
    }
}
