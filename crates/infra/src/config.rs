//! Configuration loading and representation.

use thiserror::Error;

use bookshop_observability::LogFormat;

use crate::locks::LockStrategy;

pub const LOCK_STRATEGY_VAR: &str = "BOOKSHOP_LOCK_STRATEGY";
pub const LOG_FORMAT_VAR: &str = "BOOKSHOP_LOG_FORMAT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Runtime settings for the shop services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShopConfig {
    /// `BOOKSHOP_LOCK_STRATEGY`: `per-item` (default) or `global`.
    pub lock_strategy: LockStrategy,
    /// `BOOKSHOP_LOG_FORMAT`: `json` (default) or `pretty`.
    pub log_format: LogFormat,
}

impl ShopConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys fall back to
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = value(LOCK_STRATEGY_VAR) {
            config.lock_strategy = raw.parse().map_err(|reason| ConfigError::Invalid {
                var: LOCK_STRATEGY_VAR,
                reason,
            })?;
        }
        if let Some(raw) = value(LOG_FORMAT_VAR) {
            config.log_format = raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::Invalid {
                    var: LOG_FORMAT_VAR,
                    reason: e.to_string(),
                })?;
        }

        Ok(config)
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ShopConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ShopConfig::default());
        assert_eq!(config.lock_strategy, LockStrategy::PerKey);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn reads_both_settings() {
        let config = ShopConfig::from_lookup(lookup(&[
            (LOCK_STRATEGY_VAR, "global"),
            (LOG_FORMAT_VAR, "pretty"),
        ]))
        .unwrap();
        assert_eq!(config.lock_strategy, LockStrategy::Global);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = ShopConfig::from_lookup(lookup(&[(LOCK_STRATEGY_VAR, "  ")])).unwrap();
        assert_eq!(config.lock_strategy, LockStrategy::PerKey);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = ShopConfig::from_lookup(lookup(&[(LOCK_STRATEGY_VAR, "optimistic")])).unwrap_err();
        let ConfigError::Invalid { var, .. } = err;
        assert_eq!(var, LOCK_STRATEGY_VAR);
    }
}
