use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;
use keeper_common::client::default_kubeconfig_path;
use keeper_common::kubernetes::ListOptions;
use thiserror::Error;

use crate::scheduler::StartupMode;

pub const DEFAULT_SUCCESS_AGE_MINUTES: f64 = 60.0;
pub const DEFAULT_FAILURE_AGE_MINUTES: f64 = 120.0;
pub const DEFAULT_CYCLE_INTERVAL_MINUTES: u64 = 30;

#[derive(Envconfig)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3302")]
    pub port: u16,

    #[envconfig(from = "JOBS_NAMESPACE")]
    pub namespace: Option<String>,

    // Numeric settings are read as raw strings: a malformed value falls back to its default
    // instead of failing startup.
    #[envconfig(from = "JOBS_SUCCESS_THRESHOLD_MINUTES")]
    pub success_threshold_minutes: Option<String>,

    #[envconfig(from = "JOBS_FAILURE_THRESHOLD_MINUTES")]
    pub failure_threshold_minutes: Option<String>,

    #[envconfig(from = "CHECK_FREQUENCY_MINUTES")]
    pub check_frequency_minutes: Option<String>,

    #[envconfig(from = "JOBS_LIST_PAGE_LIMIT")]
    pub list_page_limit: Option<String>,

    #[envconfig(from = "JOBS_LIST_TIMEOUT_SECONDS")]
    pub list_timeout_seconds: Option<String>,

    #[envconfig(from = "KUBECONFIG")]
    pub kubeconfig: Option<String>,

    #[envconfig(from = "RUN_ON_STARTUP", default = "true")]
    pub run_on_startup: bool,

    #[envconfig(from = "DRY_RUN", default = "false")]
    pub dry_run: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("provide namespace using JOBS_NAMESPACE")]
    MissingNamespace,
}

/// Retention thresholds and scheduling for one namespace, fixed for the life of the process.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdConfig {
    pub success_age_minutes: f64,
    pub failure_age_minutes: f64,
    pub cycle_interval_minutes: u64,
    pub namespace: String,
}

impl ThresholdConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_minutes.saturating_mul(60))
    }
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn thresholds(&self) -> Result<ThresholdConfig, ConfigError> {
        let namespace = self
            .namespace
            .as_deref()
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .ok_or(ConfigError::MissingNamespace)?;

        Ok(ThresholdConfig {
            success_age_minutes: parse_or_default(
                "JOBS_SUCCESS_THRESHOLD_MINUTES",
                self.success_threshold_minutes.as_deref(),
                DEFAULT_SUCCESS_AGE_MINUTES,
                |v: &f64| v.is_finite() && *v >= 0.0,
            ),
            failure_age_minutes: parse_or_default(
                "JOBS_FAILURE_THRESHOLD_MINUTES",
                self.failure_threshold_minutes.as_deref(),
                DEFAULT_FAILURE_AGE_MINUTES,
                |v: &f64| v.is_finite() && *v >= 0.0,
            ),
            cycle_interval_minutes: parse_or_default(
                "CHECK_FREQUENCY_MINUTES",
                self.check_frequency_minutes.as_deref(),
                DEFAULT_CYCLE_INTERVAL_MINUTES,
                |v: &u64| *v > 0,
            ),
            namespace: namespace.to_owned(),
        })
    }

    pub fn list_options(&self) -> ListOptions {
        ListOptions {
            page_limit: parse_optional("JOBS_LIST_PAGE_LIMIT", self.list_page_limit.as_deref()),
            timeout_seconds: parse_optional(
                "JOBS_LIST_TIMEOUT_SECONDS",
                self.list_timeout_seconds.as_deref(),
            ),
        }
    }

    pub fn kubeconfig_path(&self) -> PathBuf {
        match self.kubeconfig.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_kubeconfig_path(),
        }
    }

    pub fn startup_mode(&self) -> StartupMode {
        if self.run_on_startup {
            StartupMode::Immediate
        } else {
            StartupMode::Delayed
        }
    }
}

fn parse_or_default<T>(name: &str, raw: Option<&str>, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Display + Copy,
{
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return default;
    };

    match raw.parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            tracing::warn!(
                variable = name,
                value = raw,
                default = %default,
                "invalid configuration value, using default"
            );
            default
        }
    }
}

/// A positive integer, or `None` when unset. Invalid values disable the option.
fn parse_optional(name: &str, raw: Option<&str>) -> Option<u32> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;

    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!(
                variable = name,
                value = raw,
                "invalid configuration value, option disabled"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::init_from_hashmap(&env).expect("failed to load config")
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("JOBS_NAMESPACE", "batch")]);

        assert_eq!(
            config.thresholds(),
            Ok(ThresholdConfig {
                success_age_minutes: 60.0,
                failure_age_minutes: 120.0,
                cycle_interval_minutes: 30,
                namespace: "batch".to_owned(),
            })
        );
        assert_eq!(config.list_options(), ListOptions::default());
        assert_eq!(config.bind(), "0.0.0.0:3302");
        assert_eq!(config.startup_mode(), StartupMode::Immediate);
        assert!(!config.dry_run);
        assert_eq!(config.kubeconfig_path(), default_kubeconfig_path());
    }

    #[test]
    fn test_explicit_values() {
        let config = config_from(&[
            ("JOBS_NAMESPACE", "etl"),
            ("JOBS_SUCCESS_THRESHOLD_MINUTES", "15.5"),
            ("JOBS_FAILURE_THRESHOLD_MINUTES", "0"),
            ("CHECK_FREQUENCY_MINUTES", "5"),
            ("JOBS_LIST_PAGE_LIMIT", "500"),
            ("JOBS_LIST_TIMEOUT_SECONDS", "20"),
            ("KUBECONFIG", "/etc/keeper/kubeconfig"),
            ("RUN_ON_STARTUP", "false"),
            ("DRY_RUN", "true"),
        ]);

        let thresholds = config.thresholds().unwrap();
        assert_eq!(thresholds.success_age_minutes, 15.5);
        assert_eq!(thresholds.failure_age_minutes, 0.0);
        assert_eq!(thresholds.cycle_interval_minutes, 5);
        assert_eq!(thresholds.cycle_interval(), Duration::from_secs(300));
        assert_eq!(
            config.list_options(),
            ListOptions {
                page_limit: Some(500),
                timeout_seconds: Some(20),
            }
        );
        assert_eq!(
            config.kubeconfig_path(),
            PathBuf::from("/etc/keeper/kubeconfig")
        );
        assert_eq!(config.startup_mode(), StartupMode::Delayed);
        assert!(config.dry_run);
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("JOBS_NAMESPACE", "batch"),
            ("JOBS_SUCCESS_THRESHOLD_MINUTES", "an hour"),
            ("JOBS_FAILURE_THRESHOLD_MINUTES", "-10"),
            ("CHECK_FREQUENCY_MINUTES", "0"),
            ("JOBS_LIST_PAGE_LIMIT", "lots"),
            ("JOBS_LIST_TIMEOUT_SECONDS", "-1"),
        ]);

        let thresholds = config.thresholds().unwrap();
        assert_eq!(thresholds.success_age_minutes, DEFAULT_SUCCESS_AGE_MINUTES);
        assert_eq!(thresholds.failure_age_minutes, DEFAULT_FAILURE_AGE_MINUTES);
        assert_eq!(
            thresholds.cycle_interval_minutes,
            DEFAULT_CYCLE_INTERVAL_MINUTES
        );
        assert_eq!(config.list_options(), ListOptions::default());
    }

    #[test]
    fn test_non_finite_threshold_falls_back() {
        let config = config_from(&[
            ("JOBS_NAMESPACE", "batch"),
            ("JOBS_SUCCESS_THRESHOLD_MINUTES", "NaN"),
            ("JOBS_FAILURE_THRESHOLD_MINUTES", "inf"),
        ]);

        let thresholds = config.thresholds().unwrap();
        assert_eq!(thresholds.success_age_minutes, DEFAULT_SUCCESS_AGE_MINUTES);
        assert_eq!(thresholds.failure_age_minutes, DEFAULT_FAILURE_AGE_MINUTES);
    }

    #[test]
    fn test_huge_interval_saturates() {
        let config = config_from(&[
            ("JOBS_NAMESPACE", "batch"),
            ("CHECK_FREQUENCY_MINUTES", "18446744073709551615"),
        ]);

        let thresholds = config.thresholds().unwrap();
        assert_eq!(thresholds.cycle_interval_minutes, u64::MAX);
        assert_eq!(thresholds.cycle_interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_namespace_is_required() {
        assert_eq!(
            config_from(&[]).thresholds(),
            Err(ConfigError::MissingNamespace)
        );
        assert_eq!(
            config_from(&[("JOBS_NAMESPACE", "   ")]).thresholds(),
            Err(ConfigError::MissingNamespace)
        );
    }
}
