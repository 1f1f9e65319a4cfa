//! Configuration for the delivery subsystem.
//!
//! Every field has a default, so an empty TOML document is a valid configuration:
//!
//! ```toml
//! transition_policy = "strict"
//! actor_buffer_size = 32
//!
//! [scheduler]
//! interval_secs = 3600
//! staleness_secs = 14400
//! max_concurrency = 4
//! courier_timeout_secs = 10
//!
//! [estimate]
//! base_days = 4
//! fragile_extra_days = 1
//! remote_extra_days = 2
//! remote_pincode_prefix = "8"
//!
//! [[couriers]]
//! name = "delhivery"
//! display_name = "Delhivery"
//! tracking_url_template = "https://www.delhivery.com/track/package/{trackingNumber}"
//! api_endpoint = "https://track.delhivery.example/v1/scans"
//! ```

use crate::courier::CourierConfig;
use crate::error::DeliveryError;
use crate::model::TransitionPolicy;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub estimate: EstimateConfig,

    /// Whether illegal status transitions are rejected.
    ///
    /// Default: strict
    #[serde(default)]
    pub transition_policy: TransitionPolicy,

    /// Carrier overrides layered on top of the built-in carrier table.
    #[serde(default)]
    pub couriers: Vec<CourierConfig>,

    /// Request channel capacity of each store actor.
    ///
    /// Default: 32
    #[serde(default = "defaults::actor_buffer_size")]
    pub actor_buffer_size: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            estimate: EstimateConfig::default(),
            transition_policy: TransitionPolicy::default(),
            couriers: Vec::new(),
            actor_buffer_size: defaults::actor_buffer_size(),
        }
    }
}

impl DeliveryConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actor_buffer_size == 0 {
            return Err(ConfigError::Invalid("actor_buffer_size must be positive".into()));
        }
        if self.scheduler.max_concurrency == 0 {
            return Err(ConfigError::Invalid("scheduler.max_concurrency must be positive".into()));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::Invalid("scheduler.interval_secs must be positive".into()));
        }
        self.estimate.validate()
    }
}

/// Reconciliation sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether `DeliverySystem::start_scheduler` starts the sweep at all.
    ///
    /// Default: true
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Time between sweeps.
    ///
    /// Default: 3600 seconds (hourly)
    #[serde(default = "defaults::interval_secs")]
    pub interval_secs: u64,

    /// A record with no event for this long is refreshed from its courier.
    ///
    /// Default: 14400 seconds (4 hours)
    #[serde(default = "defaults::staleness_secs")]
    pub staleness_secs: u64,

    /// Records processed in parallel during a sweep.
    ///
    /// Default: 4
    #[serde(default = "defaults::max_concurrency")]
    pub max_concurrency: usize,

    /// Upper bound on one courier fetch.
    ///
    /// Default: 10 seconds
    #[serde(default = "defaults::courier_timeout_secs")]
    pub courier_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            interval_secs: defaults::interval_secs(),
            staleness_secs: defaults::staleness_secs(),
            max_concurrency: defaults::max_concurrency(),
            courier_timeout_secs: defaults::courier_timeout_secs(),
        }
    }
}

impl SchedulerConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn staleness(&self) -> TimeDelta {
        i64::try_from(self.staleness_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    pub const fn courier_timeout(&self) -> Duration {
        Duration::from_secs(self.courier_timeout_secs)
    }
}

/// Delivery estimate heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateConfig {
    /// Default: 4 days
    #[serde(default = "defaults::base_days")]
    pub base_days: i64,

    /// Default: 1 day
    #[serde(default = "defaults::fragile_extra_days")]
    pub fragile_extra_days: i64,

    /// Added when the recipient pincode starts with `remote_pincode_prefix`.
    ///
    /// Default: 2 days
    #[serde(default = "defaults::remote_extra_days")]
    pub remote_extra_days: i64,

    /// Default: "8"
    #[serde(default = "defaults::remote_pincode_prefix")]
    pub remote_pincode_prefix: String,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            base_days: defaults::base_days(),
            fragile_extra_days: defaults::fragile_extra_days(),
            remote_extra_days: defaults::remote_extra_days(),
            remote_pincode_prefix: defaults::remote_pincode_prefix(),
        }
    }
}

/// Upper bound for each estimate allowance.
pub const MAX_ESTIMATE_DAYS: i64 = 365;

impl EstimateConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, days) in [
            ("base_days", self.base_days),
            ("fragile_extra_days", self.fragile_extra_days),
            ("remote_extra_days", self.remote_extra_days),
        ] {
            if !(0..=MAX_ESTIMATE_DAYS).contains(&days) {
                return Err(ConfigError::Invalid(format!(
                    "estimate.{field} must be between 0 and {MAX_ESTIMATE_DAYS}, got {days}"
                )));
            }
        }
        Ok(())
    }

    /// Lead time for a package: base, plus the fragile and remote-area allowances.
    ///
    /// Fails only for allowances that `validate` would reject.
    pub fn lead_time(&self, is_fragile: bool, pincode: &str) -> Result<TimeDelta, DeliveryError> {
        let mut days = Some(self.base_days);
        if is_fragile {
            days = days.and_then(|d| d.checked_add(self.fragile_extra_days));
        }
        if !self.remote_pincode_prefix.is_empty() && pincode.starts_with(&self.remote_pincode_prefix) {
            days = days.and_then(|d| d.checked_add(self.remote_extra_days));
        }
        days.filter(|d| *d >= 0)
            .and_then(TimeDelta::try_days)
            .ok_or_else(|| DeliveryError::validation("delivery estimate is out of range"))
    }
}

mod defaults {
    pub const fn enabled() -> bool {
        true
    }

    pub const fn interval_secs() -> u64 {
        3600
    }

    pub const fn staleness_secs() -> u64 {
        4 * 3600
    }

    pub const fn max_concurrency() -> usize {
        4
    }

    pub const fn courier_timeout_secs() -> u64 {
        10
    }

    pub const fn base_days() -> i64 {
        4
    }

    pub const fn fragile_extra_days() -> i64 {
        1
    }

    pub const fn remote_extra_days() -> i64 {
        2
    }

    pub fn remote_pincode_prefix() -> String {
        "8".to_string()
    }

    pub const fn actor_buffer_size() -> usize {
        32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = DeliveryConfig::from_toml_str("").unwrap();
        assert_eq!(config, DeliveryConfig::default());
        assert_eq!(config.scheduler.interval(), Duration::from_secs(3600));
        assert_eq!(config.scheduler.staleness(), TimeDelta::hours(4));
        assert_eq!(config.transition_policy, TransitionPolicy::Strict);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = DeliveryConfig::from_toml_str(
            r#"
            transition_policy = "permissive"

            [scheduler]
            max_concurrency = 8

            [[couriers]]
            name = "dtdc"
            display_name = "DTDC Express"
            tracking_url_template = "https://dtdc.example/{trackingNumber}"
            "#,
        )
        .unwrap();
        assert_eq!(config.transition_policy, TransitionPolicy::Permissive);
        assert_eq!(config.scheduler.max_concurrency, 8);
        assert_eq!(config.scheduler.courier_timeout_secs, 10);
        assert_eq!(config.couriers.len(), 1);
        assert_eq!(config.couriers[0].api_endpoint, None);
    }

    #[test]
    fn rejects_zero_concurrency_and_bad_toml() {
        assert!(matches!(
            DeliveryConfig::from_toml_str("[scheduler]\nmax_concurrency = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DeliveryConfig::from_toml_str("scheduler = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn lead_time_adds_fragile_and_remote_allowances() {
        let estimate = EstimateConfig::default();
        assert_eq!(estimate.lead_time(false, "302001").unwrap(), TimeDelta::days(4));
        assert_eq!(estimate.lead_time(true, "800001").unwrap(), TimeDelta::days(7));
    }

    #[test]
    fn rejects_negative_and_oversized_estimate_days() {
        for raw in [
            "[estimate]\nbase_days = 9223372036854775807",
            "[estimate]\nbase_days = 366",
            "[estimate]\nfragile_extra_days = -1",
            "[estimate]\nremote_extra_days = -3",
        ] {
            assert!(
                matches!(DeliveryConfig::from_toml_str(raw), Err(ConfigError::Invalid(_))),
                "{raw} should be rejected"
            );
        }
        assert!(DeliveryConfig::from_toml_str("[estimate]\nbase_days = 365").is_ok());
    }

    #[test]
    fn unvalidated_estimate_fails_instead_of_panicking() {
        let estimate = EstimateConfig {
            base_days: i64::MAX,
            ..EstimateConfig::default()
        };
        assert!(matches!(
            estimate.lead_time(true, "110001"),
            Err(DeliveryError::Validation(_))
        ));
        let negative = EstimateConfig {
            base_days: -10,
            ..EstimateConfig::default()
        };
        assert!(negative.lead_time(false, "110001").is_err());
    }
}
