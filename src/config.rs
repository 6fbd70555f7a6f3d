//! Safety policy configuration.
//!
//! Every threshold the engine applies lives here so callers can inject the
//! policy instead of relying on literals scattered through the checks.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "medsafe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medsafe=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load failed ({0}): {1}")]
    Load(String, String),

    #[error("Config parse failed ({0}): {1}")]
    Parse(String, String),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Any two doses of different medications closer than this conflict.
    pub min_dose_gap_minutes: u32,
    /// Separation required for pairs in the timing-interaction table.
    pub timing_interaction_gap_minutes: u32,
    /// Per-provider lookup timeout.
    pub provider_timeout_ms: u64,
    /// Upper bound on scheduled doses per day for any one medication.
    pub max_daily_doses: u32,
    /// Sub-daily frequencies above this are rejected outright.
    pub max_doses_per_hour: u32,
    /// Date whose occurrences are compared for timing conflicts.
    /// `None` means today in local time.
    pub conflict_reference_date: Option<NaiveDate>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            min_dose_gap_minutes: 30,
            timing_interaction_gap_minutes: 120,
            provider_timeout_ms: 5_000,
            max_daily_doses: 12,
            max_doses_per_hour: 4,
            conflict_reference_date: None,
        }
    }
}

impl SafetyConfig {
    /// Load a JSON policy file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(path.display().to_string(), e.to_string()))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_dose_gap_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "min_dose_gap_minutes",
                reason: "must be greater than zero".into(),
            });
        }
        if self.min_dose_gap_minutes > 12 * 60 || self.timing_interaction_gap_minutes > 12 * 60 {
            return Err(ConfigError::Invalid {
                field: "gap",
                reason: "gaps above 12 hours cannot be measured on a 24-hour clock".into(),
            });
        }
        if self.provider_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "provider_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_daily_doses == 0 || self.max_doses_per_hour == 0 {
            return Err(ConfigError::Invalid {
                field: "max_daily_doses",
                reason: "dose ceilings must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// The date to expand schedules on for conflict checks.
    pub fn reference_date(&self) -> NaiveDate {
        self.conflict_reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
