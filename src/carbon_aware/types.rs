//! Types for carbon-aware scheduling

use crate::emissions::estimator::DEFAULT_REGION;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Threshold (gCO2/kWh) used when none is configured
pub const DEFAULT_CARBON_THRESHOLD: f64 = 400.0;

/// Carbon intensity reading for a region
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CarbonIntensityData {
    /// Region identifier (e.g., "us-east-1", "DE")
    pub region: String,
    /// Current carbon intensity in gCO2/kWh
    pub carbon_intensity: f64,
    /// Data timestamp
    pub timestamp: DateTime<Utc>,
    /// Data source (e.g., "ElectricityMap", "Mock")
    pub source: String,
}

/// Scheduler configuration
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Region whose grid intensity gates execution
    pub region: String,
    /// Highest acceptable intensity in gCO2/kWh
    pub carbon_threshold: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            carbon_threshold: DEFAULT_CARBON_THRESHOLD,
        }
    }
}

impl SchedulerConfig {
    pub fn new(region: impl Into<String>, carbon_threshold: f64) -> Self {
        Self {
            region: region.into(),
            carbon_threshold,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(Error::ConfigError("scheduler region must not be empty".to_string()));
        }
        if !self.carbon_threshold.is_finite() || self.carbon_threshold < 0.0 {
            return Err(Error::ConfigError(format!(
                "carbon_threshold must be a non-negative number, got {}",
                self.carbon_threshold
            )));
        }
        Ok(())
    }
}

/// Carbon intensity data providers
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum CarbonProvider {
    /// ElectricityMap API
    ElectricityMap {
        /// API base URL
        url: String,
        /// API token
        #[serde(default)]
        token: String,
    },
    /// Custom API endpoint
    Custom {
        /// API URL
        url: String,
        /// Authentication header
        #[serde(default)]
        auth_header: Option<String>,
    },
    /// Fixed reading for demos and tests
    #[default]
    Mock,
}

/// Unit of work handed to the scheduler
pub struct Job<F: FnOnce()> {
    pub id: String,
    /// Latest time the job may finish
    pub deadline: DateTime<Utc>,
    pub action: F,
}

impl<F: FnOnce()> Job<F> {
    pub fn new(id: impl Into<String>, deadline: DateTime<Utc>, action: F) -> Self {
        Self {
            id: id.into(),
            deadline,
            action,
        }
    }
}

/// Why a job was allowed to run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecuteReason {
    /// Intensity at or below the threshold
    GreenGrid,
    /// Grid is dirty but the deadline is too close to wait
    DeadlineApproaching,
}

/// Outcome of a scheduling decision
#[derive(Clone, Debug, PartialEq)]
pub enum ScheduleDecision {
    Execute {
        reason: ExecuteReason,
    },
    Defer {
        /// Time left before the deadline
        slack: Duration,
        /// Suggested time for the caller to try again
        retry_after: DateTime<Utc>,
    },
}

impl ScheduleDecision {
    pub fn is_execute(&self) -> bool {
        matches!(self, ScheduleDecision::Execute { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.carbon_threshold, 400.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scheduler_config_validation() {
        assert!(SchedulerConfig::new("us-east-1", -1.0).validate().is_err());
        assert!(SchedulerConfig::new("us-east-1", f64::NAN).validate().is_err());
        assert!(SchedulerConfig::new("  ", 300.0).validate().is_err());
        assert!(SchedulerConfig::new("eu-west-1", 0.0).validate().is_ok());
    }

    #[test]
    fn test_provider_deserialization() {
        let provider: CarbonProvider = toml::from_str(
            r#"
            type = "ElectricityMap"
            url = "https://api.electricitymap.org"
            token = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(
            provider,
            CarbonProvider::ElectricityMap {
                url: "https://api.electricitymap.org".to_string(),
                token: "secret".to_string(),
            }
        );

        let provider: CarbonProvider = toml::from_str(
            r#"
            type = "Custom"
            url = "http://localhost:9000/intensity"
            "#,
        )
        .unwrap();
        assert_eq!(
            provider,
            CarbonProvider::Custom {
                url: "http://localhost:9000/intensity".to_string(),
                auth_header: None,
            }
        );
    }

    #[test]
    fn test_decision_is_execute() {
        let run = ScheduleDecision::Execute {
            reason: ExecuteReason::GreenGrid,
        };
        let wait = ScheduleDecision::Defer {
            slack: Duration::hours(4),
            retry_after: Utc::now(),
        };
        assert!(run.is_execute());
        assert!(!wait.is_execute());
    }
}
