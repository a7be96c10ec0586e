//! Configuration loading
//!
//! A single TOML document with optional `[scheduler]`, `[provider]` and
//! `[estimator]` sections. Missing sections and fields take the built-in
//! defaults, so an empty file is a valid configuration.

use crate::carbon_aware::{CarbonProvider, SchedulerConfig};
use crate::emissions::EmissionsEstimator;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GreenOpsConfig {
    pub scheduler: SchedulerConfig,
    pub provider: CarbonProvider,
    pub estimator: EmissionsEstimator,
}

impl GreenOpsConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: GreenOpsConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()?;
        self.estimator.validate()
    }
}
