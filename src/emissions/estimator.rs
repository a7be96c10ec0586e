//! Query carbon footprint estimator
//!
//! Formula:
//! `Carbon (g) = Power (kW) * Time (h) * PUE * Grid Intensity (gCO2/kWh)`
//! where power is derived from the warehouse's credits per hour.

use crate::emissions::types::{EstimationResult, RegionalIntensityTable, WarehouseSizeTable};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Assumed server power draw per credit, in watts
pub const WATTS_PER_CREDIT: f64 = 200.0;

/// Power Usage Effectiveness of a modern cloud datacenter
pub const PUE: f64 = 1.1;

/// Region used when the caller does not name one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Estimates emissions from immutable lookup tables and physical constants
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EmissionsEstimator {
    /// Warehouse size to credits per hour
    pub warehouse_sizes: WarehouseSizeTable,
    /// Region to grid carbon intensity
    pub regional_intensity: RegionalIntensityTable,
    /// Watts drawn per credit
    pub watts_per_credit: f64,
    /// Datacenter overhead multiplier
    pub pue: f64,
}

impl Default for EmissionsEstimator {
    fn default() -> Self {
        Self {
            warehouse_sizes: WarehouseSizeTable::default(),
            regional_intensity: RegionalIntensityTable::default(),
            watts_per_credit: WATTS_PER_CREDIT,
            pue: PUE,
        }
    }
}

impl EmissionsEstimator {
    pub fn new(
        warehouse_sizes: WarehouseSizeTable,
        regional_intensity: RegionalIntensityTable,
    ) -> Self {
        Self {
            warehouse_sizes,
            regional_intensity,
            ..Self::default()
        }
    }

    /// Reject tables and constants that would yield meaningless estimates
    pub fn validate(&self) -> Result<()> {
        if !self.watts_per_credit.is_finite() || self.watts_per_credit <= 0.0 {
            return Err(Error::ConfigError(format!(
                "watts_per_credit must be positive, got {}",
                self.watts_per_credit
            )));
        }
        if !self.pue.is_finite() || self.pue < 1.0 {
            return Err(Error::ConfigError(format!(
                "pue must be at least 1.0, got {}",
                self.pue
            )));
        }
        if let Some((size, _)) = self.warehouse_sizes.entries().find(|(_, c)| **c == 0) {
            return Err(Error::ConfigError(format!(
                "warehouse size {} must have positive credits per hour",
                size
            )));
        }
        let intensities = self
            .regional_intensity
            .regions
            .iter()
            .map(|(region, intensity)| (region.as_str(), *intensity))
            .chain(std::iter::once((
                "default",
                self.regional_intensity.default_intensity,
            )));
        for (region, intensity) in intensities {
            if !intensity.is_finite() || intensity <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "grid intensity for {} must be positive, got {}",
                    region, intensity
                )));
            }
        }
        Ok(())
    }

    /// Estimate the carbon footprint of a single query execution.
    ///
    /// Unknown sizes count as one credit per hour and unknown regions use the
    /// table's default intensity. Negative or non-finite durations count as zero.
    pub fn estimate(
        &self,
        warehouse_size: &str,
        duration_seconds: f64,
        region: &str,
    ) -> EstimationResult {
        let duration_seconds = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            0.0
        };

        let credits_per_hour = self.warehouse_sizes.credits_per_hour(warehouse_size);
        let power_kw = f64::from(credits_per_hour) * self.watts_per_credit / 1000.0;
        let time_hours = duration_seconds / 3600.0;
        let grid_intensity = self.regional_intensity.intensity(region);

        let emissions = power_kw * time_hours * self.pue * grid_intensity;

        debug!(
            "Estimated {} gCO2 for {} warehouse running {}s in {} ({} gCO2/kWh)",
            emissions, warehouse_size, duration_seconds, region, grid_intensity
        );

        EstimationResult {
            warehouse_size: warehouse_size.to_string(),
            duration_seconds,
            region: region.to_string(),
            grid_intensity,
            estimated_emissions_gco2: round_to_cents(emissions),
        }
    }

    /// Estimate for a query in the default region
    pub fn estimate_default_region(
        &self,
        warehouse_size: &str,
        duration_seconds: f64,
    ) -> EstimationResult {
        self.estimate(warehouse_size, duration_seconds, DEFAULT_REGION)
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
