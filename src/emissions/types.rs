//! Lookup tables and result record for emissions estimation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Credits per hour for each recognised warehouse size
pub const WAREHOUSE_SIZES: [(&str, u32); 8] = [
    ("X-Small", 1),
    ("Small", 2),
    ("Medium", 4),
    ("Large", 8),
    ("X-Large", 16),
    ("2X-Large", 32),
    ("3X-Large", 64),
    ("4X-Large", 128),
];

/// Approximate grid carbon intensity (gCO2/kWh) per cloud region
pub const REGIONAL_INTENSITY: [(&str, f64); 4] = [
    ("us-east-1", 380.0),      // Virginia - coal/gas heavy
    ("us-west-2", 150.0),      // Oregon - hydro heavy
    ("eu-west-1", 230.0),      // Ireland
    ("ap-southeast-2", 500.0), // Sydney - coal heavy
];

/// Credits per hour used when the warehouse size is not recognised
pub const DEFAULT_CREDITS_PER_HOUR: u32 = 1;

/// Global average intensity used when the region is not recognised
pub const DEFAULT_GRID_INTENSITY: f64 = 300.0;

/// Mapping from warehouse size name to credits per hour
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct WarehouseSizeTable {
    sizes: HashMap<String, u32>,
}

impl Default for WarehouseSizeTable {
    fn default() -> Self {
        Self {
            sizes: WAREHOUSE_SIZES
                .iter()
                .map(|(name, credits)| (name.to_string(), *credits))
                .collect(),
        }
    }
}

impl WarehouseSizeTable {
    pub fn new(sizes: HashMap<String, u32>) -> Self {
        Self { sizes }
    }

    /// Credits per hour for a size, falling back to one credit
    pub fn credits_per_hour(&self, warehouse_size: &str) -> u32 {
        self.sizes
            .get(warehouse_size)
            .copied()
            .unwrap_or(DEFAULT_CREDITS_PER_HOUR)
    }

    pub fn contains(&self, warehouse_size: &str) -> bool {
        self.sizes.contains_key(warehouse_size)
    }

    /// Size names ordered by credits (smallest first)
    pub fn sizes(&self) -> Vec<&str> {
        let mut sizes: Vec<(&str, u32)> = self
            .sizes
            .iter()
            .map(|(name, credits)| (name.as_str(), *credits))
            .collect();
        sizes.sort_by_key(|(_, credits)| *credits);
        sizes.into_iter().map(|(name, _)| name).collect()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.sizes.iter()
    }
}

/// Mapping from region identifier to grid carbon intensity in gCO2/kWh
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RegionalIntensityTable {
    /// Known regions
    pub regions: HashMap<String, f64>,
    /// Intensity assumed for regions missing from the table
    pub default_intensity: f64,
}

impl Default for RegionalIntensityTable {
    fn default() -> Self {
        Self {
            regions: REGIONAL_INTENSITY
                .iter()
                .map(|(region, intensity)| (region.to_string(), *intensity))
                .collect(),
            default_intensity: DEFAULT_GRID_INTENSITY,
        }
    }
}

impl RegionalIntensityTable {
    /// Grid intensity for a region, falling back to the default intensity
    pub fn intensity(&self, region: &str) -> f64 {
        self.regions
            .get(region)
            .copied()
            .unwrap_or(self.default_intensity)
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    /// Regions sorted by carbon intensity (lowest first)
    pub fn regions_by_intensity(&self) -> Vec<&str> {
        let mut regions: Vec<(&str, f64)> = self
            .regions
            .iter()
            .map(|(region, intensity)| (region.as_str(), *intensity))
            .collect();
        regions.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        regions.into_iter().map(|(region, _)| region).collect()
    }
}

/// Outcome of a single estimation
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EstimationResult {
    pub warehouse_size: String,
    pub duration_seconds: f64,
    pub region: String,
    /// Grid intensity used for the calculation (gCO2/kWh)
    pub grid_intensity: f64,
    /// Estimated emissions in grams of CO2, rounded to 2 decimals
    #[serde(rename = "estimated_emissions_gCO2")]
    pub estimated_emissions_gco2: f64,
}
