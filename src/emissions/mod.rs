//! Carbon footprint estimation for data-warehouse queries
//!
//! Converts warehouse size, query duration and region into grams of CO2
//! using credits-per-hour as a proxy for power draw.

pub mod estimator;
pub mod types;

pub use estimator::EmissionsEstimator;
pub use types::{EstimationResult, RegionalIntensityTable, WarehouseSizeTable};
