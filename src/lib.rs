//! GreenOps: carbon accounting and carbon-aware scheduling for data-warehouse workloads
//!
//! This crate estimates the CO2 emitted by warehouse queries and decides
//! whether batch jobs should run now or wait for a greener grid.

pub mod carbon_aware;
pub mod config;
pub mod emissions;
pub mod error;
pub mod telemetry;

pub use crate::error::{Error, Result};
