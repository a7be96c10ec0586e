//! Carbon-aware deferral of batch workloads
//!
//! Decides whether a job runs now or waits for a greener grid, based on the
//! current carbon intensity of a region, a policy threshold and the job's
//! deadline.

pub mod api;
pub mod scheduler;
pub mod types;

pub use api::{CarbonIntensityAPI, CarbonIntensityProvider, StaticIntensityProvider};
pub use scheduler::CarbonAwareScheduler;
pub use types::{
    CarbonIntensityData, CarbonProvider, ExecuteReason, Job, ScheduleDecision, SchedulerConfig,
};
