//! Carbon-aware deferral scheduler
//!
//! Implements the green-window rule: a job runs immediately when the grid is
//! at or below the threshold, or when too little time is left before its
//! deadline to wait for a cleaner grid. Otherwise it is deferred and the
//! caller is responsible for submitting it again.

use crate::carbon_aware::api::CarbonIntensityProvider;
use crate::carbon_aware::types::{ExecuteReason, Job, ScheduleDecision, SchedulerConfig};
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

/// Jobs with at most this many hours of slack run regardless of grid intensity
pub const DEFERRAL_SAFETY_BUFFER_HOURS: i64 = 2;

/// Delay (hours) suggested to callers when a job is deferred
pub const SUGGESTED_RETRY_DELAY_HOURS: i64 = 1;

/// Decides whether batch jobs run now or wait for a greener grid
pub struct CarbonAwareScheduler {
    /// Carbon intensity source
    provider: Box<dyn CarbonIntensityProvider>,
    /// Configuration
    config: SchedulerConfig,
}

impl CarbonAwareScheduler {
    /// Create new carbon-aware scheduler
    pub fn new(config: SchedulerConfig, provider: impl CarbonIntensityProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            config,
        }
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    pub fn carbon_threshold(&self) -> f64 {
        self.config.carbon_threshold
    }

    /// Replace the threshold, rejecting values the config loader would reject
    pub fn set_carbon_threshold(&mut self, carbon_threshold: f64) -> Result<()> {
        let config = SchedulerConfig {
            carbon_threshold,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Current grid intensity for the configured region.
    ///
    /// Provider failures and readings that are not a finite non-negative
    /// number read as 0 so that jobs are never blocked by the intensity source.
    pub fn current_intensity(&self) -> f64 {
        info!("Checking grid intensity for {}", self.config.region);
        match self.provider.get_intensity(&self.config.region) {
            Ok(intensity) if intensity.is_finite() && intensity >= 0.0 => intensity,
            Ok(intensity) => {
                warn!(
                    "Invalid grid intensity {} for {}, allowing execution",
                    intensity, self.config.region
                );
                0.0
            }
            Err(e) => {
                warn!(
                    "Failed to fetch grid intensity for {}, allowing execution: {}",
                    self.config.region, e
                );
                0.0
            }
        }
    }

    /// Decide between running and deferring for a given intensity and time
    pub fn evaluate(
        &self,
        current_intensity: f64,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ScheduleDecision {
        if current_intensity <= self.config.carbon_threshold {
            return ScheduleDecision::Execute {
                reason: ExecuteReason::GreenGrid,
            };
        }

        let slack = deadline - now;
        if slack > Duration::hours(DEFERRAL_SAFETY_BUFFER_HOURS) {
            ScheduleDecision::Defer {
                slack,
                retry_after: now + Duration::hours(SUGGESTED_RETRY_DELAY_HOURS),
            }
        } else {
            ScheduleDecision::Execute {
                reason: ExecuteReason::DeadlineApproaching,
            }
        }
    }

    /// Fetch the current intensity and decide, without running anything
    pub fn decide(&self, job_id: &str, deadline: DateTime<Utc>) -> ScheduleDecision {
        let intensity = self.current_intensity();
        self.decide_with_intensity(job_id, deadline, intensity)
    }

    fn decide_with_intensity(
        &self,
        job_id: &str,
        deadline: DateTime<Utc>,
        current_intensity: f64,
    ) -> ScheduleDecision {
        info!("Current grid intensity: {} gCO2/kWh", current_intensity);

        let decision = self.evaluate(current_intensity, deadline, Utc::now());
        match &decision {
            ScheduleDecision::Execute { reason } => {
                info!("Executing job {} ({:?})", job_id, reason);
            }
            ScheduleDecision::Defer { slack, retry_after } => {
                info!(
                    "Grid is dirty (> {} gCO2/kWh). Deferring job {}; {} min before deadline, suggest retry at {}",
                    self.config.carbon_threshold,
                    job_id,
                    slack.num_minutes(),
                    retry_after.to_rfc3339()
                );
            }
        }
        decision
    }

    /// Run `action` now if the grid is green or the deadline is near.
    ///
    /// Returns `true` if the action was invoked. A deferred action is dropped
    /// without being called.
    pub fn schedule<F: FnOnce()>(&self, job_id: &str, deadline: DateTime<Utc>, action: F) -> bool {
        let intensity = self.current_intensity();
        self.schedule_with_intensity(job_id, deadline, action, intensity)
    }

    /// Same as [`schedule`](Self::schedule) with an intensity reading supplied by the caller
    pub fn schedule_with_intensity<F: FnOnce()>(
        &self,
        job_id: &str,
        deadline: DateTime<Utc>,
        action: F,
        current_intensity: f64,
    ) -> bool {
        let decision = self.decide_with_intensity(job_id, deadline, current_intensity);
        if decision.is_execute() {
            action();
            true
        } else {
            false
        }
    }

    pub fn schedule_job<F: FnOnce()>(&self, job: Job<F>) -> bool {
        self.schedule(&job.id, job.deadline, job.action)
    }
}
