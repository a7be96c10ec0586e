use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use greenops::carbon_aware::{
    CarbonAwareScheduler, CarbonIntensityAPI, CarbonIntensityProvider, StaticIntensityProvider,
};
use greenops::config::GreenOpsConfig;
use greenops::telemetry::{self, LogFormat};
use greenops::Error;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "GREENOPS_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Estimate the carbon footprint of a query
    Estimate(EstimateArgs),
    /// Run a demonstration job through the carbon-aware scheduler
    Schedule(ScheduleArgs),
    /// Show version information
    Version,
}

#[derive(Parser, Debug)]
struct EstimateArgs {
    /// Warehouse size (X-Small .. 4X-Large)
    #[arg(long)]
    warehouse_size: String,

    /// Query duration in seconds
    #[arg(long)]
    duration: f64,

    /// Cloud region
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// Print the estimate as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ScheduleArgs {
    /// Job identifier
    #[arg(long, default_value = "ETL-Daily-001")]
    job_id: String,

    /// Hours until the job's deadline
    #[arg(long, default_value_t = 4.0)]
    deadline_in_hours: f64,

    /// Region whose grid intensity gates the job
    #[arg(long, env = "GREENOPS_REGION")]
    region: Option<String>,

    /// Highest acceptable grid intensity (gCO2/kWh)
    #[arg(long, env = "GREENOPS_CARBON_THRESHOLD")]
    carbon_threshold: Option<f64>,

    /// Use this intensity instead of querying the provider
    #[arg(long)]
    intensity: Option<f64>,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    if let Commands::Version = args.command {
        println!("GreenOps v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    telemetry::init_tracing(args.log_format);

    let config = match &args.config {
        Some(path) => GreenOpsConfig::from_file(path)?,
        None => GreenOpsConfig::default(),
    };

    match args.command {
        Commands::Estimate(estimate_args) => run_estimate(&config, estimate_args),
        Commands::Schedule(schedule_args) => run_schedule(config, schedule_args),
        Commands::Version => Ok(()),
    }
}

fn run_estimate(config: &GreenOpsConfig, args: EstimateArgs) -> Result<(), Error> {
    let estimator = &config.estimator;
    if !estimator.warehouse_sizes.contains(&args.warehouse_size) {
        warn!(
            "Unknown warehouse size {}, assuming 1 credit/hour (known: {})",
            args.warehouse_size,
            estimator.warehouse_sizes.sizes().join(", ")
        );
    }
    if !estimator.regional_intensity.contains(&args.region) {
        warn!(
            "Unknown region {}, assuming {} gCO2/kWh (known, cleanest first: {})",
            args.region,
            estimator.regional_intensity.default_intensity,
            estimator.regional_intensity.regions_by_intensity().join(", ")
        );
    }

    let result = estimator.estimate(&args.warehouse_size, args.duration, &args.region);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("--- Query Carbon Estimate ---");
    println!("Warehouse: {}", result.warehouse_size);
    println!("Duration: {}s", result.duration_seconds);
    println!(
        "Region: {} ({} gCO2/kWh)",
        result.region, result.grid_intensity
    );
    println!("Estimated Impact: {} gCO2", result.estimated_emissions_gco2);
    Ok(())
}

fn run_schedule(config: GreenOpsConfig, args: ScheduleArgs) -> Result<(), Error> {
    let mut scheduler_config = config.scheduler;
    if let Some(region) = args.region {
        scheduler_config.region = region;
    }
    if let Some(threshold) = args.carbon_threshold {
        scheduler_config.carbon_threshold = threshold;
    }
    scheduler_config.validate()?;

    let provider: Box<dyn CarbonIntensityProvider> = match args.intensity {
        Some(intensity) => Box::new(StaticIntensityProvider::uniform(intensity)),
        None => Box::new(CarbonIntensityAPI::new(config.provider)?),
    };

    info!(
        "Scheduling {} in {} with threshold {} gCO2/kWh",
        args.job_id, scheduler_config.region, scheduler_config.carbon_threshold
    );

    let scheduler = CarbonAwareScheduler::new(scheduler_config, provider);
    let deadline = deadline_from_hours(Utc::now(), args.deadline_in_hours)?;

    let executed = scheduler.schedule(&args.job_id, deadline, || {
        println!("   [System] Running ETL pipeline...");
    });

    if executed {
        println!("Job {} executed", args.job_id);
    } else {
        println!(
            "Job {} deferred; resubmit in about an hour or once the grid is greener",
            args.job_id
        );
    }
    Ok(())
}

/// Deadline `hours` after `now`, rejecting values chrono cannot represent
fn deadline_from_hours(now: DateTime<Utc>, hours: f64) -> Result<DateTime<Utc>, Error> {
    let seconds = hours * 3600.0;
    if !seconds.is_finite() || seconds < 0.0 || seconds >= i64::MAX as f64 {
        return Err(Error::ConfigError(format!(
            "deadline-in-hours must be a non-negative number, got {}",
            hours
        )));
    }

    Duration::try_seconds(seconds as i64)
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or_else(|| Error::ConfigError(format!("deadline-in-hours {} is out of range", hours)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_from_hours() {
        let now = Utc::now();
        assert_eq!(
            deadline_from_hours(now, 4.0).unwrap(),
            now + Duration::hours(4)
        );
        assert_eq!(
            deadline_from_hours(now, 0.5).unwrap(),
            now + Duration::minutes(30)
        );
        assert_eq!(deadline_from_hours(now, 0.0).unwrap(), now);
    }

    #[test]
    fn test_deadline_from_hours_rejects_invalid() {
        let now = Utc::now();
        for hours in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0] {
            assert!(
                matches!(deadline_from_hours(now, hours), Err(Error::ConfigError(_))),
                "{} accepted",
                hours
            );
        }
    }

    #[test]
    fn test_deadline_from_hours_rejects_huge_values() {
        let now = Utc::now();
        for hours in [1e10, 1e15, 1e20] {
            assert!(
                matches!(deadline_from_hours(now, hours), Err(Error::ConfigError(_))),
                "{} accepted",
                hours
            );
        }
    }
}
