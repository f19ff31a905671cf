use chrono::{DateTime, FixedOffset, Utc};
use lmsbot_core::QuietHours;

use crate::commands::common::{build_engine, summarize_report, Engine};
use crate::config::AppConfig;
use crate::error::CliError;

/// Poll until Ctrl-C. A failed cycle is logged and reported, never fatal.
pub async fn run_loop(config: &AppConfig) -> Result<(), CliError> {
    let mut engine = build_engine(config)?;
    tracing::info!(
        db_path = %config.db_path.display(),
        download_dir = %config.download_dir.display(),
        interval_secs = config.poll_interval.as_secs(),
        quiet_hours = %config
            .quiet_hours
            .map_or_else(|| "none".to_string(), |hours| hours.to_string()),
        "Starting polling loop"
    );

    loop {
        let now = Utc::now();
        if in_quiet_hours(config.quiet_hours, now, config.reference_zone) {
            tracing::info!("Inside quiet hours, skipping cycle");
        } else {
            run_guarded_cycle(&mut engine, now).await;
        }

        tokio::select! {
            () = tokio::time::sleep(config.poll_interval) => {}
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Interrupted, shutting down");
                return Ok(());
            }
        }
    }
}

/// Run a single cycle regardless of quiet hours
pub async fn run_once(config: &AppConfig) -> Result<(), CliError> {
    let mut engine = build_engine(config)?;
    match engine.run_cycle(Utc::now()).await {
        Ok(report) => {
            println!("{}", summarize_report(&report));
            Ok(())
        }
        Err(error) => {
            engine.report_failure(&error).await;
            Err(error.into())
        }
    }
}

pub(crate) fn in_quiet_hours(
    quiet_hours: Option<QuietHours>,
    now: DateTime<Utc>,
    zone: FixedOffset,
) -> bool {
    quiet_hours.is_some_and(|hours| hours.is_quiet_at(now, zone))
}

async fn run_guarded_cycle(engine: &mut Engine, now: DateTime<Utc>) {
    match engine.run_cycle(now).await {
        Ok(report) => tracing::info!("Cycle complete: {}", summarize_report(&report)),
        Err(error) => {
            tracing::error!("Cycle failed: {error}");
            engine.report_failure(&error).await;
        }
    }
}
