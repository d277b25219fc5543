// src/pipeline/schedule.rs

//! Recurring execution of cycles on a cron schedule.

use chrono::Utc;
use chrono_tz::Tz;

use crate::error::{AppError, Result};
use crate::models::ScheduleConfig;
use crate::pipeline::cron::{CronSchedule, parse_timezone};
use crate::pipeline::cycle::Driver;

/// Parse the `[schedule]` section into a cron schedule and timezone.
pub fn resolve(config: &ScheduleConfig) -> Result<(CronSchedule, Tz)> {
    let expression = config
        .expression
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::schedule("schedule.expression is not set"))?;

    let schedule = CronSchedule::parse(expression)?;
    let tz = parse_timezone(config.timezone.as_deref())?;
    Ok((schedule, tz))
}

/// Run cycles at every trigger until Ctrl-C.
///
/// Cycles run one at a time. Triggers that pass while a cycle is still
/// running are skipped.
pub async fn run_schedule(driver: &Driver, schedule: &CronSchedule, tz: Tz) -> Result<()> {
    log::info!(
        "Scheduler started: \"{}\" ({})",
        schedule.expression(),
        tz
    );

    loop {
        let now = Utc::now();
        let next = schedule.next_after(now, tz).ok_or_else(|| {
            AppError::schedule(format!(
                "'{}' never fires again",
                schedule.expression()
            ))
        })?;

        log::info!(
            "Next cycle at {} ({})",
            next.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z"),
            next.format("%H:%M UTC")
        );

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutdown requested, stopping scheduler");
                return Ok(());
            }
        }

        let report = driver.run_cycle().await;
        if !report.is_success() {
            log::warn!("Cycle ended in failure; waiting for the next trigger");
        }
    }
}
