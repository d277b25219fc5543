//! Pipeline entry points for notifier operations.
//!
//! - `Driver::run_cycle`: fetch, filter, format, notify, persist once
//! - `run_schedule`: repeat cycles on a cron schedule

pub mod cron;
pub mod cycle;
pub mod dedup;
pub mod schedule;

pub use self::cron::CronSchedule;
pub use cycle::{CycleOptions, CycleReport, CycleState, Driver, Preview};
pub use dedup::{DedupCache, Selection, select_for_digest};
pub use schedule::run_schedule;
