//! Hourly driver loop.
//!
//! The loop wakes every `poll_interval`, and runs a cycle whenever the local
//! wall-clock hour differs from the hour of the previous check. A poll interval
//! longer than an hour can skip hours; nothing catches them up.

use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use console::style;

use crate::cycle::{run_cycle, CycleError};
use crate::source::SnapshotSource;
use crate::store::FeatureStore;

/// Whether a cycle is due. `last_hour` is `None` before the first check.
pub fn tick(last_hour: Option<u32>, now_hour: u32) -> bool {
    last_hour != Some(now_hour)
}

const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

fn failure_line(now: DateTime<Local>, err: &CycleError) -> String {
    format!(
        "{} {} cycle failed: {}",
        style("✗").red(),
        now.format(TIMESTAMP),
        err
    )
}

fn finished_line(now: DateTime<Local>) -> String {
    style(format!("Cycle finished at {}", now.format(TIMESTAMP)))
        .dim()
        .to_string()
}

pub struct Scheduler {
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// One poll. Runs a cycle if the hour changed and returns the hour to carry
    /// into the next check. A failed cycle is reported and swallowed.
    pub async fn check(
        &self,
        last_hour: Option<u32>,
        now: DateTime<Local>,
        source: &dyn SnapshotSource,
        store: &dyn FeatureStore,
    ) -> Option<u32> {
        let hour = now.hour();
        if !tick(last_hour, hour) {
            tracing::debug!("Hour {} already handled", hour);
            return last_hour;
        }

        match run_cycle(source, store, now.date_naive()).await {
            Ok(report) => {
                tracing::info!(
                    "Synced '{}': {} confirmed, {} counties, daily {}",
                    report.report_date_string,
                    report.confirmed_cases,
                    report.counties_written,
                    report.daily
                );
            }
            Err(e) => println!("{}", failure_line(now, &e)),
        }
        println!("{}", finished_line(Local::now()));

        Some(hour)
    }

    /// Poll forever.
    pub async fn run(&self, source: &dyn SnapshotSource, store: &dyn FeatureStore) {
        let mut last_hour = None;
        loop {
            last_hour = self.check(last_hour, Local::now(), source, store).await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
