//! Sync commands: the hourly loop and a single cycle.

use chrono::Local;
use console::style;

use super::build_clients;
use crate::config::Settings;
use crate::cycle::run_cycle;
use crate::scheduler::Scheduler;

/// Poll until killed, syncing once per wall-clock hour.
pub async fn cmd_run(settings: &Settings) -> anyhow::Result<()> {
    let (source, store) = build_clients(settings)?;
    let scheduler = Scheduler::new(settings.poll_interval());

    println!(
        "{} Syncing {} every hour (checking every {}s)",
        style("→").cyan(),
        settings.source_url,
        scheduler.poll_interval().as_secs()
    );

    scheduler.run(&source, &store).await;
    Ok(())
}

/// Run one cycle now, failing the process if it fails.
pub async fn cmd_once(settings: &Settings) -> anyhow::Result<()> {
    let (source, store) = build_clients(settings)?;

    let report = run_cycle(&source, &store, Local::now().date_naive()).await?;
    println!(
        "{} Synced '{}' ({} confirmed, {} counties, daily {})",
        style("✓").green(),
        report.report_date_string,
        report.confirmed_cases,
        report.counties_written,
        report.daily
    );
    Ok(())
}
