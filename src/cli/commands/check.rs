//! Fetch and parse the source page without touching the remote datasets.

use chrono::Local;
use console::style;

use crate::config::Settings;
use crate::cycle::sync_snapshot;
use crate::http_client::HttpClient;
use crate::models::{CountyFeature, ScrapeSnapshot, TotalsFeature};
use crate::source::{PageSource, SnapshotSource};
use crate::store::InMemoryFeatureStore;

pub async fn cmd_check(settings: &Settings, dry_run: bool) -> anyhow::Result<()> {
    let client = HttpClient::new(settings.request_timeout(), &settings.user_agent)?;
    let source = PageSource::new(client, &settings.source_url)?;

    let snapshot = source.fetch().await?;
    print_snapshot(&snapshot);

    if dry_run {
        dry_run_sync(&snapshot).await?;
    }
    Ok(())
}

fn print_snapshot(snapshot: &ScrapeSnapshot) {
    println!(
        "{} {}",
        style("✓").green(),
        style(snapshot.report_date_string()).bold()
    );
    println!("  Confirmed: {}", snapshot.confirmed_cases());
    println!("  Negative:  {}", snapshot.negative_cases());
    println!("  Recovered: {} (county sum)", snapshot.county_recovered());
    println!();
    for row in snapshot.county_rows() {
        println!(
            "  {:<16} {:>6} confirmed {:>6} recovered",
            row.county, row.confirmed_cases, row.recovered
        );
    }
}

/// Sync into a throwaway store seeded with the page's own counties and an
/// empty daily table, then show what would be written.
async fn dry_run_sync(snapshot: &ScrapeSnapshot) -> anyhow::Result<()> {
    let counties = snapshot
        .county_rows()
        .iter()
        .zip(1..)
        .map(|(row, id)| CountyFeature::blank(id, row.county.trim()))
        .collect();
    let store = InMemoryFeatureStore::new(
        TotalsFeature {
            object_id: 1,
            confirmed_cases: 0,
            presumptive_cases: 0,
            negative_cases: 0,
            updated: String::new(),
        },
        counties,
        Vec::new(),
    );

    let report = sync_snapshot(&store, snapshot, Local::now().date_naive()).await?;
    println!();
    println!(
        "{} Dry run: {} counties, daily {}",
        style("→").cyan(),
        report.counties_written,
        report.daily
    );
    for record in store.daily_records().await {
        println!("{}", serde_json::to_string_pretty(&record)?);
    }
    Ok(())
}
