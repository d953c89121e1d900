//! One fetch-reconcile-write pass.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::ScrapeSnapshot;
use crate::reconcile::{county_features, reconcile_daily, totals_feature, DailyAction};
use crate::source::{FetchError, ParseError, SnapshotSource, SourceError};
use crate::store::{FeatureStore, StoreError};

/// Anything that can abort a cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),
}

impl From<SourceError> for CycleError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Fetch(e) => CycleError::Fetch(e),
            SourceError::Parse(e) => CycleError::Parse(e),
        }
    }
}

/// What happened to the daily table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyOutcome {
    Appended,
    Overwritten,
    Unchanged,
}

impl std::fmt::Display for DailyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DailyOutcome::Appended => write!(f, "appended"),
            DailyOutcome::Overwritten => write!(f, "overwritten"),
            DailyOutcome::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Summary of a successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub report_date_string: String,
    pub confirmed_cases: i64,
    pub counties_written: usize,
    pub daily: DailyOutcome,
}

/// Fetch a snapshot from `source` and sync it into `store`.
pub async fn run_cycle(
    source: &dyn SnapshotSource,
    store: &dyn FeatureStore,
    today: NaiveDate,
) -> Result<CycleReport, CycleError> {
    let snapshot = source.fetch().await?;
    sync_snapshot(store, &snapshot, today).await
}

/// Write an already fetched snapshot into `store`.
///
/// Totals and counties are written on every call; the daily table only when
/// the report label changed. Steps run in order and stop at the first error,
/// so earlier writes are not rolled back.
pub async fn sync_snapshot(
    store: &dyn FeatureStore,
    snapshot: &ScrapeSnapshot,
    today: NaiveDate,
) -> Result<CycleReport, CycleError> {
    let current_totals = store.read_totals_feature().await?;
    store
        .write_totals_feature(&totals_feature(snapshot, &current_totals))
        .await?;

    let current_counties = store.read_county_features().await?;
    let counties = county_features(snapshot, &current_counties)?;
    if !counties.is_empty() {
        store.write_county_features(&counties).await?;
    }

    let tail = store.read_last_two_daily_records().await?;
    let daily = match reconcile_daily(snapshot, &tail, today) {
        DailyAction::Append(record) => {
            tracing::info!(
                "Appending daily record '{}' ({:+} confirmed)",
                record.report_date_string,
                record.delta_confirmed_presumptive
            );
            store.append_daily_record(&record).await?;
            DailyOutcome::Appended
        }
        DailyAction::Overwrite(record) => {
            tracing::info!(
                "Overwriting today's daily record with '{}' ({:+} confirmed)",
                record.report_date_string,
                record.delta_confirmed_presumptive
            );
            store.overwrite_most_recent_daily_record(&record).await?;
            DailyOutcome::Overwritten
        }
        DailyAction::Unchanged => {
            tracing::info!(
                "Report '{}' already recorded",
                snapshot.report_date_string()
            );
            DailyOutcome::Unchanged
        }
    };

    Ok(CycleReport {
        report_date_string: snapshot.report_date_string().to_string(),
        confirmed_cases: snapshot.confirmed_cases(),
        counties_written: counties.len(),
        daily,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CountyFeature, CountyRow, DailyRecord, TotalsFeature};
    use crate::store::InMemoryFeatureStore;
    use async_trait::async_trait;

    struct FixedSource(Result<ScrapeSnapshot, ParseError>);

    #[async_trait]
    impl SnapshotSource for FixedSource {
        async fn fetch(&self) -> Result<ScrapeSnapshot, SourceError> {
            self.0.clone().map_err(SourceError::from)
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    fn store_with(daily: Vec<DailyRecord>) -> InMemoryFeatureStore {
        InMemoryFeatureStore::new(
            TotalsFeature {
                object_id: 1,
                confirmed_cases: 0,
                presumptive_cases: 0,
                negative_cases: 0,
                updated: String::new(),
            },
            vec![
                CountyFeature::blank(1, "Cumberland"),
                CountyFeature::blank(2, "York"),
            ],
            daily,
        )
    }

    fn snapshot(label: &str) -> ScrapeSnapshot {
        ScrapeSnapshot::new(
            15,
            260,
            label,
            vec![
                CountyRow::new("Cumberland", 10, 3),
                CountyRow::new("York", 5, 1),
            ],
        )
    }

    #[tokio::test]
    async fn test_first_cycle_writes_everything() {
        let store = store_with(vec![]);
        let source = FixedSource(Ok(snapshot("3/2 9am")));

        let report = run_cycle(&source, &store, day(2)).await.unwrap();
        assert_eq!(report.daily, DailyOutcome::Appended);
        assert_eq!(report.counties_written, 2);

        let totals = store.totals().await;
        assert_eq!(totals.confirmed_cases, 15);
        assert_eq!(totals.updated, "3/2 9am");
        assert_eq!(store.counties().await["York"].recovered(), 1);

        let records = store.daily_records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_recovered, 4);
        assert_eq!(records[0].delta_confirmed_presumptive, 15);
    }

    #[tokio::test]
    async fn test_repeat_cycle_still_updates_features() {
        let store = store_with(vec![]);
        let source = FixedSource(Ok(snapshot("3/2 9am")));

        run_cycle(&source, &store, day(2)).await.unwrap();
        let report = run_cycle(&source, &store, day(2)).await.unwrap();

        assert_eq!(report.daily, DailyOutcome::Unchanged);
        assert_eq!(store.daily_edits(), 1);
        assert_eq!(store.feature_edits(), 4);
    }

    #[tokio::test]
    async fn test_parse_failure_writes_nothing() {
        let store = store_with(vec![]);
        let source = FixedSource(Err(ParseError::NoTables));

        let err = run_cycle(&source, &store, day(2)).await.unwrap_err();
        assert!(matches!(err, CycleError::Parse(ParseError::NoTables)));
        assert_eq!(store.feature_edits(), 0);
        assert_eq!(store.daily_edits(), 0);
    }

    #[tokio::test]
    async fn test_missing_county_stops_before_daily() {
        let store = store_with(vec![]);
        let partial = ScrapeSnapshot::new(
            10,
            0,
            "3/2 9am",
            vec![CountyRow::new("Cumberland", 10, 3)],
        );

        let err = sync_snapshot(&store, &partial, day(2)).await.unwrap_err();
        assert!(matches!(err, CycleError::Parse(ParseError::MissingCounty(ref c)) if c == "York"));
        // Totals were already written when the county step failed.
        assert_eq!(store.totals().await.confirmed_cases, 10);
        assert!(store.daily_records().await.is_empty());
    }

    #[tokio::test]
    async fn test_same_day_update_keeps_table_length() {
        let store = store_with(vec![]);
        sync_snapshot(&store, &snapshot("3/1 9am"), day(1)).await.unwrap();
        sync_snapshot(&store, &snapshot("3/2 9am"), day(2)).await.unwrap();

        let later = ScrapeSnapshot::new(
            20,
            300,
            "3/2 2pm",
            vec![
                CountyRow::new("Cumberland", 14, 3),
                CountyRow::new("York", 6, 1),
            ],
        );
        let report = sync_snapshot(&store, &later, day(2)).await.unwrap();
        assert_eq!(report.daily, DailyOutcome::Overwritten);

        let records = store.daily_records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].report_date_string, "3/2 2pm");
        assert_eq!(records[1].delta_confirmed_presumptive, 5);
    }
}
