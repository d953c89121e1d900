//! Reconciliation of a fresh snapshot against the stored state.
//!
//! The source republishes the same page many times between real updates, and a
//! real update can land more than once on the same calendar day. The page's
//! own report label is the only reliable change signal, so the daily table is
//! driven by it:
//!
//! | stored tail                                 | action                               |
//! |---------------------------------------------|--------------------------------------|
//! | empty                                       | append, baseline zero                |
//! | last label == snapshot label                | nothing                              |
//! | last label differs, last date is not today  | append, baseline = last              |
//! | last label differs, last date is today      | overwrite last, baseline = previous  |
//!
//! When the overwritten record has no predecessor the baseline is zero.
//!
//! Everything here is pure: new rows are built from their inputs and returned
//! to the caller to write.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{
    CountyFeature, CumulativeTotals, DailyRecord, ScrapeSnapshot, TotalsFeature,
};
use crate::source::ParseError;

/// What to do with the daily table for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyAction {
    /// Add a new record after the current tail.
    Append(DailyRecord),
    /// Replace the most recent record; carries that record's id.
    Overwrite(DailyRecord),
    /// The page has not changed since the last recorded report.
    Unchanged,
}

/// Decide how `snapshot` lands in the daily table.
///
/// `tail` holds the most recent stored records, oldest first; only the last
/// two are consulted.
pub fn reconcile_daily(
    snapshot: &ScrapeSnapshot,
    tail: &[DailyRecord],
    today: NaiveDate,
) -> DailyAction {
    let (previous, last) = match tail {
        [] => {
            return DailyAction::Append(build_record(
                snapshot,
                CumulativeTotals::ZERO,
                today,
                None,
            ))
        }
        [last] => (None, last),
        [.., previous, last] => (Some(previous), last),
    };

    if last.report_date_string == snapshot.report_date_string() {
        return DailyAction::Unchanged;
    }

    // An undated record is never today's.
    if last.report_date == Some(today) {
        let baseline = previous
            .map(DailyRecord::totals)
            .unwrap_or(CumulativeTotals::ZERO);
        DailyAction::Overwrite(build_record(snapshot, baseline, today, last.object_id))
    } else {
        DailyAction::Append(build_record(snapshot, last.totals(), today, None))
    }
}

/// Build a daily record for `snapshot` with deltas against `baseline`.
pub fn build_record(
    snapshot: &ScrapeSnapshot,
    baseline: CumulativeTotals,
    report_date: NaiveDate,
    object_id: Option<i64>,
) -> DailyRecord {
    let totals = CumulativeTotals {
        confirmed: snapshot.confirmed_cases(),
        presumptive: 0,
        negative: snapshot.negative_cases(),
        recovered: snapshot.county_recovered(),
    };

    DailyRecord {
        object_id,
        report_date: Some(report_date),
        report_date_string: snapshot.report_date_string().to_string(),
        total_confirmed: totals.confirmed,
        total_presumptive: totals.presumptive,
        total_confirmed_presumptive: totals.confirmed_presumptive(),
        total_negative: totals.negative,
        total_recovered: totals.recovered,
        delta_confirmed_presumptive: totals.confirmed_presumptive()
            - baseline.confirmed_presumptive(),
        delta_recovered: totals.recovered - baseline.recovered,
        delta_negative: totals.negative - baseline.negative,
    }
}

/// New value of the statewide row.
pub fn totals_feature(snapshot: &ScrapeSnapshot, current: &TotalsFeature) -> TotalsFeature {
    TotalsFeature {
        object_id: current.object_id,
        confirmed_cases: snapshot.confirmed_cases(),
        presumptive_cases: 0,
        negative_cases: snapshot.negative_cases(),
        updated: snapshot.report_date_string().to_string(),
    }
}

/// New values for every stored county row.
///
/// Counties on the page but not in the layer are ignored. A county in the layer
/// but missing from the page means the page lost a row and is rejected.
pub fn county_features(
    snapshot: &ScrapeSnapshot,
    current: &BTreeMap<String, CountyFeature>,
) -> Result<Vec<CountyFeature>, ParseError> {
    current
        .values()
        .map(|existing| {
            let row = snapshot
                .county(&existing.county)
                .ok_or_else(|| ParseError::MissingCounty(existing.county.clone()))?;
            Ok(CountyFeature {
                object_id: existing.object_id,
                county: existing.county.clone(),
                confirmed_cases: row.confirmed_cases,
                presumptive_cases: 0,
                negative_cases: row.recovered,
                updated: snapshot.report_date_string().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CountyRow;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    fn snapshot(confirmed: i64, negative: i64, recovered: i64, label: &str) -> ScrapeSnapshot {
        ScrapeSnapshot::new(
            confirmed,
            negative,
            label,
            vec![CountyRow::new("Cumberland", confirmed, recovered)],
        )
    }

    fn written(action: &DailyAction) -> &DailyRecord {
        match action {
            DailyAction::Append(record) | DailyAction::Overwrite(record) => record,
            DailyAction::Unchanged => panic!("expected a write, got {:?}", action),
        }
    }

    fn stored(id: i64, day: u32, label: &str, confirmed: i64, negative: i64, recovered: i64) -> DailyRecord {
        DailyRecord {
            object_id: Some(id),
            report_date: Some(date(day)),
            report_date_string: label.to_string(),
            total_confirmed: confirmed,
            total_presumptive: 0,
            total_confirmed_presumptive: confirmed,
            total_negative: negative,
            total_recovered: recovered,
            delta_confirmed_presumptive: 0,
            delta_recovered: 0,
            delta_negative: 0,
        }
    }

    #[test]
    fn test_empty_tail_appends_absolute_totals() {
        let action = reconcile_daily(&snapshot(7, 120, 1, "3/2 9am"), &[], date(2));

        let DailyAction::Append(record) = action else {
            panic!("expected append, got {:?}", action);
        };
        assert_eq!(record.object_id, None);
        assert_eq!(record.report_date, Some(date(2)));
        assert_eq!(record.delta_confirmed_presumptive, 7);
        assert_eq!(record.delta_negative, 120);
        assert_eq!(record.delta_recovered, 1);
    }

    #[test]
    fn test_new_day_appends_against_last() {
        let tail = [stored(1, 1, "3/1 9am", 10, 200, 2)];
        let action = reconcile_daily(&snapshot(15, 260, 4, "3/2 9am"), &tail, date(2));

        let DailyAction::Append(record) = action else {
            panic!("expected append, got {:?}", action);
        };
        assert_eq!(record.total_confirmed, 15);
        assert_eq!(record.total_confirmed_presumptive, 15);
        assert_eq!(record.delta_confirmed_presumptive, 5);
        assert_eq!(record.delta_recovered, 2);
        assert_eq!(record.delta_negative, 60);
        assert_eq!(record.report_date_string, "3/2 9am");
    }

    #[test]
    fn test_new_day_uses_last_not_second_to_last() {
        let tail = [
            stored(1, 1, "3/1 9am", 10, 0, 0),
            stored(2, 2, "3/2 9am", 15, 0, 0),
        ];
        let action = reconcile_daily(&snapshot(21, 0, 0, "3/3 9am"), &tail, date(3));
        assert_eq!(written(&action).delta_confirmed_presumptive, 6);
        assert!(matches!(action, DailyAction::Append(_)));
    }

    #[test]
    fn test_downward_correction_gives_negative_delta() {
        let tail = [stored(1, 1, "3/1 9am", 10, 200, 5)];
        let action = reconcile_daily(&snapshot(8, 190, 3, "3/2 9am"), &tail, date(2));
        let record = written(&action);
        assert_eq!(record.delta_confirmed_presumptive, -2);
        assert_eq!(record.delta_negative, -10);
        assert_eq!(record.delta_recovered, -2);
    }

    #[test]
    fn test_same_day_update_overwrites_against_second_to_last() {
        let tail = [
            stored(1, 1, "3/1 9am", 10, 200, 2),
            stored(2, 2, "3/2 9am", 15, 250, 3),
        ];
        let action = reconcile_daily(&snapshot(20, 300, 5, "3/2 2pm"), &tail, date(2));

        let DailyAction::Overwrite(record) = action else {
            panic!("expected overwrite, got {:?}", action);
        };
        assert_eq!(record.object_id, Some(2));
        assert_eq!(record.report_date, Some(date(2)));
        assert_eq!(record.delta_confirmed_presumptive, 10);
        assert_eq!(record.delta_negative, 100);
        assert_eq!(record.delta_recovered, 3);
        assert_eq!(record.report_date_string, "3/2 2pm");
    }

    #[test]
    fn test_same_day_update_without_predecessor_uses_zero_baseline() {
        let tail = [stored(5, 2, "3/2 9am", 15, 250, 3)];
        let action = reconcile_daily(&snapshot(20, 300, 4, "3/2 2pm"), &tail, date(2));

        let DailyAction::Overwrite(record) = action else {
            panic!("expected overwrite, got {:?}", action);
        };
        assert_eq!(record.object_id, Some(5));
        assert_eq!(record.delta_confirmed_presumptive, 20);
        assert_eq!(record.delta_negative, 300);
        assert_eq!(record.delta_recovered, 4);
    }

    #[test]
    fn test_undated_last_record_appends_against_it() {
        let mut last = stored(4, 2, "3/2 9am", 10, 200, 2);
        last.report_date = None;
        let action = reconcile_daily(&snapshot(15, 260, 4, "3/2 2pm"), &[last], date(2));

        let DailyAction::Append(record) = action else {
            panic!("expected append, got {:?}", action);
        };
        assert_eq!(record.object_id, None);
        assert_eq!(record.report_date, Some(date(2)));
        assert_eq!(record.delta_confirmed_presumptive, 5);
        assert_eq!(record.delta_recovered, 2);
    }

    #[test]
    fn test_unchanged_label_is_noop() {
        let yesterday = [stored(1, 1, "3/1 9am", 10, 0, 0)];
        assert_eq!(
            reconcile_daily(&snapshot(99, 0, 0, "3/1 9am"), &yesterday, date(2)),
            DailyAction::Unchanged
        );

        let today = [stored(1, 2, "3/2 9am", 10, 0, 0)];
        assert_eq!(
            reconcile_daily(&snapshot(99, 0, 0, "3/2 9am"), &today, date(2)),
            DailyAction::Unchanged
        );
    }

    #[test]
    fn test_presumptive_baseline_counts_toward_confirmed_delta() {
        let mut last = stored(1, 1, "3/1 9am", 10, 0, 0);
        last.total_presumptive = 3;
        let action = reconcile_daily(&snapshot(15, 0, 0, "3/2 9am"), &[last], date(2));
        assert_eq!(written(&action).delta_confirmed_presumptive, 2);
    }

    #[test]
    fn test_totals_feature_keeps_row_id() {
        let current = TotalsFeature {
            object_id: 1,
            confirmed_cases: 3,
            presumptive_cases: 2,
            negative_cases: 9,
            updated: "old".to_string(),
        };
        let updated = totals_feature(&snapshot(15, 260, 4, "3/2 9am"), &current);
        assert_eq!(
            updated,
            TotalsFeature {
                object_id: 1,
                confirmed_cases: 15,
                presumptive_cases: 0,
                negative_cases: 260,
                updated: "3/2 9am".to_string(),
            }
        );
    }

    #[test]
    fn test_county_features_store_recovered_in_negative_field() {
        let snap = ScrapeSnapshot::new(
            13,
            0,
            "3/2 9am",
            vec![
                CountyRow::new("Cumberland", 10, 2),
                CountyRow::new("York", 3, 1),
                CountyRow::new("Unlisted", 0, 0),
            ],
        );
        let current: BTreeMap<_, _> = [
            ("Cumberland".to_string(), CountyFeature::blank(1, "Cumberland")),
            ("York".to_string(), CountyFeature::blank(2, "York")),
        ]
        .into_iter()
        .collect();

        let updates = county_features(&snap, &current).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].county, "Cumberland");
        assert_eq!(updates[0].confirmed_cases, 10);
        assert_eq!(updates[0].recovered(), 2);
        assert_eq!(updates[1].object_id, 2);
        assert_eq!(updates[1].updated, "3/2 9am");
    }

    #[test]
    fn test_county_missing_from_page_is_rejected() {
        let current: BTreeMap<_, _> = [("Knox".to_string(), CountyFeature::blank(7, "Knox"))]
            .into_iter()
            .collect();
        assert_eq!(
            county_features(&snapshot(1, 0, 0, "x"), &current),
            Err(ParseError::MissingCounty("Knox".to_string()))
        );
    }
}
