//! Parsed result of one fetch of the source page.

use serde::Serialize;

/// One row of the county breakdown table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountyRow {
    pub county: String,
    pub confirmed_cases: i64,
    pub recovered: i64,
}

impl CountyRow {
    pub fn new(county: impl Into<String>, confirmed_cases: i64, recovered: i64) -> Self {
        Self {
            county: county.into(),
            confirmed_cases,
            recovered,
        }
    }
}

/// Statewide and county figures as published at a single report time.
///
/// Built once per fetch and never mutated. `county_recovered` is always the sum
/// of the county rows' recovered values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeSnapshot {
    confirmed_cases: i64,
    negative_cases: i64,
    county_recovered: i64,
    report_date_string: String,
    county_rows: Vec<CountyRow>,
}

impl ScrapeSnapshot {
    pub fn new(
        confirmed_cases: i64,
        negative_cases: i64,
        report_date_string: impl Into<String>,
        county_rows: Vec<CountyRow>,
    ) -> Self {
        let county_recovered = county_rows.iter().map(|row| row.recovered).sum();
        Self {
            confirmed_cases,
            negative_cases,
            county_recovered,
            report_date_string: report_date_string.into(),
            county_rows,
        }
    }

    pub fn confirmed_cases(&self) -> i64 {
        self.confirmed_cases
    }

    pub fn negative_cases(&self) -> i64 {
        self.negative_cases
    }

    /// Recovered count summed across counties.
    pub fn county_recovered(&self) -> i64 {
        self.county_recovered
    }

    /// The source's own "updated at" label. Opaque; only compared for equality.
    pub fn report_date_string(&self) -> &str {
        &self.report_date_string
    }

    pub fn county_rows(&self) -> &[CountyRow] {
        &self.county_rows
    }

    /// Look up a county row by name (exact match after trimming).
    pub fn county(&self, name: &str) -> Option<&CountyRow> {
        let name = name.trim();
        self.county_rows.iter().find(|row| row.county == name)
    }
}
