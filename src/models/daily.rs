//! Daily time-series records.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::fields::REPORT_DATE_FORMAT;

/// Cumulative counts used as the "previous" point for delta computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CumulativeTotals {
    pub confirmed: i64,
    pub presumptive: i64,
    pub negative: i64,
    pub recovered: i64,
}

impl CumulativeTotals {
    pub const ZERO: Self = Self {
        confirmed: 0,
        presumptive: 0,
        negative: 0,
        recovered: 0,
    };

    pub fn confirmed_presumptive(&self) -> i64 {
        self.confirmed + self.presumptive
    }
}

/// One row of the daily table: cumulative totals as of one reporting event,
/// plus the change from the record before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRecord {
    /// Remote row id. `None` until the record has been appended.
    #[serde(rename = "OBJECTID", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<i64>,
    /// Null in rows entered by hand before dates were tracked.
    #[serde(rename = "ReportDate", serialize_with = "serialize_report_date")]
    pub report_date: Option<NaiveDate>,
    #[serde(rename = "ReportDateString")]
    pub report_date_string: String,
    #[serde(rename = "Total_Confirmed")]
    pub total_confirmed: i64,
    #[serde(rename = "Total_Presumptive")]
    pub total_presumptive: i64,
    #[serde(rename = "Total_Confirmed_Presumptive")]
    pub total_confirmed_presumptive: i64,
    #[serde(rename = "Total_Negative")]
    pub total_negative: i64,
    #[serde(rename = "Total_Recovered")]
    pub total_recovered: i64,
    #[serde(rename = "Delta_Confirmed_Presumptive")]
    pub delta_confirmed_presumptive: i64,
    #[serde(rename = "Delta_Recovered")]
    pub delta_recovered: i64,
    #[serde(rename = "Delta_Negative")]
    pub delta_negative: i64,
}

impl DailyRecord {
    /// Cumulative totals carried by this record.
    pub fn totals(&self) -> CumulativeTotals {
        CumulativeTotals {
            confirmed: self.total_confirmed,
            presumptive: self.total_presumptive,
            negative: self.total_negative,
            recovered: self.total_recovered,
        }
    }
}

fn serialize_report_date<S: Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.collect_str(&date.format(REPORT_DATE_FORMAT)),
        None => serializer.serialize_none(),
    }
}
