//! Attribute names of the remote datasets.
//!
//! These must match the existing layer and table schemas exactly, including case.

pub const OBJECT_ID: &str = "OBJECTID";
pub const COUNTY: &str = "COUNTY";

pub const CONFIRMED_CASES: &str = "ConfirmedCases";
pub const PRESUMPTIVE_CASES: &str = "PresumptiveCases";
pub const NEGATIVE_CASES: &str = "NegativeCases";
pub const UPDATED: &str = "Updated";

pub const REPORT_DATE: &str = "ReportDate";
pub const REPORT_DATE_STRING: &str = "ReportDateString";
pub const TOTAL_CONFIRMED: &str = "Total_Confirmed";
pub const TOTAL_PRESUMPTIVE: &str = "Total_Presumptive";
pub const TOTAL_CONFIRMED_PRESUMPTIVE: &str = "Total_Confirmed_Presumptive";
pub const TOTAL_NEGATIVE: &str = "Total_Negative";
pub const TOTAL_RECOVERED: &str = "Total_Recovered";
pub const DELTA_CONFIRMED_PRESUMPTIVE: &str = "Delta_Confirmed_Presumptive";
pub const DELTA_RECOVERED: &str = "Delta_Recovered";
pub const DELTA_NEGATIVE: &str = "Delta_Negative";

/// Format of `ReportDate` when written as text.
pub const REPORT_DATE_FORMAT: &str = "%Y/%m/%d";
