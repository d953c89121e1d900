//! Rows of the totals and county feature layers.

use serde::Serialize;

/// The single statewide row of the totals layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalsFeature {
    #[serde(rename = "OBJECTID")]
    pub object_id: i64,
    #[serde(rename = "ConfirmedCases")]
    pub confirmed_cases: i64,
    #[serde(rename = "PresumptiveCases")]
    pub presumptive_cases: i64,
    #[serde(rename = "NegativeCases")]
    pub negative_cases: i64,
    #[serde(rename = "Updated")]
    pub updated: String,
}

/// One county row of the county layer.
///
/// `negative_cases` holds the county's recovered count; the layer schema
/// predates recovery reporting and the field was repurposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountyFeature {
    #[serde(rename = "OBJECTID")]
    pub object_id: i64,
    #[serde(rename = "COUNTY")]
    pub county: String,
    #[serde(rename = "ConfirmedCases")]
    pub confirmed_cases: i64,
    #[serde(rename = "PresumptiveCases")]
    pub presumptive_cases: i64,
    #[serde(rename = "NegativeCases")]
    pub negative_cases: i64,
    #[serde(rename = "Updated")]
    pub updated: String,
}

impl CountyFeature {
    /// A county row with no cases and no update label.
    pub fn blank(object_id: i64, county: impl Into<String>) -> Self {
        Self {
            object_id,
            county: county.into(),
            confirmed_cases: 0,
            presumptive_cases: 0,
            negative_cases: 0,
            updated: String::new(),
        }
    }

    /// Recovered count stored in the repurposed `NegativeCases` field.
    pub fn recovered(&self) -> i64 {
        self.negative_cases
    }
}
