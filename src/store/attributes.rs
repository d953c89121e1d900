//! Decoding of feature attribute maps into typed rows.
//!
//! Hosted layers are loose about types: integer fields may come back as whole
//! floats, nullable fields as `null`, and date fields as epoch milliseconds.
//! Everything funnels through [`Attributes`] so each row type only names its
//! fields.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use super::error::{StoreError, StoreResult};
use crate::models::fields::{self, REPORT_DATE_FORMAT};
use crate::models::{CountyFeature, DailyRecord, TotalsFeature};

/// The `attributes` object of one feature.
#[derive(Debug, Clone)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Take the attributes out of a `{"attributes": {...}}` feature.
    pub fn from_feature(feature: Value) -> StoreResult<Self> {
        match feature {
            Value::Object(mut obj) => match obj.remove("attributes") {
                Some(Value::Object(attrs)) => Ok(Self(attrs)),
                _ => Err(StoreError::Schema("feature has no attributes".to_string())),
            },
            _ => Err(StoreError::Schema("feature is not an object".to_string())),
        }
    }

    /// Serialize a row into an attribute map.
    pub fn from_row<T: serde::Serialize>(row: &T) -> StoreResult<Self> {
        match serde_json::to_value(row)? {
            Value::Object(attrs) => Ok(Self(attrs)),
            other => Err(StoreError::Schema(format!(
                "row serialized to {} instead of an object",
                other
            ))),
        }
    }

    /// Wrap as a `{"attributes": {...}}` feature for applyEdits.
    pub fn into_feature(self) -> Value {
        serde_json::json!({ "attributes": Value::Object(self.0) })
    }

    fn field(&self, name: &str) -> StoreResult<&Value> {
        self.0
            .get(name)
            .ok_or_else(|| StoreError::Schema(format!("missing field {}", name)))
    }

    /// An integer field that must be present and non-null.
    pub fn id(&self, name: &str) -> StoreResult<i64> {
        match self.field(name)? {
            Value::Null => Err(StoreError::Schema(format!("{} is null", name))),
            value => as_i64(name, value),
        }
    }

    /// A count field. Null counts as zero.
    pub fn count(&self, name: &str) -> StoreResult<i64> {
        match self.field(name)? {
            Value::Null => Ok(0),
            value => as_i64(name, value),
        }
    }

    /// A text field. Null is the empty string; numbers are rendered.
    pub fn text(&self, name: &str) -> StoreResult<String> {
        Ok(match self.field(name)? {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// A date stored either as `YYYY/MM/DD` text or epoch milliseconds.
    /// Null or blank is `None`.
    pub fn date(&self, name: &str) -> StoreResult<Option<NaiveDate>> {
        let invalid = || StoreError::Schema(format!("{} is not a date", name));
        match self.field(name)? {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), REPORT_DATE_FORMAT)
                .or_else(|_| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d"))
                .map(Some)
                .map_err(|_| invalid()),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .and_then(DateTime::from_timestamp_millis)
                .map(|dt| Some(dt.date_naive()))
                .ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }
}

fn as_i64(name: &str, value: &Value) -> StoreResult<i64> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| StoreError::Schema(format!("{} is not an integer: {}", name, value)))
}

impl TryFrom<&Attributes> for TotalsFeature {
    type Error = StoreError;

    fn try_from(attrs: &Attributes) -> StoreResult<Self> {
        Ok(Self {
            object_id: attrs.id(fields::OBJECT_ID)?,
            confirmed_cases: attrs.count(fields::CONFIRMED_CASES)?,
            presumptive_cases: attrs.count(fields::PRESUMPTIVE_CASES)?,
            negative_cases: attrs.count(fields::NEGATIVE_CASES)?,
            updated: attrs.text(fields::UPDATED)?,
        })
    }
}

impl TryFrom<&Attributes> for CountyFeature {
    type Error = StoreError;

    fn try_from(attrs: &Attributes) -> StoreResult<Self> {
        Ok(Self {
            object_id: attrs.id(fields::OBJECT_ID)?,
            county: attrs.text(fields::COUNTY)?.trim().to_string(),
            confirmed_cases: attrs.count(fields::CONFIRMED_CASES)?,
            presumptive_cases: attrs.count(fields::PRESUMPTIVE_CASES)?,
            negative_cases: attrs.count(fields::NEGATIVE_CASES)?,
            updated: attrs.text(fields::UPDATED)?,
        })
    }
}

impl TryFrom<&Attributes> for DailyRecord {
    type Error = StoreError;

    fn try_from(attrs: &Attributes) -> StoreResult<Self> {
        Ok(Self {
            object_id: Some(attrs.id(fields::OBJECT_ID)?),
            report_date: attrs.date(fields::REPORT_DATE)?,
            report_date_string: attrs.text(fields::REPORT_DATE_STRING)?,
            total_confirmed: attrs.count(fields::TOTAL_CONFIRMED)?,
            total_presumptive: attrs.count(fields::TOTAL_PRESUMPTIVE)?,
            total_confirmed_presumptive: attrs.count(fields::TOTAL_CONFIRMED_PRESUMPTIVE)?,
            total_negative: attrs.count(fields::TOTAL_NEGATIVE)?,
            total_recovered: attrs.count(fields::TOTAL_RECOVERED)?,
            delta_confirmed_presumptive: attrs.count(fields::DELTA_CONFIRMED_PRESUMPTIVE)?,
            delta_recovered: attrs.count(fields::DELTA_RECOVERED)?,
            delta_negative: attrs.count(fields::DELTA_NEGATIVE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        Attributes::from_feature(json!({ "attributes": value })).unwrap()
    }

    #[test]
    fn test_count_accepts_floats_strings_and_null() {
        let a = attrs(json!({"a": 12.0, "b": "7", "c": null, "d": 3}));
        assert_eq!(a.count("a").unwrap(), 12);
        assert_eq!(a.count("b").unwrap(), 7);
        assert_eq!(a.count("c").unwrap(), 0);
        assert_eq!(a.count("d").unwrap(), 3);
    }

    #[test]
    fn test_count_rejects_fractions_and_missing() {
        let a = attrs(json!({"a": 1.5}));
        assert!(matches!(a.count("a"), Err(StoreError::Schema(_))));
        assert!(matches!(a.count("missing"), Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_date_from_text_and_epoch_millis() {
        let a = attrs(json!({"text": "2020/03/02", "iso": "2020-03-02", "ms": 1583107200000i64}));
        let expected = NaiveDate::from_ymd_opt(2020, 3, 2);
        assert_eq!(a.date("text").unwrap(), expected);
        assert_eq!(a.date("iso").unwrap(), expected);
        assert_eq!(a.date("ms").unwrap(), expected);
    }

    #[test]
    fn test_daily_record_from_attributes() {
        let a = attrs(json!({
            "OBJECTID": 41,
            "ReportDate": "2020/03/01",
            "ReportDateString": "3/1 9am",
            "Total_Confirmed": 10,
            "Total_Presumptive": null,
            "Total_Confirmed_Presumptive": 10,
            "Total_Negative": 280,
            "Total_Recovered": 2,
            "Delta_Confirmed_Presumptive": 3,
            "Delta_Recovered": 1,
            "Delta_Negative": 40
        }));
        let record = DailyRecord::try_from(&a).unwrap();
        assert_eq!(record.object_id, Some(41));
        assert_eq!(record.total_presumptive, 0);
        assert_eq!(record.report_date_string, "3/1 9am");
    }

    #[test]
    fn test_null_report_date_is_none() {
        let a = attrs(json!({"null": null, "blank": " ", "bad": "yesterday"}));
        assert_eq!(a.date("null").unwrap(), None);
        assert_eq!(a.date("blank").unwrap(), None);
        assert!(matches!(a.date("bad"), Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_row_round_trips_through_feature() {
        let county = CountyFeature::blank(4, "York");
        let feature = Attributes::from_row(&county).unwrap().into_feature();
        assert_eq!(feature["attributes"]["COUNTY"], "York");
        assert_eq!(feature["attributes"]["OBJECTID"], 4);
    }
}
