//! Feature store adapter: the three remote datasets a cycle reads and edits.
//!
//! [`FeatureStore`] is the seam between the reconciliation logic and the
//! hosted service. [`ArcGisStore`] talks to a hosted feature service;
//! [`InMemoryFeatureStore`] keeps everything in process.

mod arcgis;
mod attributes;
mod error;
mod memory;

pub use arcgis::{ArcGisStore, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryFeatureStore;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::models::{CountyFeature, DailyRecord, TotalsFeature};

/// Read/edit access to the totals layer, the county layer, and the daily table.
///
/// Every failure is reported as a [`StoreError`]; callers do not retry.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Read the single statewide row.
    async fn read_totals_feature(&self) -> StoreResult<TotalsFeature>;

    /// Overwrite the statewide row.
    async fn write_totals_feature(&self, feature: &TotalsFeature) -> StoreResult<()>;

    /// Read all county rows keyed by county name.
    async fn read_county_features(&self) -> StoreResult<BTreeMap<String, CountyFeature>>;

    /// Update all given county rows in one edit.
    async fn write_county_features(&self, features: &[CountyFeature]) -> StoreResult<()>;

    /// The last two daily records, most recent last. Fewer if the table is short.
    async fn read_last_two_daily_records(&self) -> StoreResult<Vec<DailyRecord>>;

    /// Append a new daily record.
    async fn append_daily_record(&self, record: &DailyRecord) -> StoreResult<()>;

    /// Replace the most recent daily record. The record must carry that row's id.
    async fn overwrite_most_recent_daily_record(&self, record: &DailyRecord) -> StoreResult<()>;
}
