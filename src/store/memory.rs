//! In-memory feature store.
//!
//! Holds the three datasets in process. Used for dry runs and tests; state is
//! lost when the store is dropped.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::{StoreError, StoreResult};
use super::FeatureStore;
use crate::models::{CountyFeature, DailyRecord, TotalsFeature};

#[derive(Debug)]
struct DailyTable {
    records: Vec<DailyRecord>,
    next_object_id: i64,
}

/// Feature store backed by local collections.
#[derive(Debug)]
pub struct InMemoryFeatureStore {
    totals: RwLock<TotalsFeature>,
    counties: RwLock<BTreeMap<String, CountyFeature>>,
    daily: RwLock<DailyTable>,
    feature_edits: AtomicUsize,
    daily_edits: AtomicUsize,
}

impl InMemoryFeatureStore {
    /// Create a store seeded with existing rows. Daily records without an id
    /// are assigned one.
    pub fn new(totals: TotalsFeature, counties: Vec<CountyFeature>, daily: Vec<DailyRecord>) -> Self {
        let mut next_object_id = daily
            .iter()
            .filter_map(|r| r.object_id)
            .max()
            .unwrap_or(0)
            + 1;
        let records = daily
            .into_iter()
            .map(|mut record| {
                if record.object_id.is_none() {
                    record.object_id = Some(next_object_id);
                    next_object_id += 1;
                }
                record
            })
            .collect();

        Self {
            totals: RwLock::new(totals),
            counties: RwLock::new(
                counties
                    .into_iter()
                    .map(|c| (c.county.clone(), c))
                    .collect(),
            ),
            daily: RwLock::new(DailyTable {
                records,
                next_object_id,
            }),
            feature_edits: AtomicUsize::new(0),
            daily_edits: AtomicUsize::new(0),
        }
    }

    /// Snapshot of the daily table, oldest first.
    pub async fn daily_records(&self) -> Vec<DailyRecord> {
        self.daily.read().await.records.clone()
    }

    pub async fn totals(&self) -> TotalsFeature {
        self.totals.read().await.clone()
    }

    pub async fn counties(&self) -> BTreeMap<String, CountyFeature> {
        self.counties.read().await.clone()
    }

    /// Number of successful edits to the totals and county layers.
    pub fn feature_edits(&self) -> usize {
        self.feature_edits.load(Ordering::Relaxed)
    }

    /// Number of successful edits to the daily table.
    pub fn daily_edits(&self) -> usize {
        self.daily_edits.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FeatureStore for InMemoryFeatureStore {
    async fn read_totals_feature(&self) -> StoreResult<TotalsFeature> {
        Ok(self.totals.read().await.clone())
    }

    async fn write_totals_feature(&self, feature: &TotalsFeature) -> StoreResult<()> {
        let mut totals = self.totals.write().await;
        if totals.object_id != feature.object_id {
            return Err(StoreError::NotFound(format!(
                "totals row {}",
                feature.object_id
            )));
        }
        *totals = feature.clone();
        self.feature_edits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn read_county_features(&self) -> StoreResult<BTreeMap<String, CountyFeature>> {
        Ok(self.counties.read().await.clone())
    }

    async fn write_county_features(&self, features: &[CountyFeature]) -> StoreResult<()> {
        let mut counties = self.counties.write().await;
        // Validate the whole batch before applying any of it.
        for feature in features {
            match counties.get(&feature.county) {
                Some(existing) if existing.object_id == feature.object_id => {}
                _ => {
                    return Err(StoreError::NotFound(format!(
                        "county row {} ({})",
                        feature.object_id, feature.county
                    )))
                }
            }
        }
        for feature in features {
            counties.insert(feature.county.clone(), feature.clone());
        }
        self.feature_edits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn read_last_two_daily_records(&self) -> StoreResult<Vec<DailyRecord>> {
        let daily = self.daily.read().await;
        let start = daily.records.len().saturating_sub(2);
        Ok(daily.records[start..].to_vec())
    }

    async fn append_daily_record(&self, record: &DailyRecord) -> StoreResult<()> {
        let mut daily = self.daily.write().await;
        let mut record = record.clone();
        record.object_id = Some(daily.next_object_id);
        daily.next_object_id += 1;
        daily.records.push(record);
        self.daily_edits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn overwrite_most_recent_daily_record(&self, record: &DailyRecord) -> StoreResult<()> {
        let mut daily = self.daily.write().await;
        let last = daily
            .records
            .last_mut()
            .ok_or_else(|| StoreError::NotFound("daily table is empty".to_string()))?;
        if record.object_id != last.object_id {
            return Err(StoreError::NotFound(format!(
                "daily row {:?} is not the most recent",
                record.object_id
            )));
        }
        *last = record.clone();
        self.daily_edits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
