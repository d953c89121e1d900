//! Feature store backed by a hosted ArcGIS feature service.
//!
//! Each dataset is configured by its portal item id. On first use the item is
//! resolved to its feature service, and the service to its first layer (totals
//! and county datasets) or first table (daily dataset). Resolved URLs are kept
//! for the life of the store.
//!
//! A pre-issued token may be supplied; it is sent with every request. No
//! sign-in or token refresh happens here.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;
use url::Url;

use super::attributes::Attributes;
use super::error::{StoreError, StoreResult};
use super::FeatureStore;
use crate::http_client::{HttpClient, HttpResponse};
use crate::models::fields::OBJECT_ID;
use crate::models::{CountyFeature, DailyRecord, TotalsFeature};

/// Where the three datasets live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Portal base URL, e.g. `https://example.maps.arcgis.com`.
    pub portal_url: String,
    pub totals_item_id: String,
    pub county_item_id: String,
    pub daily_item_id: String,
    /// `OBJECTID` of the statewide row in the totals layer.
    pub totals_object_id: i64,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatasetKind {
    Layer,
    Table,
}

impl DatasetKind {
    fn service_key(self) -> &'static str {
        match self {
            DatasetKind::Layer => "layers",
            DatasetKind::Table => "tables",
        }
    }
}

struct Dataset {
    name: &'static str,
    item_id: String,
    kind: DatasetKind,
    url: OnceCell<Url>,
}

impl Dataset {
    fn new(name: &'static str, item_id: String, kind: DatasetKind) -> Self {
        Self {
            name,
            item_id,
            kind,
            url: OnceCell::new(),
        }
    }
}

/// [`FeatureStore`] over the ArcGIS REST API.
pub struct ArcGisStore {
    client: HttpClient,
    portal_url: Url,
    token: Option<String>,
    totals_object_id: i64,
    totals: Dataset,
    counties: Dataset,
    daily: Dataset,
}

impl ArcGisStore {
    pub fn new(client: HttpClient, config: StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            client,
            portal_url: Url::parse(&config.portal_url)?,
            token: config.token.filter(|t| !t.is_empty()),
            totals_object_id: config.totals_object_id,
            totals: Dataset::new("totals layer", config.totals_item_id, DatasetKind::Layer),
            counties: Dataset::new("county layer", config.county_item_id, DatasetKind::Layer),
            daily: Dataset::new("daily table", config.daily_item_id, DatasetKind::Table),
        })
    }

    async fn dataset_url<'a>(&self, dataset: &'a Dataset) -> StoreResult<&'a Url> {
        dataset.url.get_or_try_init(|| self.resolve(dataset)).await
    }

    /// Item id -> feature service -> first layer or table.
    async fn resolve(&self, dataset: &Dataset) -> StoreResult<Url> {
        let item_url = child(
            &self.portal_url,
            &format!("sharing/rest/content/items/{}", dataset.item_id),
        )?;
        let item = self.get_json(item_url, &[]).await?;
        let service = item
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "item {} ({}) has no service url",
                    dataset.item_id, dataset.name
                ))
            })?;
        let service_url = Url::parse(service)?;

        let info = self.get_json(service_url.clone(), &[]).await?;
        let key = dataset.kind.service_key();
        let id = info
            .get(key)
            .and_then(Value::as_array)
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.get("id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                StoreError::NotFound(format!("{} has no {} for the {}", service, key, dataset.name))
            })?;

        let url = child(&service_url, &id.to_string())?;
        tracing::debug!("Resolved {} ({}) to {}", dataset.name, dataset.item_id, url);
        Ok(url)
    }

    async fn get_json(&self, mut url: Url, params: &[(&str, String)]) -> StoreResult<Value> {
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("f", "json");
            if let Some(ref token) = self.token {
                pairs.append_pair("token", token);
            }
        }
        let response = self.client.get(&url).await?;
        decode(&url, response).await
    }

    async fn query(
        &self,
        dataset: &Dataset,
        where_clause: &str,
        extra: &[(&str, String)],
    ) -> StoreResult<Vec<Attributes>> {
        let url = child(self.dataset_url(dataset).await?, "query")?;
        let mut params = vec![
            ("where", where_clause.to_string()),
            ("outFields", "*".to_string()),
            ("returnGeometry", "false".to_string()),
        ];
        params.extend_from_slice(extra);

        let body = self.get_json(url, &params).await?;
        match body.get("features") {
            Some(Value::Array(features)) => features
                .iter()
                .cloned()
                .map(Attributes::from_feature)
                .collect(),
            _ => Err(StoreError::Schema(format!(
                "{} query returned no features",
                dataset.name
            ))),
        }
    }

    async fn apply_edits(
        &self,
        dataset: &Dataset,
        adds: Vec<Value>,
        updates: Vec<Value>,
    ) -> StoreResult<()> {
        let url = child(self.dataset_url(dataset).await?, "applyEdits")?;
        let mut form = vec![("f", "json".to_string())];
        if let Some(ref token) = self.token {
            form.push(("token", token.clone()));
        }
        if !adds.is_empty() {
            form.push(("adds", serde_json::to_string(&adds)?));
        }
        if !updates.is_empty() {
            form.push(("updates", serde_json::to_string(&updates)?));
        }

        let response = self.client.post_form(&url, &form).await?;
        let body = decode(&url, response).await?;
        check_edit_results(dataset.name, &body, "addResults", adds.len())?;
        check_edit_results(dataset.name, &body, "updateResults", updates.len())?;
        tracing::debug!(
            "{}: {} added, {} updated",
            dataset.name,
            adds.len(),
            updates.len()
        );
        Ok(())
    }
}

#[async_trait]
impl FeatureStore for ArcGisStore {
    async fn read_totals_feature(&self) -> StoreResult<TotalsFeature> {
        let where_clause = format!("{}={}", OBJECT_ID, self.totals_object_id);
        let rows = self.query(&self.totals, &where_clause, &[]).await?;
        let row = rows.first().ok_or_else(|| {
            StoreError::NotFound(format!("totals row {}", self.totals_object_id))
        })?;
        TotalsFeature::try_from(row)
    }

    async fn write_totals_feature(&self, feature: &TotalsFeature) -> StoreResult<()> {
        let update = Attributes::from_row(feature)?.into_feature();
        self.apply_edits(&self.totals, Vec::new(), vec![update]).await
    }

    async fn read_county_features(&self) -> StoreResult<BTreeMap<String, CountyFeature>> {
        let rows = self.query(&self.counties, "1=1", &[]).await?;
        let mut counties = BTreeMap::new();
        for row in &rows {
            let feature = CountyFeature::try_from(row)?;
            if let Some(previous) = counties.insert(feature.county.clone(), feature) {
                tracing::warn!(
                    "County '{}' appears more than once in the county layer",
                    previous.county
                );
            }
        }
        Ok(counties)
    }

    async fn write_county_features(&self, features: &[CountyFeature]) -> StoreResult<()> {
        if features.is_empty() {
            return Ok(());
        }
        let updates = features
            .iter()
            .map(|f| Attributes::from_row(f).map(Attributes::into_feature))
            .collect::<StoreResult<Vec<_>>>()?;
        self.apply_edits(&self.counties, Vec::new(), updates).await
    }

    async fn read_last_two_daily_records(&self) -> StoreResult<Vec<DailyRecord>> {
        let extra = [
            ("orderByFields", format!("{} DESC", OBJECT_ID)),
            ("resultRecordCount", "2".to_string()),
        ];
        let rows = self.query(&self.daily, "1=1", &extra).await?;
        let mut records = rows
            .iter()
            .take(2)
            .map(DailyRecord::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        records.reverse();
        Ok(records)
    }

    async fn append_daily_record(&self, record: &DailyRecord) -> StoreResult<()> {
        let add = Attributes::from_row(record)?.into_feature();
        self.apply_edits(&self.daily, vec![add], Vec::new()).await
    }

    async fn overwrite_most_recent_daily_record(&self, record: &DailyRecord) -> StoreResult<()> {
        if record.object_id.is_none() {
            return Err(StoreError::Schema(
                "daily record to overwrite has no OBJECTID".to_string(),
            ));
        }
        let update = Attributes::from_row(record)?.into_feature();
        self.apply_edits(&self.daily, Vec::new(), vec![update]).await
    }
}

/// Append a path segment to a URL regardless of trailing slashes.
fn child(base: &Url, segment: &str) -> StoreResult<Url> {
    Ok(Url::parse(&format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        segment
    ))?)
}

async fn decode(url: &Url, response: HttpResponse) -> StoreResult<Value> {
    if !response.is_success() {
        return Err(StoreError::Status {
            url: url[..url::Position::AfterPath].to_string(),
            status: response.status.as_u16(),
        });
    }
    let body = response.json().await?;
    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let mut message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        if let Some(details) = error.get("details").and_then(Value::as_array) {
            let details: Vec<&str> = details.iter().filter_map(Value::as_str).collect();
            if !details.is_empty() {
                message = format!("{} ({})", message, details.join("; "));
            }
        }
        return Err(StoreError::Remote { code, message });
    }
    Ok(body)
}

fn check_edit_results(
    dataset: &'static str,
    body: &Value,
    key: &str,
    expected: usize,
) -> StoreResult<()> {
    if expected == 0 {
        return Ok(());
    }
    let results = body
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::EditRejected {
            dataset,
            message: format!("response has no {}", key),
        })?;
    if results.len() != expected {
        return Err(StoreError::EditRejected {
            dataset,
            message: format!("{} results for {} edits", results.len(), expected),
        });
    }
    for result in results {
        if result.get("success").and_then(Value::as_bool) != Some(true) {
            let message = result
                .pointer("/error/description")
                .and_then(Value::as_str)
                .unwrap_or("edit failed")
                .to_string();
            return Err(StoreError::EditRejected { dataset, message });
        }
    }
    Ok(())
}
