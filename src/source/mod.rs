//! Source fetcher: retrieves the public health page and parses it into a
//! [`ScrapeSnapshot`].

mod error;
pub mod parse;

pub use error::{FetchError, ParseError, SourceError, Table};
pub use parse::{parse_count, parse_page};

use async_trait::async_trait;
use url::Url;

use crate::http_client::HttpClient;
use crate::models::ScrapeSnapshot;

/// Anything that can produce a fresh snapshot of the source page.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch and parse the current page.
    async fn fetch(&self) -> Result<ScrapeSnapshot, SourceError>;
}

/// Fetches the page over HTTP.
pub struct PageSource {
    client: HttpClient,
    url: Url,
}

impl PageSource {
    pub fn new(client: HttpClient, url: &str) -> Result<Self, FetchError> {
        Ok(Self {
            client,
            url: Url::parse(url)?,
        })
    }

    /// Download the raw page body.
    pub async fn fetch_html(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                url: self.url.to_string(),
                status: response.status.as_u16(),
            });
        }
        if let Some(content_type) = response.content_type() {
            if !content_type.contains("html") {
                tracing::warn!("Source page served as {}", content_type);
            }
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SnapshotSource for PageSource {
    async fn fetch(&self) -> Result<ScrapeSnapshot, SourceError> {
        let html = self.fetch_html().await?;
        let snapshot = parse_page(&html)?;
        tracing::debug!(
            "Parsed snapshot '{}': {} confirmed, {} counties",
            snapshot.report_date_string(),
            snapshot.confirmed_cases(),
            snapshot.county_rows().len()
        );
        Ok(snapshot)
    }
}
