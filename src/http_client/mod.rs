//! Shared HTTP client for the source page and the feature service.

mod response;

pub use response::HttpResponse;

use std::time::{Duration, Instant};

use reqwest::Client;
use url::Url;

/// Default user agent; sources and portals see who is calling.
pub const USER_AGENT: &str = "casesync/0.3 (public health data sync)";

/// HTTP client with request timing logs.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client sending `user_agent` on every request.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request.
    pub async fn get(&self, url: &Url) -> Result<HttpResponse, reqwest::Error> {
        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        tracing::debug!(
            "GET {} -> {} in {}ms",
            redact(url),
            response.status().as_u16(),
            start.elapsed().as_millis()
        );

        Ok(HttpResponse {
            status: response.status(),
            response,
        })
    }

    /// POST an urlencoded form.
    pub async fn post_form(
        &self,
        url: &Url,
        form: &[(&str, String)],
    ) -> Result<HttpResponse, reqwest::Error> {
        let start = Instant::now();
        let response = self.client.post(url.clone()).form(form).send().await?;
        tracing::debug!(
            "POST {} -> {} in {}ms",
            redact(url),
            response.status().as_u16(),
            start.elapsed().as_millis()
        );

        Ok(HttpResponse {
            status: response.status(),
            response,
        })
    }
}

/// URL without its query string, for logging.
fn redact(url: &Url) -> &str {
    &url[..url::Position::AfterPath]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_strips_query() {
        let url = Url::parse("https://example.com/a/query?token=secret&f=json").unwrap();
        assert_eq!(redact(&url), "https://example.com/a/query");
    }
}
