//! Configuration management for casesync using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http_client::USER_AGENT;
use crate::store::StoreConfig;

/// Public page the figures are scraped from.
pub const DEFAULT_SOURCE_URL: &str =
    "https://www.maine.gov/dhhs/mecdc/infectious-disease/epi/airborne/coronavirus.shtml";
/// Portal hosting the three datasets.
pub const DEFAULT_PORTAL_URL: &str = "https://nitro.maps.arcgis.com";
pub const DEFAULT_TOTALS_ITEM_ID: &str = "a2e8fb4b5f7948908427d26d23167c26";
pub const DEFAULT_COUNTY_ITEM_ID: &str = "b672bc7ee7064f66bb7f0c87ec466620";
pub const DEFAULT_DAILY_ITEM_ID: &str = "993203d373a44894a36588c4b797ffa3";

/// Application settings.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Page to scrape.
    pub source_url: String,
    /// Portal base URL used to resolve item ids.
    pub portal_url: String,
    /// Item id of the statewide totals layer.
    pub totals_item_id: String,
    /// Item id of the county layer.
    pub county_item_id: String,
    /// Item id of the daily table.
    pub daily_item_id: String,
    /// Object id of the statewide row in the totals layer.
    pub totals_object_id: i64,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Seconds between hour checks.
    pub poll_interval_secs: u64,
    /// Pre-issued portal token. Never printed.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            totals_item_id: DEFAULT_TOTALS_ITEM_ID.to_string(),
            county_item_id: DEFAULT_COUNTY_ITEM_ID.to_string(),
            daily_item_id: DEFAULT_DAILY_ITEM_ID.to_string(),
            totals_object_id: 1,
            user_agent: USER_AGENT.to_string(),
            request_timeout: 30,
            poll_interval_secs: 1800,
            token: None,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Connection details for the feature store.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            portal_url: self.portal_url.clone(),
            totals_item_id: self.totals_item_id.clone(),
            county_item_id: self.county_item_id.clone(),
            daily_item_id: self.daily_item_id.clone(),
            totals_object_id: self.totals_object_id,
            token: self.token.clone(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals_object_id: Option<i64>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Seconds between hour checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to an empty config when nothing is found or the file is bad.
    pub async fn load() -> Self {
        match prefer::load("casesync").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// The format is picked from the extension; anything unknown is read as JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref url) = self.source_url {
            settings.source_url = url.clone();
        }
        if let Some(ref url) = self.portal_url {
            settings.portal_url = url.clone();
        }
        if let Some(ref id) = self.totals_item_id {
            settings.totals_item_id = id.clone();
        }
        if let Some(ref id) = self.county_item_id {
            settings.county_item_id = id.clone();
        }
        if let Some(ref id) = self.daily_item_id {
            settings.daily_item_id = id.clone();
        }
        if let Some(id) = self.totals_object_id {
            settings.totals_object_id = id;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(interval) = self.poll_interval_secs {
            settings.poll_interval_secs = interval;
        }
        if let Some(ref token) = self.token {
            settings.token = Some(token.clone());
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

async fn load_file_config(options: &LoadOptions) -> Result<Config, String> {
    match options.config_path {
        Some(ref path) => Config::load_from_path(path).await,
        None => Ok(Config::load().await),
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Apply environment variables, which take precedence over the config file.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(token) = env_override("CASESYNC_TOKEN") {
        settings.token = Some(token);
    }
    if let Some(url) = env_override("CASESYNC_SOURCE_URL") {
        tracing::debug!("Using CASESYNC_SOURCE_URL from environment: {}", url);
        settings.source_url = url;
    }
    if let Some(url) = env_override("CASESYNC_PORTAL_URL") {
        tracing::debug!("Using CASESYNC_PORTAL_URL from environment: {}", url);
        settings.portal_url = url;
    }
}

/// Load settings with explicit options.
///
/// An explicit `--config` path that cannot be read is an error; a discovered
/// file that cannot be read is skipped.
pub async fn load_settings_with_options(options: LoadOptions) -> Result<Settings, String> {
    let config = load_file_config(&options).await?;
    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    apply_env_overrides(&mut settings);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_point_at_production() {
        let settings = Settings::default();
        assert_eq!(settings.totals_item_id, DEFAULT_TOTALS_ITEM_ID);
        assert_eq!(settings.totals_object_id, 1);
        assert_eq!(settings.poll_interval(), Duration::from_secs(1800));
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert!(settings.token.is_none());
    }

    #[tokio::test]
    async fn test_load_toml() {
        let file = config_file(
            ".toml",
            "portal_url = \"https://portal.example.com\"\npoll_interval_secs = 60\n",
        );
        let config = Config::load_from_path(file.path()).await.unwrap();
        assert_eq!(config.poll_interval_secs, Some(60));
        assert_eq!(config.source_path.as_deref(), Some(file.path()));

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);
        assert_eq!(settings.portal_url, "https://portal.example.com");
        assert_eq!(settings.poll_interval_secs, 60);
        assert_eq!(settings.source_url, DEFAULT_SOURCE_URL);
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let yaml = config_file(".yaml", "daily_item_id: abc\ntotals_object_id: 3\n");
        let config = Config::load_from_path(yaml.path()).await.unwrap();
        assert_eq!(config.daily_item_id.as_deref(), Some("abc"));
        assert_eq!(config.totals_object_id, Some(3));

        let json = config_file(".conf", r#"{"request_timeout": 5, "token": "t"}"#);
        let config = Config::load_from_path(json.path()).await.unwrap();
        assert_eq!(config.request_timeout, Some(5));
        assert_eq!(config.token.as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn test_bad_file_is_an_error() {
        let file = config_file(".toml", "poll_interval_secs = \"soon\"");
        assert!(Config::load_from_path(file.path()).await.is_err());

        let missing = Path::new("/nonexistent/casesync.toml");
        assert!(Config::load_from_path(missing).await.is_err());
    }

    #[tokio::test]
    async fn test_explicit_path_is_used() {
        let file = config_file(".json", r#"{"county_item_id": "county"}"#);
        let settings = load_settings_with_options(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
        })
        .await
        .unwrap();
        assert_eq!(settings.county_item_id, "county");
        assert_eq!(settings.daily_item_id, DEFAULT_DAILY_ITEM_ID);
    }

    #[test]
    fn test_token_is_not_serialized() {
        let settings = Settings {
            token: Some("secret".to_string()),
            ..Default::default()
        };
        let rendered = toml::to_string(&settings).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("source_url"));
    }

    #[test]
    fn test_store_config_carries_ids() {
        let settings = Settings::default();
        let store = settings.store_config();
        assert_eq!(store.county_item_id, DEFAULT_COUNTY_ITEM_ID);
        assert_eq!(store.daily_item_id, DEFAULT_DAILY_ITEM_ID);
        assert_eq!(store.totals_object_id, 1);
    }
}
