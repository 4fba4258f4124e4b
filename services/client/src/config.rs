//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::ClientResult;

/// Default API server address
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// API base URL (e.g., "http://localhost:8080")
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Durable credential file; `None` uses `~/.boardctl/credentials.json`
    #[serde(default)]
    pub credential_file: Option<PathBuf>,
    /// Posts fetched per feed page
    pub feed_page_size: u32,
    /// Automatic retries before the feed gives up
    pub feed_max_retries: u32,
    /// First retry delay; doubled on every further attempt
    pub feed_retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            credential_file: None,
            feed_page_size: 20,
            feed_max_retries: 5,
            feed_retry_delay_ms: 2000,
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BOARD_API_BASE_URL`: API base URL (default: "http://localhost:8080")
    /// - `BOARD_REQUEST_TIMEOUT_SECS`: Request timeout (default: 30)
    /// - `BOARD_CREDENTIAL_FILE`: Path of the credential file (optional)
    /// - `BOARD_FEED_PAGE_SIZE`: Posts per feed page (default: 20)
    /// - `BOARD_FEED_MAX_RETRIES`: Feed retry attempts (default: 5)
    /// - `BOARD_FEED_RETRY_DELAY_MS`: First feed retry delay (default: 2000)
    pub fn from_env() -> ClientResult<Self> {
        let defaults = ClientConfig::default();
        let config = Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("feed_page_size", defaults.feed_page_size)?
            .set_default("feed_max_retries", defaults.feed_max_retries)?
            .set_default("feed_retry_delay_ms", defaults.feed_retry_delay_ms)?
            .add_source(Environment::with_prefix("BOARD").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn feed_retry_delay(&self) -> Duration {
        Duration::from_millis(self.feed_retry_delay_ms)
    }

    /// Resolved credential file path
    pub fn credential_path(&self) -> Option<PathBuf> {
        self.credential_file.clone().or_else(|| {
            home::home_dir().map(|home| home.join(".boardctl").join("credentials.json"))
        })
    }
}
