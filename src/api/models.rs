use std::time::Duration;

use url::Url;

/// Per-request timeout for health checks.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-request timeout for document downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the backend API client
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    pub health_timeout: Duration,
    pub download_timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            health_timeout: HEALTH_TIMEOUT,
            download_timeout: DOWNLOAD_TIMEOUT,
        }
    }
}
