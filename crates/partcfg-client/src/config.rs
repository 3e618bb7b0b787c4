use crate::error::ClientError;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_URL: &str = "PARTCFG_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "PARTCFG_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Produce local STEP/DXF files when the CAD backend fails.
    pub fallback_on_error: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            fallback_on_error: true,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {raw:?}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Absolute URL for a file link returned by the backend, which may be
    /// relative to the API root.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.endpoint(url)
        }
    }
}
