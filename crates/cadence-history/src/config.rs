//! History API connection settings.

use std::time::Duration;

use cadence_core::{Error, HttpError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for history requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Where the history API lives and who is asking.
#[derive(Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// API origin, e.g. `http://localhost:5000`.
    pub base_url: Url,
    /// Bearer token of the signed-in listener. `None` means anonymous.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HistoryConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Http(HttpError::InvalidUrl(format!("{base_url}: {e}"))))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Http(HttpError::InvalidUrl(base_url.to_string())));
        }

        Ok(Self {
            base_url,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into()).filter(|t: &String| !t.is_empty());
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keeps the bearer token out of logs.
impl std::fmt::Debug for HistoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
