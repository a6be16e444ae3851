//! History API client implementation.

use std::time::Duration;

use cadence_core::{Error, HistoryKey, HistoryStore, HttpError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::config::HistoryConfig;
use crate::types::{
    Empty, Envelope, HistoryEntry, HistoryEntryRecord, HistoryListBody, ResumeBody,
    SavePositionRequest,
};

/// Maximum number of attempts for idempotent requests.
const MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_RETRY_DELAY_MS: u64 = 250;

/// Client for the listening-history endpoints.
#[derive(Clone)]
pub struct HttpHistory {
    /// HTTP client for making requests.
    http: reqwest::Client,
    base_url: Url,
    /// `Authorization` header value, absent for anonymous listeners.
    auth: Option<HeaderValue>,
}

impl HttpHistory {
    pub fn new(config: HistoryConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let auth = config
            .token
            .as_deref()
            .map(|token| {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| Error::Config(format!("Invalid token: {e}")))?;
                value.set_sensitive(true);
                Ok::<_, Error>(value)
            })
            .transpose()?;

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url,
            auth,
        })
    }

    /// Whether requests are made on behalf of a signed-in listener.
    pub const fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// Most recently played items, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        if !self.is_authenticated() {
            return Err(Error::Unauthenticated);
        }

        let mut url = self.endpoint(&["api", "history"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let body: HistoryListBody = self.fetch(Method::GET, url, true).await?;
        Ok(body
            .history
            .into_iter()
            .filter_map(HistoryEntryRecord::into_entry)
            .collect())
    }

    /// Delete one history row by its id.
    pub async fn delete(&self, entry_id: &str) -> Result<()> {
        if !self.is_authenticated() {
            return Err(Error::Unauthenticated);
        }

        let url = self.endpoint(&["api", "history", entry_id])?;
        let _: Empty = self.fetch(Method::DELETE, url, false).await?;
        debug!("Deleted history entry {entry_id}");
        Ok(())
    }

    /// Build `{base}/seg/seg/...`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Http(HttpError::InvalidUrl(self.base_url.to_string())))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.http.request(method, url);
        match &self.auth {
            Some(auth) => request.header(AUTHORIZATION, auth.clone()),
            None => request,
        }
    }

    /// Send without a body and unwrap the `{ success, ... }` envelope.
    /// Idempotent requests are retried on transient failures.
    async fn fetch<T: DeserializeOwned>(&self, method: Method, url: Url, retry: bool) -> Result<T> {
        let attempts = if retry { MAX_ATTEMPTS } else { 1 };
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = Duration::from_millis(BASE_RETRY_DELAY_MS * 2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                debug!("Retry attempt {attempt} for {url} after {delay:?}");
            }

            match self.send(self.request(method.clone(), url.clone())).await {
                Ok(bytes) => return unwrap_envelope(&bytes),
                Err(e) if e.is_retryable() => {
                    warn!("Request to {url} failed (attempt {attempt}): {e}");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Network("Request failed".to_string())))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Http(HttpError::Timeout)
            } else if e.is_connect() {
                Error::Http(HttpError::ConnectionFailed(e.to_string()))
            } else {
                Error::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthenticated);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Http(HttpError::StatusError {
                status: status.as_u16(),
                message,
            }));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::Network(format!("Failed to read response body: {e}")))
    }
}

fn unwrap_envelope<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_slice(bytes)?;
    if envelope.success {
        Ok(envelope.body)
    } else {
        Err(Error::Api(
            envelope
                .message
                .unwrap_or_else(|| "request was not successful".to_string()),
        ))
    }
}

impl HistoryStore for HttpHistory {
    async fn resume_position(&self, key: &HistoryKey) -> Result<Option<f64>> {
        if !self.is_authenticated() {
            trace!("Anonymous listener, no resume position for {key}");
            return Ok(None);
        }

        let url = self.endpoint(&["api", "history", "resume", &key.id])?;
        let body: ResumeBody = self.fetch(Method::GET, url, true).await?;
        Ok(body.position.filter(|p| p.is_finite() && *p > 0.0))
    }

    async fn save_position(&self, key: &HistoryKey, position: f64) -> Result<()> {
        if !self.is_authenticated() {
            trace!("Anonymous listener, not saving position for {key}");
            return Ok(());
        }

        let url = self.endpoint(&["api", "history"])?;
        let request = self
            .request(Method::POST, url)
            .json(&SavePositionRequest::new(key, position));
        let bytes = self.send(request).await?;
        let _: Empty = unwrap_envelope(&bytes)?;
        Ok(())
    }
}
