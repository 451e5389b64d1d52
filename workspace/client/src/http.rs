//! REST client for the remote scenario collection.
//!
//! Wraps the `/scenarios` endpoints using [`reqwest`]. Bodies are plain JSON
//! scenarios, without an envelope.

use std::time::Duration;

use async_trait::async_trait;
use common::{Scenario, ScenarioDraft, ScenarioId};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::api::ScenarioApi;
use crate::error::{ClientError, Result};

/// Timeout applied when the caller does not choose one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP implementation of [`ScenarioApi`].
#[derive(Debug, Clone)]
pub struct HttpScenarioApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpScenarioApi {
    /// Create a client for the collection rooted at `base_url`,
    /// e.g. `http://localhost:5001/api`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "API base URL must be an http(s) URL, got '{}'",
                base_url
            )));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the URL for a path below the base, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked at construction: an http(s) URL always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`ClientError::Status`] carrying the status
    /// and body text on failure.
    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        warn!("Non-OK response: {} {}", status, body);
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::ensure_success(response).await?;
        trace!("Response received, parsing JSON");
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Logs the outcome of a request the way every endpoint reports it.
fn report<T>(method: &str, url: &Url, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => info!("{} {} - Success", method, url),
        Err(e) => error!("{} {} - {}", method, url, e),
    }
    result
}

#[async_trait]
impl ScenarioApi for HttpScenarioApi {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Scenario>> {
        let url = self.endpoint(&["scenarios"]);
        debug!("GET request to: {}", url);
        let result = async {
            let response = self.client.get(url.clone()).send().await?;
            Self::parse_response(response).await
        }
        .await;
        report("GET", &url, result)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get(&self, id: &ScenarioId) -> Result<Scenario> {
        let url = self.endpoint(&["scenarios", id.as_str()]);
        debug!("GET request to: {}", url);
        let result = async {
            let response = self.client.get(url.clone()).send().await?;
            Self::parse_response(response).await
        }
        .await;
        report("GET", &url, result)
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create(&self, draft: &ScenarioDraft) -> Result<Scenario> {
        let url = self.endpoint(&["scenarios"]);
        debug!("POST request to: {}", url);
        let result = async {
            let response = self.client.post(url.clone()).json(draft).send().await?;
            Self::parse_response(response).await
        }
        .await;
        report("POST", &url, result)
    }

    #[instrument(skip(self, draft), fields(id = %id))]
    async fn update(&self, id: &ScenarioId, draft: &ScenarioDraft) -> Result<Scenario> {
        let url = self.endpoint(&["scenarios", id.as_str()]);
        debug!("PUT request to: {}", url);
        let result = async {
            let response = self.client.put(url.clone()).json(draft).send().await?;
            Self::parse_response(response).await
        }
        .await;
        report("PUT", &url, result)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &ScenarioId) -> Result<()> {
        let url = self.endpoint(&["scenarios", id.as_str()]);
        debug!("DELETE request to: {}", url);
        // Success may come with a message body or none at all; either way it is ignored.
        let result = async {
            let response = self.client.delete(url.clone()).send().await?;
            Self::ensure_success(response).await.map(|_| ())
        }
        .await;
        report("DELETE", &url, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let api = HttpScenarioApi::new("http://localhost:5001/api").unwrap();
        assert_eq!(
            api.endpoint(&["scenarios"]).as_str(),
            "http://localhost:5001/api/scenarios"
        );

        let api = HttpScenarioApi::new("http://localhost:5001/api/").unwrap();
        assert_eq!(
            api.endpoint(&["scenarios", "65a1f0"]).as_str(),
            "http://localhost:5001/api/scenarios/65a1f0"
        );
    }

    #[test]
    fn test_endpoint_encodes_identifier() {
        let api = HttpScenarioApi::new("https://demo.example.com").unwrap();
        assert_eq!(
            api.endpoint(&["scenarios", "a/b c"]).as_str(),
            "https://demo.example.com/scenarios/a%2Fb%20c"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            HttpScenarioApi::new("not a url"),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            HttpScenarioApi::new("mailto:someone@example.com"),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            HttpScenarioApi::new("ftp://example.com/api"),
            Err(ClientError::Config(_))
        ));
    }
}
