//! HTTP Backend Implementation
//!
//! Talks to the weather assistant server over JSON/HTTP.
//!
//! # Endpoints
//!
//! - `POST /gemini` - Answer a query
//! - `POST /weather-graph` - Hourly temperatures
//! - `POST /reverse-geocode` - Region name
//! - `POST /weather` - Current conditions
//!
//! Only the connect phase has a timeout. A slow reply is the delay indicator's
//! business, and abandoning one is the cancellation token's.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::traits::{
    AssistantBackend, AssistantRequest, AssistantResponse, BackendConfig, BackendError,
    GraphResponse, RegionResponse, WeatherSnapshot,
};
use crate::location::Coordinates;

/// HTTP backend client
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// Base URL without trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a new HTTP backend
    pub fn new(
        base_url: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(BackendError::Client)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Create from `BackendConfig`
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_millis(config.connect_timeout_ms),
        )
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, BackendError>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path);
        tracing::trace!(url = %url, "POST");

        let response = self.http_client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    fn name(&self) -> &str {
        "weather-assistant-http"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(&self.base_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantResponse, BackendError> {
        self.post_json("gemini", request).await
    }

    async fn weather_graph(
        &self,
        coordinates: &Coordinates,
    ) -> Result<GraphResponse, BackendError> {
        self.post_json("weather-graph", coordinates).await
    }

    async fn reverse_geocode(
        &self,
        coordinates: &Coordinates,
    ) -> Result<RegionResponse, BackendError> {
        self.post_json("reverse-geocode", coordinates).await
    }

    async fn weather_snapshot(
        &self,
        coordinates: &Coordinates,
    ) -> Result<WeatherSnapshot, BackendError> {
        self.post_json("weather", coordinates).await
    }
}
