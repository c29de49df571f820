//! Assistant Backend Traits
//!
//! Trait and wire types for the remote services the Conductor talks to. The
//! trait lets the Conductor run against the HTTP backend in production and a
//! scripted backend in tests without changing any lifecycle logic.
//!
//! # Services
//!
//! - **Assistant**: answers a natural-language query
//! - **Weather graph**: hourly temperatures for a position
//! - **Reverse geocode**: region name for a position
//! - **Weather snapshot**: current conditions for a position

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::{Coordinates, ResolvedCoordinates};

/// Default backend address
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Errors from backend calls
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// The response body was not the expected shape
    #[error("malformed response: {0}")]
    Decode(String),

    /// Backend-specific failure
    #[error("{0}")]
    Other(String),
}

/// Primary request to the assistant
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssistantRequest {
    /// The user's query
    #[serde(rename = "userInput")]
    pub query: String,
    /// Current location label
    #[serde(rename = "location")]
    pub location_label: String,
    /// Current position, if known
    #[serde(rename = "coords")]
    pub coordinates: Option<Coordinates>,
}

impl AssistantRequest {
    /// Create a request
    pub fn new(
        query: impl Into<String>,
        location_label: impl Into<String>,
        coordinates: Option<Coordinates>,
    ) -> Self {
        Self {
            query: query.into(),
            location_label: location_label.into(),
            coordinates,
        }
    }
}

/// Primary response from the assistant
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AssistantResponse {
    /// Reply text
    #[serde(default)]
    pub reply: Option<String>,
    /// Position the assistant resolved from the query
    #[serde(default, rename = "resolvedCoords", alias = "resolvedCoordinates")]
    pub resolved_coordinates: Option<ResolvedCoordinates>,
    /// Logical error reported alongside a successful transport call
    #[serde(default)]
    pub error: Option<String>,
}

impl AssistantResponse {
    /// Response carrying just a reply
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            ..Default::default()
        }
    }

    /// Attach resolved coordinates
    #[must_use]
    pub fn with_resolved(mut self, coordinates: Coordinates) -> Self {
        self.resolved_coordinates = Some(ResolvedCoordinates {
            lat: Some(coordinates.latitude),
            lon: Some(coordinates.longitude),
        });
        self
    }

    /// Response carrying a logical error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Hourly temperature response from the graph service
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphResponse {
    /// Temperatures, one per hour
    #[serde(default, rename = "hourlyTemps")]
    pub hourly_temps: Option<Vec<f64>>,
}

/// Reverse-geocode response
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RegionResponse {
    /// Region name
    #[serde(default)]
    pub region: Option<String>,
}

/// Current weather conditions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Current temperature (°C)
    pub temp: f64,
    /// Condition description
    pub condition: String,
    /// Apparent temperature (°C)
    pub feels_like: f64,
    /// Daily high (°C)
    pub temp_max: f64,
    /// Daily low (°C)
    pub temp_min: f64,
}

/// Backend connection configuration
#[derive(Clone, Debug, PartialEq)]
pub struct BackendConfig {
    /// Base URL every endpoint hangs off
    pub base_url: String,
    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_ms: 5000,
        }
    }
}

/// Assistant backend trait
///
/// Implement this to point the Conductor at a different service.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Backend name (for logs)
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Primary call: answer a query
    async fn ask(&self, request: &AssistantRequest) -> Result<AssistantResponse, BackendError>;

    /// Secondary call: hourly temperatures for a position
    async fn weather_graph(&self, coordinates: &Coordinates) -> Result<GraphResponse, BackendError>;

    /// Region name for a position
    async fn reverse_geocode(
        &self,
        coordinates: &Coordinates,
    ) -> Result<RegionResponse, BackendError>;

    /// Current conditions for a position
    async fn weather_snapshot(
        &self,
        coordinates: &Coordinates,
    ) -> Result<WeatherSnapshot, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_assistant_request_wire_shape() {
        let request =
            AssistantRequest::new("기온 알려줘", "서울", Some(Coordinates::new(37.5, 127.0)));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "userInput": "기온 알려줘",
                "location": "서울",
                "coords": {"latitude": 37.5, "longitude": 127.0}
            })
        );

        let no_coords = AssistantRequest::new("q", "somewhere", None);
        let json = serde_json::to_value(&no_coords).unwrap();
        assert!(json["coords"].is_null());
    }

    #[test]
    fn test_assistant_response_parsing() {
        let response: AssistantResponse = serde_json::from_str(
            r#"{"reply": "맑음", "resolvedCoords": {"lat": 37.5, "lon": 127}}"#,
        )
        .unwrap();
        assert_eq!(response.reply.as_deref(), Some("맑음"));
        assert_eq!(
            response.resolved_coordinates.and_then(|c| c.to_coordinates()),
            Some(Coordinates::new(37.5, 127.0))
        );
        assert!(response.error.is_none());

        let alias: AssistantResponse =
            serde_json::from_str(r#"{"resolvedCoordinates": {"lat": 1, "lon": 2}}"#).unwrap();
        assert!(alias.resolved_coordinates.is_some());

        let empty: AssistantResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, AssistantResponse::default());
    }

    #[test]
    fn test_graph_response_requires_array() {
        let ok: GraphResponse = serde_json::from_str(r#"{"hourlyTemps": [10, 11, 12]}"#).unwrap();
        assert_eq!(ok.hourly_temps, Some(vec![10.0, 11.0, 12.0]));

        let missing: GraphResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.hourly_temps, None);

        assert!(serde_json::from_str::<GraphResponse>(r#"{"hourlyTemps": "hot"}"#).is_err());
    }

    #[test]
    fn test_weather_snapshot_parsing() {
        let snapshot: WeatherSnapshot = serde_json::from_str(
            r#"{"temp": 21.5, "condition": "Clear", "feelsLike": 20, "tempMax": 24, "tempMin": 15}"#,
        )
        .unwrap();
        assert_eq!(snapshot.condition, "Clear");
        assert!((snapshot.feels_like - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_backend_config_default() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.connect_timeout_ms, 5000);
    }
}
