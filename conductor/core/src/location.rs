//! Location Context
//!
//! Where the user is, as far as the assistant is concerned: a pair of
//! coordinates and a human-readable label. Both are resolved once at startup
//! and then attached to every exchange request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label shown while the startup lookup is running
pub const LOCATION_PENDING: &str = "Fetching location...";
/// Label when reverse-geocoding returned no region
pub const LOCATION_NOT_FOUND: &str = "주소를 찾을 수 없음";
/// Label when the reverse-geocoding request failed
pub const LOCATION_REQUEST_FAILED: &str = "주소 요청 실패";
/// Label when no position is available
pub const LOCATION_DENIED: &str = "위치 정보 접근 거부됨";

/// A geographic position
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within range
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Coordinates as the assistant backend reports them (`{lat, lon}`)
///
/// Either component may be missing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCoordinates {
    /// Latitude in degrees
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude in degrees
    #[serde(default)]
    pub lon: Option<f64>,
}

impl ResolvedCoordinates {
    /// Convert to [`Coordinates`] when both components are present and usable
    #[must_use]
    pub fn to_coordinates(&self) -> Option<Coordinates> {
        let coords = Coordinates::new(self.lat?, self.lon?);
        coords.is_valid().then_some(coords)
    }
}

/// Errors from a [`LocationProvider`]
#[derive(Debug, Error)]
pub enum LocationError {
    /// No position is available (not configured, or access refused)
    #[error("location unavailable")]
    Unavailable,
}

/// Source of the user's current position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Look up the current position
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Position taken from configuration
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfiguredLocation {
    coordinates: Option<Coordinates>,
}

impl ConfiguredLocation {
    /// Create a provider that always answers with `coordinates`
    #[must_use]
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationProvider for ConfiguredLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        self.coordinates
            .filter(Coordinates::is_valid)
            .ok_or(LocationError::Unavailable)
    }
}

/// Location attached to exchange requests
#[derive(Clone, Debug, PartialEq)]
pub struct LocationContext {
    /// Human-readable label
    pub label: String,
    /// Current position, once known
    pub coordinates: Option<Coordinates>,
}

impl Default for LocationContext {
    fn default() -> Self {
        Self {
            label: LOCATION_PENDING.to_string(),
            coordinates: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_coordinates_conversion() {
        let full = ResolvedCoordinates {
            lat: Some(37.5),
            lon: Some(127.0),
        };
        assert_eq!(full.to_coordinates(), Some(Coordinates::new(37.5, 127.0)));

        let partial = ResolvedCoordinates {
            lat: Some(37.5),
            lon: None,
        };
        assert_eq!(partial.to_coordinates(), None);

        let out_of_range = ResolvedCoordinates {
            lat: Some(137.5),
            lon: Some(0.0),
        };
        assert_eq!(out_of_range.to_coordinates(), None);
    }

    #[test]
    fn test_coordinates_wire_shape() {
        let json = serde_json::to_value(Coordinates::new(1.5, 2.5)).unwrap();
        assert_eq!(json, serde_json::json!({"latitude": 1.5, "longitude": 2.5}));

        let resolved: ResolvedCoordinates =
            serde_json::from_str(r#"{"lat": 37.5, "lon": 127}"#).unwrap();
        assert_eq!(resolved.lon, Some(127.0));
    }

    #[tokio::test]
    async fn test_configured_location() {
        let provider = ConfiguredLocation::new(Some(Coordinates::new(37.5665, 126.978)));
        assert!(provider.locate().await.is_ok());

        let missing = ConfiguredLocation::default();
        assert!(matches!(
            missing.locate().await,
            Err(LocationError::Unavailable)
        ));
    }
}
