//! Assistant Backend Integration
//!
//! Access to the weather assistant server through a common trait interface.
//!
//! # Usage
//!
//! ```ignore
//! use weather_conductor::backend::{AssistantBackend, AssistantRequest, HttpBackend};
//!
//! let backend = HttpBackend::from_config(&BackendConfig::default())?;
//! let request = AssistantRequest::new("오늘 날씨 어때?", "서울", None);
//! let response = backend.ask(&request).await?;
//! ```

mod http;
mod traits;

pub use http::HttpBackend;
pub use traits::{
    AssistantBackend, AssistantRequest, AssistantResponse, BackendConfig, BackendError,
    GraphResponse, RegionResponse, WeatherSnapshot, DEFAULT_BASE_URL,
};
