//! Weather Conductor - Headless Request-Lifecycle Core
//!
//! This crate holds the whole behaviour of the weather assistant client,
//! independent of any UI framework. A surface (the TUI, or a test harness)
//! renders what the Conductor sends and reports what the user did.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          UI Surface                              │
//! │            ┌───────────────┐      ┌──────────────────┐           │
//! │            │ TUI (ratatui) │      │ Headless / tests │           │
//! │            └───────┬───────┘      └────────┬─────────┘           │
//! │                    └───────────┬───────────┘                     │
//! │                         SurfaceEvent (up)                        │
//! │                       ConductorMessage (down)                    │
//! └────────────────────────────────┼─────────────────────────────────┘
//!                                  │
//! ┌────────────────────────────────┼─────────────────────────────────┐
//! │                          CONDUCTOR CORE                          │
//! │  ┌─────────────────────────────┴──────────────────────────────┐  │
//! │  │                        Conductor                           │  │
//! │  │  ┌────────────┐  ┌────────────┐  ┌────────┐  ┌──────────┐  │  │
//! │  │  │ TokenSlot  │  │ Delay      │  │ Gate   │  │ Exchange │  │  │
//! │  │  │ (cancel)   │  │ Indicator  │  │        │  │ Executor │  │  │
//! │  │  └────────────┘  └────────────┘  └────────┘  └────┬─────┘  │  │
//! │  └────────────────────────────────────────────────────┼────────┘  │
//! │                                          AssistantBackend (HTTP)  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: Owns the conversation and every timer around it
//! - [`Conversation`]: Immutable snapshot of the chat
//! - [`ExchangeExecutor`]: Primary call plus the conditional graph call
//! - [`ConductorMessage`] / [`SurfaceEvent`]: The surface protocol
//!
//! # Quick Start
//!
//! ```ignore
//! use weather_conductor::{Conductor, ConductorConfig, HttpBackend, SurfaceEvent};
//! use tokio::sync::mpsc;
//!
//! let config = ConductorConfig::load()?;
//! let backend = HttpBackend::from_config(&config.backend)?;
//! let (tx, mut rx) = mpsc::channel(256);
//! let mut conductor = Conductor::new(backend, config, tx);
//!
//! conductor.start().await?;
//! conductor.handle_event(SurfaceEvent::typed("기온 알려줘")).await?;
//! conductor.run_until_idle().await;
//! ```
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod cancel;
pub mod conductor;
pub mod config;
pub mod conversation;
pub mod events;
pub mod exchange;
pub mod gate;
pub mod home;
pub mod indicator;
pub mod location;
pub mod messages;

// Re-exports for convenience
pub use backend::{
    AssistantBackend, AssistantRequest, AssistantResponse, BackendConfig, BackendError,
    GraphResponse, HttpBackend, RegionResponse, WeatherSnapshot,
};
pub use cancel::{ExchangeId, ExchangeToken, TokenSlot};
pub use conductor::Conductor;
pub use conversation::{Conversation, Message, WeatherGraphSeries, PLACEHOLDER_MARKER};
pub use events::{QuerySource, SurfaceEvent, SurfaceType};
pub use exchange::{
    requests_temperature, Exchange, ExchangeExecutor, ExchangeOutcome, ExchangePhase,
    ExchangeRequest, REPLY_FALLBACK,
};
pub use gate::{Commit, GateDecision, MinimumDisplayGate, PendingCommit, MIN_PLACEHOLDER_DISPLAY};
pub use indicator::{DelayIndicator, IndicatorHandle, PlaceholderShown, PLACEHOLDER_DELAY};
pub use location::{
    ConfiguredLocation, Coordinates, LocationContext, LocationError, LocationProvider,
    ResolvedCoordinates,
};
pub use messages::{
    ConductorMessage, ConductorState, EventId, MessageId, NotifyLevel, SessionId, View,
};

// Config exports
pub use config::{
    default_config_path, load_config_from_path, ConductorConfig, ConductorToml, ConfigError,
    ConfigSource,
};
