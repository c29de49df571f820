//! Weather TUI - Terminal interface for the weather assistant
//!
//! A full-screen terminal surface for the Conductor: a home card with the
//! clock, location and current weather, a chat view, and a listening screen
//! that stands in for voice capture.
//!
//! # Architecture
//!
//! - **ConductorClient**: Runs the Conductor in its own task
//! - **Display**: State derived from ConductorMessages
//! - **Views**: ratatui rendering for each view
//! - **App**: Terminal event loop

pub mod app;
pub mod conductor_client;
pub mod display;
pub mod theme;
pub mod views;

pub use app::App;
pub use conductor_client::ConductorClient;
