//! Surface Events
//!
//! Events sent from UI surfaces to the Conductor.
//!
//! # Design Philosophy
//!
//! UI surfaces report what the user did. They don't decide whether a query
//! should start an exchange or what going back does to one in flight. The
//! Conductor decides how to respond.

use serde::{Deserialize, Serialize};

use crate::messages::EventId;

/// Events from UI Surface to Conductor
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Surface connected to Conductor
    Connected {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// Surface type identifier
        surface_type: SurfaceType,
    },

    /// User submitted a query
    SubmitQuery {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// The query text
        text: String,
        /// How the query was entered
        source: QuerySource,
    },

    /// User started voice capture
    VoiceCaptureStarted {
        /// Event ID for acknowledgment
        event_id: EventId,
    },

    /// Voice capture produced text
    VoiceRecognized {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// Recognized text
        text: String,
    },

    /// User abandoned voice capture
    VoiceCaptureCancelled {
        /// Event ID for acknowledgment
        event_id: EventId,
    },

    /// User navigated back to the home view
    NavigateBack {
        /// Event ID for acknowledgment
        event_id: EventId,
    },

    /// User requested quit
    QuitRequested {
        /// Event ID for acknowledgment
        event_id: EventId,
    },
}

impl SurfaceEvent {
    /// Generate a new event ID for this event
    pub fn new_event_id() -> EventId {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        EventId(format!("evt_{id}"))
    }

    /// Typed query with a fresh event ID
    pub fn typed(text: impl Into<String>) -> Self {
        Self::SubmitQuery {
            event_id: Self::new_event_id(),
            text: text.into(),
            source: QuerySource::Typed,
        }
    }

    /// Preset query with a fresh event ID
    pub fn preset(text: impl Into<String>) -> Self {
        Self::SubmitQuery {
            event_id: Self::new_event_id(),
            text: text.into(),
            source: QuerySource::Preset,
        }
    }

    /// Back navigation with a fresh event ID
    pub fn navigate_back() -> Self {
        Self::NavigateBack {
            event_id: Self::new_event_id(),
        }
    }

    /// Get the event ID
    pub fn event_id(&self) -> &EventId {
        match self {
            Self::Connected { event_id, .. }
            | Self::SubmitQuery { event_id, .. }
            | Self::VoiceCaptureStarted { event_id }
            | Self::VoiceRecognized { event_id, .. }
            | Self::VoiceCaptureCancelled { event_id }
            | Self::NavigateBack { event_id }
            | Self::QuitRequested { event_id } => event_id,
        }
    }
}

/// How a query was entered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuerySource {
    /// Typed into the input box
    Typed,
    /// One of the home view presets
    Preset,
    /// Voice recognition result
    Voice,
}

/// Type of UI surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceType {
    /// Terminal UI (ratatui/crossterm)
    Tui,
    /// Headless (for testing/automation)
    Headless,
}

impl SurfaceType {
    /// Human-readable name
    pub fn name(&self) -> &str {
        match self {
            Self::Tui => "Terminal",
            Self::Headless => "Headless",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_unique() {
        let id1 = SurfaceEvent::new_event_id();
        let id2 = SurfaceEvent::new_event_id();
        assert_ne!(id1.0, id2.0);
    }

    #[test]
    fn test_constructors_set_source() {
        match SurfaceEvent::preset("꽃가루 농도는?") {
            SurfaceEvent::SubmitQuery { text, source, .. } => {
                assert_eq!(text, "꽃가루 농도는?");
                assert_eq!(source, QuerySource::Preset);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_surface_type_name() {
        assert_eq!(SurfaceType::Tui.name(), "Terminal");
        assert_eq!(SurfaceType::Headless.name(), "Headless");
    }
}
