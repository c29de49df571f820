//! Conductor Messages
//!
//! Messages sent from the Conductor to UI surfaces.
//!
//! # Design Philosophy
//!
//! The Conductor owns the conversation and every timer around it. Surfaces
//! are pure renderers: they draw the latest snapshot they were handed and
//! report what the user did. A surface never edits a conversation itself.

use serde::{Deserialize, Serialize};

use crate::backend::WeatherSnapshot;
use crate::conversation::Conversation;

/// Messages from Conductor to UI Surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConductorMessage {
    /// The full conversation after a change
    Conversation {
        /// Immutable snapshot to render
        snapshot: Conversation,
    },

    /// Switch to a different screen
    View {
        /// The view to show
        view: View,
    },

    /// Location label changed
    Location {
        /// Human-readable label
        label: String,
    },

    /// Current weather arrived
    Weather {
        /// Current conditions
        snapshot: WeatherSnapshot,
    },

    /// Session information, sent once on connect
    SessionInfo {
        /// Session ID
        session_id: SessionId,
        /// Name used in the greeting
        user_name: String,
    },

    /// System notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Title (optional)
        title: Option<String>,
        /// Message content
        message: String,
    },

    /// Conductor state change
    State {
        /// The new state
        state: ConductorState,
    },

    /// Acknowledgment of received event
    Ack {
        /// Event ID being acknowledged
        event_id: EventId,
    },

    /// Request surface to quit
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Event identifier (for acks)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = chrono::Utc::now().timestamp_millis();
        Self(format!("session_{timestamp}_{count}"))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which screen the surface should show
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// Clock, weather and presets
    #[default]
    Home,
    /// Conversation
    Chat,
    /// Voice capture in progress
    Listening,
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}

/// Conductor operational states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductorState {
    /// Starting up, not ready
    Initializing,
    /// Ready for input
    Ready,
    /// An exchange is in flight
    Thinking,
    /// Capturing voice input
    Listening,
    /// Shutting down
    ShuttingDown,
}

impl ConductorState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Initializing => "Starting up...",
            Self::Ready => "Ready",
            Self::Thinking => "Thinking...",
            Self::Listening => "Listening",
            Self::ShuttingDown => "Shutting down...",
        }
    }
}
