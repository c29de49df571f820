//! Conversation State
//!
//! The ordered list of chat messages shown to the user. This is the single
//! piece of state the Conductor mutates on behalf of an exchange.
//!
//! # Design Philosophy
//!
//! Every mutator is a pure transform: it takes the current sequence by
//! reference and returns a new [`Conversation`]. Snapshots already handed to a
//! surface are never modified in place, so a renderer can hold on to one for
//! as long as it likes.
//!
//! The "thinking" entry is its own [`Message::Placeholder`] variant rather than
//! a flag on a bot message. Removing it is a match on the tail of the list, not
//! a guess about what the last element happens to be.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::messages::MessageId;

/// Text carried by the placeholder entry
pub const PLACEHOLDER_MARKER: &str = "Thinking";

/// Hourly temperature points attached to a bot reply
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherGraphSeries {
    /// Temperatures in display order (one per hour)
    pub hourly_temps: Vec<f64>,
}

impl WeatherGraphSeries {
    /// Create a series from raw points
    pub fn new(hourly_temps: Vec<f64>) -> Self {
        Self { hourly_temps }
    }

    /// Number of points
    #[must_use]
    pub fn len(&self) -> usize {
        self.hourly_temps.len()
    }

    /// Whether the series has no points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hourly_temps.is_empty()
    }

    /// Lowest and highest temperature, if any points exist
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        self.hourly_temps.iter().fold(None, |acc, &t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })
    }
}

/// A single entry in the conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Text the user submitted
    User {
        /// Message identifier
        id: MessageId,
        /// The query text
        text: String,
    },
    /// A reply from the assistant (or an error surfaced as a reply)
    Bot {
        /// Message identifier
        id: MessageId,
        /// Reply text
        text: String,
        /// Optional hourly temperature graph
        graph: Option<WeatherGraphSeries>,
    },
    /// Transient "thinking" entry, always last when present
    Placeholder {
        /// Message identifier
        id: MessageId,
        /// Display marker
        marker: String,
    },
}

impl Message {
    /// Message identifier
    #[must_use]
    pub fn id(&self) -> &MessageId {
        match self {
            Self::User { id, .. } | Self::Bot { id, .. } | Self::Placeholder { id, .. } => id,
        }
    }

    /// Display text of the entry
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::User { text, .. } | Self::Bot { text, .. } => text,
            Self::Placeholder { marker, .. } => marker,
        }
    }

    /// Whether this is the thinking placeholder
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }

    /// Graph attached to a bot reply
    #[must_use]
    pub fn graph(&self) -> Option<&WeatherGraphSeries> {
        match self {
            Self::Bot { graph, .. } => graph.as_ref(),
            _ => None,
        }
    }
}

/// Immutable snapshot of the conversation
///
/// Cloning is cheap: the message list is shared behind an `Arc`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Arc<Vec<Message>>,
}

impl Conversation {
    /// Create an empty conversation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether there are no messages
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Last message, if any
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether the trailing entry is the placeholder
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.last().is_some_and(Message::is_placeholder)
    }

    /// Number of placeholder entries (0 or 1 when the invariant holds)
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_placeholder()).count()
    }

    /// Append the user's query
    #[must_use]
    pub fn append_user_message(&self, text: impl Into<String>) -> Self {
        self.with_appended(Message::User {
            id: MessageId::new(),
            text: text.into(),
        })
    }

    /// Append the thinking placeholder
    ///
    /// A second placeholder is never stacked on top of an existing one.
    #[must_use]
    pub fn append_placeholder(&self) -> Self {
        if self.has_placeholder() {
            return self.clone();
        }
        self.with_appended(Message::Placeholder {
            id: MessageId::new(),
            marker: PLACEHOLDER_MARKER.to_string(),
        })
    }

    /// Drop the trailing placeholder (if any) and append the resolved reply
    #[must_use]
    pub fn replace_placeholder_with_bot_message(
        &self,
        text: impl Into<String>,
        graph: Option<WeatherGraphSeries>,
    ) -> Self {
        let mut messages = self.without_placeholder();
        messages.push(Message::Bot {
            id: MessageId::new(),
            text: text.into(),
            graph,
        });
        Self {
            messages: Arc::new(messages),
        }
    }

    /// Drop the trailing placeholder (if any) and append an error reply
    #[must_use]
    pub fn append_error_message(&self, text: impl Into<String>) -> Self {
        self.replace_placeholder_with_bot_message(text, None)
    }

    /// Drop a trailing placeholder left behind by a superseded exchange
    #[must_use]
    pub fn discard_placeholder(&self) -> Self {
        if !self.has_placeholder() {
            return self.clone();
        }
        Self {
            messages: Arc::new(self.without_placeholder()),
        }
    }

    /// Empty conversation
    #[must_use]
    pub fn reset_all(&self) -> Self {
        Self::new()
    }

    fn with_appended(&self, message: Message) -> Self {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.extend(self.messages.iter().cloned());
        messages.push(message);
        Self {
            messages: Arc::new(messages),
        }
    }

    fn without_placeholder(&self) -> Vec<Message> {
        let mut messages: Vec<Message> = self.messages.iter().cloned().collect();
        if messages.last().is_some_and(Message::is_placeholder) {
            messages.pop();
        }
        messages
    }
}
