//! Minimum-Display Gate
//!
//! Once the placeholder is on screen it stays for at least
//! [`MIN_PLACEHOLDER_DISPLAY`]. A reply that arrives sooner is held as a
//! [`PendingCommit`] and written when the remainder elapses, provided its token
//! is still active at that point.

use std::time::Duration;

use tokio::time::Instant;

use crate::cancel::{ExchangeId, ExchangeToken};
use crate::conversation::{Conversation, WeatherGraphSeries};

/// Minimum time the placeholder stays visible once shown
pub const MIN_PLACEHOLDER_DISPLAY: Duration = Duration::from_millis(1000);

/// The terminal write for an exchange
#[derive(Clone, Debug, PartialEq)]
pub enum Commit {
    /// Assistant reply, optionally decorated with a graph
    Reply {
        /// Reply text
        text: String,
        /// Hourly temperature graph
        graph: Option<WeatherGraphSeries>,
    },
    /// Error surfaced as a bot message
    Error {
        /// Full message text, prefix included
        text: String,
    },
}

impl Commit {
    /// Apply this commit to a conversation snapshot
    #[must_use]
    pub fn apply(&self, conversation: &Conversation) -> Conversation {
        match self {
            Self::Reply { text, graph } => {
                conversation.replace_placeholder_with_bot_message(text.clone(), graph.clone())
            }
            Self::Error { text } => conversation.append_error_message(text.clone()),
        }
    }

    /// Whether this commit carries an error
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A commit waiting out the minimum display time
#[derive(Debug)]
pub struct PendingCommit {
    token: ExchangeToken,
    due: Instant,
    commit: Commit,
}

impl PendingCommit {
    /// Exchange the commit belongs to
    #[must_use]
    pub fn exchange(&self) -> ExchangeId {
        self.token.id()
    }

    /// When the commit may be written
    #[must_use]
    pub fn due(&self) -> Instant {
        self.due
    }

    /// Whether the commit may be written at `now`
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }

    /// Release the commit, re-checking the token
    ///
    /// Returns `None` if the exchange was cancelled while waiting.
    #[must_use]
    pub fn release(self) -> Option<Commit> {
        if self.token.is_cancelled() {
            None
        } else {
            Some(self.commit)
        }
    }
}

/// Outcome of passing a commit through the gate
#[derive(Debug)]
pub enum GateDecision {
    /// Write now
    Immediate(Commit),
    /// Write later
    Deferred(PendingCommit),
}

/// Computes how long a commit has to wait
#[derive(Clone, Copy, Debug)]
pub struct MinimumDisplayGate {
    min_display: Duration,
}

impl Default for MinimumDisplayGate {
    fn default() -> Self {
        Self::new(MIN_PLACEHOLDER_DISPLAY)
    }
}

impl MinimumDisplayGate {
    /// Create a gate with the given floor
    #[must_use]
    pub fn new(min_display: Duration) -> Self {
        Self { min_display }
    }

    /// How much longer the placeholder must stay up
    ///
    /// Zero when no placeholder was shown.
    #[must_use]
    pub fn remaining(&self, shown_at: Option<Instant>, now: Instant) -> Duration {
        match shown_at {
            Some(shown_at) => self
                .min_display
                .saturating_sub(now.saturating_duration_since(shown_at)),
            None => Duration::ZERO,
        }
    }

    /// Decide whether `commit` is written now or deferred
    #[must_use]
    pub fn admit(
        &self,
        token: &ExchangeToken,
        commit: Commit,
        shown_at: Option<Instant>,
        now: Instant,
    ) -> GateDecision {
        let remaining = self.remaining(shown_at, now);
        if remaining.is_zero() {
            GateDecision::Immediate(commit)
        } else {
            tracing::debug!(
                exchange = %token.id(),
                remaining_ms = remaining.as_millis() as u64,
                "Holding commit until placeholder minimum elapses"
            );
            GateDecision::Deferred(PendingCommit {
                token: token.clone(),
                due: now + remaining,
                commit,
            })
        }
    }
}
