//! Delay Indicator Scheduler
//!
//! Shows the "thinking" placeholder only when a reply is slow. The timer is a
//! plain deadline owned by the Conductor; the Conductor's poll loop calls
//! [`DelayIndicator::fire_if_due`] and the token is checked right there, at the
//! moment of firing, so a cancellation that lands on the same tick wins.

use std::time::Duration;

use tokio::time::Instant;

use crate::cancel::{ExchangeId, ExchangeToken};
use crate::conversation::Conversation;

/// How long an exchange may run before the placeholder appears
pub const PLACEHOLDER_DELAY: Duration = Duration::from_millis(800);

/// Handle returned by [`DelayIndicator::arm`], used to clear that timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndicatorHandle {
    exchange: ExchangeId,
}

impl IndicatorHandle {
    /// Exchange the timer belongs to
    #[must_use]
    pub fn exchange(&self) -> ExchangeId {
        self.exchange
    }
}

/// Result of a timer that fired with its token still active
#[derive(Clone, Debug)]
pub struct PlaceholderShown {
    /// Exchange the placeholder belongs to
    pub exchange: ExchangeId,
    /// Conversation with the placeholder appended
    pub conversation: Conversation,
    /// When the placeholder became visible
    pub shown_at: Instant,
}

#[derive(Debug)]
struct ArmedTimer {
    token: ExchangeToken,
    fires_at: Instant,
}

/// One-shot placeholder timer
#[derive(Debug, Default)]
pub struct DelayIndicator {
    armed: Option<ArmedTimer>,
}

impl DelayIndicator {
    /// Create an idle scheduler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer for `token`, replacing any timer already armed
    ///
    /// Returns `None` if the token is already cancelled.
    pub fn arm(
        &mut self,
        token: &ExchangeToken,
        now: Instant,
        delay: Duration,
    ) -> Option<IndicatorHandle> {
        if token.is_cancelled() {
            return None;
        }
        self.armed = Some(ArmedTimer {
            token: token.clone(),
            fires_at: now + delay,
        });
        Some(IndicatorHandle {
            exchange: token.id(),
        })
    }

    /// Clear the timer identified by `handle`
    ///
    /// Returns true if a timer was cleared.
    pub fn clear(&mut self, handle: IndicatorHandle) -> bool {
        self.clear_exchange(handle.exchange)
    }

    /// Clear the timer armed for `exchange`, if that is the armed one
    pub fn clear_exchange(&mut self, exchange: ExchangeId) -> bool {
        if self
            .armed
            .as_ref()
            .is_some_and(|t| t.token.id() == exchange)
        {
            self.armed = None;
            true
        } else {
            false
        }
    }

    /// Clear whatever is armed
    pub fn clear_all(&mut self) {
        self.armed = None;
    }

    /// When the armed timer will fire
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|t| t.fires_at)
    }

    /// Whether a timer is armed
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Fire the timer if its deadline has passed
    ///
    /// A due timer is always consumed. It only yields a placeholder if its
    /// token is still active at this instant.
    pub fn fire_if_due(
        &mut self,
        now: Instant,
        conversation: &Conversation,
    ) -> Option<PlaceholderShown> {
        if !self.armed.as_ref().is_some_and(|t| now >= t.fires_at) {
            return None;
        }
        let timer = self.armed.take()?;
        if timer.token.is_cancelled() {
            tracing::debug!(exchange = %timer.token.id(), "Placeholder timer fired after cancel");
            return None;
        }
        Some(PlaceholderShown {
            exchange: timer.token.id(),
            conversation: conversation.append_placeholder(),
            shown_at: now,
        })
    }
}
