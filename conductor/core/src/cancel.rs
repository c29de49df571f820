//! Exchange Cancellation
//!
//! Every exchange carries an [`ExchangeToken`]. The token is cloned into the
//! spawned task that talks to the backend and is checked by the Conductor
//! before each mutation it performs on behalf of that exchange.
//!
//! [`TokenSlot`] holds the single "current" token. Issuing a new token cancels
//! the previous one before returning, so two exchanges are never live at once.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Exchange identifier
///
/// Monotonic within a process, so a later exchange always compares greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExchangeId(u64);

impl ExchangeId {
    /// Generate the next exchange ID
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Raw numeric value
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exchange_{}", self.0)
    }
}

/// "This exchange is still wanted"
///
/// Cloning shares the underlying flag; cancelling any clone cancels all of them.
#[derive(Clone, Debug)]
pub struct ExchangeToken {
    id: ExchangeId,
    inner: CancellationToken,
}

impl ExchangeToken {
    fn new() -> Self {
        Self {
            id: ExchangeId::next(),
            inner: CancellationToken::new(),
        }
    }

    /// Exchange this token belongs to
    #[must_use]
    pub fn id(&self) -> ExchangeId {
        self.id
    }

    /// Cancel the token. Cancelling twice is a no-op.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Whether the token has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }
}

/// Holder of the current exchange token
#[derive(Debug, Default)]
pub struct TokenSlot {
    current: Option<ExchangeToken>,
}

impl TokenSlot {
    /// Create an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token, cancelling whichever token was current
    pub fn issue(&mut self) -> ExchangeToken {
        if let Some(previous) = self.current.take() {
            previous.cancel();
            tracing::debug!(exchange = %previous.id(), "Superseded by new exchange");
        }
        let token = ExchangeToken::new();
        self.current = Some(token.clone());
        token
    }

    /// Cancel the current token (if any) and empty the slot
    ///
    /// Returns the token that was cancelled.
    pub fn cancel_current(&mut self) -> Option<ExchangeToken> {
        let token = self.current.take()?;
        token.cancel();
        Some(token)
    }

    /// Forget the current token without cancelling it (exchange finished)
    pub fn release(&mut self, id: ExchangeId) {
        if self.current.as_ref().is_some_and(|t| t.id() == id) {
            self.current = None;
        }
    }

    /// The current token, if an exchange is live
    #[must_use]
    pub fn current(&self) -> Option<&ExchangeToken> {
        self.current.as_ref()
    }

    /// Whether `id` is the live, uncancelled exchange
    #[must_use]
    pub fn is_current(&self, id: ExchangeId) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| t.id() == id && !t.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_cancels_previous() {
        let mut slot = TokenSlot::new();
        let first = slot.issue();
        let second = slot.issue();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(second.id() > first.id());
        assert!(slot.is_current(second.id()));
        assert!(!slot.is_current(first.id()));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut slot = TokenSlot::new();
        let token = slot.issue();

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());

        assert!(slot.cancel_current().is_some());
        assert!(slot.cancel_current().is_none());
    }

    #[test]
    fn test_release_keeps_token_active() {
        let mut slot = TokenSlot::new();
        let token = slot.issue();
        slot.release(token.id());

        assert!(slot.current().is_none());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_release_ignores_other_ids() {
        let mut slot = TokenSlot::new();
        let old = slot.issue();
        let live = slot.issue();
        slot.release(old.id());

        assert_eq!(slot.current().map(ExchangeToken::id), Some(live.id()));
    }

    #[tokio::test]
    async fn test_clones_observe_cancellation() {
        let mut slot = TokenSlot::new();
        let token = slot.issue();
        let in_task = token.clone();

        let waiter = tokio::spawn(async move {
            in_task.cancelled().await;
            in_task.is_cancelled()
        });
        slot.cancel_current();

        assert!(waiter.await.unwrap_or(false));
    }
}
