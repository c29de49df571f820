//! Exchange Executor
//!
//! Runs one user query against the backend: the primary assistant call, then
//! the graph call when the query asks about temperature. The executor runs in
//! a spawned task and never touches conversation state. It reports an
//! [`ExchangeOutcome`] and the Conductor decides what to write.
//!
//! Every await races the exchange token. A cancelled exchange stops at the
//! next suspension point and reports [`ExchangeOutcome::Cancelled`].

use std::sync::Arc;

use tokio::time::Instant;

use crate::backend::{AssistantBackend, AssistantRequest, AssistantResponse};
use crate::cancel::{ExchangeId, ExchangeToken};
use crate::conversation::WeatherGraphSeries;
use crate::gate::Commit;
use crate::location::Coordinates;

/// Query substrings that ask for temperature data
pub const TEMPERATURE_KEYWORDS: [&str; 2] = ["기온", "온도"];

/// Reply text used when the assistant returns nothing readable
pub const REPLY_FALLBACK: &str = "응답을 이해하지 못했어요.";

/// Whether `query` asks for temperature data
#[must_use]
pub fn requests_temperature(query: &str) -> bool {
    TEMPERATURE_KEYWORDS.iter().any(|k| query.contains(k))
}

/// Text for a logical error reported by the assistant
#[must_use]
pub fn logical_error_text(error: &str) -> String {
    format!("❌ 오류: {error}")
}

/// Text for a failed primary call
#[must_use]
pub fn transport_error_text(detail: &str) -> String {
    format!("❌ {detail}")
}

/// Inputs for one exchange
#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeRequest {
    /// The user's query
    pub query: String,
    /// Location label at submission time
    pub location_label: String,
    /// Client coordinates at submission time
    pub coordinates: Option<Coordinates>,
}

impl ExchangeRequest {
    fn to_assistant_request(&self) -> AssistantRequest {
        AssistantRequest::new(
            self.query.clone(),
            self.location_label.clone(),
            self.coordinates,
        )
    }
}

/// How an exchange ended, as seen from the executor
#[derive(Clone, Debug, PartialEq)]
pub enum ExchangeOutcome {
    /// The token was cancelled; nothing may be written
    Cancelled,
    /// The assistant answered
    Reply {
        /// Reply text (fallback applied)
        text: String,
        /// Graph, when requested and fetched
        graph: Option<WeatherGraphSeries>,
    },
    /// The assistant answered with an error field
    LogicalError(String),
    /// The primary call failed
    TransportFailure(String),
}

impl ExchangeOutcome {
    /// The commit this outcome produces, if any
    #[must_use]
    pub fn into_commit(self) -> Option<Commit> {
        match self {
            Self::Cancelled => None,
            Self::Reply { text, graph } => Some(Commit::Reply { text, graph }),
            Self::LogicalError(error) => Some(Commit::Error {
                text: logical_error_text(&error),
            }),
            Self::TransportFailure(detail) => Some(Commit::Error {
                text: transport_error_text(&detail),
            }),
        }
    }

    /// Whether the commit skips the minimum-display wait
    #[must_use]
    pub fn bypasses_gate(&self) -> bool {
        matches!(self, Self::TransportFailure(_))
    }
}

/// Runs exchanges against a backend
pub struct ExchangeExecutor<B: AssistantBackend> {
    backend: Arc<B>,
}

impl<B: AssistantBackend> Clone for ExchangeExecutor<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: AssistantBackend> ExchangeExecutor<B> {
    /// Create an executor over `backend`
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Run the exchange to completion or cancellation
    pub async fn run(&self, request: ExchangeRequest, token: ExchangeToken) -> ExchangeOutcome {
        let exchange = token.id();
        tracing::debug!(exchange = %exchange, query = %request.query, "Primary call");

        let assistant_request = request.to_assistant_request();
        let primary = tokio::select! {
            biased;
            () = token.cancelled() => return ExchangeOutcome::Cancelled,
            result = self.backend.ask(&assistant_request) => result,
        };

        let response = match primary {
            Ok(response) => response,
            Err(e) => {
                if token.is_cancelled() {
                    return ExchangeOutcome::Cancelled;
                }
                tracing::warn!(exchange = %exchange, error = %e, "Primary call failed");
                return ExchangeOutcome::TransportFailure(e.to_string());
            }
        };

        if token.is_cancelled() {
            return ExchangeOutcome::Cancelled;
        }

        // An empty error string is not an error
        if let Some(error) = response.error.as_deref().filter(|e| !e.is_empty()) {
            tracing::warn!(exchange = %exchange, error = %error, "Assistant reported an error");
            return ExchangeOutcome::LogicalError(error.to_string());
        }

        let graph = self.fetch_graph(&request, &response, &token).await;
        if token.is_cancelled() {
            return ExchangeOutcome::Cancelled;
        }

        let text = response
            .reply
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| REPLY_FALLBACK.to_string());

        ExchangeOutcome::Reply { text, graph }
    }

    async fn fetch_graph(
        &self,
        request: &ExchangeRequest,
        response: &AssistantResponse,
        token: &ExchangeToken,
    ) -> Option<WeatherGraphSeries> {
        if !requests_temperature(&request.query) {
            return None;
        }

        let coordinates = response
            .resolved_coordinates
            .and_then(|c| c.to_coordinates())
            .or(request.coordinates)?;

        tracing::debug!(
            exchange = %token.id(),
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            "Graph call"
        );

        let result = tokio::select! {
            biased;
            () = token.cancelled() => return None,
            result = self.backend.weather_graph(&coordinates) => result,
        };

        match result {
            Ok(graph) => graph.hourly_temps.map(WeatherGraphSeries::new),
            Err(e) => {
                tracing::warn!(
                    exchange = %token.id(),
                    error = %e,
                    "Graph call failed, replying without graph"
                );
                None
            }
        }
    }
}

/// Lifecycle phase of an exchange
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Request sent, nothing visible yet
    Sent,
    /// Placeholder on screen
    PlaceholderShown,
    /// Reply written
    Committed,
    /// Error written
    ErrorCommitted,
    /// Abandoned
    Cancelled,
}

impl ExchangePhase {
    /// Whether no further transition is possible
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::ErrorCommitted | Self::Cancelled)
    }
}

/// Bookkeeping for the live exchange
#[derive(Clone, Debug)]
pub struct Exchange {
    token: ExchangeToken,
    query: String,
    started_at: Instant,
    placeholder_shown_at: Option<Instant>,
    phase: ExchangePhase,
}

impl Exchange {
    /// Record a freshly sent exchange
    pub fn new(token: ExchangeToken, query: impl Into<String>, started_at: Instant) -> Self {
        Self {
            token,
            query: query.into(),
            started_at,
            placeholder_shown_at: None,
            phase: ExchangePhase::Sent,
        }
    }

    /// Exchange identifier
    #[must_use]
    pub fn id(&self) -> ExchangeId {
        self.token.id()
    }

    /// The exchange token
    #[must_use]
    pub fn token(&self) -> &ExchangeToken {
        &self.token
    }

    /// Submitted query
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// When the exchange was sent
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// When the placeholder appeared, if it did
    #[must_use]
    pub fn placeholder_shown_at(&self) -> Option<Instant> {
        self.placeholder_shown_at
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    /// `Sent -> PlaceholderShown`
    pub fn mark_placeholder_shown(&mut self, at: Instant) {
        if self.phase == ExchangePhase::Sent {
            self.placeholder_shown_at = Some(at);
            self.phase = ExchangePhase::PlaceholderShown;
        }
    }

    /// Terminal transition; ignored once terminal
    pub fn finish(&mut self, phase: ExchangePhase) {
        if !self.phase.is_terminal() {
            tracing::debug!(
                exchange = %self.id(),
                from = ?self.phase,
                to = ?phase,
                "Exchange finished"
            );
            self.phase = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, GraphResponse, RegionResponse, WeatherSnapshot};
    use crate::cancel::TokenSlot;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedBackend {
        response: Result<AssistantResponse, String>,
        graph: Result<GraphResponse, String>,
        graph_calls: AtomicUsize,
    }

    impl FixedBackend {
        fn new(response: AssistantResponse) -> Self {
            Self {
                response: Ok(response),
                graph: Ok(GraphResponse {
                    hourly_temps: Some(vec![10.0, 11.0, 12.0]),
                }),
                graph_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AssistantBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn ask(&self, _: &AssistantRequest) -> Result<AssistantResponse, BackendError> {
            self.response.clone().map_err(BackendError::Other)
        }

        async fn weather_graph(&self, _: &Coordinates) -> Result<GraphResponse, BackendError> {
            self.graph_calls.fetch_add(1, Ordering::SeqCst);
            self.graph.clone().map_err(BackendError::Other)
        }

        async fn reverse_geocode(&self, _: &Coordinates) -> Result<RegionResponse, BackendError> {
            Err(BackendError::Other("unused".into()))
        }

        async fn weather_snapshot(
            &self,
            _: &Coordinates,
        ) -> Result<WeatherSnapshot, BackendError> {
            Err(BackendError::Other("unused".into()))
        }
    }

    fn request(query: &str, coordinates: Option<Coordinates>) -> ExchangeRequest {
        ExchangeRequest {
            query: query.to_string(),
            location_label: "서울".to_string(),
            coordinates,
        }
    }

    #[test]
    fn test_keyword_contract() {
        assert!(requests_temperature("기온 알려줘"));
        assert!(requests_temperature("지금 온도는?"));
        assert!(!requests_temperature("오늘 날씨 어때?"));
        assert!(!requests_temperature("temperature"));
    }

    #[tokio::test]
    async fn test_reply_without_keyword_skips_graph() {
        let backend = Arc::new(FixedBackend::new(AssistantResponse::reply("맑음")));
        let executor = ExchangeExecutor::new(Arc::clone(&backend));
        let token = TokenSlot::new().issue();

        let outcome = executor.run(request("오늘 날씨 어때?", None), token).await;
        assert_eq!(
            outcome,
            ExchangeOutcome::Reply {
                text: "맑음".to_string(),
                graph: None
            }
        );
        assert_eq!(backend.graph_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_keyword_with_resolved_coordinates_fetches_graph() {
        let response =
            AssistantResponse::reply("12도").with_resolved(Coordinates::new(37.5, 127.0));
        let backend = Arc::new(FixedBackend::new(response));
        let executor = ExchangeExecutor::new(Arc::clone(&backend));
        let token = TokenSlot::new().issue();

        let outcome = executor.run(request("기온 알려줘", None), token).await;
        assert_eq!(
            outcome,
            ExchangeOutcome::Reply {
                text: "12도".to_string(),
                graph: Some(WeatherGraphSeries::new(vec![10.0, 11.0, 12.0])),
            }
        );
    }

    #[tokio::test]
    async fn test_keyword_without_any_coordinates_skips_graph() {
        let backend = Arc::new(FixedBackend::new(AssistantResponse::reply("?")));
        let executor = ExchangeExecutor::new(Arc::clone(&backend));
        let token = TokenSlot::new().issue();

        let outcome = executor.run(request("온도", None), token).await;
        assert!(matches!(outcome, ExchangeOutcome::Reply { graph: None, .. }));
        assert_eq!(backend.graph_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_graph_failure_degrades_to_no_graph() {
        let mut backend = FixedBackend::new(AssistantResponse::reply("따뜻해요"));
        backend.graph = Err("graph down".to_string());
        let backend = Arc::new(backend);
        let executor = ExchangeExecutor::new(Arc::clone(&backend));
        let token = TokenSlot::new().issue();

        let outcome = executor
            .run(request("기온", Some(Coordinates::new(35.0, 129.0))), token)
            .await;
        assert_eq!(
            outcome,
            ExchangeOutcome::Reply {
                text: "따뜻해요".to_string(),
                graph: None
            }
        );
        assert_eq!(backend.graph_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_reply_uses_fallback() {
        let backend = Arc::new(FixedBackend::new(AssistantResponse::default()));
        let executor = ExchangeExecutor::new(backend);
        let token = TokenSlot::new().issue();

        let outcome = executor.run(request("hm", None), token).await;
        assert_eq!(
            outcome.into_commit(),
            Some(Commit::Reply {
                text: REPLY_FALLBACK.to_string(),
                graph: None
            })
        );
    }

    #[tokio::test]
    async fn test_logical_error_wins_over_reply() {
        let mut response = AssistantResponse::reply("ignored");
        response.error = Some("quota".to_string());
        let backend = Arc::new(FixedBackend::new(response));
        let executor = ExchangeExecutor::new(Arc::clone(&backend));
        let token = TokenSlot::new().issue();

        let outcome = executor.run(request("기온", None), token).await;
        assert!(!outcome.bypasses_gate());
        assert_eq!(
            outcome.into_commit(),
            Some(Commit::Error {
                text: "❌ 오류: quota".to_string()
            })
        );
        assert_eq!(backend.graph_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_error_string_keeps_reply() {
        let mut response = AssistantResponse::reply("맑음");
        response.error = Some(String::new());
        let backend = Arc::new(FixedBackend::new(response));
        let executor = ExchangeExecutor::new(backend);
        let token = TokenSlot::new().issue();

        let outcome = executor.run(request("오늘 날씨 어때?", None), token).await;
        assert_eq!(
            outcome,
            ExchangeOutcome::Reply {
                text: "맑음".to_string(),
                graph: None
            }
        );
    }

    #[tokio::test]
    async fn test_whitespace_reply_is_kept() {
        let backend = Arc::new(FixedBackend::new(AssistantResponse::reply(" ")));
        let executor = ExchangeExecutor::new(backend);
        let token = TokenSlot::new().issue();

        let outcome = executor.run(request("hm", None), token).await;
        assert_eq!(
            outcome,
            ExchangeOutcome::Reply {
                text: " ".to_string(),
                graph: None
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let backend = Arc::new(FixedBackend {
            response: Err("connection refused".to_string()),
            graph: Ok(GraphResponse::default()),
            graph_calls: AtomicUsize::new(0),
        });
        let executor = ExchangeExecutor::new(backend);
        let token = TokenSlot::new().issue();

        let outcome = executor.run(request("q", None), token).await;
        assert!(outcome.bypasses_gate());
        assert_eq!(
            outcome.into_commit(),
            Some(Commit::Error {
                text: "❌ connection refused".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let backend = Arc::new(FixedBackend::new(AssistantResponse::reply("late")));
        let executor = ExchangeExecutor::new(backend);
        let token = TokenSlot::new().issue();
        token.cancel();

        let outcome = executor.run(request("q", None), token).await;
        assert_eq!(outcome, ExchangeOutcome::Cancelled);
        assert_eq!(outcome.into_commit(), None);
    }

    #[test]
    fn test_phase_transitions() {
        let token = TokenSlot::new().issue();
        let start = Instant::now();
        let mut exchange = Exchange::new(token, "q", start);
        assert_eq!(exchange.phase(), ExchangePhase::Sent);

        exchange.mark_placeholder_shown(start);
        assert_eq!(exchange.phase(), ExchangePhase::PlaceholderShown);
        assert_eq!(exchange.placeholder_shown_at(), Some(start));

        exchange.finish(ExchangePhase::Committed);
        exchange.finish(ExchangePhase::Cancelled);
        assert_eq!(exchange.phase(), ExchangePhase::Committed);
    }
}
