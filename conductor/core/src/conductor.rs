//! Conductor - The Request-Lifecycle Controller
//!
//! The Conductor owns the conversation and everything that can change it:
//! - the current exchange token
//! - the delay-indicator timer
//! - a commit held back by the minimum-display gate
//! - a voice result waiting to be submitted
//!
//! # Design Philosophy
//!
//! Only the Conductor mutates state, and it does so through `&mut self` on a
//! single task. Network calls run in spawned tasks that report a
//! [`Completion`] back over a channel. Timers are plain deadlines. Nothing is
//! shared, so nothing is locked.
//!
//! Every completion and every timer is checked against the current token
//! before it is allowed to write. A result that belongs to a superseded or
//! cancelled exchange is dropped on the floor.
//!
//! # Driving the Conductor
//!
//! - [`Conductor::run`] is the production loop: surface events, completions
//!   and deadlines in one `select!`.
//! - [`Conductor::poll`] handles whatever is ready right now without waiting.
//! - [`Conductor::step`] waits for the next completion or deadline and handles
//!   it. Tests drive it under tokio's paused clock.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backend::{AssistantBackend, WeatherSnapshot};
use crate::cancel::{ExchangeId, TokenSlot};
use crate::config::ConductorConfig;
use crate::conversation::Conversation;
use crate::events::{QuerySource, SurfaceEvent, SurfaceType};
use crate::exchange::{
    Exchange, ExchangeExecutor, ExchangeOutcome, ExchangePhase, ExchangeRequest,
};
use crate::gate::{Commit, GateDecision, MinimumDisplayGate, PendingCommit};
use crate::indicator::DelayIndicator;
use crate::location::{
    ConfiguredLocation, Coordinates, LocationContext, LocationProvider, LOCATION_DENIED,
    LOCATION_NOT_FOUND, LOCATION_REQUEST_FAILED,
};
use crate::messages::{
    ConductorMessage, ConductorState, EventId, NotifyLevel, SessionId, View,
};

/// Result reported by a spawned task
#[derive(Debug)]
enum Completion {
    /// An exchange finished (or noticed it was cancelled)
    Exchange {
        exchange: ExchangeId,
        outcome: ExchangeOutcome,
    },
    /// Position lookup finished
    Located(Option<Coordinates>),
    /// Reverse-geocoding finished
    Region(String),
    /// Current-weather fetch finished
    Weather(Option<WeatherSnapshot>),
    /// A startup task was stopped by shutdown
    Abandoned,
}

/// What woke the Conductor up
enum Wake {
    Event(Option<SurfaceEvent>),
    Completion(Completion),
    Deadline,
}

/// A voice result waiting out the submit delay
#[derive(Debug)]
struct PendingVoice {
    text: String,
    due: Instant,
}

/// The Conductor - headless lifecycle controller
pub struct Conductor<B: AssistantBackend> {
    /// Configuration
    config: ConductorConfig,
    /// Assistant backend
    backend: Arc<B>,
    /// Runs exchanges against the backend
    executor: ExchangeExecutor<B>,
    /// Source of the startup position
    location_provider: Arc<dyn LocationProvider>,
    /// Session identifier
    session_id: SessionId,
    /// Current operational state
    state: ConductorState,
    /// Screen the surface is showing
    view: View,
    /// Conversation snapshot
    conversation: Conversation,
    /// Location attached to requests
    location: LocationContext,
    /// Current weather, once fetched
    weather: Option<WeatherSnapshot>,
    /// Holder of the live exchange token
    tokens: TokenSlot,
    /// Live exchange bookkeeping
    exchange: Option<Exchange>,
    /// Placeholder timer
    indicator: DelayIndicator,
    /// Minimum-display gate
    gate: MinimumDisplayGate,
    /// Commit waiting on the gate
    pending_commit: Option<PendingCommit>,
    /// Voice result waiting to be submitted
    pending_voice: Option<PendingVoice>,
    /// Stops startup lookups on shutdown
    startup: CancellationToken,
    /// Channel to send messages to UI surface
    tx: mpsc::Sender<ConductorMessage>,
    /// Spawned tasks report here
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    /// Spawned tasks that have not reported yet
    inflight: usize,
    /// Connected surface
    surface_type: Option<SurfaceType>,
}

impl<B: AssistantBackend + 'static> Conductor<B> {
    /// Create a new Conductor with the given backend
    ///
    /// The startup position comes from `config.coordinates`.
    pub fn new(backend: B, config: ConductorConfig, tx: mpsc::Sender<ConductorMessage>) -> Self {
        let location_provider = Arc::new(ConfiguredLocation::new(config.coordinates));
        let backend = Arc::new(backend);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        Self {
            gate: MinimumDisplayGate::new(config.min_placeholder_display),
            executor: ExchangeExecutor::new(Arc::clone(&backend)),
            config,
            backend,
            location_provider,
            session_id: SessionId::new(),
            state: ConductorState::Initializing,
            view: View::Home,
            conversation: Conversation::new(),
            location: LocationContext::default(),
            weather: None,
            tokens: TokenSlot::new(),
            exchange: None,
            indicator: DelayIndicator::new(),
            pending_commit: None,
            pending_voice: None,
            startup: CancellationToken::new(),
            tx,
            completion_tx,
            completion_rx,
            inflight: 0,
            surface_type: None,
        }
    }

    /// Replace the startup location provider
    #[must_use]
    pub fn with_location_provider(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.location_provider = provider;
        self
    }

    /// Get the session ID
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Get current state
    pub fn state(&self) -> ConductorState {
        self.state
    }

    /// Get current view
    pub fn view(&self) -> View {
        self.view
    }

    /// Get the conversation snapshot
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Get the location context
    pub fn location(&self) -> &LocationContext {
        &self.location
    }

    /// Get the current weather
    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    /// Phase of the live exchange, if any
    pub fn exchange_phase(&self) -> Option<ExchangePhase> {
        self.exchange.as_ref().map(Exchange::phase)
    }

    /// Whether a voice result is waiting to be submitted
    pub fn has_pending_voice(&self) -> bool {
        self.pending_voice.is_some()
    }

    /// Connected surface type
    pub fn surface_type(&self) -> Option<&SurfaceType> {
        self.surface_type.as_ref()
    }

    /// Start the Conductor and kick off the startup lookups
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.set_state(ConductorState::Initializing).await;
        tracing::info!(
            session = %self.session_id.0,
            backend = self.backend.name(),
            "Starting conductor"
        );

        if !self.backend.health_check().await {
            self.notify(
                NotifyLevel::Warning,
                "Weather server not reachable - replies may fail",
            )
            .await;
        }

        let provider = Arc::clone(&self.location_provider);
        let startup = self.startup.clone();
        self.spawn_task(async move {
            tokio::select! {
                biased;
                () = startup.cancelled() => Completion::Abandoned,
                located = provider.locate() => match located {
                    Ok(coordinates) => Completion::Located(Some(coordinates)),
                    Err(e) => {
                        tracing::warn!(error = %e, "No position available");
                        Completion::Located(None)
                    }
                },
            }
        });

        self.send(ConductorMessage::SessionInfo {
            session_id: self.session_id.clone(),
            user_name: self.config.user_name.clone(),
        })
        .await;
        self.settle_state().await;

        Ok(())
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        tracing::trace!(event = %event.event_id().0, "Surface event");
        match event {
            SurfaceEvent::Connected {
                event_id,
                surface_type,
            } => {
                tracing::info!(surface = surface_type.name(), "Surface connected");
                self.surface_type = Some(surface_type);
                self.ack(event_id).await;
                self.send_full_state().await;
            }

            SurfaceEvent::SubmitQuery {
                event_id,
                text,
                source,
            } => {
                self.ack(event_id).await;
                self.submit_query(&text, source).await;
            }

            SurfaceEvent::VoiceCaptureStarted { event_id } => {
                self.ack(event_id).await;
                self.set_view(View::Listening).await;
                self.settle_state().await;
            }

            SurfaceEvent::VoiceRecognized { event_id, text } => {
                self.ack(event_id).await;
                if text.trim().is_empty() {
                    tracing::debug!("Ignoring empty voice result");
                } else {
                    let due = Instant::now() + self.config.voice_submit_delay;
                    if self.pending_voice.is_some() {
                        tracing::debug!("Replacing pending voice submission");
                    }
                    self.pending_voice = Some(PendingVoice { text, due });
                }
            }

            SurfaceEvent::VoiceCaptureCancelled { event_id } => {
                self.ack(event_id).await;
                self.pending_voice = None;
                let view = if self.conversation.is_empty() {
                    View::Home
                } else {
                    View::Chat
                };
                self.set_view(view).await;
                self.settle_state().await;
            }

            SurfaceEvent::NavigateBack { event_id } => {
                self.ack(event_id).await;
                self.navigate_home().await;
            }

            SurfaceEvent::QuitRequested { event_id } => {
                self.ack(event_id).await;
                self.shutdown().await?;
            }
        }

        Ok(())
    }

    /// Handle everything that is ready now, without waiting
    ///
    /// Returns true if there was activity.
    pub async fn poll(&mut self) -> bool {
        let mut active = false;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.handle_completion(completion).await;
            active = true;
        }
        if self
            .next_deadline()
            .is_some_and(|deadline| deadline <= Instant::now())
        {
            self.on_deadline().await;
            active = true;
        }
        active
    }

    /// Wait for the next completion or deadline and handle it
    ///
    /// Returns false when there is nothing left to wait for.
    pub async fn step(&mut self) -> bool {
        if self.poll().await {
            return true;
        }
        if self.is_idle() {
            return false;
        }
        match self.next_wake(None).await {
            Wake::Completion(completion) => self.handle_completion(completion).await,
            Wake::Deadline => self.on_deadline().await,
            Wake::Event(_) => {}
        }
        true
    }

    /// Step until nothing is pending
    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }

    /// Production loop: surface events, completions and timers
    ///
    /// Returns when the surface disconnects or asks to quit.
    pub async fn run(&mut self, mut events: mpsc::Receiver<SurfaceEvent>) -> anyhow::Result<()> {
        while self.state != ConductorState::ShuttingDown {
            match self.next_wake(Some(&mut events)).await {
                Wake::Event(Some(event)) => self.handle_event(event).await?,
                Wake::Event(None) => {
                    tracing::info!("Surface channel closed");
                    self.shutdown().await?;
                }
                Wake::Completion(completion) => self.handle_completion(completion).await,
                Wake::Deadline => self.on_deadline().await,
            }
        }
        Ok(())
    }

    /// Earliest armed deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.indicator.deadline(),
            self.pending_commit.as_ref().map(PendingCommit::due),
            self.pending_voice.as_ref().map(|v| v.due),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Whether no timer is armed and no task is outstanding
    pub fn is_idle(&self) -> bool {
        self.inflight == 0 && self.next_deadline().is_none()
    }

    /// Shut down the Conductor
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        self.set_state(ConductorState::ShuttingDown).await;
        self.abandon_exchange();
        self.pending_voice = None;
        self.startup.cancel();

        self.send(ConductorMessage::Quit {
            message: Some("Goodbye!".to_string()),
        })
        .await;

        Ok(())
    }

    // =========================================================================
    // Exchange lifecycle
    // =========================================================================

    async fn submit_query(&mut self, text: &str, source: QuerySource) {
        let query = text.trim();
        if query.is_empty() {
            tracing::debug!(source = ?source, "Ignoring blank query");
            return;
        }
        if self.state == ConductorState::ShuttingDown {
            return;
        }

        self.abandon_exchange();
        self.pending_voice = None;

        let token = self.tokens.issue();
        let now = Instant::now();
        tracing::debug!(exchange = %token.id(), source = ?source, "Starting exchange");

        self.conversation = self
            .conversation
            .discard_placeholder()
            .append_user_message(query);
        self.exchange = Some(Exchange::new(token.clone(), query, now));
        self.indicator
            .arm(&token, now, self.config.placeholder_delay);

        let request = ExchangeRequest {
            query: query.to_string(),
            location_label: self.location.label.clone(),
            coordinates: self.location.coordinates,
        };
        let executor = self.executor.clone();
        let exchange = token.id();
        self.spawn_task(async move {
            let outcome = executor.run(request, token).await;
            Completion::Exchange { exchange, outcome }
        });

        self.publish_conversation().await;
        self.set_view(View::Chat).await;
        self.settle_state().await;
    }

    /// Cancel the live exchange and everything armed for it
    fn abandon_exchange(&mut self) {
        if let Some(token) = self.tokens.cancel_current() {
            tracing::debug!(exchange = %token.id(), "Cancelled exchange");
        }
        if let Some(mut exchange) = self.exchange.take() {
            exchange.finish(ExchangePhase::Cancelled);
        }
        self.indicator.clear_all();
        self.pending_commit = None;
    }

    async fn navigate_home(&mut self) {
        self.abandon_exchange();
        self.pending_voice = None;
        self.conversation = self.conversation.reset_all();
        self.publish_conversation().await;
        self.set_view(View::Home).await;
        self.settle_state().await;
    }

    async fn on_exchange_outcome(&mut self, id: ExchangeId, outcome: ExchangeOutcome) {
        let Some(exchange) = self.exchange.as_ref().filter(|e| e.id() == id) else {
            tracing::debug!(exchange = %id, "Dropping result of superseded exchange");
            return;
        };
        if !self.tokens.is_current(id) || outcome == ExchangeOutcome::Cancelled {
            tracing::debug!(exchange = %id, "Dropping result of cancelled exchange");
            return;
        }

        let token = exchange.token().clone();
        let shown_at = exchange.placeholder_shown_at();
        self.indicator.clear_exchange(id);

        let bypass = outcome.bypasses_gate();
        let Some(commit) = outcome.into_commit() else {
            return;
        };

        if bypass {
            self.write_commit(id, commit).await;
            return;
        }
        match self.gate.admit(&token, commit, shown_at, Instant::now()) {
            GateDecision::Immediate(commit) => self.write_commit(id, commit).await,
            GateDecision::Deferred(pending) => self.pending_commit = Some(pending),
        }
    }

    /// The single terminal write for an exchange
    async fn write_commit(&mut self, id: ExchangeId, commit: Commit) {
        if !self.tokens.is_current(id) {
            tracing::debug!(exchange = %id, "Commit skipped, exchange no longer current");
            return;
        }

        let phase = if commit.is_error() {
            ExchangePhase::ErrorCommitted
        } else {
            ExchangePhase::Committed
        };
        self.conversation = commit.apply(&self.conversation);
        if let Some(mut exchange) = self.exchange.take() {
            exchange.finish(phase);
            tracing::info!(
                exchange = %id,
                query = exchange.query(),
                phase = ?exchange.phase(),
                elapsed = ?exchange.started_at().elapsed(),
                "Exchange committed"
            );
        }
        self.tokens.release(id);

        self.publish_conversation().await;
        self.settle_state().await;
    }

    // =========================================================================
    // Completions and timers
    // =========================================================================

    async fn handle_completion(&mut self, completion: Completion) {
        self.inflight = self.inflight.saturating_sub(1);
        match completion {
            Completion::Exchange { exchange, outcome } => {
                self.on_exchange_outcome(exchange, outcome).await;
            }
            Completion::Located(Some(coordinates)) => {
                self.location.coordinates = Some(coordinates);
                self.spawn_region_lookup(coordinates);
                self.spawn_weather_lookup(coordinates);
            }
            Completion::Located(None) => {
                self.set_location_label(LOCATION_DENIED.to_string()).await;
            }
            Completion::Region(label) => {
                self.set_location_label(label).await;
            }
            Completion::Weather(Some(snapshot)) => {
                self.weather = Some(snapshot.clone());
                self.send(ConductorMessage::Weather { snapshot }).await;
            }
            Completion::Weather(None) | Completion::Abandoned => {}
        }
    }

    /// Fire due timers after any completion from the same tick
    ///
    /// A task woken by the same timer tick has not run yet when the deadline
    /// wins the select, so yield once and drain before firing.
    async fn on_deadline(&mut self) {
        tokio::task::yield_now().await;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.handle_completion(completion).await;
        }
        self.fire_due_timers(Instant::now()).await;
    }

    async fn fire_due_timers(&mut self, now: Instant) {
        if let Some(shown) = self.indicator.fire_if_due(now, &self.conversation) {
            match self.exchange.as_mut() {
                Some(exchange)
                    if exchange.id() == shown.exchange && self.tokens.is_current(shown.exchange) =>
                {
                    tracing::debug!(exchange = %shown.exchange, "Showing placeholder");
                    exchange.mark_placeholder_shown(shown.shown_at);
                    self.conversation = shown.conversation;
                    self.publish_conversation().await;
                }
                _ => {
                    tracing::debug!(
                        exchange = %shown.exchange,
                        "Placeholder for stale exchange ignored"
                    );
                }
            }
        }

        if self.pending_commit.as_ref().is_some_and(|p| p.is_due(now)) {
            if let Some(pending) = self.pending_commit.take() {
                let id = pending.exchange();
                match pending.release() {
                    Some(commit) => self.write_commit(id, commit).await,
                    None => tracing::debug!(exchange = %id, "Held commit cancelled"),
                }
            }
        }

        if self.pending_voice.as_ref().is_some_and(|v| now >= v.due) {
            if let Some(voice) = self.pending_voice.take() {
                self.submit_query(&voice.text, QuerySource::Voice).await;
            }
        }
    }

    async fn next_wake(&mut self, events: Option<&mut mpsc::Receiver<SurfaceEvent>>) -> Wake {
        let deadline = self.next_deadline();
        let timer = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        let event = async {
            match events {
                Some(rx) => rx.recv().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            Some(completion) = self.completion_rx.recv() => Wake::Completion(completion),
            () = timer => Wake::Deadline,
            event = event => Wake::Event(event),
        }
    }

    fn spawn_task<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        self.inflight += 1;
        tokio::spawn(async move {
            let completion = task.await;
            if tx.send(completion).is_err() {
                tracing::debug!("Conductor gone before task completed");
            }
        });
    }

    fn spawn_region_lookup(&mut self, coordinates: Coordinates) {
        let backend = Arc::clone(&self.backend);
        let startup = self.startup.clone();
        self.spawn_task(async move {
            tokio::select! {
                biased;
                () = startup.cancelled() => Completion::Abandoned,
                result = backend.reverse_geocode(&coordinates) => {
                    let label = match result {
                        Ok(response) => response
                            .region
                            .filter(|r| !r.trim().is_empty())
                            .unwrap_or_else(|| LOCATION_NOT_FOUND.to_string()),
                        Err(e) => {
                            tracing::warn!(error = %e, "Reverse geocoding failed");
                            LOCATION_REQUEST_FAILED.to_string()
                        }
                    };
                    Completion::Region(label)
                }
            }
        });
    }

    fn spawn_weather_lookup(&mut self, coordinates: Coordinates) {
        let backend = Arc::clone(&self.backend);
        let startup = self.startup.clone();
        self.spawn_task(async move {
            tokio::select! {
                biased;
                () = startup.cancelled() => Completion::Abandoned,
                result = backend.weather_snapshot(&coordinates) => match result {
                    Ok(snapshot) => Completion::Weather(Some(snapshot)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Weather fetch failed");
                        Completion::Weather(None)
                    }
                },
            }
        });
    }

    // =========================================================================
    // Surface messaging
    // =========================================================================

    async fn set_location_label(&mut self, label: String) {
        tracing::info!(label = %label, "Location resolved");
        self.location.label = label.clone();
        self.send(ConductorMessage::Location { label }).await;
    }

    async fn set_view(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.send(ConductorMessage::View { view }).await;
        }
    }

    /// Derive the operational state from what is live
    async fn settle_state(&mut self) {
        if self.state == ConductorState::ShuttingDown {
            return;
        }
        let state = if self.exchange.is_some() {
            ConductorState::Thinking
        } else if self.view == View::Listening {
            ConductorState::Listening
        } else {
            ConductorState::Ready
        };
        self.set_state(state).await;
    }

    async fn set_state(&mut self, state: ConductorState) {
        if self.state != state {
            self.state = state;
            self.send(ConductorMessage::State { state }).await;
        }
    }

    async fn publish_conversation(&self) {
        self.send(ConductorMessage::Conversation {
            snapshot: self.conversation.clone(),
        })
        .await;
    }

    async fn send_full_state(&self) {
        self.send(ConductorMessage::State { state: self.state }).await;
        self.send(ConductorMessage::SessionInfo {
            session_id: self.session_id.clone(),
            user_name: self.config.user_name.clone(),
        })
        .await;
        self.send(ConductorMessage::View { view: self.view }).await;
        self.send(ConductorMessage::Location {
            label: self.location.label.clone(),
        })
        .await;
        if let Some(ref snapshot) = self.weather {
            self.send(ConductorMessage::Weather {
                snapshot: snapshot.clone(),
            })
            .await;
        }
        self.publish_conversation().await;
    }

    async fn ack(&self, event_id: EventId) {
        self.send(ConductorMessage::Ack { event_id }).await;
    }

    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ConductorMessage::Notify {
            level,
            title: None,
            message: message.to_string(),
        })
        .await;
    }

    async fn send(&self, msg: ConductorMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!(error = %e, "Surface channel closed, dropping message");
        }
    }
}

impl<B: AssistantBackend> Drop for Conductor<B> {
    fn drop(&mut self) {
        self.tokens.cancel_current();
        self.startup.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        AssistantRequest, AssistantResponse, BackendError, GraphResponse, RegionResponse,
    };

    struct MockBackend;

    #[async_trait::async_trait]
    impl AssistantBackend for MockBackend {
        fn name(&self) -> &str {
            "Mock"
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn ask(&self, _: &AssistantRequest) -> Result<AssistantResponse, BackendError> {
            Ok(AssistantResponse::reply("맑음"))
        }

        async fn weather_graph(&self, _: &Coordinates) -> Result<GraphResponse, BackendError> {
            Ok(GraphResponse::default())
        }

        async fn reverse_geocode(&self, _: &Coordinates) -> Result<RegionResponse, BackendError> {
            Ok(RegionResponse {
                region: Some("서울특별시".to_string()),
            })
        }

        async fn weather_snapshot(
            &self,
            _: &Coordinates,
        ) -> Result<WeatherSnapshot, BackendError> {
            Err(BackendError::Other("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_conductor_creation() {
        let (tx, _rx) = mpsc::channel(100);
        let conductor = Conductor::new(MockBackend, ConductorConfig::default(), tx);

        assert_eq!(conductor.state(), ConductorState::Initializing);
        assert_eq!(conductor.view(), View::Home);
        assert!(conductor.conversation().is_empty());
        assert!(conductor.is_idle());
    }

    #[tokio::test]
    async fn test_conductor_start_without_position() {
        let (tx, mut rx) = mpsc::channel(100);
        let mut conductor = Conductor::new(MockBackend, ConductorConfig::default(), tx);

        conductor.start().await.unwrap();
        conductor.run_until_idle().await;

        assert_eq!(conductor.state(), ConductorState::Ready);
        assert_eq!(conductor.location().label, LOCATION_DENIED);

        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, ConductorMessage::SessionInfo { .. }));
    }

    #[tokio::test]
    async fn test_conductor_start_with_position() {
        let (tx, _rx) = mpsc::channel(100);
        let config = ConductorConfig::default().with_coordinates(Coordinates::new(37.5, 127.0));
        let mut conductor = Conductor::new(MockBackend, config, tx);

        conductor.start().await.unwrap();
        conductor.run_until_idle().await;

        assert_eq!(conductor.location().label, "서울특별시");
        assert_eq!(
            conductor.location().coordinates,
            Some(Coordinates::new(37.5, 127.0))
        );
        assert!(conductor.weather().is_none());
    }

    #[tokio::test]
    async fn test_blank_query_ignored() {
        let (tx, _rx) = mpsc::channel(100);
        let mut conductor = Conductor::new(MockBackend, ConductorConfig::default(), tx);

        conductor
            .handle_event(SurfaceEvent::typed("   "))
            .await
            .unwrap();

        assert!(conductor.conversation().is_empty());
        assert_eq!(conductor.view(), View::Home);
        assert!(conductor.is_idle());
    }

    #[tokio::test]
    async fn test_connect_acks_and_sends_full_state() {
        let (tx, mut rx) = mpsc::channel(100);
        let mut conductor = Conductor::new(MockBackend, ConductorConfig::default(), tx);
        let event_id = SurfaceEvent::new_event_id();

        conductor
            .handle_event(SurfaceEvent::Connected {
                event_id: event_id.clone(),
                surface_type: SurfaceType::Tui,
            })
            .await
            .unwrap();

        assert_eq!(conductor.surface_type(), Some(&SurfaceType::Tui));
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, ConductorMessage::Ack { event_id: ref id } if *id == event_id));

        let mut saw_view = false;
        let mut saw_location = false;
        while let Ok(msg) = rx.try_recv() {
            saw_view |= matches!(msg, ConductorMessage::View { view: View::Home });
            saw_location |= matches!(msg, ConductorMessage::Location { .. });
        }
        assert!(saw_view);
        assert!(saw_location);
    }

    #[tokio::test]
    async fn test_quit_sends_quit() {
        let (tx, mut rx) = mpsc::channel(100);
        let mut conductor = Conductor::new(MockBackend, ConductorConfig::default(), tx);

        conductor
            .handle_event(SurfaceEvent::QuitRequested {
                event_id: SurfaceEvent::new_event_id(),
            })
            .await
            .unwrap();

        assert_eq!(conductor.state(), ConductorState::ShuttingDown);
        let mut saw_quit = false;
        while let Ok(msg) = rx.try_recv() {
            saw_quit |= matches!(msg, ConductorMessage::Quit { .. });
        }
        assert!(saw_quit);
    }
}
