//! Conductor Client
//!
//! Thin wrapper around the Conductor for TUI integration.
//! The Conductor runs in its own task (no network between them); this client
//! holds both ends of the channels that connect it to the terminal loop.
//!
//! # Architecture
//!
//! The TUI is a "thin client" - it doesn't contain any business logic.
//! All lifecycle decisions happen in the Conductor. The TUI's job is:
//! 1. Convert terminal events to SurfaceEvents
//! 2. Send SurfaceEvents to the Conductor task
//! 3. Receive ConductorMessages
//! 4. Render display state based on messages

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use weather_conductor::{
    AssistantBackend, Conductor, ConductorConfig, ConductorMessage, HttpBackend, QuerySource,
    SurfaceEvent, SurfaceType,
};

/// Capacity of the Conductor -> TUI channel
const MESSAGE_BUFFER: usize = 256;

/// Capacity of the TUI -> Conductor channel
const EVENT_BUFFER: usize = 64;

/// Client for communicating with the Conductor task
pub struct ConductorClient {
    /// Events to the Conductor
    events: mpsc::Sender<SurfaceEvent>,
    /// Receiver for messages from Conductor
    rx: mpsc::Receiver<ConductorMessage>,
    /// The Conductor task
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

impl ConductorClient {
    /// Spawn a Conductor talking HTTP to the configured backend
    pub fn from_config(config: ConductorConfig) -> anyhow::Result<Self> {
        let backend = HttpBackend::from_config(&config.backend)
            .context("failed to create weather backend")?;
        Ok(Self::spawn(backend, config))
    }

    /// Spawn a Conductor over any backend
    ///
    /// The task starts the Conductor, then serves events until the surface
    /// quits or drops its sender.
    pub fn spawn<B: AssistantBackend + 'static>(backend: B, config: ConductorConfig) -> Self {
        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        let (events, events_rx) = mpsc::channel(EVENT_BUFFER);

        let task = tokio::spawn(async move {
            let mut conductor = Conductor::new(backend, config, tx);
            conductor.start().await?;
            conductor.run(events_rx).await
        });

        Self {
            events,
            rx,
            task: Some(task),
        }
    }

    /// Connect this surface to the Conductor
    pub async fn connect(&self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::Connected {
            event_id: SurfaceEvent::new_event_id(),
            surface_type: SurfaceType::Tui,
        })
        .await
    }

    /// Submit a typed or preset query
    pub async fn submit(&self, text: String, source: QuerySource) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::SubmitQuery {
            event_id: SurfaceEvent::new_event_id(),
            text,
            source,
        })
        .await
    }

    /// User opened the voice screen
    pub async fn start_voice(&self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::VoiceCaptureStarted {
            event_id: SurfaceEvent::new_event_id(),
        })
        .await
    }

    /// Voice capture produced a transcript
    pub async fn voice_recognized(&self, text: String) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::VoiceRecognized {
            event_id: SurfaceEvent::new_event_id(),
            text,
        })
        .await
    }

    /// User closed the voice screen without a result
    pub async fn cancel_voice(&self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::VoiceCaptureCancelled {
            event_id: SurfaceEvent::new_event_id(),
        })
        .await
    }

    /// Leave the chat for the home view
    pub async fn navigate_back(&self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::navigate_back()).await
    }

    /// Notify Conductor that user wants to quit
    pub async fn request_quit(&self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::QuitRequested {
            event_id: SurfaceEvent::new_event_id(),
        })
        .await
    }

    /// Send raw surface event to Conductor
    pub async fn send_event(&self, event: SurfaceEvent) -> anyhow::Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| anyhow::anyhow!("conductor task has stopped"))
    }

    /// Receive all pending messages from the Conductor (non-blocking)
    pub fn recv_all(&mut self) -> Vec<ConductorMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Wait for the next message from the Conductor
    pub async fn recv(&mut self) -> Option<ConductorMessage> {
        self.rx.recv().await
    }

    /// Wait for the Conductor task to finish and surface its error, if any
    pub async fn finish(&mut self) -> anyhow::Result<()> {
        match self.task.take() {
            Some(task) => task.await.context("conductor task panicked")?,
            None => Ok(()),
        }
    }
}
