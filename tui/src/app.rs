//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, mouse, resize)
//! - ConductorClient for orchestration
//! - DisplayState for rendering
//!
//! The App converts key presses into SurfaceEvents, applies incoming
//! ConductorMessages to its DisplayState and redraws. It never decides what
//! happens to an exchange.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use weather_conductor::home::PRESET_QUERIES;
use weather_conductor::{ConductorMessage, QuerySource, View};

use crate::conductor_client::ConductorClient;
use crate::display::DisplayState;
use crate::views::{self, InputView};

/// Redraw interval; drives the placeholder animation and the clock
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Lines scrolled per mouse wheel notch
const WHEEL_STEP: usize = 3;

/// What a key press asks the Conductor to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Nothing to send
    None,
    /// Submit a query
    Submit(String, QuerySource),
    /// Open the voice screen
    StartVoice,
    /// Send the voice transcript
    VoiceResult(String),
    /// Close the voice screen
    CancelVoice,
    /// Back to the home view
    NavigateBack,
    /// Leave the application
    Quit,
}

/// Surface-local input state
#[derive(Debug, Default)]
pub struct InputState {
    /// Text being typed (or the voice transcript)
    pub buffer: String,
    /// Highlighted preset on the home view
    pub selected_preset: usize,
    /// Chat scroll offset (lines from bottom, 0 = latest)
    pub scroll_offset: usize,
    /// Chat lines laid out on the last frame
    pub total_lines: usize,
    /// Chat viewport height on the last frame
    pub page: usize,
}

impl InputState {
    /// Translate a key press on `view` into an action, updating local state
    pub fn handle_key(&mut self, view: View, key: KeyEvent) -> KeyAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return KeyAction::Quit;
        }

        match (view, key.code) {
            (View::Listening, KeyCode::Esc) => {
                self.buffer.clear();
                KeyAction::CancelVoice
            }
            (View::Listening, KeyCode::Enter) => {
                let transcript = std::mem::take(&mut self.buffer);
                if transcript.trim().is_empty() {
                    KeyAction::None
                } else {
                    KeyAction::VoiceResult(transcript)
                }
            }

            (View::Home, KeyCode::Esc) => KeyAction::Quit,
            (View::Chat, KeyCode::Esc) => {
                self.buffer.clear();
                self.scroll_offset = 0;
                KeyAction::NavigateBack
            }

            (View::Home, KeyCode::Tab) => {
                self.selected_preset = (self.selected_preset + 1) % PRESET_QUERIES.len();
                KeyAction::None
            }
            (View::Home, KeyCode::BackTab) => {
                self.selected_preset =
                    (self.selected_preset + PRESET_QUERIES.len() - 1) % PRESET_QUERIES.len();
                KeyAction::None
            }

            (_, KeyCode::Enter) => {
                self.scroll_offset = 0;
                if self.buffer.trim().is_empty() {
                    self.buffer.clear();
                    if view == View::Home {
                        let preset = PRESET_QUERIES[self.selected_preset % PRESET_QUERIES.len()];
                        return KeyAction::Submit(preset.to_string(), QuerySource::Preset);
                    }
                    return KeyAction::None;
                }
                KeyAction::Submit(std::mem::take(&mut self.buffer), QuerySource::Typed)
            }

            (_, KeyCode::F(2)) => {
                self.buffer.clear();
                KeyAction::StartVoice
            }

            (_, KeyCode::Char(c)) => {
                self.buffer.push(c);
                KeyAction::None
            }
            (_, KeyCode::Backspace) => {
                self.buffer.pop();
                KeyAction::None
            }

            (View::Chat, KeyCode::PageUp) => {
                self.scroll_up(self.page.max(1) / 2 + 1);
                KeyAction::None
            }
            (View::Chat, KeyCode::PageDown) => {
                self.scroll_offset = self.scroll_offset.saturating_sub(self.page.max(1) / 2 + 1);
                KeyAction::None
            }

            _ => KeyAction::None,
        }
    }

    fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.total_lines.saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    fn view(&self) -> InputView<'_> {
        InputView {
            buffer: &self.buffer,
            selected_preset: self.selected_preset,
            scroll_offset: self.scroll_offset,
        }
    }
}

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,
    /// Goodbye message to show on exit
    goodbye_message: Option<String>,
    /// Client for communicating with the Conductor task
    conductor: ConductorClient,
    /// Display state derived from ConductorMessages
    display: DisplayState,
    /// Local input state
    input: InputState,
    /// Last frame time (for animations)
    last_frame: Instant,
}

impl App {
    /// Create a new App around a running Conductor
    pub fn new(conductor: ConductorClient) -> Self {
        Self {
            running: true,
            goodbye_message: None,
            conductor,
            display: DisplayState::new(),
            input: InputState::default(),
            last_frame: Instant::now(),
        }
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        if let Err(e) = self.conductor.connect().await {
            tracing::warn!(error = %e, "Conductor connect failed");
        }
        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(Event::Mouse(mouse))) => self.handle_mouse(mouse),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Terminal event error");
                        }
                        None => self.running = false,
                    }
                }

                msg = self.conductor.recv() => match msg {
                    Some(msg) => self.apply(msg),
                    None => {
                        tracing::info!("Conductor channel closed");
                        self.running = false;
                    }
                },

                _ = ticker.tick() => {}
            }

            for msg in self.conductor.recv_all() {
                self.apply(msg);
            }
            self.update();
            self.render(terminal)?;

            if self.display.quit_requested {
                self.running = false;
            }
        }

        self.conductor.finish().await
    }

    fn apply(&mut self, msg: ConductorMessage) {
        if let ConductorMessage::Quit { message } = &msg {
            self.goodbye_message.clone_from(message);
        }
        if matches!(msg, ConductorMessage::View { view: View::Home }) {
            self.input.scroll_offset = 0;
        }
        self.display.apply_message(msg);
    }

    /// Handle keyboard input
    async fn handle_key(&mut self, key: KeyEvent) {
        self.display.clear_notification();

        let action = self.input.handle_key(self.display.view, key);
        let result = match action {
            KeyAction::None => Ok(()),
            KeyAction::Submit(text, source) => self.conductor.submit(text, source).await,
            KeyAction::StartVoice => self.conductor.start_voice().await,
            KeyAction::VoiceResult(text) => self.conductor.voice_recognized(text).await,
            KeyAction::CancelVoice => self.conductor.cancel_voice().await,
            KeyAction::NavigateBack => self.conductor.navigate_back().await,
            KeyAction::Quit => {
                let result = self.conductor.request_quit().await;
                self.running = false;
                result
            }
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to reach conductor");
            self.running = false;
        }
    }

    /// Handle mouse input
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.display.view != View::Chat {
            return;
        }
        match mouse.kind {
            MouseEventKind::ScrollUp => self.input.scroll_up(WHEEL_STEP),
            MouseEventKind::ScrollDown => {
                self.input.scroll_offset = self.input.scroll_offset.saturating_sub(WHEEL_STEP);
            }
            _ => {}
        }
    }

    /// Update animations
    fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.display.update(delta);
    }

    /// Render the UI
    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let now = chrono::Local::now();
        let input = self.input.view();
        let mut total_lines = 0;
        let mut page = 0;
        terminal.draw(|frame| {
            page = frame.area().height.saturating_sub(views::INPUT_HEIGHT + 1) as usize;
            total_lines = views::render(frame, &self.display, &input, &now);
        })?;
        self.input.total_lines = total_lines;
        self.input.page = page;
        Ok(())
    }

    /// Get the goodbye message for display after TUI closes
    pub fn goodbye(&self) -> Option<&str> {
        self.goodbye_message.as_deref()
    }
}
