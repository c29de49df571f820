//! Display State Types
//!
//! Types that represent the current display state for the TUI.
//! These are derived from ConductorMessages and used for rendering.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - it just renders what the Conductor tells it to.
//! The conversation arrives as whole snapshots, so there is nothing to merge:
//! the latest snapshot replaces the previous one.
//!
//! - DisplayLine: One wrapped, styled row of the chat view
//! - DisplayNotification: A transient banner
//! - DisplayState: Everything the renderer reads

use std::time::Duration;

use weather_conductor::home::{condition_line, detail_line, temperature_line, welcome_line};
use weather_conductor::location::LOCATION_PENDING;
use weather_conductor::{
    ConductorMessage, ConductorState, Conversation, Message, NotifyLevel, SessionId, View,
    WeatherGraphSeries, WeatherSnapshot,
};

/// Interval between ellipsis frames on the placeholder
pub const THINKING_FRAME: Duration = Duration::from_millis(400);

/// Glyphs used for the inline temperature graph, lowest to highest
const GRAPH_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Who a chat line belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRole {
    /// User input
    User,
    /// Assistant reply
    Bot,
    /// Thinking placeholder
    Thinking,
    /// Graph row under a reply
    Graph,
}

impl DisplayRole {
    /// Get the prefix for this role
    pub fn prefix(&self) -> &'static str {
        match self {
            DisplayRole::User => "You: ",
            DisplayRole::Bot => "Weather: ",
            DisplayRole::Thinking | DisplayRole::Graph => "",
        }
    }
}

/// A wrapped row of the chat view
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayLine {
    /// Whose message this row came from
    pub role: DisplayRole,
    /// Row text
    pub text: String,
}

impl DisplayLine {
    fn new(role: DisplayRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    fn blank() -> Self {
        Self::new(DisplayRole::Bot, String::new())
    }
}

/// `Thinking` followed by 0-3 dots depending on how long it has been shown
pub fn thinking_text(marker: &str, elapsed: Duration) -> String {
    let frame = elapsed.as_millis() / THINKING_FRAME.as_millis();
    let dots = usize::try_from(frame % 4).unwrap_or(0);
    format!("{marker}{}", ".".repeat(dots))
}

/// Render an hourly series as a row of block glyphs
pub fn sparkline_text(series: &WeatherGraphSeries) -> String {
    let Some((lo, hi)) = series.range() else {
        return String::new();
    };
    let span = hi - lo;
    let top = (GRAPH_GLYPHS.len() - 1) as f64;
    series
        .hourly_temps
        .iter()
        .map(|&t| {
            let level = if span > f64::EPSILON {
                ((t - lo) / span * top).round()
            } else {
                top / 2.0
            };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let index = (level.max(0.0) as usize).min(GRAPH_GLYPHS.len() - 1);
            GRAPH_GLYPHS[index]
        })
        .collect()
}

/// Caption printed next to the graph
pub fn graph_caption(series: &WeatherGraphSeries) -> String {
    match series.range() {
        Some((lo, hi)) => format!("{lo:.0}°..{hi:.0}° over {}h", series.len()),
        None => String::new(),
    }
}

/// Build the wrapped rows for a conversation snapshot
///
/// `thinking_for` is how long the placeholder has been visible, which drives
/// the ellipsis animation.
pub fn conversation_lines(
    conversation: &Conversation,
    width: usize,
    thinking_for: Duration,
) -> Vec<DisplayLine> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for message in conversation.messages() {
        match message {
            Message::User { text, .. } => {
                push_wrapped(&mut lines, DisplayRole::User, text, width);
            }
            Message::Bot { text, graph, .. } => {
                push_wrapped(&mut lines, DisplayRole::Bot, text, width);
                if let Some(graph) = graph.as_ref().filter(|g| !g.is_empty()) {
                    lines.push(DisplayLine::new(DisplayRole::Graph, sparkline_text(graph)));
                    lines.push(DisplayLine::new(DisplayRole::Graph, graph_caption(graph)));
                }
            }
            Message::Placeholder { marker, .. } => {
                lines.push(DisplayLine::new(
                    DisplayRole::Thinking,
                    thinking_text(marker, thinking_for),
                ));
            }
        }
        lines.push(DisplayLine::blank());
    }

    lines
}

fn push_wrapped(lines: &mut Vec<DisplayLine>, role: DisplayRole, text: &str, width: usize) {
    let content = format!("{}{}", role.prefix(), text);
    for row in textwrap::wrap(&content, width) {
        lines.push(DisplayLine::new(role, row.into_owned()));
    }
}

/// A notification to display
#[derive(Clone, Debug)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NotifyLevel,
    /// Optional title
    pub title: Option<String>,
    /// Message content
    pub message: String,
}

/// The full display state for the TUI
#[derive(Debug)]
pub struct DisplayState {
    /// Current screen
    pub view: View,
    /// Latest conversation snapshot
    pub conversation: Conversation,
    /// Location label on the home card
    pub location_label: String,
    /// Current weather (absent until fetched)
    pub weather: Option<WeatherSnapshot>,
    /// Name used in the welcome line
    pub user_name: String,
    /// Session the surface is attached to
    pub session_id: Option<SessionId>,
    /// Conductor state
    pub conductor_state: ConductorState,
    /// Pending notification (if any)
    pub notification: Option<DisplayNotification>,
    /// Time the current placeholder has been on screen
    pub thinking_for: Duration,
    /// Set once the Conductor asks the surface to quit
    pub quit_requested: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            view: View::Home,
            conversation: Conversation::new(),
            location_label: LOCATION_PENDING.to_string(),
            weather: None,
            user_name: String::new(),
            session_id: None,
            conductor_state: ConductorState::Initializing,
            notification: None,
            thinking_for: Duration::ZERO,
            quit_requested: false,
        }
    }
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a ConductorMessage to update display state
    pub fn apply_message(&mut self, msg: ConductorMessage) {
        match msg {
            ConductorMessage::Conversation { snapshot } => {
                if !snapshot.has_placeholder() {
                    self.thinking_for = Duration::ZERO;
                }
                self.conversation = snapshot;
            }
            ConductorMessage::View { view } => {
                self.view = view;
            }
            ConductorMessage::Location { label } => {
                self.location_label = label;
            }
            ConductorMessage::Weather { snapshot } => {
                self.weather = Some(snapshot);
            }
            ConductorMessage::SessionInfo {
                session_id,
                user_name,
            } => {
                self.session_id = Some(session_id);
                self.user_name = user_name;
            }
            ConductorMessage::State { state } => {
                self.conductor_state = state;
            }
            ConductorMessage::Notify {
                level,
                title,
                message,
            } => {
                self.notification = Some(DisplayNotification {
                    level,
                    title,
                    message,
                });
            }
            ConductorMessage::Quit { message } => {
                self.quit_requested = true;
                if let Some(msg) = message {
                    self.notification = Some(DisplayNotification {
                        level: NotifyLevel::Info,
                        title: Some("Goodbye".to_string()),
                        message: msg,
                    });
                }
            }
            ConductorMessage::Ack { .. } => {}
        }
    }

    /// Advance the placeholder animation clock
    pub fn update(&mut self, delta: Duration) {
        if self.conversation.has_placeholder() {
            self.thinking_for += delta;
        }
    }

    /// Clear the notification
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }

    /// Whether an exchange is in flight
    pub fn is_thinking(&self) -> bool {
        self.conductor_state == ConductorState::Thinking
    }

    /// `"{temp}°C"` or the pending marker
    pub fn temperature(&self) -> String {
        temperature_line(self.weather.as_ref())
    }

    /// Condition or the pending marker
    pub fn condition(&self) -> String {
        condition_line(self.weather.as_ref())
    }

    /// Feels-like / high / low line
    pub fn details(&self) -> String {
        detail_line(self.weather.as_ref())
    }

    /// Greeting for the home card
    pub fn welcome(&self) -> String {
        welcome_line(&self.user_name)
    }
}
