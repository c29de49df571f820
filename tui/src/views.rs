//! View Rendering
//!
//! One render function per [`View`], plus the input box and status bar they
//! share. Everything here is a pure function of the display state and the
//! local input state, so it can be drawn onto a `TestBackend` in tests.

use chrono::{DateTime, Local};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

use weather_conductor::home::{format_clock, format_date, PRESET_QUERIES};
use weather_conductor::{ConductorState, NotifyLevel, View};

use crate::display::{conversation_lines, DisplayRole, DisplayState};
use crate::theme::{
    BOT_BLUE, CLOUD_WHITE, DIM_GRAY, ERROR_RED, GRAPH_ORANGE, LISTENING_CORAL, SKY_BRIGHT,
    SKY_DIM, SUN_YELLOW, THINKING_GRAY, USER_GREEN, WARNING_AMBER,
};

/// Input box height (lines), separator included
pub const INPUT_HEIGHT: u16 = 3;

/// Local state the surface owns (never sent to the Conductor)
#[derive(Clone, Copy, Debug)]
pub struct InputView<'a> {
    /// Text being typed (or the voice transcript on the listening screen)
    pub buffer: &'a str,
    /// Highlighted preset on the home view
    pub selected_preset: usize,
    /// Chat scroll offset (lines from bottom, 0 = latest)
    pub scroll_offset: usize,
}

/// Draw the whole screen
///
/// Returns the number of chat lines laid out, for scroll bounds.
pub fn render(
    frame: &mut Frame,
    display: &DisplayState,
    input: &InputView<'_>,
    now: &DateTime<Local>,
) -> usize {
    let [body, input_area, status_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(INPUT_HEIGHT),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let mut total_lines = 0;
    match display.view {
        View::Home => render_home(frame, body, display, input, now),
        View::Chat => total_lines = render_chat(frame, body, display, input),
        View::Listening => render_listening(frame, body, input),
    }

    if display.view != View::Listening {
        render_input(frame, input_area, input.buffer);
    }
    render_status(frame, status_area, display, input.scroll_offset);

    total_lines
}

fn render_home(
    frame: &mut Frame,
    area: Rect,
    display: &DisplayState,
    input: &InputView<'_>,
    now: &DateTime<Local>,
) {
    let [card, greeting, presets] = Layout::vertical([
        Constraint::Length(9),
        Constraint::Length(2),
        Constraint::Min(0),
    ])
    .areas(area);

    let card_lines = vec![
        Line::from(display.location_label.clone()).fg(SKY_DIM),
        Line::from(format_clock(now)).fg(SKY_BRIGHT).bold(),
        Line::from(format_date(now)).fg(SKY_DIM),
        Line::default(),
        Line::from(display.temperature()).fg(SKY_BRIGHT).bold(),
        Line::from(display.condition()).fg(CLOUD_WHITE),
        Line::from(display.details()).fg(SKY_DIM),
    ];
    frame.render_widget(
        Paragraph::new(card_lines)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(SKY_DIM)),
            ),
        card,
    );

    frame.render_widget(
        Paragraph::new(display.welcome())
            .alignment(Alignment::Center)
            .fg(CLOUD_WHITE),
        greeting,
    );

    let preset_lines: Vec<Line> = PRESET_QUERIES
        .iter()
        .enumerate()
        .map(|(i, query)| {
            if i == input.selected_preset {
                Line::from(format!("> {query}")).fg(SUN_YELLOW).bold()
            } else {
                Line::from(format!("  {query}")).fg(DIM_GRAY)
            }
        })
        .collect();
    frame.render_widget(
        Paragraph::new(preset_lines).alignment(Alignment::Center),
        presets,
    );
}

fn render_chat(
    frame: &mut Frame,
    area: Rect,
    display: &DisplayState,
    input: &InputView<'_>,
) -> usize {
    let width = area.width.saturating_sub(2) as usize;
    let height = area.height as usize;
    let lines = conversation_lines(&display.conversation, width, display.thinking_for);
    let total = lines.len();

    let max_scroll = total.saturating_sub(height);
    let scroll = input.scroll_offset.min(max_scroll);
    let visible_end = total.saturating_sub(scroll);
    let visible_start = visible_end.saturating_sub(height);

    let rendered: Vec<Line> = lines[visible_start..visible_end]
        .iter()
        .map(|line| {
            let style = match line.role {
                DisplayRole::User => Style::default().fg(USER_GREEN),
                DisplayRole::Bot if line.text.contains('❌') => Style::default().fg(ERROR_RED),
                DisplayRole::Bot => Style::default().fg(BOT_BLUE),
                DisplayRole::Thinking => Style::default()
                    .fg(THINKING_GRAY)
                    .add_modifier(Modifier::ITALIC),
                DisplayRole::Graph => Style::default().fg(GRAPH_ORANGE),
            };
            Line::from(Span::styled(line.text.clone(), style))
        })
        .collect();

    frame.render_widget(
        Paragraph::new(rendered).block(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT)
                .border_style(Style::default().fg(DIM_GRAY)),
        ),
        area,
    );

    total
}

fn render_listening(frame: &mut Frame, area: Rect, input: &InputView<'_>) {
    let transcript = if input.buffer.is_empty() {
        Line::from("Speak now...").fg(DIM_GRAY)
    } else {
        Line::from(input.buffer.to_string()).fg(CLOUD_WHITE)
    };
    let lines = vec![
        Line::from("Listening").fg(LISTENING_CORAL).bold(),
        Line::default(),
        transcript,
        Line::default(),
        Line::from("Enter to send | Esc to cancel").fg(DIM_GRAY),
    ];

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(LISTENING_CORAL)),
            ),
        area,
    );
}

fn render_input(frame: &mut Frame, area: Rect, buffer: &str) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    let room = usize::from(area.width).saturating_sub("You: _".len());
    frame.render_widget(
        Paragraph::new(format!("You: {}_", visible_tail(buffer, room)))
            .fg(USER_GREEN)
            .block(block),
        area,
    );
}

/// Longest suffix of `text` that fits in `width` terminal columns
fn visible_tail(text: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, ch) in text.char_indices().rev() {
        used += ch.width().unwrap_or(0);
        if used > width {
            return &text[idx + ch.len_utf8()..];
        }
    }
    text
}

fn render_status(frame: &mut Frame, area: Rect, display: &DisplayState, scroll_offset: usize) {
    if let Some(ref note) = display.notification {
        let color = match note.level {
            NotifyLevel::Info => SKY_BRIGHT,
            NotifyLevel::Warning => WARNING_AMBER,
            NotifyLevel::Error => ERROR_RED,
        };
        let text = match note.title {
            Some(ref title) => format!(" {title}: {}", note.message),
            None => format!(" {}", note.message),
        };
        frame.render_widget(Paragraph::new(text).fg(color), area);
        return;
    }

    let state_style = match display.conductor_state {
        ConductorState::Initializing | ConductorState::Thinking => Style::default().fg(SKY_BRIGHT),
        ConductorState::Listening => Style::default().fg(LISTENING_CORAL),
        _ => Style::default().fg(DIM_GRAY),
    };
    let hints = match display.view {
        View::Home => "Tab preset | F2 voice | Esc quit",
        View::Chat => "PgUp/PgDn scroll | F2 voice | Esc back",
        View::Listening => "Esc cancel",
    };
    let scroll_info = if scroll_offset > 0 {
        format!(" [^{scroll_offset} lines]")
    } else {
        String::new()
    };

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {}", display.conductor_state.description()), state_style),
            Span::styled(format!(" | {hints}{scroll_info}"), Style::default().fg(DIM_GRAY)),
        ])),
        area,
    );
}
