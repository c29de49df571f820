//! Theme and Colors
//!
//! A sky palette for the home card, chat bubbles and the listening screen.

use ratatui::style::Color;

// ============================================================================
// Sky Palette
// ============================================================================

/// Clock and temperature on the home card
pub const SKY_BRIGHT: Color = Color::Rgb(135, 206, 250);

/// Borders and secondary text on the home card
pub const SKY_DIM: Color = Color::Rgb(70, 130, 180);

/// Weather condition text
pub const CLOUD_WHITE: Color = Color::Rgb(235, 240, 245);

/// Selected preset
pub const SUN_YELLOW: Color = Color::Rgb(255, 214, 102);

// ============================================================================
// Chat Colors
// ============================================================================

/// User messages
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// Assistant replies
pub const BOT_BLUE: Color = Color::Rgb(150, 180, 255);

/// Thinking placeholder
pub const THINKING_GRAY: Color = Color::Rgb(150, 150, 150);

/// Hourly temperature graph
pub const GRAPH_ORANGE: Color = Color::Rgb(255, 165, 90);

// ============================================================================
// UI Colors
// ============================================================================

/// Voice capture accent
pub const LISTENING_CORAL: Color = Color::Rgb(255, 127, 127);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Warning amber
pub const WARNING_AMBER: Color = Color::Rgb(255, 190, 80);
