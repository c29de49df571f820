//! Home screen presentation
//!
//! Text the home view shows around the conversation: clock, date, current
//! weather lines, preset queries and the greeting. Everything here is a pure
//! function of its inputs so surfaces can call it on every frame.

use chrono::{DateTime, TimeZone};

use crate::backend::WeatherSnapshot;

/// Preset queries offered on the home view
pub const PRESET_QUERIES: [&str; 3] = ["오늘 날씨 어때?", "미세먼지 농도는?", "꽃가루 농도는?"];

/// Temperature shown before the snapshot arrives
pub const TEMPERATURE_PENDING: &str = "00°C";

/// Condition and detail text shown before the snapshot arrives
pub const WEATHER_PENDING: &str = "Loading...";

/// Default user name for the greeting
pub const DEFAULT_USER_NAME: &str = "나연";

/// `HH:MM`, 24-hour
pub fn format_clock<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%H:%M").to_string()
}

/// Short month, e.g. `Jun 7, Monday`
pub fn format_date<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%b %-d, %A").to_string()
}

/// Large temperature line
pub fn temperature_line(weather: Option<&WeatherSnapshot>) -> String {
    weather.map_or_else(
        || TEMPERATURE_PENDING.to_string(),
        |w| format!("{}°C", w.temp),
    )
}

/// Condition line
pub fn condition_line(weather: Option<&WeatherSnapshot>) -> String {
    weather.map_or_else(|| WEATHER_PENDING.to_string(), |w| w.condition.clone())
}

/// Feels-like / high / low line
pub fn detail_line(weather: Option<&WeatherSnapshot>) -> String {
    weather.map_or_else(
        || WEATHER_PENDING.to_string(),
        |w| {
            format!(
                "Feels like {}° | H: {}° L: {}°",
                w.feels_like, w.temp_max, w.temp_min
            )
        },
    )
}

/// Greeting shown above the presets
pub fn welcome_line(user_name: &str) -> String {
    format!("Hey {user_name}, welcome back!")
}
