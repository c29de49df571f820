//! Weather assistant terminal client
//!
//! Loads configuration, spawns the Conductor and runs the TUI until the user
//! quits. Logs go to a file so they never draw over the alternate screen.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use weather_conductor::ConductorConfig;
use weather_tui::{App, ConductorClient};

const LOG_FILE: &str = "weather-tui.log";
const DEFAULT_FILTER: &str = "weather_conductor=info,weather_tui=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_logging()?;

    let config = ConductorConfig::load()?;
    tracing::info!(
        source = ?config.source(),
        backend = %config.backend.base_url,
        "Configuration loaded"
    );

    let client = ConductorClient::from_config(config)?;

    let mut terminal = setup_terminal()?;
    let mut app = App::new(client);
    let result = app.run(&mut terminal).await;
    restore_terminal(&mut terminal)?;

    if let Some(goodbye) = app.goodbye() {
        println!("{goodbye}");
    }
    if let Err(ref e) = result {
        tracing::error!(error = %e, "Application exited with error");
    }
    result
}

fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("weather-assistant")
}

/// File logger, filtered by `RUST_LOG`
fn init_logging() -> anyhow::Result<WorkerGuard> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;

    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(dir.join(LOG_FILE))?;
    let (writer, guard) = non_blocking(file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry().with(file_layer).try_init()?;
    Ok(guard)
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        default_hook(info);
    }));

    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
