//! Terminal dashboard for the lumen smart light.
//!
//! Wires the pieces together: spawns the reconciliation engine as a
//! background task, sets the terminal up for rendering, and runs the main
//! event loop that turns key presses into intents and engine events into
//! screen updates.

mod app;
mod config;
mod input;
mod ui;

use std::io::{self, stdout};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lumen_core::api::ApiClient;
use lumen_core::engine::{Engine, today};
use lumen_core::messages::{Intent, UiEvent};
use lumen_core::session::{Session, TokenStore};

use app::App;
use config::Config;

#[derive(Parser)]
#[command(name = "lumen-tui")]
#[command(author, version, about = "Terminal dashboard for the lumen smart light", long_about = None)]
struct Cli {
    /// Base URL of the device-control API (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

/// Set up the terminal for TUI rendering.
///
/// Enables raw mode and switches to the alternate screen buffer.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal is busy drawing the dashboard; default to warnings only
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::load();
    let api_url = cli.api_url.unwrap_or_else(|| config.api_url.clone());
    info!(%api_url, "starting dashboard");

    let api = ApiClient::new(&api_url)?;
    let session = Session::new(TokenStore::new());

    // Create communication channels
    let (intent_tx, intent_rx) = mpsc::channel::<Intent>(32);
    let (event_tx, event_rx) = mpsc::channel::<UiEvent>(64);
    let cancel = CancellationToken::new();

    // Create and spawn the background engine
    let engine = Engine::new(
        api,
        session,
        config.engine_config(),
        intent_rx,
        event_tx,
        cancel.clone(),
    );
    let engine_handle = tokio::spawn(engine.run());

    // Create the application
    let mut app = App::new(event_rx, today());

    // Set up terminal
    let mut terminal = setup_terminal()?;

    // Run the main event loop
    let result = run_event_loop(&mut terminal, &mut app, &intent_tx).await;

    // Shut the engine down
    cancel.cancel();
    let _ = intent_tx.try_send(Intent::Shutdown);

    // Restore terminal
    restore_terminal()?;

    // Wait for the engine to complete
    let _ = engine_handle.await;

    result
}

/// Main event loop for the TUI.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    intent_tx: &mpsc::Sender<Intent>,
) -> Result<()> {
    while !app.should_quit {
        app.clean_expired_toasts();

        // Draw the UI
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for keyboard events with timeout
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = input::handle_key(app.screen, key.code);
            if let Some(intent) = input::apply_action(app, action) {
                let _ = intent_tx.try_send(intent);
            }
        }

        // Non-blocking receive of engine events
        while let Ok(event) = app.event_rx.try_recv() {
            app.handle_event(event);
        }
    }

    Ok(())
}
