mod action;
mod app;
mod config;
mod dom;
mod error;
mod event;
mod shortcuts;
mod tui;
mod ui;

use std::panic;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::dom::Site;
use crate::event::Event;
use crate::tui::EventHandler;

/// Drive Redmine keyboard shortcuts against a simulated site in the terminal.
#[derive(Parser, Debug)]
#[command(name = "blitz", version, about)]
struct Cli {
    /// Site fixture (TOML) describing the pages to browse
    fixture: PathBuf,

    /// Language tag for the shortcut labels, overriding the page's own
    #[arg(long)]
    lang: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let config = Config::load(cli.config.as_deref());
    let site = Site::load(&cli.fixture)?;
    let app = App::new(site, config, cli.lang.as_deref())?;

    // Run the application
    let result = run(app).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(mut app: App) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Ticks drive host scripts and watcher deadlines, so they run faster
    // than the chord timeout
    let tick_rate = Duration::from_millis(50);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    // Main loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
