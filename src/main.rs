// main.rs

mod app;
mod attachments;
mod charts;
mod config;
mod errors;
mod forms;
mod handlers;
mod logging;
mod models;
mod nav;
mod parser;
mod queries;
mod store;
mod ui;
mod views;

use crate::app::App;
use crate::config::{Config, SCHEMA_VERSION};
use crate::store::Store;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    let _log_guard = logging::init_tracing(&config.log_dir(), &config.log_filter)?;

    // Nothing starts without the store
    let store = match Store::open(&config.database_path(), SCHEMA_VERSION).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, "database error");
            eprintln!("Error: {}", err);
            return Err(err.into());
        }
    };
    tracing::info!(
        path = %store.path().display(),
        version = store.stored_version().await?,
        "database ready"
    );

    let mut app = App::new(store, config.chrono_locale());
    app.initialize().await?;

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = ui::run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
