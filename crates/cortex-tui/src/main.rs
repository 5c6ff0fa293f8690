use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use cortex_core::ai::SYSTEM_INSTRUCTION;
use cortex_core::{Config, GeminiClient, TurnExecutor};

mod app;
mod handler;
mod logging;
mod markdown;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "cortex", version)]
#[command(about = "Cortex - a terminal AI assistant for daily tasks and coding")]
struct Cli {
    /// Gemini model to use
    #[arg(short, long, env = "CORTEX_MODEL")]
    model: Option<String>,

    /// Override the Gemini API base URL
    #[arg(long, env = "CORTEX_BASE_URL")]
    base_url: Option<String>,

    /// Where to write logs
    #[arg(long, env = "CORTEX_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_file.as_deref())?;

    let config = Config::load().unwrap_or_else(|err| {
        warn!(error = %err, "could not load config file, using defaults");
        Config::new()
    });

    let model = cli.model.clone().unwrap_or_else(|| config.model_or_default());
    let base_url = cli.base_url.clone().unwrap_or_else(|| config.base_url_or_default());
    let api_key = config.resolve_api_key();

    info!(
        model = %model,
        base_url = %base_url,
        api_key_present = api_key.is_some(),
        "starting cortex"
    );
    if api_key.is_none() {
        warn!("no API key configured; turns will fail until GEMINI_API_KEY is set");
    }

    let has_api_key = api_key.is_some();
    let client = GeminiClient::new(api_key, &model, SYSTEM_INSTRUCTION).with_base_url(&base_url);
    let executor = TurnExecutor::new(Arc::new(client));
    let mut app = App::new(executor, &model, has_api_key);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    info!(messages = app.conversation.len(), "exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}
