use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use url::Url;

use tunebot::cli::{Cli, Commands};
use tunebot::console::{fallback_name, ConsoleMessenger};
use tunebot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramMessenger};
use tunecore::core::{init_logger, log_startup_configuration};
use tunecore::download::{FfprobeProbe, HttpTransport};
use tunecore::{config, ConversationId, Messenger, Pipeline, PipelineConfig, RequestRunner, TrackRequest, UrlScanParser};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // .env first, so LOG_FILE_PATH and friends can come from it
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Fetch { url, output }) => run_fetch(&url, output).await,
    }
}

fn build_pipeline(messenger: Arc<dyn Messenger>) -> Result<Pipeline> {
    Ok(Pipeline::new(
        messenger,
        Arc::new(HttpTransport::new()?),
        Arc::new(FfprobeProbe::new()),
        Arc::new(UrlScanParser),
        PipelineConfig::default(),
    ))
}

async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration();

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(bot.clone()));
    let runner = RequestRunner::from_env(Arc::new(build_pipeline(messenger)?));
    log::info!("Accepting up to {} requests at once", runner.available());

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, schema(HandlerDeps::new(runner)))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

async fn run_fetch(raw_url: &str, output: PathBuf) -> Result<()> {
    let url = Url::parse(raw_url).map_err(|e| anyhow::anyhow!("Invalid URL {}: {}", raw_url, e))?;
    fs_err::create_dir_all(&output)?;

    let console = Arc::new(ConsoleMessenger::new(&output, fallback_name(&url)));
    let pipeline = build_pipeline(console.clone())?;

    let outcome = pipeline
        .run_track(TrackRequest {
            url,
            conversation: ConversationId(0),
            message: None,
        })
        .await;

    match outcome.error() {
        None => {
            if let Some(path) = console.delivered() {
                log::info!("Saved to {}", path.display());
            }
            Ok(())
        }
        Some(err) => Err(anyhow::anyhow!("Download failed ({}): {}", err.subcategory(), err)),
    }
}
