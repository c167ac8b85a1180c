use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tier5_bus::{EventBus, Topic};
use tier5_client::HttpReviewApi;
use tier5_console::Console;
use tier5_core::load_config;
use tier5_schema::ConsoleEvent;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "tier5-console", version, about = "Headless reviewer correction console")]
struct Cli {
    #[arg(long, default_value = "config/console.yaml", help = "Console config file")]
    config: PathBuf,

    #[arg(long, help = "Load once, log the queue summary and exit")]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let (file_layer, _guard) = match &config.logging.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "tier5-console.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    let api = HttpReviewApi::new(
        config.api.base_url.clone(),
        config.api.reviewer_id.clone(),
        Duration::from_secs(config.api.timeout_secs),
    );
    tracing::info!(api_base = %api.api_base(), "starting console");

    let bus = EventBus::new(64);
    let mut toasts = bus.subscribe(Topic::Toast).await;
    let mut relogin = bus.subscribe(Topic::ReloginRequired).await;
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = toasts.recv() => {
                    if let ConsoleEvent::Toast { level, message } = event {
                        tracing::info!(?level, "{message}");
                    }
                }
                Some(_) = relogin.recv() => {
                    tracing::warn!("review service rejected the reviewer; update api.reviewer_id and log in again");
                }
                else => break,
            }
        }
    });

    let mut console = Console::new(Arc::new(api), config, bus.publisher());
    console.start().await;
    log_summary(&console);

    if cli.once {
        return Ok(());
    }

    console
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    log_summary(&console);
    Ok(())
}

fn log_summary(console: &Console) {
    tracing::info!(
        pending = console.queue().len(),
        page = console.page(),
        has_more = console.has_more(),
        corrected = console.corrected().len(),
        selected = console.editor().selected_prompt_id().unwrap_or("-"),
        "queue summary"
    );
}
