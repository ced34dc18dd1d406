//! botgate CLI: run the gateway with a demo echo handler. Config from env
//! (`.env` supported); token can be passed on the command line.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use botgate_core::{init_tracing, Update};
use botgate_telegram::{BotConfig, BotInterface};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use update_chain::{ChainOutcome, UpdateAction, UpdateFilter};

#[derive(Parser)]
#[command(name = "botgate")]
#[command(about = "Bot API gateway: poll updates and dispatch them to handlers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run polling with a demo echo handler (config from env; token overrides BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Await the next message in a chat and print it (request/response demo).
    Await {
        #[arg(short, long)]
        chat: i64,
        #[arg(long, default_value = "60")]
        timeout_s: u64,
    },
}

/// Echoes message text back to its chat.
struct EchoAction {
    interface: Arc<BotInterface>,
}

#[async_trait]
impl UpdateAction for EchoAction {
    async fn run(&self, update: &Update) -> botgate_core::Result<ChainOutcome> {
        if let (Some(chat), Some(text)) = (update.chat_id(), update.text()) {
            self.interface.send_message(chat, text, None).await?;
            return Ok(ChainOutcome::Consumed);
        }
        Ok(ChainOutcome::Continue)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { token } => run(token).await,
        Commands::Await { chat, timeout_s } => await_message(chat, timeout_s).await,
    }
}

async fn build_interface(token: Option<String>) -> Result<Arc<BotInterface>> {
    let config = match token {
        Some(token) => BotConfig::with_token(token),
        None => BotConfig::from_env()?,
    };
    init_tracing(config.log_file.as_deref())?;
    let interface = Arc::new(BotInterface::create(config)?);

    match interface.get_me().await {
        Ok(me) => info!(username = ?me.username, id = me.id, "bot identified"),
        Err(e) => warn!(error = %e, "getMe failed; token may be invalid"),
    }
    Ok(interface)
}

async fn run(token: Option<String>) -> Result<()> {
    let interface = build_interface(token).await?;

    interface
        .register_handler(
            UpdateFilter::IsMessage,
            Arc::new(EchoAction {
                interface: Arc::clone(&interface),
            }),
        )
        .await;

    interface.start_polling()?;
    info!("polling; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    interface.stop_polling();
    info!(cursor = interface.cursor(), "stopped");
    Ok(())
}

async fn await_message(chat: i64, timeout_s: u64) -> Result<()> {
    let interface = build_interface(None).await?;
    interface.start_polling()?;

    let update = interface
        .await_next_update(
            chat,
            UpdateFilter::IsMessage,
            Duration::from_secs(timeout_s),
        )
        .await?;
    println!("update {}: {}", update.id, update.text().unwrap_or("<no text>"));

    interface.stop_polling();
    Ok(())
}
