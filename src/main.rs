mod gateway;

use clap::{Parser, Subcommand};
use relay_assistants::OpenAiAssistants;
use relay_channels::discord::DiscordChannel;
use relay_core::{
    config::{self, RelayConfig},
    shellexpand,
    traits::{AssistantService, Channel},
};
use relay_memory::InMemorySessionStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "relay",
    version,
    about = "Relay: Discord conversations backed by OpenAI assistant threads"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and start relaying.
    Start,
    /// Check configuration and remote availability.
    Status,
    /// Send a one-shot prompt to the assistant on a fresh thread.
    Ask {
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let mut cfg = config::load(&cli.config)?;
    cfg.apply_env();

    let _log_guard = init_logging(&cfg.relay);

    match cli.command {
        Commands::Start => {
            cfg.validate()?;

            let assistant = Arc::new(OpenAiAssistants::from_config(&cfg.assistant)?);

            let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
            if let Some(ref dc) = cfg.channel.discord {
                let channel = DiscordChannel::new(dc.clone())?;
                channels.insert("discord".to_string(), Arc::new(channel));
            }

            let store = relay_memory::build_store(&cfg.memory).await?;
            let sessions = gateway::session::SessionDirectory::new(store);

            println!("{}: starting relay...", cfg.relay.name);
            let gw = Arc::new(gateway::Gateway::new(
                assistant,
                channels,
                sessions,
                &cfg.assistant,
                cfg.backfill.mode,
                cfg.relay.clone(),
            ));
            gw.run().await?;
        }
        Commands::Status => {
            println!("{}: status check\n", cfg.relay.name);
            println!("Config: {}", cli.config);
            println!(
                "Assistant: {}",
                if cfg.assistant.assistant_id.is_empty() {
                    "(unset)"
                } else {
                    cfg.assistant.assistant_id.as_str()
                }
            );
            println!("Sessions: {}", cfg.memory.backend.display_name());
            println!("Backfill: {:?}", cfg.backfill.mode);
            println!();

            if cfg.assistant.api_key.is_empty() {
                println!("  openai: missing api key");
            } else {
                let assistant = OpenAiAssistants::from_config(&cfg.assistant)?;
                let available = assistant.is_available().await;
                println!(
                    "  openai: {}",
                    if available { "reachable" } else { "unreachable" }
                );
            }

            match cfg.channel.discord {
                Some(ref dc) if dc.enabled && !dc.bot_token.is_empty() => {
                    let channel = DiscordChannel::new(dc.clone())?;
                    match channel.check_token().await {
                        Ok(user) => println!("  discord: connected as {user}"),
                        Err(e) => println!("  discord: token rejected ({e})"),
                    }
                }
                Some(ref dc) if dc.enabled => println!("  discord: enabled but missing bot_token"),
                Some(_) => println!("  discord: disabled"),
                None => println!("  discord: not configured"),
            }

            if let Err(e) = cfg.validate() {
                println!("\n{e}");
            }
        }
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: relay ask <message>");
            }
            if cfg.assistant.assistant_id.is_empty() || cfg.assistant.api_key.is_empty() {
                anyhow::bail!("ask needs ASSISTANT_ID and OPENAI_API_KEY to be set");
            }

            let prompt = message.join(" ");
            let assistant = Arc::new(OpenAiAssistants::from_config(&cfg.assistant)?);
            let sessions =
                gateway::session::SessionDirectory::new(Arc::new(InMemorySessionStore::new()));
            let gw = gateway::Gateway::new(
                assistant,
                HashMap::new(),
                sessions,
                &cfg.assistant,
                cfg.backfill.mode,
                cfg.relay.clone(),
            );
            let reply = gw.ask(&prompt).await?;
            println!("{reply}");
        }
    }

    Ok(())
}

/// Stdout logging, plus a daily-rolling file under `log_dir` when set.
///
/// `RUST_LOG` wins over the configured level. The returned guard must live
/// until exit so buffered file output is flushed.
fn init_logging(cfg: &RelayConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.as_str()));

    let (file_layer, guard) = match &cfg.log_dir {
        Some(dir) => {
            let dir = shellexpand(dir);
            std::fs::create_dir_all(&dir).ok();
            let appender = tracing_appender::rolling::daily(&dir, "relay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}
