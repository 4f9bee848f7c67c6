//! piesplit CLI binary

use anyhow::Context;
use clap::Parser;
use piesplit::bargaining::ThresholdResponder;
use piesplit::chat::{ChatAssistant, OpenAiChatClient};
use piesplit::cli::{export_stored, history_lines, Cli, Commands, PieSplitApp};
use piesplit::config::Config;
use piesplit::session_log::{JsonFileStore, LogStore};
use piesplit::types::SessionId;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides the per-command default
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::default()
            .add_directive(cli.command.default_log_level().into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let mut store = JsonFileStore::in_dir(&config.storage.dir);
    tracing::debug!("Session log store at {}", store.path().display());

    match cli.command {
        Commands::Play {
            bot,
            threshold,
            no_chat,
        } => {
            let chat = if no_chat {
                None
            } else {
                match OpenAiChatClient::from_env(config.chat.clone()) {
                    Ok(client) => Some(ChatAssistant::new(
                        Arc::new(client),
                        config.chat.history_window,
                    )),
                    Err(e) => {
                        tracing::warn!("Rules assistant unavailable: {}", e);
                        None
                    }
                }
            };
            let bot = bot.then(|| ThresholdResponder::new(threshold));

            let app = PieSplitApp::new(&config, store, chat, bot)
                .context("failed to start game")?;
            tracing::info!("Playing game {}", app.session_id().await);
            app.run_interactive().await?;
        }

        Commands::History { session_id } => {
            let id = session_id.map(SessionId);
            for line in history_lines(&store, id.as_ref())? {
                println!("{}", line);
            }
        }

        Commands::Export {
            output,
            experiment_id,
            clear,
        } => {
            let export = export_stored(&mut store, &output, experiment_id, clear)
                .with_context(|| format!("failed to export to {}", output.display()))?;
            println!(
                "Exported {} session(s) as {} to {}",
                export.game_logs.len(),
                export.experiment_id,
                output.display()
            );
        }

        Commands::Clear => {
            store.clear().context("failed to clear stored sessions")?;
            println!("Cleared all stored sessions");
        }
    }

    Ok(())
}
