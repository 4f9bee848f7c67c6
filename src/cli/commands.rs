//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "piesplit")]
#[command(about = "piesplit - two-player split-the-pie bargaining experiment", long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a game at the terminal
    Play {
        /// Let an automated opponent play Player 2
        #[arg(long)]
        bot: bool,

        /// Smallest share the automated opponent accepts
        #[arg(short, long, default_value = "30")]
        threshold: u32,

        /// Disable the rules assistant
        #[arg(long)]
        no_chat: bool,
    },

    /// List stored sessions, or show the events of one
    History {
        /// Session ID to show
        session_id: Option<String>,
    },

    /// Write all stored sessions to an experiment export file
    Export {
        /// Output file
        #[arg(short, long, default_value = "vlaai_game_logs.json")]
        output: PathBuf,

        /// Experiment identifier (defaults to one derived from the time)
        #[arg(short, long)]
        experiment_id: Option<String>,

        /// Erase stored sessions after a successful export
        #[arg(long)]
        clear: bool,
    },

    /// Erase all stored sessions
    Clear,
}

impl Commands {
    /// Log level used when `RUST_LOG` is unset. Play shares the terminal with
    /// the game prompt, so it only logs warnings.
    pub fn default_log_level(&self) -> Level {
        match self {
            Commands::Play { .. } => Level::WARN,
            _ => Level::INFO,
        }
    }
}
