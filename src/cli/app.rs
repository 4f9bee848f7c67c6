//! piesplit application: binds player intents to the engine, log and assistant

use crate::bargaining::{BargainingEngine, Phase, Resolution, ThresholdResponder};
use crate::chat::ChatAssistant;
use crate::config::Config;
use crate::error::{ErrorKind, PieError, Result};
use crate::export::ExperimentExport;
use crate::session_log::{load_events, LogStore, SessionLog, StoredSession};
use crate::types::{Clock, Player, SessionId, SystemClock};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use super::intent::{Intent, HELP};

/// Default export file name
pub const DEFAULT_EXPORT_FILE: &str = "vlaai_game_logs.json";

/// One running game with its collaborators
#[derive(Clone)]
pub struct PieSplitApp<S: LogStore + Clone + 'static> {
    store: S,
    engine: Arc<Mutex<BargainingEngine>>,
    chat: Option<ChatAssistant>,
    bot: Option<ThresholdResponder>,
}

impl<S: LogStore + Clone + 'static> PieSplitApp<S> {
    /// Start a new game logging into `store`
    pub fn new(
        config: &Config,
        store: S,
        chat: Option<ChatAssistant>,
        bot: Option<ThresholdResponder>,
    ) -> Result<Self> {
        let session_id = SessionId::generate();
        let clock = SystemClock;
        let log = SessionLog::new(store.clone(), session_id.clone(), clock.now());
        let engine = BargainingEngine::start(
            session_id,
            config.game,
            Box::new(log),
            Box::new(clock),
        )?;

        Ok(Self {
            store,
            engine: Arc::new(Mutex::new(engine)),
            chat,
            bot,
        })
    }

    /// Get the bargaining engine
    pub fn engine(&self) -> Arc<Mutex<BargainingEngine>> {
        self.engine.clone()
    }

    pub async fn session_id(&self) -> SessionId {
        self.engine.lock().await.session().session_id.clone()
    }

    pub async fn status(&self) -> String {
        self.engine.lock().await.status_message()
    }

    /// Current player offers to keep `amount_kept`
    pub async fn offer(&self, amount_kept: i64) -> Result<Vec<String>> {
        let mut engine = self.engine.lock().await;
        let offer = engine.submit_offer(amount_kept)?;

        let mut lines = vec![format!(
            "Round {}: {} offered to keep {}",
            engine.state().round_number(),
            offer.offering_player,
            offer.amount_kept
        )];
        self.drive_bot(&mut engine, &mut lines)?;
        lines.push(engine.status_message());
        Ok(lines)
    }

    /// Current player accepts or rejects the pending offer
    pub async fn respond(&self, accepted: bool) -> Result<Vec<String>> {
        let mut engine = self.engine.lock().await;
        let responder = engine.state().active_player();
        let resolution = engine.respond(accepted)?;

        let mut lines = vec![describe(responder, resolution)];
        self.drive_bot(&mut engine, &mut lines)?;
        lines.push(engine.status_message());
        Ok(lines)
    }

    /// Events of the current game, oldest first
    pub async fn history(&self) -> Vec<String> {
        self.engine
            .lock()
            .await
            .events()
            .iter()
            .map(|e| e.kind.describe(e.round_number))
            .collect()
    }

    /// Write every stored session plus the current game and chat to `path`
    pub async fn export(&self, path: &Path, experiment_id: Option<String>) -> Result<ExperimentExport> {
        let transcript = match &self.chat {
            Some(chat) => Some(chat.transcript().await),
            None => None,
        };

        let mut engine = self.engine.lock().await;
        engine.flush_log();
        let current = engine.export_session(transcript.as_ref());
        let game_logs = self.store.read_all()?;
        drop(engine);

        let completed_at = Utc::now();
        let export = ExperimentExport::assemble(
            experiment_id.unwrap_or_else(|| ExperimentExport::default_id(completed_at)),
            completed_at,
            game_logs,
            Some(current),
        );
        export.write_to(path)?;
        Ok(export)
    }

    /// Run one intent other than chat and quit
    pub async fn handle(&self, intent: Intent) -> Result<Vec<String>> {
        match intent {
            Intent::Offer(amount) => self.offer(amount).await,
            Intent::Accept => self.respond(true).await,
            Intent::Reject => self.respond(false).await,
            Intent::Status => Ok(vec![self.status().await]),
            Intent::History => Ok(self.history().await),
            Intent::Export(path) => {
                let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
                self.export(&path, None).await?;
                Ok(vec![format!("Exported to {}", path.display())])
            }
            Intent::Help => Ok(HELP.iter().map(|l| l.to_string()).collect()),
            Intent::Ask(_) | Intent::Quit => Err(PieError::Internal(
                "chat and quit are handled by the input loop".to_string(),
            )),
        }
    }

    /// Read commands from stdin until `quit` or end of input
    pub async fn run_interactive(&self) -> Result<()> {
        let result = self.input_loop().await;
        self.leave().await;
        result
    }

    /// Persist whatever the session log still owes the store
    pub async fn leave(&self) {
        let mut engine = self.engine.lock().await;
        engine.flush_log();
        tracing::info!("Leaving game {}", engine.session().session_id);
    }

    async fn input_loop(&self) -> Result<()> {
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        if let Some(chat) = &self.chat {
            if let Some(greeting) = chat.transcript().await.messages().first() {
                println!("Assistant: {}", greeting.text);
            }
        }
        println!("{}", self.status().await);
        println!("Type 'help' for a list of commands.");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match Intent::parse(&line) {
                        Ok(Intent::Quit) => break,
                        Ok(Intent::Ask(text)) => self.spawn_chat(text, reply_tx.clone()),
                        Ok(intent) => match self.handle(intent).await {
                            Ok(output) => output.iter().for_each(|l| println!("{}", l)),
                            Err(e) => report(&e),
                        },
                        Err(usage) => println!("{}", usage),
                    }
                }
                Some(reply) = reply_rx.recv() => println!("{}", reply),
            }
        }

        Ok(())
    }

    /// Ask the assistant without holding up the game
    fn spawn_chat(&self, text: String, replies: mpsc::UnboundedSender<String>) {
        let Some(chat) = self.chat.clone() else {
            println!("The rules assistant is disabled.");
            return;
        };
        if chat.is_busy() {
            println!("{}", PieError::ChatBusy);
            return;
        }

        tokio::spawn(async move {
            let message = match chat.ask(&text).await {
                Ok(reply) => format!("Assistant: {}", reply),
                Err(e) => e.to_string(),
            };
            let _ = replies.send(message);
        });
    }

    /// Let the automated opponent take every turn that is Player 2's
    fn drive_bot(&self, engine: &mut BargainingEngine, lines: &mut Vec<String>) -> Result<()> {
        let Some(bot) = self.bot else {
            return Ok(());
        };
        let total = engine.rules().total_share;

        loop {
            match engine.phase() {
                Phase::AwaitingResponse(offer) if engine.state().active_player() == Player::Player2 => {
                    let accepted = bot.accepts(&offer, total);
                    let resolution = engine.respond(accepted)?;
                    lines.push(describe(Player::Player2, resolution));
                }
                Phase::AwaitingOffer(Player::Player2) => {
                    let offer = engine.submit_offer(i64::from(bot.proposal(total)))?;
                    lines.push(format!(
                        "Round {}: {} offered to keep {}",
                        engine.state().round_number(),
                        offer.offering_player,
                        offer.amount_kept
                    ));
                }
                _ => return Ok(()),
            }
        }
    }
}

fn describe(responder: Player, resolution: Resolution) -> String {
    match resolution {
        Resolution::Accepted(shares) => format!(
            "{} accepted. Player 1 gets {}, Player 2 gets {}",
            responder, shares.player1, shares.player2
        ),
        Resolution::Rejected {
            next_offerer,
            round_number,
        } => format!(
            "{} rejected. Round {}: {} offers next",
            responder, round_number, next_offerer
        ),
        Resolution::RoundLimitReached => format!("{} rejected the final offer", responder),
    }
}

fn report(error: &PieError) {
    match error.kind() {
        ErrorKind::Validation => println!("{}", error),
        _ => {
            tracing::warn!("{}", error);
            println!("Something went wrong: {}", error);
        }
    }
}

/// Lines describing stored sessions, or one session's events
pub fn history_lines<S: LogStore>(store: &S, session_id: Option<&SessionId>) -> Result<Vec<String>> {
    if let Some(id) = session_id {
        let events = load_events(store, id)?;
        if events.is_empty() {
            return Ok(vec![format!("No events stored for {}", id)]);
        }
        return Ok(events
            .iter()
            .map(|e| format!("{}  {}", e.timestamp.to_rfc3339(), e.kind.describe(e.round_number)))
            .collect());
    }

    let sessions = store.read_all()?;
    if sessions.is_empty() {
        return Ok(vec!["No stored sessions".to_string()]);
    }
    Ok(sessions.iter().map(summarize).collect())
}

fn summarize(session: &StoredSession) -> String {
    let outcome = session
        .final_outcome
        .map(|o| o.to_string())
        .unwrap_or_else(|| "in progress".to_string());
    format!(
        "{}  started {}  {} event(s)  {}",
        session.game_id,
        session.timestamp.to_rfc3339(),
        session.rounds.len(),
        outcome
    )
}

/// Export every stored session, optionally clearing the store afterwards
pub fn export_stored<S: LogStore>(
    store: &mut S,
    output: &Path,
    experiment_id: Option<String>,
    clear: bool,
) -> Result<ExperimentExport> {
    let completed_at = Utc::now();
    let export = ExperimentExport::assemble(
        experiment_id.unwrap_or_else(|| ExperimentExport::default_id(completed_at)),
        completed_at,
        store.read_all()?,
        None,
    );
    export.write_to(output)?;

    if clear {
        store.clear()?;
        tracing::info!("Cleared stored sessions after export");
    }
    Ok(export)
}
