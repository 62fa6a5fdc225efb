//! Table controller.
//!
//! One task owns the [`RaceTable`] and consumes [`Command`]s serially: player actions, ticks from
//! the racing ticker and commentary arrivals. Every mutation is followed by a broadcast so clients
//! only ever observe committed state.

use std::sync::Arc;
use std::time::Duration;

use derby_execution::{LedgerError, RaceTable, RoundOutcome, TableError};
use derby_types::CommentaryPhase;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commentary::{
    generate_commentary, Commentator, CommentaryRequest, FIRST_BETTING_LINE, GREETING, RESET_LINE,
};
use crate::messages::{Action, OutboundEvent, PayoutView, RoundView, TableSnapshot};
use crate::ticker::{Tick, Ticker};

const COMMAND_QUEUE: usize = 256;

#[derive(Debug)]
pub enum Command {
    Apply {
        action: Action,
        reply: oneshot::Sender<Result<TableSnapshot, ControllerError>>,
    },
    Snapshot {
        reply: oneshot::Sender<TableSnapshot>,
    },
    Tick(Tick),
    Commentary {
        ticket: u64,
        text: String,
    },
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("controller stopped")]
    Closed,
}

impl ControllerError {
    /// Stable error code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ControllerError::Table(TableError::OutOfPhase { .. }) => "OUT_OF_PHASE",
            ControllerError::Table(TableError::InvalidPlayerCount { .. }) => {
                "INVALID_PLAYER_COUNT"
            }
            ControllerError::Table(TableError::Ledger(err)) => match err {
                LedgerError::ZeroAmount => "INVALID_AMOUNT",
                LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
                LedgerError::UnknownRacer(_) => "UNKNOWN_RACER",
                LedgerError::PassWithBalance { .. } => "PASS_NOT_ALLOWED",
            },
            ControllerError::Table(_) => "INTERNAL",
            ControllerError::Closed => "UNAVAILABLE",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ControllerSettings {
    pub round_interval: Duration,
    pub commentary_timeout: Duration,
}

/// Cloneable handle for submitting commands to the controller task.
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Command>,
}

impl ControllerHandle {
    /// Apply a player action and return the resulting snapshot.
    pub async fn apply(&self, action: Action) -> Result<TableSnapshot, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Apply { action, reply })
            .await
            .map_err(|_| ControllerError::Closed)?;
        rx.await.map_err(|_| ControllerError::Closed)?
    }

    pub async fn snapshot(&self) -> Result<TableSnapshot, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| ControllerError::Closed)?;
        rx.await.map_err(|_| ControllerError::Closed)
    }
}

pub struct Controller<C: Commentator> {
    table: RaceTable,
    rng: StdRng,
    commentator: Arc<C>,
    settings: ControllerSettings,
    events: broadcast::Sender<OutboundEvent>,
    commands: mpsc::WeakSender<Command>,
    ticker: Option<Ticker>,
    generation: u64,
    commentary: String,
    commentary_ticket: u64,
    commentary_pending: bool,
}

impl<C: Commentator> Controller<C> {
    /// Spawn the controller task for `table`.
    ///
    /// The task ends once every [`ControllerHandle`] is dropped and no racing segment is running.
    pub fn spawn(
        table: RaceTable,
        rng: StdRng,
        commentator: Arc<C>,
        settings: ControllerSettings,
        events: broadcast::Sender<OutboundEvent>,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let controller = Self {
            table,
            rng,
            commentator,
            settings,
            events,
            commands: tx.downgrade(),
            ticker: None,
            generation: 0,
            commentary: GREETING.to_string(),
            commentary_ticket: 0,
            commentary_pending: false,
        };
        let handle = tokio::spawn(controller.run(rx));
        (ControllerHandle { tx }, handle)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
        self.stop_ticker();
        info!("controller stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Apply { action, reply } => {
                let result = self
                    .apply(action)
                    .map(|()| self.snapshot())
                    .map_err(ControllerError::from);
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Tick(tick) => self.on_tick(tick),
            Command::Commentary { ticket, text } => self.on_commentary(ticket, text),
        }
    }

    fn apply(&mut self, action: Action) -> Result<(), TableError> {
        debug!(action = action.as_str(), phase = %self.table.phase(), "applying action");
        match action {
            Action::ConfirmPlayers { count } => {
                self.table.confirm_players(count)?;
                self.narrate(FIRST_BETTING_LINE);
            }
            Action::Wager { racer, amount } => {
                self.table.place_wager(racer, amount)?;
            }
            Action::Pass => self.table.pass()?,
            Action::StartRace => {
                self.table.start_race()?;
                self.start_ticker();
            }
            Action::Reset => {
                self.table.reset()?;
                self.narrate(RESET_LINE);
            }
        }
        self.publish_state();
        Ok(())
    }

    fn on_tick(&mut self, tick: Tick) {
        if !self.ticker.as_ref().is_some_and(|ticker| ticker.owns(tick)) {
            debug!(generation = tick.generation, "stale tick ignored");
            return;
        }
        match self.table.advance_round(&mut self.rng) {
            Ok(RoundOutcome::Continue) => self.publish_round(),
            Ok(RoundOutcome::Checkpoint) => {
                self.stop_ticker();
                self.publish_round();
                self.publish_state();
                self.request_commentary(CommentaryPhase::MidRace);
            }
            Ok(RoundOutcome::Finished(payouts)) => {
                self.stop_ticker();
                self.publish_round();
                self.publish(OutboundEvent::Settled {
                    winners: self.table.race().winners.iter().copied().collect(),
                    payouts: payouts.iter().map(PayoutView::from).collect(),
                });
                self.publish_state();
                self.request_commentary(CommentaryPhase::Finish);
            }
            Err(err) => {
                warn!(%err, "tick rejected, stopping ticker");
                self.stop_ticker();
            }
        }
    }

    fn on_commentary(&mut self, ticket: u64, text: String) {
        if ticket != self.commentary_ticket {
            debug!(ticket, current = self.commentary_ticket, "stale commentary dropped");
            return;
        }
        self.commentary = text.clone();
        self.commentary_pending = false;
        self.publish(OutboundEvent::Commentary { text });
    }

    fn start_ticker(&mut self) {
        self.stop_ticker();
        let Some(tx) = self.commands.upgrade() else {
            warn!("command queue closed, ticker not started");
            return;
        };
        self.generation = self.generation.wrapping_add(1);
        self.ticker = Some(Ticker::spawn(
            self.settings.round_interval,
            self.generation,
            tx,
            Command::Tick,
        ));
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    /// Replace the commentary with a fixed line, discarding any pending request.
    fn narrate(&mut self, text: &str) {
        self.commentary_ticket = self.commentary_ticket.wrapping_add(1);
        self.commentary_pending = false;
        self.commentary = text.to_string();
        self.publish(OutboundEvent::Commentary {
            text: self.commentary.clone(),
        });
    }

    fn request_commentary(&mut self, phase: CommentaryPhase) {
        self.commentary_ticket = self.commentary_ticket.wrapping_add(1);
        let Some(tx) = self.commands.upgrade() else {
            return;
        };
        self.commentary_pending = true;

        let ticket = self.commentary_ticket;
        let request = CommentaryRequest {
            phase,
            racers: self.table.racers().to_vec(),
            state: self.table.race().clone(),
            track_length: self.table.config().track_length,
        };
        let commentator = self.commentator.clone();
        let timeout = self.settings.commentary_timeout;
        tokio::spawn(async move {
            let text = generate_commentary(commentator.as_ref(), &request, timeout).await;
            let _ = tx.send(Command::Commentary { ticket, text }).await;
        });
    }

    fn snapshot(&self) -> TableSnapshot {
        let race = self.table.race();
        TableSnapshot {
            phase: self.table.phase(),
            round: race.round,
            track_length: self.table.config().track_length,
            positions: race.positions.clone(),
            winners: race.winners.iter().copied().collect(),
            players: self.table.players().to_vec(),
            current_player: self.table.current_turn(),
            commentary: self.commentary.clone(),
            commentary_pending: self.commentary_pending,
            racers: self.table.racers().to_vec(),
        }
    }

    fn publish_state(&self) {
        self.publish(OutboundEvent::State {
            payload: self.snapshot(),
        });
    }

    fn publish_round(&self) {
        let race = self.table.race();
        self.publish(OutboundEvent::Round {
            payload: RoundView {
                round: race.round,
                positions: race.positions.clone(),
                winners: race.winners.iter().copied().collect(),
            },
        });
    }

    fn publish(&self, event: OutboundEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}
