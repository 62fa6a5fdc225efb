//! Game phase state machine for a race table.
//!
//! [`RaceTable`] owns the players, the race state and the current [`GamePhase`], and sequences
//! the ledger, progression and settlement steps. It performs no I/O and keeps no clock: the
//! caller decides when to advance a round.
//!
//! ## Phases
//!
//! ```text
//! Setup --(players confirmed)--> BettingPhase1
//! BettingPhase1 --(every player acted)--> ReadyForInitialRace
//! ReadyForInitialRace --(race started)--> RacingInitialSegment
//! RacingInitialSegment --(checkpoint round reached)--> BettingPhase2
//! BettingPhase2 --(every player acted)--> ReadyForFinalRace
//! ReadyForFinalRace --(race started)--> RacingFinalSegment
//! RacingFinalSegment --(winner detected)--> Results
//! Results --(reset)--> BettingPhase1
//! ```
//!
//! Any action outside its phase is rejected with [`TableError::OutOfPhase`] and leaves the table
//! unchanged.
//!
//! A racer that crosses the line during the initial segment stays frozen at the finish until the
//! checkpoint; the race is only settled by the final segment.

use derby_types::{
    validate_roster, GamePhase, Player, PlayerId, RaceState, Racer, RacerInvariantError, Wager,
    CHECKPOINT_ROUND, INITIAL_TOKENS, MAX_PLAYERS, MIN_PLAYERS, TRACK_LENGTH,
};
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::{self, LedgerError, TurnAdvance, TurnOrder};
use crate::logging::{format_positions, format_racer_list};
use crate::progression;
use crate::settlement::{settle, PlayerPayout};

/// Table rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableConfig {
    /// Spaces from start to finish line.
    pub track_length: u32,
    /// Round at which the initial segment stops for the second betting window.
    pub checkpoint_round: u32,
    /// Tokens each player is seated with.
    pub initial_stake: u64,
    pub min_players: usize,
    pub max_players: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            track_length: TRACK_LENGTH,
            checkpoint_round: CHECKPOINT_ROUND,
            initial_stake: INITIAL_TOKENS,
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
        }
    }
}

impl TableConfig {
    /// Validate the configuration (all values must be > 0, player bounds ordered).
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.track_length == 0 {
            return Err("track_length must be greater than zero");
        }
        if self.checkpoint_round == 0 {
            return Err("checkpoint_round must be greater than zero");
        }
        if self.initial_stake == 0 {
            return Err("initial_stake must be greater than zero");
        }
        if self.min_players == 0 {
            return Err("min_players must be greater than zero");
        }
        if self.min_players > self.max_players {
            return Err("min_players must not exceed max_players");
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("{action} is not allowed during {phase}")]
    OutOfPhase {
        action: &'static str,
        phase: GamePhase,
    },
    #[error("player count {count} outside {min}..={max}")]
    InvalidPlayerCount {
        count: usize,
        min: usize,
        max: usize,
    },
    #[error("invalid wager: {0}")]
    Ledger(#[from] LedgerError),
    #[error("invalid table config: {0}")]
    InvalidConfig(&'static str),
    #[error("invalid roster: {0}")]
    InvalidRoster(#[from] RacerInvariantError),
}

/// Events that move the table between phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    PlayersConfirmed,
    BettingClosed,
    RaceStarted,
    CheckpointReached,
    WinnerDetected,
    Reset,
}

/// Determine the phase reached from `phase` on `event`.
///
/// Returns `None` when the event is not valid in that phase.
pub fn next_phase(phase: GamePhase, event: PhaseEvent) -> Option<GamePhase> {
    match (phase, event) {
        (GamePhase::Setup, PhaseEvent::PlayersConfirmed) => Some(GamePhase::BettingPhase1),
        (GamePhase::BettingPhase1, PhaseEvent::BettingClosed) => {
            Some(GamePhase::ReadyForInitialRace)
        }
        (GamePhase::ReadyForInitialRace, PhaseEvent::RaceStarted) => {
            Some(GamePhase::RacingInitialSegment)
        }
        (GamePhase::RacingInitialSegment, PhaseEvent::CheckpointReached) => {
            Some(GamePhase::BettingPhase2)
        }
        (GamePhase::BettingPhase2, PhaseEvent::BettingClosed) => Some(GamePhase::ReadyForFinalRace),
        (GamePhase::ReadyForFinalRace, PhaseEvent::RaceStarted) => {
            Some(GamePhase::RacingFinalSegment)
        }
        (GamePhase::RacingFinalSegment, PhaseEvent::WinnerDetected) => Some(GamePhase::Results),
        (GamePhase::Results, PhaseEvent::Reset) => Some(GamePhase::BettingPhase1),
        _ => None,
    }
}

/// When a racing segment ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopCondition {
    /// Stop once the round counter reaches the given round.
    Checkpoint(u32),
    /// Stop on the first round with at least one winner.
    Finish,
}

impl StopCondition {
    pub fn is_met(&self, state: &RaceState) -> bool {
        match self {
            StopCondition::Checkpoint(round) => state.round >= *round,
            StopCondition::Finish => state.has_winner(),
        }
    }
}

/// What a single round did to the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Keep racing.
    Continue,
    /// The initial segment stopped at the checkpoint; the second betting window is open.
    Checkpoint,
    /// At least one racer finished; payouts were credited.
    Finished(Vec<PlayerPayout>),
}

/// The single-table game state machine.
#[derive(Clone, Debug)]
pub struct RaceTable {
    config: TableConfig,
    racers: Vec<Racer>,
    players: Vec<Player>,
    race: RaceState,
    phase: GamePhase,
    turns: TurnOrder,
    stop: Option<StopCondition>,
}

impl RaceTable {
    pub fn new(config: TableConfig, racers: &[Racer]) -> Result<Self, TableError> {
        config.validate().map_err(TableError::InvalidConfig)?;
        validate_roster(racers)?;
        Ok(Self {
            config,
            racers: racers.to_vec(),
            players: Vec::new(),
            race: RaceState::new(racers),
            phase: GamePhase::Setup,
            turns: TurnOrder::new(0),
            stop: None,
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn racers(&self) -> &[Racer] {
        &self.racers
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn race(&self) -> &RaceState {
        &self.race
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Active racing segment's stop condition.
    pub fn stop_condition(&self) -> Option<StopCondition> {
        self.stop
    }

    /// Index of the player whose turn it is, while a betting window is open.
    pub fn current_turn(&self) -> Option<usize> {
        self.phase.betting_phase().map(|_| self.turns.current())
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_turn().and_then(|idx| self.players.get(idx))
    }

    /// Seat `count` players and open the first betting window.
    pub fn confirm_players(&mut self, count: usize) -> Result<(), TableError> {
        if self.phase != GamePhase::Setup {
            return Err(self.out_of_phase("confirm_players"));
        }
        if count < self.config.min_players || count > self.config.max_players {
            return Err(TableError::InvalidPlayerCount {
                count,
                min: self.config.min_players,
                max: self.config.max_players,
            });
        }
        self.players = (1..=count)
            .map(|seat| Player::with_stake(seat as PlayerId, self.config.initial_stake))
            .collect();
        self.turns = TurnOrder::new(count);
        self.transition(PhaseEvent::PlayersConfirmed)
    }

    /// Place the current player's wager and pass the turn.
    pub fn place_wager(&mut self, racer: u8, amount: u64) -> Result<Wager, TableError> {
        let Some(betting) = self.phase.betting_phase() else {
            return Err(self.out_of_phase("place_wager"));
        };
        let seat = self.turns.current();
        let player = &mut self.players[seat];
        let wager = match ledger::place_wager(player, &self.racers, racer, amount, betting) {
            Ok(wager) => wager,
            Err(err) => {
                warn!(player = player.id, racer, amount, %err, "wager rejected");
                return Err(err.into());
            }
        };
        info!(
            player = player.id,
            racer,
            amount,
            phase = u8::from(betting),
            balance = player.balance,
            wagered = player.total_wagered(),
            "wager placed"
        );
        self.advance_turn()?;
        Ok(wager)
    }

    /// Let a player with no tokens through the betting window without wagering.
    pub fn pass(&mut self) -> Result<(), TableError> {
        if self.phase.betting_phase().is_none() {
            return Err(self.out_of_phase("pass"));
        }
        let player = &self.players[self.turns.current()];
        if let Err(err) = ledger::check_pass(player) {
            warn!(player = player.id, %err, "pass rejected");
            return Err(err.into());
        }
        info!(player = player.id, "player passed");
        self.advance_turn()
    }

    /// Start the next racing segment and return its stop condition.
    pub fn start_race(&mut self) -> Result<StopCondition, TableError> {
        let stop = match self.phase {
            GamePhase::ReadyForInitialRace => {
                StopCondition::Checkpoint(self.config.checkpoint_round)
            }
            GamePhase::ReadyForFinalRace => StopCondition::Finish,
            _ => return Err(self.out_of_phase("start_race")),
        };
        self.transition(PhaseEvent::RaceStarted)?;
        self.stop = Some(stop);
        info!(round = self.race.round, ?stop, "race segment started");
        Ok(stop)
    }

    /// Advance every racer by one round and apply the segment's stop condition.
    ///
    /// Only the final segment settles: payouts are credited exactly once and the table moves to
    /// [`GamePhase::Results`].
    pub fn advance_round<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<RoundOutcome, TableError> {
        let stop = match (self.phase.is_racing(), self.stop) {
            (true, Some(stop)) => stop,
            _ => return Err(self.out_of_phase("advance_round")),
        };
        self.race = progression::advance_round(
            &self.race,
            &self.racers,
            self.config.track_length,
            rng,
        );
        if !stop.is_met(&self.race) {
            return Ok(RoundOutcome::Continue);
        }

        self.stop = None;
        if stop == StopCondition::Finish {
            self.transition(PhaseEvent::WinnerDetected)?;
            info!(
                round = self.race.round,
                winners = %format_racer_list(self.race.winners.iter().copied()),
                "race finished"
            );
            let payouts = settle(&mut self.players, &self.race.winners);
            return Ok(RoundOutcome::Finished(payouts));
        }

        self.transition(PhaseEvent::CheckpointReached)?;
        info!(
            round = self.race.round,
            positions = %format_positions(&self.race),
            "checkpoint reached"
        );
        Ok(RoundOutcome::Checkpoint)
    }

    /// Start a new race with the same players: wagers cleared, race zeroed, balances kept.
    pub fn reset(&mut self) -> Result<(), TableError> {
        if self.phase != GamePhase::Results {
            return Err(self.out_of_phase("reset"));
        }
        for player in self.players.iter_mut() {
            player.clear_wagers();
        }
        self.race.reset();
        self.turns.reset();
        self.transition(PhaseEvent::Reset)
    }

    fn advance_turn(&mut self) -> Result<(), TableError> {
        match self.turns.advance() {
            TurnAdvance::Next(_) => Ok(()),
            TurnAdvance::Complete => self.transition(PhaseEvent::BettingClosed),
        }
    }

    fn transition(&mut self, event: PhaseEvent) -> Result<(), TableError> {
        let Some(next) = next_phase(self.phase, event) else {
            return Err(self.out_of_phase("transition"));
        };
        info!(from = %self.phase, to = %next, ?event, "phase transition");
        self.phase = next;
        Ok(())
    }

    fn out_of_phase(&self, action: &'static str) -> TableError {
        warn!(action, phase = %self.phase, "action rejected");
        TableError::OutOfPhase {
            action,
            phase: self.phase,
        }
    }
}
