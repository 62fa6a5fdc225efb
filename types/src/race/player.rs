use serde::Serialize;

use super::{RacerId, FIRST_PHASE_MULTIPLIER, INITIAL_TOKENS, SECOND_PHASE_MULTIPLIER};

/// Player identifier (1-based seat number).
pub type PlayerId = u32;

/// Betting window a wager was placed in.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum BettingPhase {
    /// Before the race starts.
    First = 1,
    /// At the checkpoint after the initial segment.
    Second = 2,
}

impl BettingPhase {
    /// Winnings multiplier applied to the wagered amount (includes the stake).
    pub fn multiplier(self) -> u64 {
        match self {
            BettingPhase::First => FIRST_PHASE_MULTIPLIER,
            BettingPhase::Second => SECOND_PHASE_MULTIPLIER,
        }
    }
}

impl From<BettingPhase> for u8 {
    fn from(phase: BettingPhase) -> Self {
        phase as u8
    }
}

/// A player's commitment of tokens to a racer within a betting window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Wager {
    pub racer: RacerId,
    pub amount: u64,
    pub phase: BettingPhase,
}

/// Player state for a session at the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub balance: u64,
    pub wagers: Vec<Wager>,
}

impl Player {
    /// Create a player seated at `id` with the default stake.
    pub fn new(id: PlayerId) -> Self {
        Self::with_stake(id, INITIAL_TOKENS)
    }

    pub fn with_stake(id: PlayerId, stake: u64) -> Self {
        Self {
            id,
            name: format!("플레이어 {id}"),
            balance: stake,
            wagers: Vec::new(),
        }
    }

    /// Total tokens currently committed across all wagers.
    pub fn total_wagered(&self) -> u64 {
        self.wagers
            .iter()
            .fold(0u64, |acc, wager| acc.saturating_add(wager.amount))
    }

    /// Drop all wagers; the balance is kept as is.
    pub fn clear_wagers(&mut self) {
        self.wagers.clear();
    }
}
