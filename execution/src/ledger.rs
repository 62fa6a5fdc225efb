//! Betting ledger.
//!
//! Records wagers against a player's balance and tracks whose turn it is. A rejected wager leaves
//! the player untouched, so a balance can never go below zero.

use derby_types::{racer_by_id, BettingPhase, Player, Racer, RacerId, Wager};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("wager amount must be positive")]
    ZeroAmount,
    #[error("insufficient balance (required={required}, available={available})")]
    InsufficientBalance { required: u64, available: u64 },
    #[error("unknown racer {0}")]
    UnknownRacer(RacerId),
    #[error("only a player with no tokens may pass (balance={balance})")]
    PassWithBalance { balance: u64 },
}

/// Debit `amount` from `player` and record the wager.
pub fn place_wager(
    player: &mut Player,
    racers: &[Racer],
    racer: RacerId,
    amount: u64,
    phase: BettingPhase,
) -> Result<Wager, LedgerError> {
    if racer_by_id(racers, racer).is_none() {
        return Err(LedgerError::UnknownRacer(racer));
    }
    if amount == 0 {
        return Err(LedgerError::ZeroAmount);
    }
    let remaining = player
        .balance
        .checked_sub(amount)
        .ok_or(LedgerError::InsufficientBalance {
            required: amount,
            available: player.balance,
        })?;

    let wager = Wager {
        racer,
        amount,
        phase,
    };
    player.balance = remaining;
    player.wagers.push(wager);
    Ok(wager)
}

/// Check that `player` may pass the betting window without wagering.
///
/// Passing is reserved for players whose balance is exhausted; it records nothing.
pub fn check_pass(player: &Player) -> Result<(), LedgerError> {
    if player.balance != 0 {
        return Err(LedgerError::PassWithBalance {
            balance: player.balance,
        });
    }
    Ok(())
}

/// Result of handing the turn to the next player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnAdvance {
    /// Another player still has to act.
    Next(usize),
    /// Every player has acted; the window is closed and the index is back at 0.
    Complete,
}

/// Strict round-robin over seated players, one active player at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnOrder {
    current: usize,
    players: usize,
}

impl TurnOrder {
    pub fn new(players: usize) -> Self {
        Self {
            current: 0,
            players,
        }
    }

    /// Index of the player expected to act.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn advance(&mut self) -> TurnAdvance {
        if self.current + 1 < self.players {
            self.current += 1;
            TurnAdvance::Next(self.current)
        } else {
            self.current = 0;
            TurnAdvance::Complete
        }
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use derby_types::{INITIAL_TOKENS, ROSTER};

    #[test]
    fn test_place_wager_debits_balance() {
        let mut player = Player::new(1);
        let wager = place_wager(&mut player, &ROSTER, 3, 4, BettingPhase::First).unwrap();
        assert_eq!(wager.amount, 4);
        assert_eq!(player.balance, INITIAL_TOKENS - 4);
        assert_eq!(player.wagers, vec![wager]);
    }

    #[test]
    fn test_place_wager_full_balance() {
        let mut player = Player::new(1);
        place_wager(&mut player, &ROSTER, 8, INITIAL_TOKENS, BettingPhase::Second).unwrap();
        assert_eq!(player.balance, 0);
    }

    #[test]
    fn test_rejected_wagers_leave_player_untouched() {
        let mut player = Player::new(1);
        let before = player.clone();

        assert_eq!(
            place_wager(&mut player, &ROSTER, 3, 0, BettingPhase::First),
            Err(LedgerError::ZeroAmount)
        );
        assert_eq!(
            place_wager(&mut player, &ROSTER, 3, INITIAL_TOKENS + 1, BettingPhase::First),
            Err(LedgerError::InsufficientBalance {
                required: INITIAL_TOKENS + 1,
                available: INITIAL_TOKENS,
            })
        );
        assert_eq!(
            place_wager(&mut player, &ROSTER, 9, 1, BettingPhase::First),
            Err(LedgerError::UnknownRacer(9))
        );
        assert_eq!(player, before);
    }

    #[test]
    fn test_pass_requires_empty_balance() {
        let mut player = Player::new(1);
        assert_eq!(
            check_pass(&player),
            Err(LedgerError::PassWithBalance {
                balance: INITIAL_TOKENS
            })
        );
        player.balance = 0;
        assert_eq!(check_pass(&player), Ok(()));
    }

    #[test]
    fn test_turn_order_wraps() {
        let mut turns = TurnOrder::new(3);
        assert_eq!(turns.current(), 0);
        assert_eq!(turns.advance(), TurnAdvance::Next(1));
        assert_eq!(turns.advance(), TurnAdvance::Next(2));
        assert_eq!(turns.advance(), TurnAdvance::Complete);
        assert_eq!(turns.current(), 0);
    }

    #[test]
    fn test_single_player_turn_completes_immediately() {
        let mut turns = TurnOrder::new(1);
        assert_eq!(turns.advance(), TurnAdvance::Complete);
        assert_eq!(turns.current(), 0);
    }
}
