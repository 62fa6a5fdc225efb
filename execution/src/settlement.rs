//! Settlement of closed betting state against the final winners.

use std::collections::BTreeSet;

use derby_types::{Player, PlayerId, RacerId, Wager};
use tracing::info;

use crate::logging::format_payouts;

/// Tokens credited to one player at settlement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerPayout {
    pub player: PlayerId,
    pub amount: u64,
    pub balance: u64,
}

/// Payout for a single wager: amount times the phase multiplier when the racer won.
///
/// Every winner pays in full; a wager is never split between tied racers.
pub fn wager_payout(wager: &Wager, winners: &BTreeSet<RacerId>) -> u64 {
    if wager.amount == 0 || !winners.contains(&wager.racer) {
        return 0;
    }
    wager.amount.saturating_mul(wager.phase.multiplier())
}

/// Credit every player's winnings and report what was paid.
pub fn settle(players: &mut [Player], winners: &BTreeSet<RacerId>) -> Vec<PlayerPayout> {
    let mut payouts = Vec::with_capacity(players.len());
    for player in players.iter_mut() {
        let amount = player
            .wagers
            .iter()
            .fold(0u64, |acc, wager| acc.saturating_add(wager_payout(wager, winners)));
        player.balance = player.balance.saturating_add(amount);
        payouts.push(PlayerPayout {
            player: player.id,
            amount,
            balance: player.balance,
        });
    }
    info!(
        winners = ?winners,
        payouts = %format_payouts(&payouts),
        "race settled"
    );
    payouts
}
