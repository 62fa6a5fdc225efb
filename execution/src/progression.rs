//! Race progression engine.
//!
//! Advances every racer by one round. The engine has no notion of pacing or stopping; callers
//! inspect the returned state to decide whether to keep going.

use derby_types::{RaceState, Racer};
use rand::Rng;
use tracing::debug;

use crate::movement::draw_movement;

/// Compute the next round from `state`.
///
/// Racers already at the finish are frozen and draw nothing, so a finished racer cannot be
/// counted again. Positions are clamped to `track_length`. Winners are recomputed from scratch
/// and may hold several racers.
pub fn advance_round<R: Rng + ?Sized>(
    state: &RaceState,
    racers: &[Racer],
    track_length: u32,
    rng: &mut R,
) -> RaceState {
    let mut next = state.clone();
    for racer in racers {
        let position = next.positions.entry(racer.id).or_insert(0);
        if *position >= track_length {
            continue;
        }
        let step = draw_movement(racer.movement, rng);
        *position = position.saturating_add(step).min(track_length);
    }

    next.winners = next
        .positions
        .iter()
        .filter(|(_, position)| **position >= track_length)
        .map(|(id, _)| *id)
        .collect();
    next.round = state.round.saturating_add(1);

    debug!(
        round = next.round,
        positions = %crate::logging::format_positions(&next),
        winners = ?next.winners,
        "round advanced"
    );
    next
}
