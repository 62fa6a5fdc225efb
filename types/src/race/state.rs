use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{Racer, RacerId};

/// Positions, round counter and winners of the race in progress.
///
/// Ordered maps keep snapshots and logs stable across runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RaceState {
    pub positions: BTreeMap<RacerId, u32>,
    pub round: u32,
    pub winners: BTreeSet<RacerId>,
}

impl RaceState {
    /// Zeroed state with every racer on the start line.
    pub fn new(racers: &[Racer]) -> Self {
        Self {
            positions: racers.iter().map(|racer| (racer.id, 0)).collect(),
            round: 0,
            winners: BTreeSet::new(),
        }
    }

    pub fn position(&self, racer: RacerId) -> u32 {
        self.positions.get(&racer).copied().unwrap_or(0)
    }

    pub fn has_winner(&self) -> bool {
        !self.winners.is_empty()
    }

    /// Racers sharing the furthest position (empty before anyone moves).
    pub fn leaders(&self) -> Vec<RacerId> {
        let Some(best) = self.positions.values().copied().max() else {
            return Vec::new();
        };
        if best == 0 {
            return Vec::new();
        }
        self.positions
            .iter()
            .filter(|(_, position)| **position == best)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Back to the start line, keeping the set of racers.
    pub fn reset(&mut self) {
        for position in self.positions.values_mut() {
            *position = 0;
        }
        self.round = 0;
        self.winners.clear();
    }
}
