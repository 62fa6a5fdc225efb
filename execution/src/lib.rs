//! Derby execution layer.
//!
//! This crate contains the race core: the weighted movement model, the round-by-round
//! progression engine, the betting ledger, settlement, and the [`RaceTable`] phase machine that
//! sequences them.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution; pacing belongs to the caller.
//! - Randomness is always injected (`rand::Rng`), so a seeded generator replays a race exactly.
//! - Iterate ordered collections only, so logs and snapshots do not depend on hash order.
//!
//! ## Minimal race (example)
//! ```rust
//! use derby_execution::{RaceTable, RoundOutcome, TableConfig};
//! use derby_types::{GamePhase, ROSTER};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut table = RaceTable::new(TableConfig::default(), &ROSTER).unwrap();
//! table.confirm_players(1).unwrap();
//! table.place_wager(3, 10).unwrap();
//! table.start_race().unwrap();
//! loop {
//!     match table.advance_round(&mut rng).unwrap() {
//!         RoundOutcome::Continue => continue,
//!         RoundOutcome::Checkpoint => {
//!             table.pass().unwrap();
//!             table.start_race().unwrap();
//!         }
//!         RoundOutcome::Finished(_) => break,
//!     }
//! }
//! assert_eq!(table.phase(), GamePhase::Results);
//! ```

pub mod ledger;
pub mod logging;
pub mod movement;
pub mod progression;
pub mod settlement;
pub mod table;

#[cfg(test)]
mod scenario_tests;

pub use ledger::{check_pass, place_wager, LedgerError, TurnAdvance, TurnOrder};
pub use movement::{draw_movement, select_movement, total_weight};
pub use progression::advance_round;
pub use settlement::{settle, wager_payout, PlayerPayout};
pub use table::{
    next_phase, PhaseEvent, RaceTable, RoundOutcome, StopCondition, TableConfig, TableError,
};
