//! Race domain types.
//!
//! Defines the racer roster, wagers, players, race progress and game phases used by the execution
//! layer and clients.

mod constants;
mod phase;
mod player;
mod racer;
mod state;

pub use constants::*;
pub use phase::*;
pub use player::*;
pub use racer::*;
pub use state::*;
