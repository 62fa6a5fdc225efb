//! Common types used throughout derby.
//!
//! Racers, wagers, players, race state and the game phase enum shared by the execution layer and
//! the race table service.

pub mod race;

pub use race::*;
