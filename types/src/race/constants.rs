/// Number of spaces between the start and the finish line.
pub const TRACK_LENGTH: u32 = 12;

/// Tokens every player starts a session with.
pub const INITIAL_TOKENS: u64 = 10;

/// Round at which the initial racing segment stops for the second betting window.
pub const CHECKPOINT_ROUND: u32 = 3;

/// Payout multiplier for wagers placed before the race starts.
pub const FIRST_PHASE_MULTIPLIER: u64 = 3;

/// Payout multiplier for wagers placed at the checkpoint.
pub const SECOND_PHASE_MULTIPLIER: u64 = 2;

/// Player count bounds offered by the setup screen.
pub const MIN_PLAYERS: usize = 1;
pub const MAX_PLAYERS: usize = 5;

/// Default pause between race rounds (milliseconds).
pub const ROUND_INTERVAL_MS: u64 = 800;

/// Number of racers in the fixed roster.
pub const RACER_COUNT: usize = 8;
