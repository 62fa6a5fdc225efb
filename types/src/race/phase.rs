use serde::Serialize;

use super::BettingPhase;

/// Game phase of the table. Exactly one is active at a time.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Setup = 0,
    #[serde(rename = "betting_phase_1")]
    BettingPhase1 = 1,
    ReadyForInitialRace = 2,
    RacingInitialSegment = 3,
    #[serde(rename = "betting_phase_2")]
    BettingPhase2 = 4,
    ReadyForFinalRace = 5,
    RacingFinalSegment = 6,
    Results = 7,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Setup => "setup",
            GamePhase::BettingPhase1 => "betting_phase_1",
            GamePhase::ReadyForInitialRace => "ready_for_initial_race",
            GamePhase::RacingInitialSegment => "racing_initial_segment",
            GamePhase::BettingPhase2 => "betting_phase_2",
            GamePhase::ReadyForFinalRace => "ready_for_final_race",
            GamePhase::RacingFinalSegment => "racing_final_segment",
            GamePhase::Results => "results",
        }
    }

    /// Betting window open in this phase, if any.
    pub fn betting_phase(&self) -> Option<BettingPhase> {
        match self {
            GamePhase::BettingPhase1 => Some(BettingPhase::First),
            GamePhase::BettingPhase2 => Some(BettingPhase::Second),
            _ => None,
        }
    }

    pub fn is_racing(&self) -> bool {
        matches!(
            self,
            GamePhase::RacingInitialSegment | GamePhase::RacingFinalSegment
        )
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which narration the commentary collaborator is asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CommentaryPhase {
    #[serde(rename = "mid-race")]
    MidRace,
    #[serde(rename = "finish")]
    Finish,
}

impl CommentaryPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentaryPhase::MidRace => "mid-race",
            CommentaryPhase::Finish => "finish",
        }
    }
}
