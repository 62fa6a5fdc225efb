use serde::Serialize;
use thiserror::Error as ThisError;

use super::RACER_COUNT;

/// Racer identifier (1-based, unique within the roster).
pub type RacerId = u8;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum RacerInvariantError {
    #[error("racer {id} has an empty movement table")]
    EmptyMovementTable { id: RacerId },
    #[error("racer id {id} is reserved")]
    ReservedId { id: RacerId },
    #[error("duplicate racer id {id}")]
    DuplicateId { id: RacerId },
}

/// One entry of a racer's movement distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MovementWeight {
    pub spaces: u32,
    pub weight: u32,
}

impl MovementWeight {
    pub const fn new(spaces: u32, weight: u32) -> Self {
        Self { spaces, weight }
    }
}

/// A competitor with a fixed discrete movement distribution.
///
/// Entry order in `movement` is significant: draws walk the table in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Racer {
    pub id: RacerId,
    pub name: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub movement: &'static [MovementWeight],
}

impl Racer {
    pub fn total_weight(&self) -> u64 {
        self.movement.iter().map(|entry| entry.weight as u64).sum()
    }

    pub fn validate_invariants(&self) -> Result<(), RacerInvariantError> {
        if self.id == 0 {
            return Err(RacerInvariantError::ReservedId { id: self.id });
        }
        if self.movement.is_empty() {
            return Err(RacerInvariantError::EmptyMovementTable { id: self.id });
        }
        Ok(())
    }
}

/// Check every racer's invariants and that ids are unique.
pub fn validate_roster(racers: &[Racer]) -> Result<(), RacerInvariantError> {
    for (idx, racer) in racers.iter().enumerate() {
        racer.validate_invariants()?;
        if racers[..idx].iter().any(|other| other.id == racer.id) {
            return Err(RacerInvariantError::DuplicateId { id: racer.id });
        }
    }
    Ok(())
}

/// Look up a racer by id.
pub fn racer_by_id(racers: &[Racer], id: RacerId) -> Option<&Racer> {
    racers.iter().find(|racer| racer.id == id)
}

/// The fixed roster every race is run with.
pub const ROSTER: [Racer; RACER_COUNT] = [
    Racer {
        id: 1,
        name: "솜사탕 토끼",
        color: "#fda4af",
        icon: "🐰",
        description: "가끔 엄청난 점프로 앞서나가지만, 금방 숨이 차요!",
        movement: &[
            MovementWeight::new(0, 35),
            MovementWeight::new(1, 25),
            MovementWeight::new(3, 40),
        ],
    },
    Racer {
        id: 2,
        name: "우주 오리",
        color: "#fde047",
        icon: "🐥",
        description: "뒤뚱뒤뚱 멈추지 않고 꾸준히 나아가는 성실파예요.",
        movement: &[
            MovementWeight::new(0, 10),
            MovementWeight::new(1, 75),
            MovementWeight::new(2, 15),
        ],
    },
    Racer {
        id: 3,
        name: "딸기냥이",
        color: "#fb7185",
        icon: "🐱",
        description: "기분파 고양이! 운이 좋으면 순식간에 골인!",
        movement: &[
            MovementWeight::new(0, 45),
            MovementWeight::new(1, 20),
            MovementWeight::new(4, 35),
        ],
    },
    Racer {
        id: 4,
        name: "꿀벌 판다",
        color: "#64748b",
        icon: "🐼",
        description: "느릿느릿하지만 한 번 움직이면 묵직하게 나아가요.",
        movement: &[
            MovementWeight::new(0, 30),
            MovementWeight::new(1, 40),
            MovementWeight::new(2, 30),
        ],
    },
    Racer {
        id: 5,
        name: "별사탕 유니콘",
        color: "#d8b4fe",
        icon: "🦄",
        description: "신비로운 힘으로 가끔 마법처럼 순간이동해요!",
        movement: &[
            MovementWeight::new(0, 20),
            MovementWeight::new(2, 60),
            MovementWeight::new(3, 20),
        ],
    },
    Racer {
        id: 6,
        name: "새싹 개구리",
        color: "#86efac",
        icon: "🐸",
        description: "폴짝폴짝 리드미컬하게 트랙을 가로질러요.",
        movement: &[MovementWeight::new(1, 70), MovementWeight::new(2, 30)],
    },
    Racer {
        id: 7,
        name: "구름 강아지",
        color: "#bae6fd",
        icon: "🐶",
        description: "주인을 찾는 마음으로 열심히 뛰어다녀요!",
        movement: &[
            MovementWeight::new(0, 25),
            MovementWeight::new(1, 45),
            MovementWeight::new(2, 30),
        ],
    },
    Racer {
        id: 8,
        name: "불꽃 여우",
        color: "#fb923c",
        icon: "🦊",
        description: "엄청난 스피드를 가졌지만, 엉뚱한 방향으로 가기도 해요.",
        movement: &[
            MovementWeight::new(0, 50),
            MovementWeight::new(2, 25),
            MovementWeight::new(5, 25),
        ],
    },
];
