use std::collections::BTreeMap;

use derby_execution::PlayerPayout;
use derby_types::{GamePhase, Player, Racer, RacerId};
use serde::{Deserialize, Serialize};

/// Player command at the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    ConfirmPlayers { count: usize },
    Wager { racer: RacerId, amount: u64 },
    Pass,
    StartRace,
    Reset,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ConfirmPlayers { .. } => "confirm_players",
            Action::Wager { .. } => "wager",
            Action::Pass => "pass",
            Action::StartRace => "start_race",
            Action::Reset => "reset",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    ConfirmPlayers {
        #[serde(rename = "requestId")]
        request_id: Option<String>,
        count: usize,
    },
    Wager {
        #[serde(rename = "requestId")]
        request_id: Option<String>,
        racer: RacerId,
        amount: u64,
    },
    Pass {
        #[serde(rename = "requestId")]
        request_id: Option<String>,
    },
    StartRace {
        #[serde(rename = "requestId")]
        request_id: Option<String>,
    },
    Reset {
        #[serde(rename = "requestId")]
        request_id: Option<String>,
    },
}

impl InboundMessage {
    pub fn into_parts(self) -> (Option<String>, Action) {
        match self {
            InboundMessage::ConfirmPlayers { request_id, count } => {
                (request_id, Action::ConfirmPlayers { count })
            }
            InboundMessage::Wager {
                request_id,
                racer,
                amount,
            } => (request_id, Action::Wager { racer, amount }),
            InboundMessage::Pass { request_id } => (request_id, Action::Pass),
            InboundMessage::StartRace { request_id } => (request_id, Action::StartRace),
            InboundMessage::Reset { request_id } => (request_id, Action::Reset),
        }
    }
}

/// Full read-only view of the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub phase: GamePhase,
    pub round: u32,
    pub track_length: u32,
    pub positions: BTreeMap<RacerId, u32>,
    pub winners: Vec<RacerId>,
    pub players: Vec<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<usize>,
    pub commentary: String,
    pub commentary_pending: bool,
    pub racers: Vec<Racer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundView {
    pub round: u32,
    pub positions: BTreeMap<RacerId, u32>,
    pub winners: Vec<RacerId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PayoutView {
    pub player: u32,
    pub payout: u64,
    pub balance: u64,
}

impl From<&PlayerPayout> for PayoutView {
    fn from(payout: &PlayerPayout) -> Self {
        Self {
            player: payout.player,
            payout: payout.amount,
            balance: payout.balance,
        }
    }
}

/// Events broadcast to every connected client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    State {
        payload: TableSnapshot,
    },
    Round {
        payload: RoundView,
    },
    Settled {
        winners: Vec<RacerId>,
        payouts: Vec<PayoutView>,
    },
    Commentary {
        text: String,
    },
}

/// Direct reply to one inbound message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundResponse {
    Ack {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    Error {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        code: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_inbound_messages_parse() {
        let wager: InboundMessage =
            serde_json::from_str(r#"{"type":"wager","requestId":"r1","racer":3,"amount":10}"#)
                .unwrap();
        assert_eq!(
            wager.into_parts(),
            (
                Some("r1".to_string()),
                Action::Wager {
                    racer: 3,
                    amount: 10
                }
            )
        );

        let confirm: InboundMessage =
            serde_json::from_str(r#"{"type":"confirm_players","count":2}"#).unwrap();
        assert_eq!(
            confirm.into_parts(),
            (None, Action::ConfirmPlayers { count: 2 })
        );

        let start: InboundMessage = serde_json::from_str(r#"{"type":"start_race"}"#).unwrap();
        assert_eq!(start.into_parts().1, Action::StartRace);
        let pass: InboundMessage = serde_json::from_str(r#"{"type":"pass"}"#).unwrap();
        assert_eq!(pass.into_parts().1, Action::Pass);
    }

    #[test]
    fn test_inbound_rejects_bad_payloads() {
        assert!(serde_json::from_str::<InboundMessage>(r#"{"type":"bet"}"#).is_err());
        assert!(
            serde_json::from_str::<InboundMessage>(r#"{"type":"wager","racer":3,"amount":-1}"#)
                .is_err()
        );
    }

    #[test]
    fn test_outbound_shapes() {
        let settled = OutboundEvent::Settled {
            winners: vec![3],
            payouts: vec![PayoutView::from(&PlayerPayout {
                player: 1,
                amount: 30,
                balance: 30,
            })],
        };
        assert_eq!(
            serde_json::to_value(&settled).unwrap(),
            json!({
                "type": "settled",
                "winners": [3],
                "payouts": [{ "player": 1, "payout": 30, "balance": 30 }]
            })
        );

        let error = OutboundResponse::Error {
            request_id: None,
            code: "OUT_OF_PHASE".to_string(),
            message: "reset is not allowed during setup".to_string(),
        };
        let value: Value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["type"], "error");
        assert!(value.get("requestId").is_none());

        let ack = OutboundResponse::Ack {
            request_id: Some("r9".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({ "type": "ack", "requestId": "r9" })
        );
    }
}
