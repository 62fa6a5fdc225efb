use std::fmt::Write;

use derby_types::{RaceState, RacerId};

use crate::settlement::PlayerPayout;

/// Render positions as `id:position` pairs in racer order.
pub fn format_positions(state: &RaceState) -> String {
    let mut out = String::with_capacity(state.positions.len().saturating_mul(5));
    for (idx, (racer, position)) in state.positions.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}:{}", racer, position);
    }
    out
}

pub fn format_racer_list(racers: impl IntoIterator<Item = RacerId>) -> String {
    let mut out = String::new();
    for (idx, racer) in racers.into_iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", racer);
    }
    out
}

pub fn push_payout_entry(out: &mut String, payout: &PlayerPayout) {
    if !out.is_empty() {
        out.push(',');
    }
    let _ = write!(
        out,
        r#"{{"player":{},"payout":{},"balance":{}}}"#,
        payout.player, payout.amount, payout.balance
    );
}

pub fn format_payouts(payouts: &[PlayerPayout]) -> String {
    let mut out = String::new();
    for payout in payouts {
        push_payout_entry(&mut out, payout);
    }
    format!("[{out}]")
}
