//! End-to-end race scenarios driven through [`RaceTable`].
//!
//! These tests run whole betting cycles (confirm, bet, race, checkpoint, bet, race, settle,
//! reset) and check the accounting and determinism guarantees across the full cycle.

use derby_types::{GamePhase, MovementWeight, Player, Racer, ROSTER};
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{PlayerPayout, RaceTable, RoundOutcome, TableConfig};

static STEADY: [MovementWeight; 1] = [MovementWeight::new(1, 1)];
static QUICK: [MovementWeight; 1] = [MovementWeight::new(2, 1)];

/// The full roster with racer #3 moving two spaces a round and everyone else one.
fn rigged_roster() -> Vec<Racer> {
    ROSTER
        .iter()
        .map(|racer| Racer {
            movement: if racer.id == 3 { &QUICK } else { &STEADY },
            ..*racer
        })
        .collect()
}

/// Run rounds until the segment stops.
fn run_segment<R: Rng>(table: &mut RaceTable, rng: &mut R) -> RoundOutcome {
    loop {
        match table.advance_round(rng).unwrap() {
            RoundOutcome::Continue => continue,
            outcome => return outcome,
        }
    }
}

/// One player wagers `stake` on `racer`, passes (or wagers the rest) at the checkpoint, and the
/// race is run to the end. Returns the payouts.
fn play_single_player_race<R: Rng>(
    table: &mut RaceTable,
    racer: u8,
    stake: u64,
    rng: &mut R,
) -> Vec<PlayerPayout> {
    table.place_wager(racer, stake).unwrap();
    table.start_race().unwrap();
    assert_eq!(run_segment(table, rng), RoundOutcome::Checkpoint);
    assert_eq!(table.phase(), GamePhase::BettingPhase2);

    let balance = table.players()[0].balance;
    if balance == 0 {
        table.pass().unwrap();
    } else {
        table.place_wager(racer, balance).unwrap();
    }
    table.start_race().unwrap();
    match run_segment(table, rng) {
        RoundOutcome::Finished(payouts) => payouts,
        other => panic!("final segment ended with {other:?}"),
    }
}

#[test]
fn test_all_in_pass_and_lone_winner() {
    let racers = rigged_roster();
    let mut table = RaceTable::new(TableConfig::default(), &racers).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    table.confirm_players(1).unwrap();

    table.place_wager(3, 10).unwrap();
    assert_eq!(table.players()[0].balance, 0);
    table.start_race().unwrap();
    assert_eq!(run_segment(&mut table, &mut rng), RoundOutcome::Checkpoint);
    assert_eq!(table.race().round, 3);
    assert!(!table.race().has_winner());

    // Broke player passes the second window.
    table.pass().unwrap();
    table.start_race().unwrap();
    let payouts = match run_segment(&mut table, &mut rng) {
        RoundOutcome::Finished(payouts) => payouts,
        other => panic!("unexpected outcome {other:?}"),
    };

    assert_eq!(table.race().winners.iter().copied().collect::<Vec<_>>(), vec![3]);
    assert_eq!(table.race().round, 6);
    assert_eq!(
        payouts,
        vec![PlayerPayout {
            player: 1,
            amount: 30,
            balance: 30,
        }]
    );
    assert_eq!(table.phase(), GamePhase::Results);
}

#[test]
fn test_multi_player_cycle_and_reset() {
    let racers = rigged_roster();
    let mut table = RaceTable::new(TableConfig::default(), &racers).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    table.confirm_players(3).unwrap();

    table.place_wager(3, 4).unwrap();
    table.place_wager(1, 10).unwrap();
    table.place_wager(3, 1).unwrap();
    assert_eq!(table.phase(), GamePhase::ReadyForInitialRace);

    table.start_race().unwrap();
    assert_eq!(run_segment(&mut table, &mut rng), RoundOutcome::Checkpoint);

    table.place_wager(3, 6).unwrap();
    table.pass().unwrap();
    table.place_wager(5, 9).unwrap();
    assert_eq!(table.phase(), GamePhase::ReadyForFinalRace);

    table.start_race().unwrap();
    let payouts = match run_segment(&mut table, &mut rng) {
        RoundOutcome::Finished(payouts) => payouts,
        other => panic!("unexpected outcome {other:?}"),
    };
    let credited: Vec<_> = payouts.iter().map(|payout| payout.amount).collect();
    // 4 * 3 + 6 * 2, nothing, 1 * 3
    assert_eq!(credited, vec![24, 0, 3]);

    table.reset().unwrap();
    assert_eq!(table.phase(), GamePhase::BettingPhase1);
    assert_eq!(table.current_turn(), Some(0));
    assert_eq!(table.race().round, 0);
    assert!(table.race().positions.values().all(|position| *position == 0));
    assert!(table.race().winners.is_empty());
    let balances: Vec<_> = table.players().iter().map(|player| player.balance).collect();
    assert_eq!(balances, vec![24, 0, 3]);
    assert!(table.players().iter().all(|player| player.wagers.is_empty()));

    // A second race runs on the carried balances.
    table.place_wager(3, 24).unwrap();
    table.pass().unwrap();
    table.place_wager(2, 3).unwrap();
    assert_eq!(table.phase(), GamePhase::ReadyForInitialRace);
}

#[test]
fn test_seeded_races_replay_identically() {
    let run = |seed: u64| {
        let mut table = RaceTable::new(TableConfig::default(), &ROSTER).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        table.confirm_players(1).unwrap();
        let payouts = play_single_player_race(&mut table, 6, 7, &mut rng);
        (payouts, table.race().clone())
    };
    assert_eq!(run(42), run(42));
}

proptest! {
    #[test]
    fn prop_full_roster_race_accounting(
        seed in any::<u64>(),
        racer in 1u8..=8,
        stake in 1u64..=10,
    ) {
        let mut table = RaceTable::new(TableConfig::default(), &ROSTER).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        table.confirm_players(1).unwrap();

        let payouts = play_single_player_race(&mut table, racer, stake, &mut rng);
        let player: &Player = &table.players()[0];
        let staked_first = stake;
        let staked_second = player.wagers.iter().skip(1).map(|wager| wager.amount).sum::<u64>();
        let expected = if table.race().winners.contains(&racer) {
            staked_first * 3 + staked_second * 2
        } else {
            0
        };

        prop_assert_eq!(table.phase(), GamePhase::Results);
        prop_assert!(table.race().has_winner());
        prop_assert_eq!(payouts.len(), 1);
        prop_assert_eq!(payouts[0].amount, expected);
        prop_assert_eq!(player.balance, 10 - staked_first - staked_second + expected);
        for position in table.race().positions.values() {
            prop_assert!(*position <= 12);
        }
    }
}
