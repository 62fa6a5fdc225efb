//! Weighted movement model.
//!
//! A racer's movement table is an ordered list of `(spaces, weight)` pairs. One draw picks an
//! entry with probability `weight / total`; ties resolve to the earliest entry.

use derby_types::MovementWeight;
use rand::Rng;

/// Sum of all weights in a movement table.
pub fn total_weight(weights: &[MovementWeight]) -> u64 {
    weights.iter().map(|entry| entry.weight as u64).sum()
}

/// Pick the entry selected by `roll`, where `roll` is in `[0, total_weight)`.
///
/// Walks the table in declaration order, subtracting each weight from the remaining roll until it
/// falls inside an entry. Returns 0 when the roll runs past the table (only possible for a roll
/// outside the valid range or an all-zero table).
pub fn select_movement(weights: &[MovementWeight], roll: u64) -> u32 {
    let mut remaining = roll;
    for entry in weights {
        let weight = entry.weight as u64;
        if remaining < weight {
            return entry.spaces;
        }
        remaining -= weight;
    }
    0
}

/// Draw one step size from a movement table.
///
/// A table whose weights sum to zero yields zero movement.
pub fn draw_movement<R: Rng + ?Sized>(weights: &[MovementWeight], rng: &mut R) -> u32 {
    let total = total_weight(weights);
    if total == 0 {
        return 0;
    }
    select_movement(weights, rng.gen_range(0..total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use derby_types::ROSTER;
    use rand::{rngs::StdRng, SeedableRng};

    const TABLE: [MovementWeight; 3] = [
        MovementWeight::new(0, 35),
        MovementWeight::new(1, 25),
        MovementWeight::new(3, 40),
    ];

    #[test]
    fn test_total_weight() {
        assert_eq!(total_weight(&TABLE), 100);
        assert_eq!(total_weight(&[]), 0);
    }

    #[test]
    fn test_select_movement_boundaries() {
        assert_eq!(select_movement(&TABLE, 0), 0);
        assert_eq!(select_movement(&TABLE, 34), 0);
        assert_eq!(select_movement(&TABLE, 35), 1);
        assert_eq!(select_movement(&TABLE, 59), 1);
        assert_eq!(select_movement(&TABLE, 60), 3);
        assert_eq!(select_movement(&TABLE, 99), 3);
        // Past the end of the table
        assert_eq!(select_movement(&TABLE, 100), 0);
    }

    #[test]
    fn test_select_movement_skips_zero_weight_entries() {
        let table = [
            MovementWeight::new(7, 0),
            MovementWeight::new(2, 1),
            MovementWeight::new(9, 0),
        ];
        assert_eq!(select_movement(&table, 0), 2);
    }

    #[test]
    fn test_select_movement_prefers_declaration_order() {
        // Same weights, different order: the earlier entry owns the lower rolls.
        let forward = [MovementWeight::new(1, 50), MovementWeight::new(2, 50)];
        let backward = [MovementWeight::new(2, 50), MovementWeight::new(1, 50)];
        assert_eq!(select_movement(&forward, 0), 1);
        assert_eq!(select_movement(&backward, 0), 2);
    }

    #[test]
    fn test_draw_movement_degenerate_table() {
        let mut rng = StdRng::seed_from_u64(1);
        let table = [MovementWeight::new(4, 0), MovementWeight::new(5, 0)];
        for _ in 0..100 {
            assert_eq!(draw_movement(&table, &mut rng), 0);
        }
        assert_eq!(draw_movement(&[], &mut rng), 0);
    }

    #[test]
    fn test_draw_movement_only_returns_table_steps() {
        let mut rng = StdRng::seed_from_u64(42);
        for racer in ROSTER.iter() {
            for _ in 0..1_000 {
                let step = draw_movement(racer.movement, &mut rng);
                assert!(racer.movement.iter().any(|entry| entry.spaces == step));
            }
        }
    }

    #[test]
    fn test_draw_movement_frequencies_converge() {
        const TRIALS: usize = 200_000;
        let mut rng = StdRng::seed_from_u64(0xD3B1);
        for racer in ROSTER.iter() {
            let total = total_weight(racer.movement) as f64;
            let mut counts = vec![0usize; racer.movement.len()];
            for _ in 0..TRIALS {
                let step = draw_movement(racer.movement, &mut rng);
                let idx = racer
                    .movement
                    .iter()
                    .position(|entry| entry.spaces == step)
                    .expect("step from table");
                counts[idx] += 1;
            }
            for (entry, count) in racer.movement.iter().zip(counts) {
                let expected = entry.weight as f64 / total;
                let observed = count as f64 / TRIALS as f64;
                assert!(
                    (expected - observed).abs() < 0.01,
                    "racer {} step {}: expected {expected:.3}, observed {observed:.3}",
                    racer.id,
                    entry.spaces
                );
            }
        }
    }
}
