//! Canonical single-elimination seeding and seed assignment.

use crate::division::{Team, TeamId};
use crate::errors::{EngineError, EngineResult};
use crate::standings::TeamStanding;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Expanded seed order for a bracket of `size` entrants (rounded up to a
/// power of two), top half first.
///
/// Starting from `[1]`, each pass of length `s` replaces every entry `a` with
/// `a, 2s + 1 - a` until the list holds half the bracket.
pub fn expanded_order(size: u32) -> Vec<u32> {
    if size < 2 {
        return Vec::new();
    }
    let half = (size.next_power_of_two() / 2) as usize;

    let mut order = vec![1u32];
    while order.len() < half {
        let span = 2 * order.len() as u32 + 1;
        order = order.iter().flat_map(|&a| [a, span - a]).collect();
    }
    order
}

/// Round-1 seed pairs for a bracket of `size` entrants.
///
/// Returns `P/2` pairs for `P = size.next_power_of_two()`, each `(x, P + 1 - x)`
/// with the better seed first, in bracket order so that adjacent pairs feed
/// the same round-2 match.
pub fn canonical_pairs(size: u32) -> Vec<(u32, u32)> {
    if size < 2 {
        return Vec::new();
    }
    let p = size.next_power_of_two();
    expanded_order(size)
        .into_iter()
        .map(|seed| (seed, p + 1 - seed))
        .collect()
}

/// A team placed at a seed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededTeam {
    pub seed: u32,
    pub team_id: TeamId,
    pub team_name: String,
}

/// Turn ranked standings into seeds.
///
/// Teams with an explicit seed override are pinned to that seed; everyone
/// else fills the open seeds in rank order. The result is sorted by seed.
pub fn assign_seeds(standings: &[TeamStanding], teams: &[Team]) -> EngineResult<Vec<SeededTeam>> {
    let field = standings.len() as u32;
    let overrides: HashMap<TeamId, u32> = teams
        .iter()
        .filter_map(|t| t.seed.map(|seed| (t.id, seed)))
        .filter(|(id, _)| standings.iter().any(|s| s.team_id == *id))
        .collect();

    let mut taken = HashSet::new();
    for (&team_id, &seed) in &overrides {
        if seed == 0 || seed > field || !taken.insert(seed) {
            return Err(EngineError::InvalidSeedOverride { team_id, seed });
        }
    }

    let mut open = (1..=field).filter(|seed| !taken.contains(seed));
    let mut seeded = Vec::with_capacity(standings.len());
    for standing in standings {
        let seed = match overrides.get(&standing.team_id) {
            Some(&seed) => seed,
            None => match open.next() {
                Some(seed) => seed,
                None => break,
            },
        };
        seeded.push(SeededTeam {
            seed,
            team_id: standing.team_id,
            team_name: standing.team_name.clone(),
        });
    }

    seeded.sort_by_key(|s| s.seed);
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::compute_standings;

    #[test]
    fn test_four_bracket_pairs() {
        assert_eq!(canonical_pairs(4), vec![(1, 4), (2, 3)]);
    }

    #[test]
    fn test_eight_bracket_pairs() {
        assert_eq!(canonical_pairs(8), vec![(1, 8), (4, 5), (2, 7), (3, 6)]);
    }

    #[test]
    fn test_sixteen_bracket_order() {
        assert_eq!(
            expanded_order(16),
            vec![1, 8, 4, 5, 2, 7, 3, 6]
        );
        assert_eq!(canonical_pairs(16)[1], (8, 9));
    }

    #[test]
    fn test_non_power_of_two_rounds_up() {
        assert_eq!(canonical_pairs(6), canonical_pairs(8));
        assert_eq!(canonical_pairs(2), vec![(1, 2)]);
        assert!(canonical_pairs(1).is_empty());
        assert!(canonical_pairs(0).is_empty());
    }

    #[test]
    fn test_rank_order_becomes_seed_order() {
        let teams: Vec<Team> = (1..=3).map(|id| Team::new(id, 1, format!("T{id}"))).collect();
        let standings = compute_standings(&teams, &[]);
        let seeded = assign_seeds(&standings, &teams).unwrap();
        let ids: Vec<(u32, TeamId)> = seeded.iter().map(|s| (s.seed, s.team_id)).collect();
        assert_eq!(ids, vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_override_pins_seed() {
        let teams = vec![
            Team::new(1, 1, "A"),
            Team::new(2, 1, "B"),
            Team::new(3, 1, "C").with_seed(1),
        ];
        let standings = compute_standings(&teams, &[]);
        let seeded = assign_seeds(&standings, &teams).unwrap();
        let ids: Vec<TeamId> = seeded.iter().map(|s| s.team_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_bad_override_rejected() {
        let teams = vec![Team::new(1, 1, "A").with_seed(5), Team::new(2, 1, "B")];
        let standings = compute_standings(&teams, &[]);
        assert_eq!(
            assign_seeds(&standings, &teams),
            Err(EngineError::InvalidSeedOverride {
                team_id: 1,
                seed: 5
            })
        );

        let clash = vec![
            Team::new(1, 1, "A").with_seed(1),
            Team::new(2, 1, "B").with_seed(1),
        ];
        let standings = compute_standings(&clash, &[]);
        assert!(assign_seeds(&standings, &clash).is_err());
    }
}
