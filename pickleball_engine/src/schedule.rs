//! Round-robin schedule generation.
//!
//! Each scheduling group (a pool, or the whole division when it has no pools)
//! is paired with the circle method: one team stays fixed while the others
//! rotate, and a BYE pads odd groups. Groups are scheduled one after another
//! so round indices never collide across pools.

use crate::division::{Division, NewMatch, Team, TeamId};
use std::collections::HashSet;

/// Team ids grouped the way the round robin pairs them.
///
/// Pools come in `order`, each with its teams in roster order. Teams outside
/// every known pool form a trailing group. Empty groups are omitted.
pub fn scheduling_groups(division: &Division, teams: &[Team]) -> Vec<Vec<TeamId>> {
    if division.pools.is_empty() {
        let all: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
        return if all.is_empty() { Vec::new() } else { vec![all] };
    }

    let mut pools: Vec<_> = division.pools.iter().collect();
    pools.sort_by_key(|p| (p.order, p.id));
    let known: HashSet<_> = pools.iter().map(|p| p.id).collect();

    let mut groups: Vec<Vec<TeamId>> = pools
        .iter()
        .map(|pool| {
            teams
                .iter()
                .filter(|t| t.pool_id == Some(pool.id))
                .map(|t| t.id)
                .collect()
        })
        .collect();

    groups.push(
        teams
            .iter()
            .filter(|t| t.pool_id.is_none_or(|id| !known.contains(&id)))
            .map(|t| t.id)
            .collect(),
    );

    groups.retain(|g| !g.is_empty());
    groups
}

/// Rounds of pairings for one group using the circle method
fn circle_rounds(group: &[TeamId]) -> Vec<Vec<(TeamId, TeamId)>> {
    if group.len() < 2 {
        return Vec::new();
    }

    let mut ring: Vec<Option<TeamId>> = group.iter().copied().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }

    let n = ring.len();
    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let pairs = (0..n / 2)
            .filter_map(|i| match (ring[i], ring[n - 1 - i]) {
                (Some(home), Some(away)) => Some((home, away)),
                _ => None,
            })
            .collect();
        rounds.push(pairs);

        // First entry is fixed; the last one moves into second place
        if let Some(last) = ring.pop() {
            ring.insert(1, last);
        }
    }
    rounds
}

/// Every round-robin match for a division
pub fn generate_round_robin(division: &Division, teams: &[Team]) -> Vec<NewMatch> {
    let mut matches = Vec::new();
    let mut round_offset = 0u32;

    for group in scheduling_groups(division, teams) {
        let rounds = circle_rounds(&group);
        for (round, pairs) in rounds.iter().enumerate() {
            for &(a, b) in pairs {
                matches.push(NewMatch::round_robin(round_offset + round as u32, a, b));
            }
        }
        round_offset += rounds.len() as u32;
    }

    matches
}
