//! Standings derived from round-robin results.
//!
//! Standings are never stored. [`compute_standings`] is a pure function of the
//! roster and the match records, and every consumer (bracket seeding, stage
//! checks, diagnostics) calls it instead of keeping its own tally.

pub mod integrity;

pub use integrity::{DoubleBooking, RoundRobinReport, check_round_robin};

use crate::division::{DivisionSnapshot, Match, MatchOutcome, MatchStage, SlotSide, Team, TeamId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Record against a single opponent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub wins: u32,
    pub losses: u32,
    pub point_diff: i64,
}

/// Ranked standing of one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: TeamId,
    pub team_name: String,
    pub wins: u32,
    pub losses: u32,
    pub points_for: u32,
    pub points_against: u32,
    pub point_diff: i64,
    /// 1-based position after sorting
    pub rank: u32,
    /// Per-opponent records. Carried as data only; ranking does not read it.
    pub head_to_head: BTreeMap<TeamId, HeadToHead>,
}

impl TeamStanding {
    fn empty(team: &Team) -> Self {
        Self {
            team_id: team.id,
            team_name: team.name.clone(),
            wins: 0,
            losses: 0,
            points_for: 0,
            points_against: 0,
            point_diff: 0,
            rank: 0,
            head_to_head: BTreeMap::new(),
        }
    }

    pub fn played(&self) -> u32 {
        self.wins + self.losses
    }
}

/// Compute ranked standings for `teams` from their round-robin matches.
///
/// Ordering is wins descending, then point differential descending. Teams
/// level on both keep their roster order, so ranks are distinct positions.
/// Matches of other stages, matches naming teams outside the roster and games
/// missing either score are ignored.
pub fn compute_standings(teams: &[Team], matches: &[Match]) -> Vec<TeamStanding> {
    let mut rows: Vec<TeamStanding> = teams.iter().map(TeamStanding::empty).collect();
    let index: HashMap<TeamId, usize> = teams
        .iter()
        .enumerate()
        .map(|(i, team)| (team.id, i))
        .collect();

    for m in matches.iter().filter(|m| m.stage == MatchStage::RoundRobin) {
        let (Some(a), Some(b)) = (m.team_a, m.team_b) else {
            continue;
        };
        let (Some(&ia), Some(&ib)) = (index.get(&a), index.get(&b)) else {
            debug!("Skipping match {} with a team outside the roster", m.id);
            continue;
        };
        if ia == ib {
            continue;
        }
        let Some((points_a, points_b)) = m.totals() else {
            continue;
        };

        rows[ia].points_for = rows[ia].points_for.saturating_add(points_a);
        rows[ia].points_against = rows[ia].points_against.saturating_add(points_b);
        rows[ib].points_for = rows[ib].points_for.saturating_add(points_b);
        rows[ib].points_against = rows[ib].points_against.saturating_add(points_a);

        let diff = i64::from(points_a) - i64::from(points_b);
        rows[ia].head_to_head.entry(b).or_default().point_diff += diff;
        rows[ib].head_to_head.entry(a).or_default().point_diff -= diff;

        let (winner, loser) = match m.outcome() {
            MatchOutcome::Decided {
                winner: SlotSide::Left,
            } => ((ia, a), (ib, b)),
            MatchOutcome::Decided {
                winner: SlotSide::Right,
            } => ((ib, b), (ia, a)),
            MatchOutcome::Pending | MatchOutcome::Tied => continue,
        };
        rows[winner.0].wins += 1;
        rows[winner.0].head_to_head.entry(loser.1).or_default().wins += 1;
        rows[loser.0].losses += 1;
        rows[loser.0].head_to_head.entry(winner.1).or_default().losses += 1;
    }

    for row in &mut rows {
        row.point_diff = i64::from(row.points_for) - i64::from(row.points_against);
    }

    // Vec::sort_by is stable, which keeps roster order among exact ties
    rows.sort_by(|x, y| {
        y.wins
            .cmp(&x.wins)
            .then_with(|| y.point_diff.cmp(&x.point_diff))
    });

    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
    }

    rows
}

/// Standings for a whole division snapshot
pub fn standings_for(snapshot: &DivisionSnapshot) -> Vec<TeamStanding> {
    compute_standings(&snapshot.teams, &snapshot.matches)
}
