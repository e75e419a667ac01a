//! Round-robin integrity diagnostics.
//!
//! Nothing here corrects data. The report lists what is wrong so an
//! administrator can fix the schedule before standings are trusted.

use crate::division::{Division, Match, MatchId, MatchStage, Team, TeamId};
use crate::schedule::scheduling_groups;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// A team scheduled more than once in the same round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleBooking {
    pub round_index: u32,
    pub team_id: TeamId,
    pub appearances: usize,
}

/// Result of checking a division's round-robin matches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRobinReport {
    pub team_count: usize,
    pub expected_matches: usize,
    pub actual_matches: usize,
    /// Pairs with more than one match, with the number of matches
    pub duplicate_pairs: Vec<((TeamId, TeamId), usize)>,
    /// Expected pairs that have no match
    pub missing_pairs: Vec<(TeamId, TeamId)>,
    /// Pairs with a match that the schedule does not call for
    pub unexpected_pairs: Vec<(TeamId, TeamId)>,
    pub self_matches: Vec<MatchId>,
    pub double_booked: Vec<DoubleBooking>,
    /// Matches with an empty slot or a team outside the roster
    pub orphan_matches: Vec<MatchId>,
}

impl RoundRobinReport {
    pub fn problem_count(&self) -> usize {
        self.duplicate_pairs.len()
            + self.missing_pairs.len()
            + self.unexpected_pairs.len()
            + self.self_matches.len()
            + self.double_booked.len()
            + self.orphan_matches.len()
    }

    pub fn is_clean(&self) -> bool {
        self.problem_count() == 0 && self.expected_matches == self.actual_matches
    }
}

impl fmt::Display for RoundRobinReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Teams: {}, expected matches: {}, actual matches: {}",
            self.team_count, self.expected_matches, self.actual_matches
        )?;
        if self.is_clean() {
            return writeln!(f, "No problems found");
        }
        for ((a, b), count) in &self.duplicate_pairs {
            writeln!(f, "  duplicate pair {a} vs {b}: {count} matches")?;
        }
        for (a, b) in &self.missing_pairs {
            writeln!(f, "  missing pair {a} vs {b}")?;
        }
        for (a, b) in &self.unexpected_pairs {
            writeln!(f, "  unexpected pair {a} vs {b}")?;
        }
        for id in &self.self_matches {
            writeln!(f, "  match {id} pits a team against itself")?;
        }
        for booking in &self.double_booked {
            writeln!(
                f,
                "  team {} plays {} times in round {}",
                booking.team_id, booking.appearances, booking.round_index
            )?;
        }
        for id in &self.orphan_matches {
            writeln!(f, "  match {id} has an empty or unknown team slot")?;
        }
        Ok(())
    }
}

fn ordered(a: TeamId, b: TeamId) -> (TeamId, TeamId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Check round-robin matches against the pairs the division's scheduling
/// groups call for.
pub fn check_round_robin(division: &Division, teams: &[Team], matches: &[Match]) -> RoundRobinReport {
    let roster: HashSet<TeamId> = teams.iter().map(|t| t.id).collect();

    let mut expected: BTreeSet<(TeamId, TeamId)> = BTreeSet::new();
    for group in scheduling_groups(division, teams) {
        for (i, &a) in group.iter().enumerate() {
            for &b in &group[i + 1..] {
                expected.insert(ordered(a, b));
            }
        }
    }

    let mut report = RoundRobinReport {
        team_count: teams.len(),
        expected_matches: expected.len(),
        ..Default::default()
    };

    let mut pair_counts: BTreeMap<(TeamId, TeamId), usize> = BTreeMap::new();
    let mut round_counts: BTreeMap<(u32, TeamId), usize> = BTreeMap::new();

    for m in matches.iter().filter(|m| m.stage == MatchStage::RoundRobin) {
        report.actual_matches += 1;

        let (Some(a), Some(b)) = (m.team_a, m.team_b) else {
            report.orphan_matches.push(m.id);
            continue;
        };
        if !roster.contains(&a) || !roster.contains(&b) {
            report.orphan_matches.push(m.id);
            continue;
        }
        if a == b {
            report.self_matches.push(m.id);
            *round_counts.entry((m.round_index, a)).or_default() += 1;
            continue;
        }

        *pair_counts.entry(ordered(a, b)).or_default() += 1;
        *round_counts.entry((m.round_index, a)).or_default() += 1;
        *round_counts.entry((m.round_index, b)).or_default() += 1;
    }

    for (&pair, &count) in &pair_counts {
        if count > 1 {
            report.duplicate_pairs.push((pair, count));
        }
        if !expected.contains(&pair) {
            report.unexpected_pairs.push(pair);
        }
    }
    report.missing_pairs = expected
        .iter()
        .filter(|pair| !pair_counts.contains_key(*pair))
        .copied()
        .collect();
    report.double_booked = round_counts
        .into_iter()
        .filter(|&(_, appearances)| appearances > 1)
        .map(|((round_index, team_id), appearances)| DoubleBooking {
            round_index,
            team_id,
            appearances,
        })
        .collect();

    report
}
