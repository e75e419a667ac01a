//! Elimination bracket: sizing, canonical seeding and graph construction.
//!
//! ## Example
//!
//! ```
//! use pickleball_engine::bracket::{BracketBuilder, BracketPolicy, SeededTeam, size_bracket};
//!
//! let field: Vec<SeededTeam> = (1..=5)
//!     .map(|seed| SeededTeam {
//!         seed,
//!         team_id: i64::from(seed) * 10,
//!         team_name: format!("Team {seed}"),
//!     })
//!     .collect();
//!
//! let sizing = size_bracket(&BracketPolicy::default(), 5);
//! let bracket = BracketBuilder::new(sizing, &field).build();
//!
//! // Seeds 4 and 5 play in; seed 1 waits for the winner
//! assert_eq!(bracket.play_in().count(), 1);
//! assert_eq!(bracket.at(1, 0).unwrap().right.seed, 4);
//! ```

pub mod builder;
pub mod models;
pub mod seeding;
pub mod sizing;

pub use builder::BracketBuilder;
pub use models::{Bracket, BracketMatch, BracketSlot, ByeAdvance, MatchStatus, SeedResolution};
pub use seeding::{SeededTeam, assign_seeds, canonical_pairs, expanded_order};
pub use sizing::{
    BracketPolicy, BracketSizing, LadderPolicy, LadderStep, PowerOfTwoPolicy, SizingPolicy,
    size_bracket,
};

use crate::config::EngineConfig;
use crate::division::{DivisionSnapshot, Match, MatchStage};
use crate::errors::EngineResult;
use crate::standings::standings_for;

/// Sizing decision for the division's current roster
pub fn sizing_for(snapshot: &DivisionSnapshot, config: &EngineConfig) -> BracketSizing {
    size_bracket(&config.bracket_policy, snapshot.teams.len() as u32)
}

/// Full bracket graph for a division, recomputed from its snapshot.
///
/// Seeds come from current standings, so before the round robin finishes
/// this is a projection.
pub fn bracket_for(snapshot: &DivisionSnapshot, config: &EngineConfig) -> EngineResult<Bracket> {
    let standings = standings_for(snapshot);
    let field = assign_seeds(&standings, &snapshot.teams)?;
    let sizing = sizing_for(snapshot, config);

    let records: Vec<Match> = snapshot
        .matches
        .iter()
        .filter(|m| m.stage != MatchStage::RoundRobin)
        .cloned()
        .collect();

    Ok(BracketBuilder::new(sizing, &field)
        .with_results(&records)
        .with_third_place(config.third_place_match)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::division::{Game, Match, SlotSide, TeamId};

    fn field(n: u32) -> Vec<SeededTeam> {
        (1..=n)
            .map(|seed| SeededTeam {
                seed,
                team_id: i64::from(seed) * 10,
                team_name: format!("Team {seed}"),
            })
            .collect()
    }

    fn record(
        id: i64,
        stage: MatchStage,
        round_index: u32,
        position: u32,
        teams: (TeamId, TeamId),
        score: (u32, u32),
    ) -> Match {
        Match {
            id,
            division_id: 1,
            stage,
            round_index,
            bracket_position: Some(position),
            is_third_place: false,
            team_a: Some(teams.0),
            team_b: Some(teams.1),
            games: vec![Game::new(1, score.0, score.1)],
            tiebreaker: None,
        }
    }

    fn build(n: u32, records: &[Match], third_place: bool) -> Bracket {
        let seeds = field(n);
        let sizing = size_bracket(&BracketPolicy::default(), n);
        BracketBuilder::new(sizing, &seeds)
            .with_results(records)
            .with_third_place(third_place)
            .build()
    }

    #[test]
    fn test_four_teams_standard_pairing() {
        let bracket = build(4, &[], false);
        let round_one: Vec<(u32, u32)> = bracket
            .round(1)
            .map(|m| (m.left.seed, m.right.seed))
            .collect();
        assert_eq!(round_one, vec![(1, 4), (2, 3)]);
        assert!(bracket.byes.is_empty());

        let final_match = bracket.final_match().unwrap();
        assert_eq!(final_match.id, "r2-p0");
        assert_eq!((final_match.left.seed, final_match.right.seed), (1, 2));
        assert!(!final_match.left.is_resolved());
        assert_eq!(bracket.at(1, 0).unwrap().next_match_id.as_deref(), Some("r2-p0"));
        assert_eq!(bracket.at(1, 1).unwrap().next_slot, Some(SlotSide::Right));
    }

    #[test]
    fn test_five_teams_play_in_feeds_seed_four() {
        let bracket = build(5, &[], false);
        let play_in: Vec<_> = bracket.play_in().collect();
        assert_eq!(play_in.len(), 1);
        assert_eq!((play_in[0].left.seed, play_in[0].right.seed), (4, 5));
        assert_eq!(play_in[0].next_match_id.as_deref(), Some("r1-p0"));
        assert_eq!(play_in[0].next_slot, Some(SlotSide::Right));

        let opener = bracket.at(1, 0).unwrap();
        assert_eq!(opener.left.team_id, Some(10));
        assert_eq!(opener.right.seed, 4);
        assert_eq!(opener.right.team_id, None);
    }

    #[test]
    fn test_play_in_winner_inherits_better_seed() {
        // seed 5 (team 50) upsets seed 4 (team 40)
        let records = vec![record(1, MatchStage::PlayIn, 0, 0, (40, 50), (8, 11))];
        let bracket = build(5, &records, false);

        let play_in = bracket.play_in().next().unwrap();
        assert!(play_in.is_finished());
        assert_eq!(play_in.winner_team_id, Some(50));
        assert_eq!(play_in.winner_seed, Some(4));

        let opener = bracket.at(1, 0).unwrap();
        assert_eq!(opener.right.seed, 4);
        assert_eq!(opener.right.team_id, Some(50));
    }

    #[test]
    fn test_six_teams_two_play_ins() {
        let bracket = build(6, &[], false);
        let pairs: Vec<(u32, u32)> = bracket
            .play_in()
            .map(|m| (m.left.seed, m.right.seed))
            .collect();
        assert_eq!(pairs, vec![(3, 6), (4, 5)]);
        let round_one: Vec<(u32, u32)> = bracket
            .round(1)
            .map(|m| (m.left.seed, m.right.seed))
            .collect();
        assert_eq!(round_one, vec![(1, 4), (2, 3)]);
        assert!(bracket.byes.is_empty());
    }

    #[test]
    fn test_three_teams_top_seed_bye() {
        let bracket = build(3, &[], false);
        assert_eq!(bracket.round(1).count(), 1);
        assert_eq!(bracket.byes.len(), 1);

        let bye = &bracket.byes[0];
        assert_eq!(bye.slot.seed, 1);
        assert_eq!(bye.slot.team_id, Some(10));
        assert_eq!(bye.into_match_id.as_deref(), Some("r2-p0"));

        let final_match = bracket.final_match().unwrap();
        assert!(final_match.left.is_bye);
        assert_eq!(final_match.left.team_id, Some(10));
        assert_eq!(final_match.right.seed, 2);
    }

    #[test]
    fn test_winners_advance_to_champion() {
        let records = vec![
            record(1, MatchStage::Elimination, 0, 0, (10, 40), (11, 3)),
            record(2, MatchStage::Elimination, 0, 1, (20, 30), (7, 11)),
            record(3, MatchStage::Elimination, 1, 0, (10, 30), (9, 11)),
        ];
        let bracket = build(4, &records, false);

        let final_match = bracket.final_match().unwrap();
        assert_eq!(final_match.left.team_id, Some(10));
        assert_eq!(final_match.right.team_id, Some(30));
        assert_eq!(final_match.right.seed, 3);
        assert!(final_match.is_finished());

        let champion = bracket.champion.as_ref().unwrap();
        assert_eq!(champion.team_id, Some(30));
        assert_eq!(champion.seed, 3);
        assert!(bracket.is_decided());
    }

    #[test]
    fn test_tied_record_is_in_progress() {
        let mut tied = record(1, MatchStage::Elimination, 0, 0, (10, 40), (11, 9));
        tied.games.push(Game::new(2, 9, 11));
        let bracket = build(4, &[tied], false);
        let opener = bracket.at(1, 0).unwrap();
        assert_eq!(opener.status, MatchStatus::InProgress);
        assert_eq!(opener.winner_team_id, None);
    }

    #[test]
    fn test_third_place_from_semifinal_losers() {
        let records = vec![
            record(1, MatchStage::Elimination, 0, 0, (10, 40), (11, 3)),
            record(2, MatchStage::Elimination, 0, 1, (20, 30), (11, 5)),
        ];
        let bracket = build(4, &records, true);
        let third = bracket.third_place_match().unwrap();
        assert_eq!(third.id, "third-place");
        assert_eq!(third.left.team_id, Some(40));
        assert_eq!(third.right.team_id, Some(30));
        assert_eq!(
            bracket.at(1, 0).unwrap().loser_next_match_id.as_deref(),
            Some("third-place")
        );
        assert!(!bracket.is_decided());
    }

    #[test]
    fn test_resolve_seed() {
        let seeds = field(5);
        let sizing = size_bracket(&BracketPolicy::default(), 5);
        let builder = BracketBuilder::new(sizing, &seeds);
        assert!(matches!(builder.resolve_seed(1), SeedResolution::Team(ref t) if t.team_id == 10));
        assert_eq!(builder.resolve_seed(4), SeedResolution::Unresolved);
        assert_eq!(builder.resolve_seed(5), SeedResolution::Bye);
        assert_eq!(builder.resolve_seed(0), SeedResolution::Bye);
    }

    #[test]
    fn test_materialize_rows() {
        let bracket = build(5, &[], false);
        let play_in = bracket.materialize(MatchStage::PlayIn);
        assert_eq!(play_in.len(), 1);
        assert_eq!(play_in[0].team_a, Some(40));
        assert_eq!(play_in[0].team_b, Some(50));

        let elimination = bracket.materialize(MatchStage::Elimination);
        assert_eq!(elimination.len(), 3);
        assert_eq!(elimination[0].round_index, 0);
        assert_eq!(elimination[0].team_b, None);
        assert_eq!(elimination[2].round_index, 1);
    }
}
