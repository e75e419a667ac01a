//! Integration tests for the division lifecycle
//!
//! These tests drive divisions through the manager from round-robin
//! scheduling to a crowned champion.

use pickleball_engine::division::{MAX_GAME_SCORE, TeamKind};
use pickleball_engine::{
    Division, DivisionManager, EngineConfig, EngineError, InMemoryDivisionRepository, Match,
    MatchStage, Stage, Team, Tiebreaker, TransitionOutcome,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

async fn setup(teams: i64, config: EngineConfig) -> DivisionManager {
    let repo = InMemoryDivisionRepository::new();
    repo.insert_division(Division::new(1, "Men's 4.0", TeamKind::Doubles))
        .await;
    for id in 1..=teams {
        repo.insert_team(Team::new(id, 1, format!("Team {id}")))
            .await
            .unwrap();
    }
    DivisionManager::new(Arc::new(repo), config)
}

/// Lower team id wins every round-robin match, so seeds follow team ids
async fn play_round_robin(manager: &DivisionManager) {
    for m in manager.generate_round_robin(1).await.unwrap() {
        let (a, b) = (m.team_a.unwrap(), m.team_b.unwrap());
        let (sa, sb) = if a < b { (11, 4) } else { (4, 11) };
        manager.record_game_score(m.id, 1, sa, sb).await.unwrap();
    }
}

/// Score a match so that `winner` takes it 11-7
async fn win(manager: &DivisionManager, m: &Match, winner: i64) {
    let (sa, sb) = if m.team_a == Some(winner) { (11, 7) } else { (7, 11) };
    manager.record_game_score(m.id, 1, sa, sb).await.unwrap();
}

async fn current(manager: &DivisionManager, id: i64) -> Match {
    manager
        .snapshot(1)
        .await
        .unwrap()
        .find_match(id)
        .cloned()
        .unwrap()
}

fn applied(outcome: TransitionOutcome) -> Vec<Match> {
    match outcome {
        TransitionOutcome::Applied { created, .. } => created,
        other => panic!("expected applied transition, got {other:?}"),
    }
}

#[tokio::test]
async fn test_five_teams_through_play_in() {
    let manager = setup(5, EngineConfig::default()).await;
    play_round_robin(&manager).await;
    assert_eq!(
        manager.snapshot(1).await.unwrap().division.stage,
        Stage::RoundRobinComplete
    );

    let banner = manager.sizing_banner(1).await.unwrap();
    assert_eq!(banner.bracket_size, 4);
    assert!(banner.needs_play_in);
    assert_eq!(banner.auto_qualified_count, 3);
    assert_eq!(banner.play_in_team_count, 2);

    let play_in = applied(manager.advance_stage(1).await.unwrap());
    assert_eq!(play_in.len(), 1);
    assert_eq!((play_in[0].team_a, play_in[0].team_b), (Some(4), Some(5)));

    // elimination rows do not exist yet
    let outcome = manager.record_game_score(play_in[0].id, 1, 9, 11).await.unwrap();
    assert!(outcome.propagated.is_empty());
    assert_eq!(outcome.completed, Some(Stage::PlayInComplete));

    let rows = applied(manager.advance_stage(1).await.unwrap());
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|m| m.stage == MatchStage::Elimination));
    assert_eq!((rows[0].team_a, rows[0].team_b), (Some(1), Some(5)));
    assert_eq!((rows[1].team_a, rows[1].team_b), (Some(2), Some(3)));

    let bracket = manager.bracket(1).await.unwrap();
    let opener = bracket.at(1, 0).unwrap();
    assert_eq!(opener.right.seed, 4);
    assert_eq!(opener.right.team_id, Some(5));

    win(&manager, &rows[0], 5).await;
    win(&manager, &rows[1], 2).await;
    let final_match = current(&manager, rows[2].id).await;
    assert_eq!((final_match.team_a, final_match.team_b), (Some(5), Some(2)));

    win(&manager, &final_match, 5).await;
    let snapshot = manager.snapshot(1).await.unwrap();
    assert_eq!(snapshot.division.stage, Stage::Complete);
    let champion = manager.bracket(1).await.unwrap().champion.unwrap();
    assert_eq!(champion.team_id, Some(5));
    assert_eq!(champion.seed, 4);

    let stages: Vec<Stage> = manager
        .transitions(1)
        .await
        .unwrap()
        .iter()
        .map(|t| t.to)
        .collect();
    assert_eq!(
        stages,
        vec![
            Stage::RoundRobinComplete,
            Stage::PlayIn,
            Stage::PlayInComplete,
            Stage::Elimination,
            Stage::Complete
        ]
    );
}

#[tokio::test]
async fn test_four_teams_skip_play_in() {
    let manager = setup(4, EngineConfig::default()).await;
    play_round_robin(&manager).await;

    let rows = applied(
        manager
            .request_transition(1, Stage::Elimination)
            .await
            .unwrap(),
    );
    assert_eq!((rows[0].team_a, rows[0].team_b), (Some(1), Some(4)));
    assert_eq!((rows[1].team_a, rows[1].team_b), (Some(2), Some(3)));

    // the division never had a play-in stage
    assert!(matches!(
        manager.request_transition(1, Stage::PlayIn).await,
        Err(EngineError::TransitionRejected { .. })
    ));
}

#[tokio::test]
async fn test_six_teams_two_play_ins() {
    let manager = setup(6, EngineConfig::default()).await;
    play_round_robin(&manager).await;

    let play_in = applied(manager.advance_stage(1).await.unwrap());
    let pairs: Vec<_> = play_in.iter().map(|m| (m.team_a, m.team_b)).collect();
    assert_eq!(pairs, vec![(Some(3), Some(6)), (Some(4), Some(5))]);

    // a premature elimination request is refused
    assert!(
        manager
            .request_transition(1, Stage::Elimination)
            .await
            .unwrap_err()
            .is_policy_violation()
    );

    win(&manager, &play_in[0], 6).await;
    win(&manager, &play_in[1], 4).await;

    let rows = applied(manager.advance_stage(1).await.unwrap());
    assert_eq!((rows[0].team_a, rows[0].team_b), (Some(1), Some(4)));
    assert_eq!((rows[1].team_a, rows[1].team_b), (Some(2), Some(6)));
}

#[tokio::test]
async fn test_three_game_match_credits_higher_total() {
    let manager = setup(3, EngineConfig::default()).await;
    let rows = manager.generate_round_robin(1).await.unwrap();
    let m = &rows[0];
    for (index, (a, b)) in [(11, 9), (8, 11), (11, 13)].into_iter().enumerate() {
        manager
            .record_game_score(m.id, index as u32 + 1, a, b)
            .await
            .unwrap();
    }

    let standings = manager.standings(1).await.unwrap();
    let first = standings
        .iter()
        .find(|s| Some(s.team_id) == m.team_a)
        .unwrap();
    let second = standings
        .iter()
        .find(|s| Some(s.team_id) == m.team_b)
        .unwrap();
    assert_eq!((first.wins, first.losses), (0, 1));
    assert_eq!((second.wins, second.losses), (1, 0));
    assert_eq!(first.points_for, 30);
    assert_eq!(first.points_against, 33);
    assert_eq!(first.point_diff, -3);
}

#[tokio::test]
async fn test_level_totals_wait_for_tiebreaker() {
    let manager = setup(3, EngineConfig::default()).await;
    let rows = manager.generate_round_robin(1).await.unwrap();
    let m = &rows[0];
    manager.record_game_score(m.id, 1, 11, 9).await.unwrap();
    manager.record_game_score(m.id, 2, 9, 11).await.unwrap();

    let standings = manager.standings(1).await.unwrap();
    assert!(standings.iter().all(|s| s.wins == 0 && s.losses == 0));

    manager
        .save_tiebreaker(m.id, Tiebreaker::new(5, 3))
        .await
        .unwrap();
    let standings = manager.standings(1).await.unwrap();
    let first = standings
        .iter()
        .find(|s| Some(s.team_id) == m.team_a)
        .unwrap();
    assert_eq!((first.wins, first.losses), (1, 0));
    // tiebreaker points stay out of the totals
    assert_eq!((first.points_for, first.points_against), (20, 20));
}

#[tokio::test]
async fn test_third_place_match() {
    let config = EngineConfig::default().with_third_place_match(true);
    let manager = setup(4, config).await;
    play_round_robin(&manager).await;

    let rows = applied(manager.advance_stage(1).await.unwrap());
    assert_eq!(rows.len(), 4);
    let third = rows.iter().find(|m| m.is_third_place).unwrap().clone();
    let final_id = rows
        .iter()
        .find(|m| !m.is_third_place && m.round_index == 1)
        .unwrap()
        .id;

    let outcome = manager.record_game_score(rows[0].id, 1, 11, 2).await.unwrap();
    assert_eq!(outcome.propagated.len(), 2);
    win(&manager, &rows[1], 3).await;

    let third = current(&manager, third.id).await;
    assert_eq!((third.team_a, third.team_b), (Some(4), Some(2)));

    let final_match = current(&manager, final_id).await;
    let outcome = manager
        .record_game_score(final_match.id, 1, 11, 8)
        .await
        .unwrap();
    assert_eq!(outcome.completed, None);
    assert_eq!(outcome.stage, Stage::Elimination);

    win(&manager, &third, 2).await;
    assert_eq!(
        manager.snapshot(1).await.unwrap().division.stage,
        Stage::Complete
    );
}

#[tokio::test]
async fn test_scores_rejected_outside_their_stage() {
    let manager = setup(4, EngineConfig::default()).await;
    play_round_robin(&manager).await;
    let rr_match = manager.snapshot(1).await.unwrap().matches[0].clone();

    assert!(matches!(
        manager.record_game_score(rr_match.id, 2, 11, 0).await,
        Err(EngineError::MatchNotScorable {
            stage: MatchStage::RoundRobin,
            division_stage: Stage::RoundRobinComplete,
            ..
        })
    ));
    assert_eq!(
        manager.record_game_score(999, 1, 11, 0).await,
        Err(EngineError::MatchNotFound(999))
    );
}

#[tokio::test]
async fn test_resubmitted_score_changes_nothing() {
    let manager = setup(4, EngineConfig::default()).await;
    play_round_robin(&manager).await;
    let rows = applied(manager.advance_stage(1).await.unwrap());
    let semi = &rows[0];

    let first = manager.record_game_score(semi.id, 1, 11, 6).await.unwrap();
    assert_eq!(first.propagated.len(), 1);
    assert_eq!(first.propagated[0].team_id, Some(1));
    let before = manager.snapshot(1).await.unwrap();
    let transitions = manager.transitions(1).await.unwrap().len();

    let again = manager.record_game_score(semi.id, 1, 11, 6).await.unwrap();
    assert!(again.propagated.is_empty());
    assert_eq!(again.completed, None);
    assert_eq!(again.stage, Stage::Elimination);
    assert_eq!(manager.snapshot(1).await.unwrap(), before);
    assert_eq!(manager.transitions(1).await.unwrap().len(), transitions);
}

#[tokio::test]
async fn test_out_of_range_score_is_never_stored() {
    let manager = setup(4, EngineConfig::default()).await;
    let rows = manager.generate_round_robin(1).await.unwrap();
    let first = &rows[0];

    assert!(matches!(
        manager.record_game_score(first.id, 1, u32::MAX, 0).await,
        Err(EngineError::ScoreOutOfRange { score: u32::MAX, .. })
    ));
    assert!(current(&manager, first.id).await.games.is_empty());

    for m in &rows {
        let (a, b) = (m.team_a.unwrap(), m.team_b.unwrap());
        let (sa, sb) = if a < b { (MAX_GAME_SCORE, 4) } else { (4, MAX_GAME_SCORE) };
        manager.record_game_score(m.id, 1, sa, sb).await.unwrap();
        if m.id == first.id {
            // a second oversized game cannot push the match totals past u32
            assert!(matches!(
                manager.record_game_score(m.id, 2, u32::MAX, u32::MAX).await,
                Err(EngineError::ScoreOutOfRange { .. })
            ));
        }
    }
    assert_eq!(current(&manager, first.id).await.games.len(), 1);

    let standings = manager.standings(1).await.unwrap();
    assert_eq!(standings[0].team_id, 1);
    assert_eq!(standings[0].points_for, 3 * MAX_GAME_SCORE);
}

#[tokio::test]
async fn test_concurrent_transition_requests_apply_once() {
    let manager = setup(4, EngineConfig::default()).await;
    play_round_robin(&manager).await;

    let (a, b) = tokio::join!(
        manager.request_transition(1, Stage::Elimination),
        manager.request_transition(1, Stage::Elimination)
    );
    let applied_count = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(|o| matches!(o, TransitionOutcome::Applied { .. }))
        .count();
    assert_eq!(applied_count, 1);

    let snapshot = manager.snapshot(1).await.unwrap();
    assert_eq!(snapshot.matches_in(MatchStage::Elimination).count(), 3);
}

#[tokio::test]
async fn test_concurrent_final_scores_complete_once() {
    let manager = setup(4, EngineConfig::default()).await;
    let rows = manager.generate_round_robin(1).await.unwrap();
    let (last, rest) = rows.split_last().unwrap();
    let (second_last, rest) = rest.split_last().unwrap();
    for m in rest {
        manager.record_game_score(m.id, 1, 11, 3).await.unwrap();
    }

    let (a, b) = tokio::join!(
        manager.record_game_score(last.id, 1, 11, 3),
        manager.record_game_score(second_last.id, 1, 11, 3)
    );
    a.unwrap();
    b.unwrap();

    let transitions = manager.transitions(1).await.unwrap();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].to, Stage::RoundRobinComplete);
}

#[tokio::test]
async fn test_simulated_divisions_reach_champion() {
    for seed in 0..12u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let teams = rng.random_range(3..=12);
        let config = EngineConfig::default().with_third_place_match(rng.random_bool(0.5));
        let manager = setup(teams, config).await;
        manager.generate_round_robin(1).await.unwrap();

        for _ in 0..64 {
            let snapshot = manager.snapshot(1).await.unwrap();
            let stage = snapshot.division.stage;
            if stage == Stage::Complete {
                break;
            }
            let Some(scorable) = stage.scorable_matches() else {
                manager.advance_stage(1).await.unwrap();
                continue;
            };

            let open: Vec<Match> = snapshot
                .matches_in(scorable)
                .filter(|m| m.team_a.is_some() && m.team_b.is_some() && !m.is_resolved())
                .cloned()
                .collect();
            for m in open {
                let loser_score = rng.random_range(0..=9);
                let (sa, sb) = if rng.random_bool(0.5) {
                    (11, loser_score)
                } else {
                    (loser_score, 11)
                };
                manager.record_game_score(m.id, 1, sa, sb).await.unwrap();
            }
        }

        let snapshot = manager.snapshot(1).await.unwrap();
        assert_eq!(snapshot.division.stage, Stage::Complete, "seed {seed}");
        let bracket = manager.bracket(1).await.unwrap();
        let champion = bracket.champion.unwrap();
        assert!(champion.team_id.is_some(), "seed {seed}");
        assert!(manager.integrity_report(1).await.unwrap().is_clean());
    }
}
