//! Division Walkthrough Example
//!
//! Runs a six-team division from round robin through play-in to a champion.

use pickleball_engine::division::TeamKind;
use pickleball_engine::{
    Division, DivisionManager, EngineConfig, EngineResult, InMemoryDivisionRepository, Match,
    Stage, Team, TransitionOutcome,
};
use std::sync::Arc;

/// Lower team id takes the match 11-6
async fn play(manager: &DivisionManager, m: &Match) -> EngineResult<()> {
    let (Some(a), Some(b)) = (m.team_a, m.team_b) else {
        return Ok(());
    };
    let (sa, sb) = if a < b { (11, 6) } else { (6, 11) };
    manager.record_game_score(m.id, 1, sa, sb).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> EngineResult<()> {
    println!("=== Division Walkthrough ===\n");

    let repo = InMemoryDivisionRepository::new();
    repo.insert_division(Division::new(1, "Mixed 3.5", TeamKind::Doubles))
        .await;
    for (id, name) in ["Dinks", "Kitchen", "Lobsters", "Poachers", "Erne", "Volley"]
        .into_iter()
        .enumerate()
    {
        repo.insert_team(Team::new(id as i64 + 1, 1, name)).await?;
    }
    let manager = DivisionManager::new(Arc::new(repo), EngineConfig::default());

    println!("Round robin");
    for m in manager.generate_round_robin(1).await? {
        play(&manager, &m).await?;
    }
    for s in manager.standings(1).await? {
        println!(
            "  {}. {:<10} {}-{}  {:+}",
            s.rank, s.team_name, s.wins, s.losses, s.point_diff
        );
    }

    let banner = manager.sizing_banner(1).await?;
    println!(
        "\nBracket of {}: play-in needed = {}, {} teams qualify directly\n",
        banner.bracket_size, banner.needs_play_in, banner.auto_qualified_count
    );

    loop {
        let snapshot = manager.snapshot(1).await?;
        match snapshot.division.stage {
            Stage::Complete => break,
            Stage::RoundRobinComplete | Stage::PlayInComplete => {
                if let TransitionOutcome::Applied { to, created, .. } =
                    manager.advance_stage(1).await?
                {
                    println!("Entered {to} with {} matches", created.len());
                }
            }
            stage => {
                let Some(scorable) = stage.scorable_matches() else {
                    break;
                };
                let open: Vec<Match> = snapshot
                    .matches_in(scorable)
                    .filter(|m| !m.is_resolved())
                    .cloned()
                    .collect();
                for m in &open {
                    play(&manager, m).await?;
                }
            }
        }
    }

    let bracket = manager.bracket(1).await?;
    for m in &bracket.matches {
        println!(
            "  {:<12} #{} {:?} vs #{} {:?} -> {:?}",
            m.id, m.left.seed, m.left.team_name, m.right.seed, m.right.team_name, m.winner_team_id
        );
    }
    if let Some(champion) = bracket.champion {
        println!("\nChampion: {:?} (seed {})", champion.team_name, champion.seed);
    }

    Ok(())
}
