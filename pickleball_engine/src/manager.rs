//! Division manager: applies engine decisions through the repository.

use crate::bracket::{Bracket, BracketSizing, bracket_for, sizing_for};
use crate::config::EngineConfig;
use crate::division::{
    DivisionId, DivisionSnapshot, Game, MAX_GAME_SCORE, Match, MatchId, MatchStage, Stage,
    Tiebreaker,
};
use crate::errors::{EngineError, EngineResult};
use crate::repository::{DivisionRepository, StageTransitionRecord, TransitionWrite};
use crate::schedule::generate_round_robin;
use crate::stage::{SlotWrite, StagePlan, StageProgressor};
use crate::standings::{RoundRobinReport, TeamStanding, check_round_robin, standings_for};
use log::{debug, info, warn};
use std::sync::Arc;

/// Result of recording a score or tiebreaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub updated: Match,
    /// Downstream slots changed by this result
    pub propagated: Vec<SlotWrite>,
    /// Division stage after the update
    pub stage: Stage,
    /// Completion transition triggered by this update
    pub completed: Option<Stage>,
}

/// Result of a director-triggered transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied {
        from: Stage,
        to: Stage,
        created: Vec<Match>,
    },
    /// The division was already there; nothing changed
    AlreadyApplied { stage: Stage },
}

/// Division manager
#[derive(Clone)]
pub struct DivisionManager {
    repo: Arc<dyn DivisionRepository>,
    config: Arc<EngineConfig>,
}

impl DivisionManager {
    /// Create a new division manager
    pub fn new(repo: Arc<dyn DivisionRepository>, config: EngineConfig) -> Self {
        Self {
            repo,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn snapshot(&self, division_id: DivisionId) -> EngineResult<DivisionSnapshot> {
        self.repo.load_snapshot(division_id).await
    }

    /// Create every round-robin match for the division
    pub async fn generate_round_robin(&self, division_id: DivisionId) -> EngineResult<Vec<Match>> {
        let snapshot = self.snapshot(division_id).await?;
        if snapshot.division.stage != Stage::RoundRobin {
            return Err(EngineError::StageConflict {
                expected: Stage::RoundRobin,
                actual: snapshot.division.stage,
            });
        }

        let rows = generate_round_robin(&snapshot.division, &snapshot.teams);
        let created = self
            .repo
            .materialize_matches(division_id, MatchStage::RoundRobin, rows)
            .await?;
        info!(
            "Generated {} round-robin matches for division {}",
            created.len(),
            division_id
        );
        Ok(created)
    }

    /// Record one game score and apply whatever follows from it
    pub async fn record_game_score(
        &self,
        match_id: MatchId,
        game_index: u32,
        score_a: u32,
        score_b: u32,
    ) -> EngineResult<ScoreOutcome> {
        if game_index == 0 {
            return Err(EngineError::InvalidGameIndex(game_index));
        }
        check_score_range(score_a)?;
        check_score_range(score_b)?;
        let game = Game::new(game_index, score_a, score_b);

        let division_id = self.repo.get_match(match_id).await?.division_id;
        let snapshot = self.snapshot(division_id).await?;
        let progressor = StageProgressor::new(&self.config);
        let current = progressor.check_scorable(&snapshot, match_id)?;

        let mut prospective = current.clone();
        match prospective.games.iter().position(|g| g.index == game_index) {
            Some(i) => prospective.games[i] = game,
            None => prospective.games.push(game),
        }
        progressor.check_result_change(&snapshot, &prospective)?;

        let updated = self.repo.upsert_game(match_id, game).await?;
        debug!(
            "Match {} game {} recorded {}-{}",
            match_id, game_index, score_a, score_b
        );
        self.settle(division_id, updated).await
    }

    /// Attach a tiebreaker to a match whose games ended level
    pub async fn save_tiebreaker(
        &self,
        match_id: MatchId,
        tiebreaker: Tiebreaker,
    ) -> EngineResult<ScoreOutcome> {
        check_score_range(tiebreaker.team_a_score)?;
        check_score_range(tiebreaker.team_b_score)?;
        if tiebreaker.winner().is_none() {
            return Err(EngineError::TiebreakerNotDecisive {
                team_a_score: tiebreaker.team_a_score,
                team_b_score: tiebreaker.team_b_score,
            });
        }

        let division_id = self.repo.get_match(match_id).await?.division_id;
        let snapshot = self.snapshot(division_id).await?;
        let progressor = StageProgressor::new(&self.config);
        let current = progressor.check_scorable(&snapshot, match_id)?;

        if !matches!(current.totals(), Some((a, b)) if a == b) {
            return Err(EngineError::TiebreakerNotApplicable(match_id));
        }

        let mut prospective = current.clone();
        prospective.tiebreaker = Some(tiebreaker.clone());
        progressor.check_result_change(&snapshot, &prospective)?;

        let updated = self.repo.save_tiebreaker(match_id, tiebreaker).await?;
        self.settle(division_id, updated).await
    }

    /// Propagate the result of `updated` and fire any completion transition
    async fn settle(&self, division_id: DivisionId, updated: Match) -> EngineResult<ScoreOutcome> {
        let progressor = StageProgressor::new(&self.config);

        let mut snapshot = self.snapshot(division_id).await?;
        let propagated = progressor.advancement_writes(&snapshot, updated.id)?;
        for write in &propagated {
            self.repo.write_slot(*write).await?;
            info!(
                "Match {} result placed team {:?} into match {} ({:?})",
                updated.id, write.team_id, write.match_id, write.side
            );
        }
        if !propagated.is_empty() {
            snapshot = self.snapshot(division_id).await?;
        }

        let mut stage = snapshot.division.stage;
        let mut completed = None;
        if let Some(to) = progressor.completed_stage(&snapshot)? {
            let plan = StagePlan {
                division_id,
                from: stage,
                to,
                new_matches: Vec::new(),
            };
            if let TransitionWrite::Applied(_) = self.repo.apply_transition(&plan).await? {
                info!("Division {} moved from {} to {}", division_id, stage, to);
                completed = Some(to);
            }
            stage = to;
        }

        Ok(ScoreOutcome {
            updated,
            propagated,
            stage,
            completed,
        })
    }

    /// Take the division out of a completed stage into the next one
    pub async fn advance_stage(&self, division_id: DivisionId) -> EngineResult<TransitionOutcome> {
        let snapshot = self.snapshot(division_id).await?;
        let plan = StageProgressor::new(&self.config).plan_advance(&snapshot)?;
        self.apply(plan).await
    }

    /// Move the division to `target`, or do nothing if it is already there
    pub async fn request_transition(
        &self,
        division_id: DivisionId,
        target: Stage,
    ) -> EngineResult<TransitionOutcome> {
        let snapshot = self.snapshot(division_id).await?;
        match StageProgressor::new(&self.config).plan_transition(&snapshot, target)? {
            Some(plan) => self.apply(plan).await,
            None => Ok(TransitionOutcome::AlreadyApplied {
                stage: snapshot.division.stage,
            }),
        }
    }

    async fn apply(&self, plan: StagePlan) -> EngineResult<TransitionOutcome> {
        match self.repo.apply_transition(&plan).await? {
            TransitionWrite::Applied(created) => {
                info!(
                    "Division {} moved from {} to {} with {} new matches",
                    plan.division_id,
                    plan.from,
                    plan.to,
                    created.len()
                );
                Ok(TransitionOutcome::Applied {
                    from: plan.from,
                    to: plan.to,
                    created,
                })
            }
            TransitionWrite::AlreadyApplied => {
                warn!(
                    "Division {} was already moved to {}",
                    plan.division_id, plan.to
                );
                Ok(TransitionOutcome::AlreadyApplied { stage: plan.to })
            }
        }
    }

    /// Ranked standings, recomputed from current results
    pub async fn standings(&self, division_id: DivisionId) -> EngineResult<Vec<TeamStanding>> {
        Ok(standings_for(&self.snapshot(division_id).await?))
    }

    /// Bracket graph, recomputed from current results
    pub async fn bracket(&self, division_id: DivisionId) -> EngineResult<Bracket> {
        bracket_for(&self.snapshot(division_id).await?, &self.config)
    }

    /// Play-in banner data: whether play-in is needed and how many qualify directly
    pub async fn sizing_banner(&self, division_id: DivisionId) -> EngineResult<BracketSizing> {
        Ok(sizing_for(&self.snapshot(division_id).await?, &self.config))
    }

    pub async fn integrity_report(&self, division_id: DivisionId) -> EngineResult<RoundRobinReport> {
        let snapshot = self.snapshot(division_id).await?;
        Ok(check_round_robin(
            &snapshot.division,
            &snapshot.teams,
            &snapshot.matches,
        ))
    }

    pub async fn transitions(
        &self,
        division_id: DivisionId,
    ) -> EngineResult<Vec<StageTransitionRecord>> {
        self.repo.transitions(division_id).await
    }
}

fn check_score_range(score: u32) -> EngineResult<()> {
    if score > MAX_GAME_SCORE {
        return Err(EngineError::ScoreOutOfRange {
            score,
            max: MAX_GAME_SCORE,
        });
    }
    Ok(())
}
