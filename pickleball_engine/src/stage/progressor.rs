//! Division stage machine.
//!
//! The progressor is pure: it reads a [`DivisionSnapshot`] and answers which
//! transition is due, which rows a transition creates and which downstream
//! slots a result fills. Writing any of that back is the caller's job.

use crate::bracket::{Bracket, bracket_for};
use crate::config::EngineConfig;
use crate::division::{
    DivisionId, DivisionSnapshot, Match, MatchId, MatchStage, NewMatch, SlotSide, Stage, TeamId,
};
use crate::errors::{EngineError, EngineResult};
use crate::standings::check_round_robin;
use log::debug;
use serde::{Deserialize, Serialize};

/// A stage change together with the match rows it creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    pub division_id: DivisionId,
    pub from: Stage,
    pub to: Stage,
    pub new_matches: Vec<NewMatch>,
}

/// Parent-pointer write placing (or clearing) a team in a downstream slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWrite {
    pub match_id: MatchId,
    pub side: SlotSide,
    pub team_id: Option<TeamId>,
}

fn rejected(from: Stage, to: Stage, reason: impl Into<String>) -> EngineError {
    EngineError::TransitionRejected {
        from,
        to,
        reason: reason.into(),
    }
}

/// Stage that normally follows `stage`
fn successor(stage: Stage) -> Stage {
    match stage {
        Stage::RoundRobin => Stage::RoundRobinComplete,
        Stage::RoundRobinComplete => Stage::Elimination,
        Stage::PlayIn => Stage::PlayInComplete,
        Stage::PlayInComplete => Stage::Elimination,
        Stage::Elimination | Stage::Complete => Stage::Complete,
    }
}

/// Stage machine over division snapshots
pub struct StageProgressor<'a> {
    config: &'a EngineConfig,
}

impl<'a> StageProgressor<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    fn all_resolved(snapshot: &DivisionSnapshot, stage: MatchStage) -> bool {
        let mut matches = snapshot.matches_in(stage).peekable();
        matches.peek().is_some() && matches.all(Match::is_resolved)
    }

    /// Completion transition that results already justify, if any.
    pub fn completed_stage(&self, snapshot: &DivisionSnapshot) -> EngineResult<Option<Stage>> {
        let done = match snapshot.division.stage {
            Stage::RoundRobin => Self::all_resolved(snapshot, MatchStage::RoundRobin)
                .then_some(Stage::RoundRobinComplete),
            Stage::PlayIn => {
                Self::all_resolved(snapshot, MatchStage::PlayIn).then_some(Stage::PlayInComplete)
            }
            Stage::Elimination => bracket_for(snapshot, self.config)?
                .is_decided()
                .then_some(Stage::Complete),
            Stage::RoundRobinComplete | Stage::PlayInComplete | Stage::Complete => None,
        };
        Ok(done)
    }

    /// Plan the director-triggered transition out of a completed stage.
    ///
    /// From RR_COMPLETE this enters PLAY_IN when the field needs one and
    /// ELIMINATION otherwise; from PLAY_IN_COMPLETE it enters ELIMINATION.
    pub fn plan_advance(&self, snapshot: &DivisionSnapshot) -> EngineResult<StagePlan> {
        let from = snapshot.division.stage;
        let plan = |to, new_matches| StagePlan {
            division_id: snapshot.division.id,
            from,
            to,
            new_matches,
        };

        match from {
            Stage::RoundRobinComplete => {
                self.check_field(snapshot, from)?;
                let bracket = bracket_for(snapshot, self.config)?;
                if bracket.sizing.needs_play_in {
                    Ok(plan(Stage::PlayIn, bracket.materialize(MatchStage::PlayIn)))
                } else {
                    Ok(plan(
                        Stage::Elimination,
                        bracket.materialize(MatchStage::Elimination),
                    ))
                }
            }
            Stage::PlayInComplete => {
                let bracket = bracket_for(snapshot, self.config)?;
                if let Some(open) = bracket.play_in().find(|m| !m.is_finished()) {
                    return Err(rejected(
                        from,
                        Stage::Elimination,
                        format!("play-in match {} is not decided", open.id),
                    ));
                }
                Ok(plan(
                    Stage::Elimination,
                    bracket.materialize(MatchStage::Elimination),
                ))
            }
            Stage::RoundRobin => Err(rejected(
                from,
                successor(from),
                "round robin is still in progress",
            )),
            Stage::PlayIn => Err(rejected(
                from,
                successor(from),
                "play-in is still in progress",
            )),
            Stage::Elimination => Err(rejected(
                from,
                successor(from),
                "division completes when the Final is decided",
            )),
            Stage::Complete => Err(rejected(from, from, "division is complete")),
        }
    }

    /// Plan a transition to a specific stage.
    ///
    /// Returns `Ok(None)` when the division already reached `target`.
    pub fn plan_transition(
        &self,
        snapshot: &DivisionSnapshot,
        target: Stage,
    ) -> EngineResult<Option<StagePlan>> {
        let current = snapshot.division.stage;

        if target <= current {
            let skipped_play_in = matches!(target, Stage::PlayIn | Stage::PlayInComplete)
                && current > Stage::PlayInComplete
                && snapshot.matches_in(MatchStage::PlayIn).next().is_none();
            if skipped_play_in {
                return Err(rejected(current, target, "this division had no play-in"));
            }
            debug!("Division {} already reached {}", snapshot.division.id, target);
            return Ok(None);
        }

        match target {
            Stage::RoundRobinComplete | Stage::PlayInComplete | Stage::Complete => {
                match self.completed_stage(snapshot)? {
                    Some(done) if done == target => Ok(Some(StagePlan {
                        division_id: snapshot.division.id,
                        from: current,
                        to: target,
                        new_matches: Vec::new(),
                    })),
                    _ => Err(rejected(
                        current,
                        target,
                        "results do not complete the current stage",
                    )),
                }
            }
            Stage::PlayIn | Stage::Elimination => {
                let plan = self.plan_advance(snapshot).map_err(|err| match err {
                    EngineError::TransitionRejected { from, reason, .. } => {
                        rejected(from, target, reason)
                    }
                    other => other,
                })?;
                if plan.to == target {
                    Ok(Some(plan))
                } else {
                    Err(rejected(
                        current,
                        target,
                        format!("next stage is {}", plan.to),
                    ))
                }
            }
            Stage::RoundRobin => Ok(None),
        }
    }

    fn check_field(&self, snapshot: &DivisionSnapshot, from: Stage) -> EngineResult<()> {
        let teams = snapshot.teams.len();
        if teams < self.config.min_elimination_teams {
            return Err(EngineError::InsufficientTeams {
                needed: self.config.min_elimination_teams,
                current: teams,
            });
        }

        if self.config.require_clean_round_robin && from == Stage::RoundRobinComplete {
            let report = check_round_robin(&snapshot.division, &snapshot.teams, &snapshot.matches);
            if !report.is_clean() {
                return Err(EngineError::RoundRobinIntegrity {
                    expected: report.expected_matches,
                    actual: report.actual_matches,
                    problems: report.problem_count(),
                });
            }
        }
        Ok(())
    }

    /// The match, if it may be scored right now
    pub fn check_scorable<'s>(
        &self,
        snapshot: &'s DivisionSnapshot,
        match_id: MatchId,
    ) -> EngineResult<&'s Match> {
        let record = snapshot
            .find_match(match_id)
            .ok_or(EngineError::MatchNotFound(match_id))?;

        let division_stage = snapshot.division.stage;
        if division_stage.scorable_matches() != Some(record.stage) {
            return Err(EngineError::MatchNotScorable {
                match_id,
                stage: record.stage,
                division_stage,
            });
        }
        if record.team_a.is_none() || record.team_b.is_none() {
            return Err(EngineError::MatchSlotsUnresolved(match_id));
        }
        Ok(record)
    }

    /// Reject an update that changes a decided elimination result after the
    /// match it feeds has started.
    pub fn check_result_change(
        &self,
        snapshot: &DivisionSnapshot,
        updated: &Match,
    ) -> EngineResult<()> {
        if updated.stage != MatchStage::Elimination {
            return Ok(());
        }
        let Some(before) = snapshot.find_match(updated.id) else {
            return Err(EngineError::MatchNotFound(updated.id));
        };
        if before.winner().is_none() || before.winner() == updated.winner() {
            return Ok(());
        }

        let bracket = bracket_for(snapshot, self.config)?;
        let Some(node) = bracket.by_match_id(updated.id) else {
            return Ok(());
        };
        let started = [&node.next_match_id, &node.loser_next_match_id]
            .into_iter()
            .flatten()
            .filter_map(|id| bracket.node(id))
            .filter_map(|downstream| downstream.match_id)
            .filter_map(|id| snapshot.find_match(id))
            .any(Match::has_result);

        if started {
            Err(EngineError::ResultLocked(updated.id))
        } else {
            Ok(())
        }
    }

    /// Downstream slot writes implied by the current result of `match_id`.
    ///
    /// Only writes that change a persisted slot are returned, so replaying the
    /// same result yields nothing.
    pub fn advancement_writes(
        &self,
        snapshot: &DivisionSnapshot,
        match_id: MatchId,
    ) -> EngineResult<Vec<SlotWrite>> {
        let record = snapshot
            .find_match(match_id)
            .ok_or(EngineError::MatchNotFound(match_id))?;
        if record.stage != MatchStage::Elimination {
            return Ok(Vec::new());
        }

        let bracket = bracket_for(snapshot, self.config)?;
        let Some(node) = bracket.by_match_id(match_id) else {
            return Ok(Vec::new());
        };

        let winner = node.winner_team_id;
        let loser = node.loser_team_id();
        let mut writes = Vec::new();
        for (target, side, team_id) in [
            (&node.next_match_id, node.next_slot, winner),
            (&node.loser_next_match_id, node.loser_next_slot, loser),
        ] {
            if let Some(write) = Self::write_for(&bracket, snapshot, target.as_deref(), side, team_id) {
                writes.push(write);
            }
        }
        Ok(writes)
    }

    fn write_for(
        bracket: &Bracket,
        snapshot: &DivisionSnapshot,
        target: Option<&str>,
        side: Option<SlotSide>,
        team_id: Option<TeamId>,
    ) -> Option<SlotWrite> {
        let side = side?;
        let match_id = bracket.node(target?)?.match_id?;
        let current = snapshot.find_match(match_id)?.team(side);
        (current != team_id).then_some(SlotWrite {
            match_id,
            side,
            team_id,
        })
    }
}
