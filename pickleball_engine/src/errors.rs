//! Engine error types.

use crate::division::{DivisionId, MatchId, MatchStage, Stage, TeamId};
use thiserror::Error;

/// Engine errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Division not found: {0}")]
    DivisionNotFound(DivisionId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// The division moved on while the caller was working from an older stage
    #[error("Division not in correct stage: expected {expected}, got {actual}")]
    StageConflict { expected: Stage, actual: Stage },

    /// A transition precondition failed
    #[error("Transition from {from} to {to} rejected: {reason}")]
    TransitionRejected {
        from: Stage,
        to: Stage,
        reason: String,
    },

    #[error("{stage} matches already materialized for division {division_id}")]
    AlreadyMaterialized {
        division_id: DivisionId,
        stage: MatchStage,
    },

    #[error("Match {match_id} ({stage}) cannot be scored while division is {division_stage}")]
    MatchNotScorable {
        match_id: MatchId,
        stage: MatchStage,
        division_stage: Stage,
    },

    #[error("Match {0} does not have both teams assigned yet")]
    MatchSlotsUnresolved(MatchId),

    /// A decided result already feeds a match that has started
    #[error("Result of match {0} is locked")]
    ResultLocked(MatchId),

    #[error("Tiebreaker score must be decisive, got {team_a_score}-{team_b_score}")]
    TiebreakerNotDecisive { team_a_score: u32, team_b_score: u32 },

    #[error("Match {0} is not tied; a tiebreaker does not apply")]
    TiebreakerNotApplicable(MatchId),

    #[error("Insufficient teams: need {needed}, have {current}")]
    InsufficientTeams { needed: usize, current: usize },

    #[error("Invalid seed override {seed} for team {team_id}")]
    InvalidSeedOverride { team_id: TeamId, seed: u32 },

    #[error("Invalid game index {0}: games are numbered from 1")]
    InvalidGameIndex(u32),

    #[error("Score {score} is out of range (max {max})")]
    ScoreOutOfRange { score: u32, max: u32 },

    #[error(
        "Round-robin integrity check failed: expected {expected} matches, found {actual} ({problems} problems)"
    )]
    RoundRobinIntegrity {
        expected: usize,
        actual: usize,
        problems: usize,
    },
}

impl EngineError {
    /// Whether the caller asked for something the stage rules forbid, as
    /// opposed to referencing records that do not exist.
    pub fn is_policy_violation(&self) -> bool {
        !matches!(
            self,
            EngineError::DivisionNotFound(_) | EngineError::MatchNotFound(_)
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
