//! Persistence collaborator for division records.
//!
//! The engine reads and writes through [`DivisionRepository`]. Implementations
//! own the atomicity guarantees the engine relies on:
//!
//! - a game-score write is atomic per `(match_id, game index)`
//! - a stage transition is atomic and idempotent; applying a transition the
//!   division already made is a no-op
//! - match rows for a stage are materialized at most once per division

pub mod memory;

pub use memory::InMemoryDivisionRepository;

use crate::division::{
    Division, DivisionId, DivisionSnapshot, Game, Match, MatchId, MatchStage, NewMatch, Stage,
    Team, Tiebreaker,
};
use crate::errors::EngineResult;
use crate::stage::{SlotWrite, StagePlan};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit entry for an applied stage transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransitionRecord {
    pub division_id: DivisionId,
    pub from: Stage,
    pub to: Stage,
    pub matches_created: usize,
    pub at: DateTime<Utc>,
}

/// Outcome of [`DivisionRepository::apply_transition`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionWrite {
    /// Stage changed; these rows were created
    Applied(Vec<Match>),
    /// The division was already in the target stage
    AlreadyApplied,
}

/// Trait for division repository operations
#[async_trait]
pub trait DivisionRepository: Send + Sync {
    async fn get_division(&self, division_id: DivisionId) -> EngineResult<Division>;

    /// Teams in roster order
    async fn list_teams(&self, division_id: DivisionId) -> EngineResult<Vec<Team>>;

    /// Matches of every stage
    async fn list_matches(&self, division_id: DivisionId) -> EngineResult<Vec<Match>>;

    async fn get_match(&self, match_id: MatchId) -> EngineResult<Match>;

    /// Division, teams and matches read together
    async fn load_snapshot(&self, division_id: DivisionId) -> EngineResult<DivisionSnapshot> {
        Ok(DivisionSnapshot {
            division: self.get_division(division_id).await?,
            teams: self.list_teams(division_id).await?,
            matches: self.list_matches(division_id).await?,
        })
    }

    /// Insert or replace the game with `game.index`
    async fn upsert_game(&self, match_id: MatchId, game: Game) -> EngineResult<Match>;

    async fn save_tiebreaker(&self, match_id: MatchId, tiebreaker: Tiebreaker)
    -> EngineResult<Match>;

    /// Place a team into (or clear) one side of a match
    async fn write_slot(&self, write: SlotWrite) -> EngineResult<()>;

    /// Create rows for `stage` without changing the division stage.
    ///
    /// Fails with `AlreadyMaterialized` if rows for that stage exist.
    async fn materialize_matches(
        &self,
        division_id: DivisionId,
        stage: MatchStage,
        rows: Vec<NewMatch>,
    ) -> EngineResult<Vec<Match>>;

    /// Compare-and-set the division stage from `plan.from` to `plan.to` and
    /// create `plan.new_matches`, all at once.
    async fn apply_transition(&self, plan: &StagePlan) -> EngineResult<TransitionWrite>;

    /// Applied transitions, oldest first
    async fn transitions(&self, division_id: DivisionId)
    -> EngineResult<Vec<StageTransitionRecord>>;
}
