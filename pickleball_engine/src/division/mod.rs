//! Division records consumed by the engine.
//!
//! The engine never owns these records. They are read from the persistence
//! collaborator as a [`DivisionSnapshot`] and every derived view (standings,
//! bracket, stage) is recomputed from that snapshot.

pub mod models;

pub use models::{
    Division, DivisionId, DivisionSnapshot, Game, MAX_GAME_SCORE, Match, MatchId, MatchOutcome,
    MatchStage, NewMatch, Pool, PoolId, RallyEntry, SlotSide, Stage, Team, TeamId, TeamKind,
    Tiebreaker,
};
