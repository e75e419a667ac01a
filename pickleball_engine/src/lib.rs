//! # Pickleball Engine
//!
//! Division stage and bracket engine for pickleball tournaments.
//!
//! A division moves through a fixed sequence of stages:
//!
//! - **RoundRobin**: every team plays every other team in its group
//! - **RoundRobinComplete**: all round-robin matches have a winner
//! - **PlayIn** / **PlayInComplete**: only when the field does not fit the
//!   bracket; the lowest seeds play for the remaining places
//! - **Elimination**: single elimination from canonically seeded pairs
//! - **Complete**: the Final (and third-place match, if enabled) is decided
//!
//! Standings, sizing and the bracket graph are always recomputed from the
//! persisted match records, so the engine itself holds no state. The
//! [`DivisionManager`] applies the engine's decisions through a
//! [`DivisionRepository`].
//!
//! ## Core Modules
//!
//! - [`standings`]: win/loss standings and round-robin integrity checks
//! - [`bracket`]: bracket sizing, canonical seeding and graph construction
//! - [`stage`]: stage machine and advancement planning
//! - [`manager`]: async orchestration over a repository
//!
//! ## Example
//!
//! ```
//! use pickleball_engine::{BracketPolicy, size_bracket};
//!
//! let sizing = size_bracket(&BracketPolicy::default(), 6);
//! assert_eq!(sizing.bracket_size, 4);
//! assert!(sizing.needs_play_in);
//! assert_eq!(sizing.auto_qualified_count, 2);
//! ```

/// Bracket sizing, seeding and graph construction.
pub mod bracket;
pub use bracket::{
    Bracket, BracketBuilder, BracketMatch, BracketPolicy, BracketSizing, BracketSlot, MatchStatus,
    SeedResolution, SeededTeam, SizingPolicy, bracket_for, size_bracket,
};

pub mod config;
pub use config::{ConfigError, EngineConfig};

/// Division, team and match records.
pub mod division;
pub use division::{
    Division, DivisionId, DivisionSnapshot, Game, Match, MatchId, MatchStage, SlotSide, Stage,
    Team, TeamId, Tiebreaker,
};

pub mod errors;
pub use errors::{EngineError, EngineResult};

pub mod manager;
pub use manager::{DivisionManager, ScoreOutcome, TransitionOutcome};

pub mod repository;
pub use repository::{DivisionRepository, InMemoryDivisionRepository};

pub mod schedule;

/// Stage machine.
pub mod stage;
pub use stage::{SlotWrite, StagePlan, StageProgressor};

/// Standings and round-robin integrity.
pub mod standings;
pub use standings::{RoundRobinReport, TeamStanding, compute_standings};
