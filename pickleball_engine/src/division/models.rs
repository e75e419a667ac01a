//! Division, team and match records as read from the persistence collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Division ID type
pub type DivisionId = i64;

/// Team ID type
pub type TeamId = i64;

/// Match ID type
pub type MatchId = i64;

/// Pool ID type
pub type PoolId = i64;

/// Division-level phase governing which matches may be created or scored.
///
/// Transitions only move forward:
///
/// ```text
/// RoundRobin -> RoundRobinComplete -> (PlayIn -> PlayInComplete ->)? Elimination -> Complete
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Round-robin matches are being played
    #[serde(rename = "RR_IN_PROGRESS")]
    RoundRobin,
    /// Every round-robin match is resolved; standings are final
    #[serde(rename = "RR_COMPLETE")]
    RoundRobinComplete,
    /// Play-in matches are being played
    PlayIn,
    /// Every play-in match is resolved
    PlayInComplete,
    /// Elimination bracket is being played
    Elimination,
    /// The Final is decided
    Complete,
}

impl Stage {
    /// The kind of match that may be scored while the division sits in this stage.
    pub fn scorable_matches(self) -> Option<MatchStage> {
        match self {
            Self::RoundRobin => Some(MatchStage::RoundRobin),
            Self::PlayIn => Some(MatchStage::PlayIn),
            Self::Elimination => Some(MatchStage::Elimination),
            Self::RoundRobinComplete | Self::PlayInComplete | Self::Complete => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Complete
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::RoundRobin => "RR_IN_PROGRESS",
            Self::RoundRobinComplete => "RR_COMPLETE",
            Self::PlayIn => "PLAY_IN",
            Self::PlayInComplete => "PLAY_IN_COMPLETE",
            Self::Elimination => "ELIMINATION",
            Self::Complete => "COMPLETE",
        };
        write!(f, "{repr}")
    }
}

/// Stage a match record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStage {
    RoundRobin,
    PlayIn,
    Elimination,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::RoundRobin => "ROUND_ROBIN",
            Self::PlayIn => "PLAY_IN",
            Self::Elimination => "ELIMINATION",
        };
        write!(f, "{repr}")
    }
}

/// Team format of a division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamKind {
    /// One player per side
    Singles,
    /// Two players per side
    Doubles,
    /// Four players per side
    Squad,
}

/// A scheduling group inside a division
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub name: String,
    /// Scheduling order; lower pools play earlier rounds
    pub order: u32,
}

/// Division record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub id: DivisionId,
    pub name: String,
    pub team_kind: TeamKind,
    #[serde(default)]
    pub pools: Vec<Pool>,
    pub stage: Stage,
}

impl Division {
    /// Create a division in the round-robin stage
    pub fn new(id: DivisionId, name: impl Into<String>, team_kind: TeamKind) -> Self {
        Self {
            id,
            name: name.into(),
            team_kind,
            pools: Vec::new(),
            stage: Stage::RoundRobin,
        }
    }

    /// Attach scheduling pools
    pub fn with_pools(mut self, pools: Vec<Pool>) -> Self {
        self.pools = pools;
        self
    }
}

/// Team record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub division_id: DivisionId,
    pub name: String,
    /// Explicit seed override pinned by the tournament director
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub pool_id: Option<PoolId>,
}

impl Team {
    pub fn new(id: TeamId, division_id: DivisionId, name: impl Into<String>) -> Self {
        Self {
            id,
            division_id,
            name: name.into(),
            seed: None,
            pool_id: None,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn in_pool(mut self, pool_id: PoolId) -> Self {
        self.pool_id = Some(pool_id);
        self
    }
}

/// Highest score accepted for a single game or tiebreaker
pub const MAX_GAME_SCORE: u32 = 99;

/// One game of a match. Either score stays `None` until entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// 1-based game number within the match
    pub index: u32,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
}

impl Game {
    pub fn new(index: u32, score_a: u32, score_b: u32) -> Self {
        Self {
            index,
            score_a: Some(score_a),
            score_b: Some(score_b),
        }
    }

    /// Both scores, if both have been entered
    pub fn scores(&self) -> Option<(u32, u32)> {
        self.score_a.zip(self.score_b)
    }
}

/// A recorded rally in a tiebreaker sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RallyEntry {
    pub order: u32,
    pub team_a_player: Option<String>,
    pub team_b_player: Option<String>,
    pub winner: SlotSide,
}

/// Decisive score attached to a match whose games ended level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tiebreaker {
    pub team_a_score: u32,
    pub team_b_score: u32,
    #[serde(default)]
    pub sequence: Vec<RallyEntry>,
}

impl Tiebreaker {
    pub fn new(team_a_score: u32, team_b_score: u32) -> Self {
        Self {
            team_a_score,
            team_b_score,
            sequence: Vec::new(),
        }
    }

    /// Winning side, or `None` when the scores are level
    pub fn winner(&self) -> Option<SlotSide> {
        match self.team_a_score.cmp(&self.team_b_score) {
            std::cmp::Ordering::Greater => Some(SlotSide::Left),
            std::cmp::Ordering::Less => Some(SlotSide::Right),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// One side of a match. `Left` is team A, `Right` is team B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSide {
    Left,
    Right,
}

impl SlotSide {
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Result state of a match derived from its games and tiebreaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// No game has both scores recorded
    Pending,
    /// Totals are level and no decisive tiebreaker exists
    Tied,
    Decided { winner: SlotSide },
}

/// Match record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub division_id: DivisionId,
    pub stage: MatchStage,
    /// 0-based round within the match's stage
    pub round_index: u32,
    /// Position within the round for play-in and elimination matches
    #[serde(default)]
    pub bracket_position: Option<u32>,
    #[serde(default)]
    pub is_third_place: bool,
    pub team_a: Option<TeamId>,
    pub team_b: Option<TeamId>,
    #[serde(default)]
    pub games: Vec<Game>,
    #[serde(default)]
    pub tiebreaker: Option<Tiebreaker>,
}

impl Match {
    /// Point totals over every game with both scores entered
    pub fn totals(&self) -> Option<(u32, u32)> {
        self.games
            .iter()
            .filter_map(Game::scores)
            .fold(None, |acc, (a, b)| {
                let (ta, tb) = acc.unwrap_or((0, 0));
                Some((ta.saturating_add(a), tb.saturating_add(b)))
            })
    }

    pub fn has_result(&self) -> bool {
        self.totals().is_some()
    }

    pub fn outcome(&self) -> MatchOutcome {
        let Some((a, b)) = self.totals() else {
            return MatchOutcome::Pending;
        };

        match a.cmp(&b) {
            std::cmp::Ordering::Greater => MatchOutcome::Decided {
                winner: SlotSide::Left,
            },
            std::cmp::Ordering::Less => MatchOutcome::Decided {
                winner: SlotSide::Right,
            },
            std::cmp::Ordering::Equal => match self.tiebreaker.as_ref().and_then(Tiebreaker::winner)
            {
                Some(winner) => MatchOutcome::Decided { winner },
                None => MatchOutcome::Tied,
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.outcome(), MatchOutcome::Decided { .. })
    }

    pub fn team(&self, side: SlotSide) -> Option<TeamId> {
        match side {
            SlotSide::Left => self.team_a,
            SlotSide::Right => self.team_b,
        }
    }

    /// Winning team, once the match is decided and the slot is filled
    pub fn winner(&self) -> Option<TeamId> {
        match self.outcome() {
            MatchOutcome::Decided { winner } => self.team(winner),
            _ => None,
        }
    }

    pub fn loser(&self) -> Option<TeamId> {
        match self.outcome() {
            MatchOutcome::Decided { winner } => self.team(winner.opposite()),
            _ => None,
        }
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team_a == Some(team_id) || self.team_b == Some(team_id)
    }
}

/// A match row to be created by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub stage: MatchStage,
    pub round_index: u32,
    pub bracket_position: Option<u32>,
    pub is_third_place: bool,
    pub team_a: Option<TeamId>,
    pub team_b: Option<TeamId>,
}

impl NewMatch {
    /// Round-robin pairing
    pub fn round_robin(round_index: u32, team_a: TeamId, team_b: TeamId) -> Self {
        Self {
            stage: MatchStage::RoundRobin,
            round_index,
            bracket_position: None,
            is_third_place: false,
            team_a: Some(team_a),
            team_b: Some(team_b),
        }
    }
}

/// Everything the engine reads about one division
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionSnapshot {
    pub division: Division,
    pub teams: Vec<Team>,
    #[serde(default)]
    pub matches: Vec<Match>,
}

impl DivisionSnapshot {
    pub fn matches_in(&self, stage: MatchStage) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.stage == stage)
    }

    pub fn find_match(&self, match_id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn team_name(&self, team_id: TeamId) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.id == team_id)
            .map(|t| t.name.as_str())
    }
}
