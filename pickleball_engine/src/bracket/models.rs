//! Bracket graph types.

use super::seeding::SeededTeam;
use super::sizing::BracketSizing;
use crate::division::{Game, MatchId, MatchStage, NewMatch, SlotSide, TeamId, Tiebreaker};
use serde::{Deserialize, Serialize};

/// Display status of a bracket node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// No score entered yet
    Scheduled,
    /// Some score entered but no decisive result
    InProgress,
    /// Decided
    Finished,
}

/// One side of a bracket node.
///
/// `seed` is always present. `team_id`/`team_name` stay empty until the
/// occupant is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlot {
    pub seed: u32,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
    /// Occupant reached this slot without playing the previous round
    pub is_bye: bool,
}

impl BracketSlot {
    /// Seeded placeholder with no known occupant
    pub fn placeholder(seed: u32) -> Self {
        Self {
            seed,
            team_id: None,
            team_name: None,
            is_bye: false,
        }
    }

    pub fn occupied(seed: u32, team_id: TeamId, team_name: impl Into<String>) -> Self {
        Self {
            seed,
            team_id: Some(team_id),
            team_name: Some(team_name.into()),
            is_bye: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.team_id.is_some()
    }
}

/// What currently stands behind a seed number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedResolution {
    /// A known team holds the seed
    Team(SeededTeam),
    /// Nobody holds the seed; the opponent advances
    Bye,
    /// The seed belongs to a play-in match that is not decided yet
    Unresolved,
}

/// A node of the bracket graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatch {
    /// Stable id: `playin-{i}`, `r{round}-p{position}` or `third-place`
    pub id: String,
    /// 0 for play-in, 1 through the Final otherwise
    pub round: u32,
    pub position: u32,
    pub is_third_place: bool,
    pub left: BracketSlot,
    pub right: BracketSlot,
    pub status: MatchStatus,
    pub winner_seed: Option<u32>,
    pub winner_team_id: Option<TeamId>,
    pub next_match_id: Option<String>,
    pub next_slot: Option<SlotSide>,
    /// Where the loser goes, for semifinals feeding a third-place match
    pub loser_next_match_id: Option<String>,
    pub loser_next_slot: Option<SlotSide>,
    /// Persisted match record backing this node, once materialized
    pub match_id: Option<MatchId>,
    pub games: Vec<Game>,
    pub tiebreaker: Option<Tiebreaker>,
}

impl BracketMatch {
    pub(crate) fn new(id: String, round: u32, position: u32, left: BracketSlot, right: BracketSlot) -> Self {
        Self {
            id,
            round,
            position,
            is_third_place: false,
            left,
            right,
            status: MatchStatus::Scheduled,
            winner_seed: None,
            winner_team_id: None,
            next_match_id: None,
            next_slot: None,
            loser_next_match_id: None,
            loser_next_slot: None,
            match_id: None,
            games: Vec::new(),
            tiebreaker: None,
        }
    }

    pub fn slot(&self, side: SlotSide) -> &BracketSlot {
        match side {
            SlotSide::Left => &self.left,
            SlotSide::Right => &self.right,
        }
    }

    pub fn is_play_in(&self) -> bool {
        self.round == 0
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    pub fn winner_side(&self) -> Option<SlotSide> {
        let winner = self.winner_team_id?;
        if self.left.team_id == Some(winner) {
            Some(SlotSide::Left)
        } else if self.right.team_id == Some(winner) {
            Some(SlotSide::Right)
        } else {
            None
        }
    }

    /// Slot shown downstream for this node's winner
    pub fn winner_slot(&self) -> BracketSlot {
        match self.winner_side() {
            Some(side) => BracketSlot {
                seed: self.winner_seed.unwrap_or(self.slot(side).seed),
                is_bye: false,
                ..self.slot(side).clone()
            },
            None => BracketSlot::placeholder(self.left.seed.min(self.right.seed)),
        }
    }

    /// Slot shown downstream for this node's loser
    pub fn loser_slot(&self) -> BracketSlot {
        match self.winner_side() {
            Some(side) => BracketSlot {
                is_bye: false,
                ..self.slot(side.opposite()).clone()
            },
            None => BracketSlot::placeholder(self.left.seed.max(self.right.seed)),
        }
    }

    pub fn loser_team_id(&self) -> Option<TeamId> {
        self.winner_side()
            .and_then(|side| self.slot(side.opposite()).team_id)
    }
}

/// A seed that skipped round 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByeAdvance {
    pub slot: BracketSlot,
    /// Node the occupant is placed into
    pub into_match_id: Option<String>,
    pub into_slot: Option<SlotSide>,
}

/// Complete bracket graph from play-in through the Final
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub sizing: BracketSizing,
    pub field: Vec<SeededTeam>,
    /// Ordered by round, then position; a third-place match comes last
    pub matches: Vec<BracketMatch>,
    pub byes: Vec<ByeAdvance>,
    pub final_match_id: Option<String>,
    pub champion: Option<BracketSlot>,
}

impl Bracket {
    pub fn node(&self, id: &str) -> Option<&BracketMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn by_match_id(&self, match_id: MatchId) -> Option<&BracketMatch> {
        self.matches.iter().find(|m| m.match_id == Some(match_id))
    }

    pub fn at(&self, round: u32, position: u32) -> Option<&BracketMatch> {
        self.matches
            .iter()
            .find(|m| m.round == round && m.position == position && !m.is_third_place)
    }

    pub fn play_in(&self) -> impl Iterator<Item = &BracketMatch> {
        self.matches.iter().filter(|m| m.is_play_in())
    }

    pub fn round(&self, round: u32) -> impl Iterator<Item = &BracketMatch> {
        self.matches
            .iter()
            .filter(move |m| m.round == round && !m.is_third_place)
    }

    pub fn final_match(&self) -> Option<&BracketMatch> {
        self.final_match_id.as_deref().and_then(|id| self.node(id))
    }

    pub fn third_place_match(&self) -> Option<&BracketMatch> {
        self.matches.iter().find(|m| m.is_third_place)
    }

    /// Final decided, along with the third-place match when there is one
    pub fn is_decided(&self) -> bool {
        self.final_match().is_some_and(BracketMatch::is_finished)
            && self.third_place_match().is_none_or(BracketMatch::is_finished)
    }

    /// Match rows to create when the division enters `stage`
    pub fn materialize(&self, stage: MatchStage) -> Vec<NewMatch> {
        let nodes = self.matches.iter().filter(|m| match stage {
            MatchStage::PlayIn => m.is_play_in(),
            MatchStage::Elimination => !m.is_play_in(),
            MatchStage::RoundRobin => false,
        });

        nodes
            .map(|m| NewMatch {
                stage,
                round_index: m.round.saturating_sub(1),
                bracket_position: Some(m.position),
                is_third_place: m.is_third_place,
                team_a: m.left.team_id,
                team_b: m.right.team_id,
            })
            .collect()
    }
}
