//! Bracket sizing policies.
//!
//! A policy only answers "how big is the bracket for N teams". The play-in
//! arithmetic in [`size_bracket`] is the same for every policy.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// Chooses the elimination bracket size for a field of `team_count` teams.
#[enum_dispatch]
pub trait SizingPolicy {
    /// Bracket size; always a power of two.
    fn bracket_size(&self, team_count: u32) -> u32;
}

/// One rung of a [`LadderPolicy`]: fields up to `max_teams` use `bracket_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderStep {
    pub max_teams: u32,
    pub bracket_size: u32,
}

/// Fixed table of supported bracket sizes.
///
/// The default ladder caps 17-24 teams at a 16 bracket with play-in instead
/// of rounding up to 32.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderPolicy {
    pub steps: Vec<LadderStep>,
    /// Size used above the last step
    pub fallback: u32,
}

impl LadderPolicy {
    pub fn new(steps: Vec<LadderStep>, fallback: u32) -> Self {
        Self { steps, fallback }
    }
}

impl Default for LadderPolicy {
    fn default() -> Self {
        let step = |max_teams, bracket_size| LadderStep {
            max_teams,
            bracket_size,
        };
        Self {
            steps: vec![step(8, 4), step(16, 8), step(24, 16), step(32, 32)],
            fallback: 64,
        }
    }
}

impl SizingPolicy for LadderPolicy {
    fn bracket_size(&self, team_count: u32) -> u32 {
        self.steps
            .iter()
            .find(|step| team_count <= step.max_teams)
            .map_or(self.fallback, |step| step.bracket_size)
    }
}

/// Largest power of two not above the field (minimum 2). Every field that is
/// not itself a power of two plays in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerOfTwoPolicy;

impl SizingPolicy for PowerOfTwoPolicy {
    fn bracket_size(&self, team_count: u32) -> u32 {
        if team_count <= 2 {
            2
        } else {
            1 << (31 - team_count.leading_zeros())
        }
    }
}

/// Sizing policy selected by configuration
#[enum_dispatch(SizingPolicy)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketPolicy {
    Ladder(LadderPolicy),
    PowerOfTwo(PowerOfTwoPolicy),
}

impl Default for BracketPolicy {
    fn default() -> Self {
        Self::Ladder(LadderPolicy::default())
    }
}

/// How a field of teams maps onto a bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSizing {
    pub team_count: u32,
    pub bracket_size: u32,
    pub needs_play_in: bool,
    pub auto_qualified_count: u32,
    pub play_in_team_count: u32,
}

impl BracketSizing {
    pub fn play_in_match_count(&self) -> u32 {
        self.play_in_team_count / 2
    }

    /// Teams that take a bracket position once play-in is resolved
    pub fn field_size(&self) -> u32 {
        self.auto_qualified_count + self.play_in_match_count()
    }

    /// Elimination rounds from round 1 through the Final
    pub fn round_count(&self) -> u32 {
        self.bracket_size.max(1).next_power_of_two().trailing_zeros()
    }

    /// Seeds that play in rather than qualifying directly
    pub fn play_in_seeds(&self) -> std::ops::RangeInclusive<u32> {
        (self.auto_qualified_count + 1)..=(self.auto_qualified_count + self.play_in_team_count)
    }
}

/// Size the bracket for `team_count` teams under `policy`.
pub fn size_bracket(policy: &impl SizingPolicy, team_count: u32) -> BracketSizing {
    let bracket_size = policy.bracket_size(team_count);
    let needs_play_in = bracket_size < team_count && team_count < 2 * bracket_size;

    let (auto_qualified_count, play_in_team_count) = if needs_play_in {
        let excess = team_count - bracket_size;
        (team_count - 2 * excess, 2 * excess)
    } else {
        (bracket_size.min(team_count), 0)
    };

    BracketSizing {
        team_count,
        bracket_size,
        needs_play_in,
        auto_qualified_count,
        play_in_team_count,
    }
}
