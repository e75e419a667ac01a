//! Bracket graph construction.
//!
//! The graph is built bottom-up in a single pass over immutable
//! `(round, position)` indices. Round-1 position `p` is canonical pair `p`;
//! round `r` position `p` is fed by round `r - 1` positions `2p` and `2p + 1`.
//! A feeder that holds nobody collapses: its sibling passes straight through
//! without a node, which is how byes and walkovers stay out of the graph.

use super::models::{Bracket, BracketMatch, BracketSlot, ByeAdvance, MatchStatus, SeedResolution};
use super::seeding::{SeededTeam, canonical_pairs};
use super::sizing::BracketSizing;
use crate::division::{Match, MatchStage, SlotSide};
use log::warn;

const THIRD_PLACE_ID: &str = "third-place";

/// What arrives at one side of a prospective node
enum Feed {
    /// Nobody can arrive here
    Empty,
    /// An occupant arriving without a node at this level
    Through {
        slot: BracketSlot,
        /// Play-in node whose winner this is
        play_in: Option<usize>,
        /// Entry in the bye list to point at the receiving node
        bye: Option<usize>,
    },
    /// Winner of an existing node
    Node(usize),
}

/// Builds a [`Bracket`] from seeds, sizing and whatever results exist.
pub struct BracketBuilder<'a> {
    sizing: BracketSizing,
    field: &'a [SeededTeam],
    records: &'a [Match],
    third_place: bool,
}

impl<'a> BracketBuilder<'a> {
    /// `field` must hold every seeded team, ordered by seed.
    pub fn new(sizing: BracketSizing, field: &'a [SeededTeam]) -> Self {
        Self {
            sizing,
            field,
            records: &[],
            third_place: false,
        }
    }

    /// Persisted play-in and elimination match records to read results from
    pub fn with_results(mut self, records: &'a [Match]) -> Self {
        self.records = records;
        self
    }

    pub fn with_third_place(mut self, enabled: bool) -> Self {
        self.third_place = enabled;
        self
    }

    fn seeded(&self, seed: u32) -> Option<&'a SeededTeam> {
        self.field.iter().find(|s| s.seed == seed)
    }

    fn record(&self, stage: MatchStage, round_index: u32, position: u32, third: bool) -> Option<&'a Match> {
        self.records.iter().find(|m| {
            m.stage == stage
                && m.is_third_place == third
                && (third || (m.round_index == round_index && m.bracket_position == Some(position)))
        })
    }

    /// Seeds meeting in play-in match `index`: the best remaining play-in
    /// seed against the worst.
    fn play_in_seeds(&self, index: u32) -> (u32, u32) {
        let first = self.sizing.auto_qualified_count + 1 + index;
        let last = self.sizing.auto_qualified_count + self.sizing.play_in_team_count - index;
        (first, last)
    }

    fn play_in_winner(&self, index: u32) -> Option<&'a SeededTeam> {
        let record = self.record(MatchStage::PlayIn, 0, index, false)?;
        let winner = record.winner()?;
        let (a, b) = self.play_in_seeds(index);
        let team = [a, b]
            .into_iter()
            .filter_map(|seed| self.seeded(seed))
            .find(|s| s.team_id == winner);
        if team.is_none() {
            warn!(
                "Play-in match {} names winner {} who is not seeded {} or {}",
                record.id, winner, a, b
            );
        }
        team
    }

    /// Who currently holds `seed` in the elimination bracket.
    ///
    /// Play-in winners take the better seed of their match.
    pub fn resolve_seed(&self, seed: u32) -> SeedResolution {
        if seed == 0 || seed > self.sizing.field_size() {
            return SeedResolution::Bye;
        }

        if seed <= self.sizing.auto_qualified_count {
            return match self.seeded(seed) {
                Some(team) => SeedResolution::Team(team.clone()),
                None => SeedResolution::Bye,
            };
        }

        let index = seed - self.sizing.auto_qualified_count - 1;
        match self.play_in_winner(index) {
            Some(team) => SeedResolution::Team(SeededTeam {
                seed,
                ..team.clone()
            }),
            None => SeedResolution::Unresolved,
        }
    }

    fn is_play_in_seed(&self, seed: u32) -> bool {
        self.sizing.needs_play_in && seed > self.sizing.auto_qualified_count
    }

    /// Fill status and winner of a node from its backing record
    fn settle(node: &mut BracketMatch, record: Option<&Match>, inherit_better_seed: bool) {
        let Some(record) = record else {
            return;
        };
        node.match_id = Some(record.id);
        node.games = record.games.clone();
        node.tiebreaker = record.tiebreaker.clone();

        if let Some(winner) = record.winner() {
            let side = if node.left.team_id == Some(winner) {
                Some(SlotSide::Left)
            } else if node.right.team_id == Some(winner) {
                Some(SlotSide::Right)
            } else {
                None
            };

            match side {
                Some(side) => {
                    node.status = MatchStatus::Finished;
                    node.winner_team_id = Some(winner);
                    node.winner_seed = Some(if inherit_better_seed {
                        node.left.seed.min(node.right.seed)
                    } else {
                        node.slot(side).seed
                    });
                    return;
                }
                None => warn!(
                    "Match {} names winner {} who does not occupy node {}",
                    record.id, winner, node.id
                ),
            }
        }

        if record.has_result() {
            node.status = MatchStatus::InProgress;
        }
    }

    fn slot_for(&self, seed: u32, resolution: &SeedResolution) -> BracketSlot {
        match resolution {
            SeedResolution::Team(team) => BracketSlot::occupied(seed, team.team_id, &team.team_name),
            SeedResolution::Bye | SeedResolution::Unresolved => BracketSlot::placeholder(seed),
        }
    }

    fn feed_slot(nodes: &[BracketMatch], feed: &Feed) -> BracketSlot {
        match feed {
            Feed::Through { slot, .. } => slot.clone(),
            Feed::Node(i) => nodes[*i].winner_slot(),
            Feed::Empty => BracketSlot::placeholder(0),
        }
    }

    /// Point a feed at the node it was consumed by
    fn link(
        nodes: &mut [BracketMatch],
        byes: &mut [ByeAdvance],
        feed: &Feed,
        target: &str,
        side: SlotSide,
    ) {
        match feed {
            Feed::Node(i) => {
                nodes[*i].next_match_id = Some(target.to_string());
                nodes[*i].next_slot = Some(side);
            }
            Feed::Through { play_in, bye, .. } => {
                if let Some(i) = play_in {
                    nodes[*i].next_match_id = Some(target.to_string());
                    nodes[*i].next_slot = Some(side);
                }
                if let Some(i) = bye {
                    byes[*i].into_match_id = Some(target.to_string());
                    byes[*i].into_slot = Some(side);
                }
            }
            Feed::Empty => {}
        }
    }

    /// Build the full graph.
    pub fn build(&self) -> Bracket {
        let mut nodes: Vec<BracketMatch> = Vec::new();
        let mut byes: Vec<ByeAdvance> = Vec::new();

        // Play-in, round 0
        let play_in_count = if self.sizing.needs_play_in {
            self.sizing.play_in_match_count()
        } else {
            0
        };
        for index in 0..play_in_count {
            let (a, b) = self.play_in_seeds(index);
            let slot = |seed| match self.seeded(seed) {
                Some(team) => BracketSlot::occupied(seed, team.team_id, &team.team_name),
                None => BracketSlot::placeholder(seed),
            };
            let mut node = BracketMatch::new(format!("playin-{index}"), 0, index, slot(a), slot(b));
            Self::settle(&mut node, self.record(MatchStage::PlayIn, 0, index, false), true);
            nodes.push(node);
        }
        let play_in_node = |seed: u32| -> Option<usize> {
            self.is_play_in_seed(seed)
                .then(|| (seed - self.sizing.auto_qualified_count - 1) as usize)
                .filter(|&i| i < play_in_count as usize)
        };

        // Round 1
        let mut feeds: Vec<Feed> = Vec::new();
        for (position, &(a, b)) in canonical_pairs(self.sizing.bracket_size).iter().enumerate() {
            let position = position as u32;
            let (ra, rb) = (self.resolve_seed(a), self.resolve_seed(b));

            let feed = match (&ra, &rb) {
                (SeedResolution::Bye, SeedResolution::Bye) => Feed::Empty,
                (present, SeedResolution::Bye) | (SeedResolution::Bye, present) => {
                    let seed = if matches!(ra, SeedResolution::Bye) { b } else { a };
                    let slot = BracketSlot {
                        is_bye: true,
                        ..self.slot_for(seed, present)
                    };
                    byes.push(ByeAdvance {
                        slot: slot.clone(),
                        into_match_id: None,
                        into_slot: None,
                    });
                    Feed::Through {
                        slot,
                        play_in: play_in_node(seed),
                        bye: Some(byes.len() - 1),
                    }
                }
                _ => {
                    let id = format!("r1-p{position}");
                    let mut node = BracketMatch::new(
                        id.clone(),
                        1,
                        position,
                        self.slot_for(a, &ra),
                        self.slot_for(b, &rb),
                    );
                    for (seed, side) in [(a, SlotSide::Left), (b, SlotSide::Right)] {
                        if let Some(i) = play_in_node(seed) {
                            nodes[i].next_match_id = Some(id.clone());
                            nodes[i].next_slot = Some(side);
                        }
                    }
                    Self::settle(
                        &mut node,
                        self.record(MatchStage::Elimination, 0, position, false),
                        false,
                    );
                    nodes.push(node);
                    Feed::Node(nodes.len() - 1)
                }
            };
            feeds.push(feed);
        }

        // Rounds 2 through the Final
        let rounds = self.sizing.round_count();
        for round in 2..=rounds {
            let mut next = Vec::with_capacity(feeds.len() / 2);
            let mut current = feeds.into_iter();
            let mut position = 0u32;
            while let (Some(left), Some(right)) = (current.next(), current.next()) {
                let feed = match (left, right) {
                    (Feed::Empty, Feed::Empty) => Feed::Empty,
                    (only, Feed::Empty) | (Feed::Empty, only) => only,
                    (left, right) => {
                        let id = format!("r{round}-p{position}");
                        let mut node = BracketMatch::new(
                            id.clone(),
                            round,
                            position,
                            Self::feed_slot(&nodes, &left),
                            Self::feed_slot(&nodes, &right),
                        );
                        node.left.is_bye = matches!(left, Feed::Through { .. });
                        node.right.is_bye = matches!(right, Feed::Through { .. });
                        Self::link(&mut nodes, &mut byes, &left, &id, SlotSide::Left);
                        Self::link(&mut nodes, &mut byes, &right, &id, SlotSide::Right);
                        Self::settle(
                            &mut node,
                            self.record(MatchStage::Elimination, round - 1, position, false),
                            false,
                        );
                        nodes.push(node);
                        Feed::Node(nodes.len() - 1)
                    }
                };
                next.push(feed);
                position += 1;
            }
            feeds = next;
        }
        let top = feeds.into_iter().next().unwrap_or(Feed::Empty);
        let (final_match_id, champion) = match &top {
            Feed::Node(i) => {
                let final_node = &nodes[*i];
                let champion = final_node.is_finished().then(|| final_node.winner_slot());
                (Some(final_node.id.clone()), champion)
            }
            Feed::Through { slot, .. } => (None, slot.is_resolved().then(|| slot.clone())),
            Feed::Empty => (None, None),
        };

        if self.third_place {
            self.attach_third_place(&mut nodes, final_match_id.as_deref(), rounds);
        }

        nodes.sort_by_key(|n| (n.round, n.is_third_place, n.position));

        Bracket {
            sizing: self.sizing,
            field: self.field.to_vec(),
            matches: nodes,
            byes,
            final_match_id,
            champion,
        }
    }

    /// Third-place node between the losers of the two semifinals, when both
    /// semifinals are real matches.
    fn attach_third_place(&self, nodes: &mut Vec<BracketMatch>, final_id: Option<&str>, rounds: u32) {
        if rounds < 2 || final_id.is_none() {
            return;
        }
        let semifinal = |side: SlotSide| {
            nodes.iter().position(|n| {
                n.round == rounds - 1
                    && n.next_match_id.as_deref() == final_id
                    && n.next_slot == Some(side)
            })
        };
        let (Some(left), Some(right)) = (semifinal(SlotSide::Left), semifinal(SlotSide::Right))
        else {
            return;
        };

        let mut node = BracketMatch::new(
            THIRD_PLACE_ID.to_string(),
            rounds,
            1,
            nodes[left].loser_slot(),
            nodes[right].loser_slot(),
        );
        node.is_third_place = true;
        for (i, side) in [(left, SlotSide::Left), (right, SlotSide::Right)] {
            nodes[i].loser_next_match_id = Some(THIRD_PLACE_ID.to_string());
            nodes[i].loser_next_slot = Some(side);
        }
        Self::settle(
            &mut node,
            self.record(MatchStage::Elimination, rounds - 1, 1, true),
            false,
        );
        nodes.push(node);
    }
}
