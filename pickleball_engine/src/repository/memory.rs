//! In-memory division repository.

use super::{DivisionRepository, StageTransitionRecord, TransitionWrite};
use crate::division::{
    Division, DivisionId, DivisionSnapshot, Game, Match, MatchId, MatchStage, NewMatch, SlotSide,
    Team, Tiebreaker,
};
use crate::errors::{EngineError, EngineResult};
use crate::stage::{SlotWrite, StagePlan};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Store {
    divisions: HashMap<DivisionId, Division>,
    teams: Vec<Team>,
    matches: BTreeMap<MatchId, Match>,
    transitions: Vec<StageTransitionRecord>,
    next_match_id: MatchId,
}

impl Store {
    fn division(&self, division_id: DivisionId) -> EngineResult<&Division> {
        self.divisions
            .get(&division_id)
            .ok_or(EngineError::DivisionNotFound(division_id))
    }

    fn match_mut(&mut self, match_id: MatchId) -> EngineResult<&mut Match> {
        self.matches
            .get_mut(&match_id)
            .ok_or(EngineError::MatchNotFound(match_id))
    }

    fn has_stage(&self, division_id: DivisionId, stage: MatchStage) -> bool {
        self.matches
            .values()
            .any(|m| m.division_id == division_id && m.stage == stage)
    }

    fn insert_rows(&mut self, division_id: DivisionId, rows: &[NewMatch]) -> Vec<Match> {
        rows.iter()
            .map(|row| {
                self.next_match_id += 1;
                let record = Match {
                    id: self.next_match_id,
                    division_id,
                    stage: row.stage,
                    round_index: row.round_index,
                    bracket_position: row.bracket_position,
                    is_third_place: row.is_third_place,
                    team_a: row.team_a,
                    team_b: row.team_b,
                    games: Vec::new(),
                    tiebreaker: None,
                };
                self.matches.insert(record.id, record.clone());
                record
            })
            .collect()
    }

    fn check_unmaterialized(&self, division_id: DivisionId, rows: &[NewMatch]) -> EngineResult<()> {
        for stage in [MatchStage::RoundRobin, MatchStage::PlayIn, MatchStage::Elimination] {
            if rows.iter().any(|r| r.stage == stage) && self.has_stage(division_id, stage) {
                return Err(EngineError::AlreadyMaterialized { division_id, stage });
            }
        }
        Ok(())
    }
}

/// Division repository held in process memory.
///
/// Every operation takes the store lock once, which makes each call atomic.
#[derive(Debug, Default)]
pub struct InMemoryDivisionRepository {
    store: RwLock<Store>,
}

impl InMemoryDivisionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a snapshot, keeping its ids
    pub async fn import(&self, snapshot: DivisionSnapshot) {
        let mut store = self.store.write().await;
        let division_id = snapshot.division.id;
        store.teams.retain(|t| t.division_id != division_id);
        store.teams.extend(snapshot.teams);
        for m in snapshot.matches {
            store.next_match_id = store.next_match_id.max(m.id);
            store.matches.insert(m.id, m);
        }
        store.divisions.insert(division_id, snapshot.division);
    }

    pub async fn insert_division(&self, division: Division) {
        self.store
            .write()
            .await
            .divisions
            .insert(division.id, division);
    }

    pub async fn insert_team(&self, team: Team) -> EngineResult<()> {
        let mut store = self.store.write().await;
        store.division(team.division_id)?;
        store.teams.push(team);
        Ok(())
    }
}

#[async_trait]
impl DivisionRepository for InMemoryDivisionRepository {
    async fn get_division(&self, division_id: DivisionId) -> EngineResult<Division> {
        self.store.read().await.division(division_id).cloned()
    }

    async fn list_teams(&self, division_id: DivisionId) -> EngineResult<Vec<Team>> {
        let store = self.store.read().await;
        store.division(division_id)?;
        Ok(store
            .teams
            .iter()
            .filter(|t| t.division_id == division_id)
            .cloned()
            .collect())
    }

    async fn list_matches(&self, division_id: DivisionId) -> EngineResult<Vec<Match>> {
        let store = self.store.read().await;
        store.division(division_id)?;
        Ok(store
            .matches
            .values()
            .filter(|m| m.division_id == division_id)
            .cloned()
            .collect())
    }

    async fn get_match(&self, match_id: MatchId) -> EngineResult<Match> {
        self.store
            .read()
            .await
            .matches
            .get(&match_id)
            .cloned()
            .ok_or(EngineError::MatchNotFound(match_id))
    }

    async fn load_snapshot(&self, division_id: DivisionId) -> EngineResult<DivisionSnapshot> {
        let store = self.store.read().await;
        let division = store.division(division_id)?.clone();
        Ok(DivisionSnapshot {
            division,
            teams: store
                .teams
                .iter()
                .filter(|t| t.division_id == division_id)
                .cloned()
                .collect(),
            matches: store
                .matches
                .values()
                .filter(|m| m.division_id == division_id)
                .cloned()
                .collect(),
        })
    }

    async fn upsert_game(&self, match_id: MatchId, game: Game) -> EngineResult<Match> {
        if game.index == 0 {
            return Err(EngineError::InvalidGameIndex(game.index));
        }
        let mut store = self.store.write().await;
        let record = store.match_mut(match_id)?;
        match record.games.iter().position(|g| g.index == game.index) {
            Some(i) => record.games[i] = game,
            None => {
                record.games.push(game);
                record.games.sort_by_key(|g| g.index);
            }
        }
        Ok(record.clone())
    }

    async fn save_tiebreaker(
        &self,
        match_id: MatchId,
        tiebreaker: Tiebreaker,
    ) -> EngineResult<Match> {
        let mut store = self.store.write().await;
        let record = store.match_mut(match_id)?;
        record.tiebreaker = Some(tiebreaker);
        Ok(record.clone())
    }

    async fn write_slot(&self, write: SlotWrite) -> EngineResult<()> {
        let mut store = self.store.write().await;
        let record = store.match_mut(write.match_id)?;
        match write.side {
            SlotSide::Left => record.team_a = write.team_id,
            SlotSide::Right => record.team_b = write.team_id,
        }
        Ok(())
    }

    async fn materialize_matches(
        &self,
        division_id: DivisionId,
        stage: MatchStage,
        rows: Vec<NewMatch>,
    ) -> EngineResult<Vec<Match>> {
        let mut store = self.store.write().await;
        store.division(division_id)?;
        if store.has_stage(division_id, stage) {
            return Err(EngineError::AlreadyMaterialized { division_id, stage });
        }
        let rows: Vec<NewMatch> = rows.into_iter().filter(|r| r.stage == stage).collect();
        Ok(store.insert_rows(division_id, &rows))
    }

    async fn apply_transition(&self, plan: &StagePlan) -> EngineResult<TransitionWrite> {
        let mut store = self.store.write().await;
        let actual = store.division(plan.division_id)?.stage;

        if actual == plan.to {
            return Ok(TransitionWrite::AlreadyApplied);
        }
        if actual != plan.from {
            return Err(EngineError::StageConflict {
                expected: plan.from,
                actual,
            });
        }
        store.check_unmaterialized(plan.division_id, &plan.new_matches)?;

        let created = store.insert_rows(plan.division_id, &plan.new_matches);
        if let Some(division) = store.divisions.get_mut(&plan.division_id) {
            division.stage = plan.to;
        }
        store.transitions.push(StageTransitionRecord {
            division_id: plan.division_id,
            from: plan.from,
            to: plan.to,
            matches_created: created.len(),
            at: Utc::now(),
        });
        Ok(TransitionWrite::Applied(created))
    }

    async fn transitions(
        &self,
        division_id: DivisionId,
    ) -> EngineResult<Vec<StageTransitionRecord>> {
        Ok(self
            .store
            .read()
            .await
            .transitions
            .iter()
            .filter(|t| t.division_id == division_id)
            .cloned()
            .collect())
    }
}
