//! In-memory storage adapter for `bracket_core`.
//!
//! Tables are plain maps behind one mutex; ids are assigned from a single
//! monotonic counter on insert. The adapter is the reference backend for
//! tests and for embedding the manager without an external database.

use async_trait::async_trait;
use bracket_core::{
    DbError, DbResult, Group, GroupFilter, GroupStore, Id, Match, MatchFilter, MatchGame,
    MatchGameFilter, MatchGameStore, MatchStore, Participant, ParticipantFilter, ParticipantStore,
    Round, RoundFilter, RoundStore, Stage, StageFilter, StageStore, StoragePort, Tournament,
    TournamentStore,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Default)]
struct Tables {
    next_id: Id,
    tournaments: BTreeMap<Id, Tournament>,
    participants: BTreeMap<Id, Participant>,
    stages: BTreeMap<Id, Stage>,
    groups: BTreeMap<Id, Group>,
    rounds: BTreeMap<Id, Round>,
    matches: BTreeMap<Id, Match>,
    match_games: BTreeMap<Id, MatchGame>,
}

impl Tables {
    fn assign_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory implementation of the storage port.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // a poisoned mutex only happens after a panic mid-write; recovering
        // the data is still the most useful behavior for a test backend
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn matches_id(value: Id, filter: Option<Id>) -> bool {
    filter.is_none_or(|f| f == value)
}

fn matches_u32(value: u32, filter: Option<u32>) -> bool {
    filter.is_none_or(|f| f == value)
}

#[async_trait]
impl TournamentStore for MemoryStorage {
    async fn insert_tournament(&self, mut tournament: Tournament) -> DbResult<Id> {
        let mut tables = self.lock();
        let id = tables.assign_id();
        tournament.id = id;
        tables.tournaments.insert(id, tournament);
        Ok(id)
    }

    async fn select_tournament(&self, id: Id) -> DbResult<Option<Tournament>> {
        Ok(self.lock().tournaments.get(&id).cloned())
    }

    async fn delete_tournament(&self, id: Id) -> DbResult<()> {
        self.lock()
            .tournaments
            .remove(&id)
            .map(|_| ())
            .ok_or(DbError::NotFound)
    }
}

#[async_trait]
impl ParticipantStore for MemoryStorage {
    async fn insert_participants(&self, participants: Vec<Participant>) -> DbResult<Vec<Id>> {
        let mut tables = self.lock();
        let mut ids = Vec::with_capacity(participants.len());
        for mut participant in participants {
            let id = tables.assign_id();
            participant.id = id;
            tables.participants.insert(id, participant);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn select_participant(&self, id: Id) -> DbResult<Option<Participant>> {
        Ok(self.lock().participants.get(&id).cloned())
    }

    async fn select_participants(&self, filter: &ParticipantFilter) -> DbResult<Vec<Participant>> {
        Ok(self
            .lock()
            .participants
            .values()
            .filter(|p| matches_id(p.tournament_id, filter.tournament_id))
            .cloned()
            .collect())
    }

    async fn delete_participants(&self, filter: &ParticipantFilter) -> DbResult<()> {
        self.lock()
            .participants
            .retain(|_, p| !matches_id(p.tournament_id, filter.tournament_id));
        Ok(())
    }
}

#[async_trait]
impl StageStore for MemoryStorage {
    async fn insert_stage(&self, mut stage: Stage) -> DbResult<Id> {
        let mut tables = self.lock();
        let id = tables.assign_id();
        stage.id = id;
        tables.stages.insert(id, stage);
        Ok(id)
    }

    async fn select_stage(&self, id: Id) -> DbResult<Option<Stage>> {
        Ok(self.lock().stages.get(&id).cloned())
    }

    async fn select_stages(&self, filter: &StageFilter) -> DbResult<Vec<Stage>> {
        Ok(self
            .lock()
            .stages
            .values()
            .filter(|s| matches_id(s.tournament_id, filter.tournament_id))
            .cloned()
            .collect())
    }

    async fn update_stage(&self, stage: &Stage) -> DbResult<()> {
        let mut tables = self.lock();
        if !tables.stages.contains_key(&stage.id) {
            return Err(DbError::NotFound);
        }
        tables.stages.insert(stage.id, stage.clone());
        Ok(())
    }

    async fn delete_stage(&self, id: Id) -> DbResult<()> {
        self.lock()
            .stages
            .remove(&id)
            .map(|_| ())
            .ok_or(DbError::NotFound)
    }
}

#[async_trait]
impl GroupStore for MemoryStorage {
    async fn insert_groups(&self, groups: Vec<Group>) -> DbResult<Vec<Id>> {
        let mut tables = self.lock();
        let mut ids = Vec::with_capacity(groups.len());
        for mut group in groups {
            let id = tables.assign_id();
            group.id = id;
            tables.groups.insert(id, group);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn select_groups(&self, filter: &GroupFilter) -> DbResult<Vec<Group>> {
        Ok(self
            .lock()
            .groups
            .values()
            .filter(|g| {
                matches_id(g.stage_id, filter.stage_id)
                    && matches_u32(g.number, filter.number)
            })
            .cloned()
            .collect())
    }

    async fn delete_groups(&self, filter: &GroupFilter) -> DbResult<()> {
        self.lock().groups.retain(|_, g| {
            !(matches_id(g.stage_id, filter.stage_id)
                && matches_u32(g.number, filter.number))
        });
        Ok(())
    }
}

#[async_trait]
impl RoundStore for MemoryStorage {
    async fn insert_rounds(&self, rounds: Vec<Round>) -> DbResult<Vec<Id>> {
        let mut tables = self.lock();
        let mut ids = Vec::with_capacity(rounds.len());
        for mut round in rounds {
            let id = tables.assign_id();
            round.id = id;
            tables.rounds.insert(id, round);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn select_rounds(&self, filter: &RoundFilter) -> DbResult<Vec<Round>> {
        Ok(self
            .lock()
            .rounds
            .values()
            .filter(|r| {
                matches_id(r.stage_id, filter.stage_id)
                    && matches_id(r.group_id, filter.group_id)
                    && matches_u32(r.number, filter.number)
            })
            .cloned()
            .collect())
    }

    async fn delete_rounds(&self, filter: &RoundFilter) -> DbResult<()> {
        self.lock().rounds.retain(|_, r| {
            !(matches_id(r.stage_id, filter.stage_id)
                && matches_id(r.group_id, filter.group_id)
                && matches_u32(r.number, filter.number))
        });
        Ok(())
    }
}

#[async_trait]
impl MatchStore for MemoryStorage {
    async fn insert_matches(&self, matches: Vec<Match>) -> DbResult<Vec<Id>> {
        let mut tables = self.lock();
        let mut ids = Vec::with_capacity(matches.len());
        for mut match_ in matches {
            let id = tables.assign_id();
            match_.id = id;
            tables.matches.insert(id, match_);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn select_match(&self, id: Id) -> DbResult<Option<Match>> {
        Ok(self.lock().matches.get(&id).cloned())
    }

    async fn select_matches(&self, filter: &MatchFilter) -> DbResult<Vec<Match>> {
        Ok(self
            .lock()
            .matches
            .values()
            .filter(|m| {
                matches_id(m.stage_id, filter.stage_id)
                    && matches_id(m.group_id, filter.group_id)
                    && matches_id(m.round_id, filter.round_id)
                    && matches_u32(m.number, filter.number)
            })
            .cloned()
            .collect())
    }

    async fn update_match(&self, match_: &Match) -> DbResult<()> {
        let mut tables = self.lock();
        if !tables.matches.contains_key(&match_.id) {
            return Err(DbError::NotFound);
        }
        tables.matches.insert(match_.id, match_.clone());
        Ok(())
    }

    async fn delete_matches(&self, filter: &MatchFilter) -> DbResult<()> {
        self.lock().matches.retain(|_, m| {
            !(matches_id(m.stage_id, filter.stage_id)
                && matches_id(m.group_id, filter.group_id)
                && matches_id(m.round_id, filter.round_id)
                && matches_u32(m.number, filter.number))
        });
        Ok(())
    }
}

#[async_trait]
impl MatchGameStore for MemoryStorage {
    async fn insert_match_games(&self, games: Vec<MatchGame>) -> DbResult<Vec<Id>> {
        let mut tables = self.lock();
        let mut ids = Vec::with_capacity(games.len());
        for mut game in games {
            let id = tables.assign_id();
            game.id = id;
            tables.match_games.insert(id, game);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn select_match_game(&self, id: Id) -> DbResult<Option<MatchGame>> {
        Ok(self.lock().match_games.get(&id).cloned())
    }

    async fn select_match_games(&self, filter: &MatchGameFilter) -> DbResult<Vec<MatchGame>> {
        Ok(self
            .lock()
            .match_games
            .values()
            .filter(|g| {
                matches_id(g.stage_id, filter.stage_id)
                    && matches_id(g.parent_id, filter.parent_id)
                    && matches_u32(g.number, filter.number)
            })
            .cloned()
            .collect())
    }

    async fn update_match_game(&self, game: &MatchGame) -> DbResult<()> {
        let mut tables = self.lock();
        if !tables.match_games.contains_key(&game.id) {
            return Err(DbError::NotFound);
        }
        tables.match_games.insert(game.id, game.clone());
        Ok(())
    }

    async fn delete_match_games(&self, filter: &MatchGameFilter) -> DbResult<()> {
        self.lock().match_games.retain(|_, g| {
            !(matches_id(g.stage_id, filter.stage_id)
                && matches_id(g.parent_id, filter.parent_id)
                && matches_u32(g.number, filter.number))
        });
        Ok(())
    }
}

impl StoragePort for MemoryStorage {}
