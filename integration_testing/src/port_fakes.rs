// storage fakes with one-shot failure injection

use async_trait::async_trait;
use bracket_core::{
    DbError, DbResult, Group, GroupFilter, GroupStore, Id, Manager, Match, MatchFilter, MatchGame,
    MatchGameFilter, MatchGameStore, MatchStore, Participant, ParticipantFilter, ParticipantStore,
    Round, RoundFilter, RoundStore, Seeding, Stage, StageFilter, StageStore, StoragePort,
    Tournament, TournamentStore,
};
use db_memory::MemoryStorage;
use std::sync::{Arc, Mutex};

/// Storage wrapper delegating to [`MemoryStorage`] that can fail exactly one
/// upcoming call per switch, for exercising the partial-failure contract.
#[derive(Clone, Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_next_select_match: Arc<Mutex<bool>>,
    fail_next_select_matches: Arc<Mutex<bool>>,
    fail_next_update_match: Arc<Mutex<bool>>,
    fail_next_insert_matches: Arc<Mutex<bool>>,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_select_match_once(&self) {
        *self.fail_next_select_match.lock().unwrap() = true;
    }
    pub fn fail_select_matches_once(&self) {
        *self.fail_next_select_matches.lock().unwrap() = true;
    }
    pub fn fail_update_match_once(&self) {
        *self.fail_next_update_match.lock().unwrap() = true;
    }
    pub fn fail_insert_matches_once(&self) {
        *self.fail_next_insert_matches.lock().unwrap() = true;
    }

    fn trip(switch: &Arc<Mutex<bool>>, what: &str) -> DbResult<()> {
        let mut guard = switch.lock().unwrap();
        if *guard {
            *guard = false;
            return Err(DbError::Other(anyhow::anyhow!("injected {what} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl TournamentStore for FailingStorage {
    async fn insert_tournament(&self, tournament: Tournament) -> DbResult<Id> {
        self.inner.insert_tournament(tournament).await
    }
    async fn select_tournament(&self, id: Id) -> DbResult<Option<Tournament>> {
        self.inner.select_tournament(id).await
    }
    async fn delete_tournament(&self, id: Id) -> DbResult<()> {
        self.inner.delete_tournament(id).await
    }
}

#[async_trait]
impl ParticipantStore for FailingStorage {
    async fn insert_participants(&self, participants: Vec<Participant>) -> DbResult<Vec<Id>> {
        self.inner.insert_participants(participants).await
    }
    async fn select_participant(&self, id: Id) -> DbResult<Option<Participant>> {
        self.inner.select_participant(id).await
    }
    async fn select_participants(&self, filter: &ParticipantFilter) -> DbResult<Vec<Participant>> {
        self.inner.select_participants(filter).await
    }
    async fn delete_participants(&self, filter: &ParticipantFilter) -> DbResult<()> {
        self.inner.delete_participants(filter).await
    }
}

#[async_trait]
impl StageStore for FailingStorage {
    async fn insert_stage(&self, stage: Stage) -> DbResult<Id> {
        self.inner.insert_stage(stage).await
    }
    async fn select_stage(&self, id: Id) -> DbResult<Option<Stage>> {
        self.inner.select_stage(id).await
    }
    async fn select_stages(&self, filter: &StageFilter) -> DbResult<Vec<Stage>> {
        self.inner.select_stages(filter).await
    }
    async fn update_stage(&self, stage: &Stage) -> DbResult<()> {
        self.inner.update_stage(stage).await
    }
    async fn delete_stage(&self, id: Id) -> DbResult<()> {
        self.inner.delete_stage(id).await
    }
}

#[async_trait]
impl GroupStore for FailingStorage {
    async fn insert_groups(&self, groups: Vec<Group>) -> DbResult<Vec<Id>> {
        self.inner.insert_groups(groups).await
    }
    async fn select_groups(&self, filter: &GroupFilter) -> DbResult<Vec<Group>> {
        self.inner.select_groups(filter).await
    }
    async fn delete_groups(&self, filter: &GroupFilter) -> DbResult<()> {
        self.inner.delete_groups(filter).await
    }
}

#[async_trait]
impl RoundStore for FailingStorage {
    async fn insert_rounds(&self, rounds: Vec<Round>) -> DbResult<Vec<Id>> {
        self.inner.insert_rounds(rounds).await
    }
    async fn select_rounds(&self, filter: &RoundFilter) -> DbResult<Vec<Round>> {
        self.inner.select_rounds(filter).await
    }
    async fn delete_rounds(&self, filter: &RoundFilter) -> DbResult<()> {
        self.inner.delete_rounds(filter).await
    }
}

#[async_trait]
impl MatchStore for FailingStorage {
    async fn insert_matches(&self, matches: Vec<Match>) -> DbResult<Vec<Id>> {
        Self::trip(&self.fail_next_insert_matches, "insert")?;
        self.inner.insert_matches(matches).await
    }
    async fn select_match(&self, id: Id) -> DbResult<Option<Match>> {
        Self::trip(&self.fail_next_select_match, "select")?;
        self.inner.select_match(id).await
    }
    async fn select_matches(&self, filter: &MatchFilter) -> DbResult<Vec<Match>> {
        Self::trip(&self.fail_next_select_matches, "select")?;
        self.inner.select_matches(filter).await
    }
    async fn update_match(&self, match_: &Match) -> DbResult<()> {
        Self::trip(&self.fail_next_update_match, "update")?;
        self.inner.update_match(match_).await
    }
    async fn delete_matches(&self, filter: &MatchFilter) -> DbResult<()> {
        self.inner.delete_matches(filter).await
    }
}

#[async_trait]
impl MatchGameStore for FailingStorage {
    async fn insert_match_games(&self, games: Vec<MatchGame>) -> DbResult<Vec<Id>> {
        self.inner.insert_match_games(games).await
    }
    async fn select_match_game(&self, id: Id) -> DbResult<Option<MatchGame>> {
        self.inner.select_match_game(id).await
    }
    async fn select_match_games(&self, filter: &MatchGameFilter) -> DbResult<Vec<MatchGame>> {
        self.inner.select_match_games(filter).await
    }
    async fn update_match_game(&self, game: &MatchGame) -> DbResult<()> {
        self.inner.update_match_game(game).await
    }
    async fn delete_match_games(&self, filter: &MatchGameFilter) -> DbResult<()> {
        self.inner.delete_match_games(filter).await
    }
}

impl StoragePort for FailingStorage {}

/// Manager backed by a plain in-memory storage.
pub fn make_manager() -> (Manager, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    (Manager::new(storage.clone()), storage)
}

/// Manager backed by the failure-injecting wrapper.
pub fn make_failing_manager() -> (Manager, Arc<FailingStorage>) {
    let storage = Arc::new(FailingStorage::new());
    (Manager::new(storage.clone()), storage)
}

/// Seeding from a list of names.
pub fn seed_names(names: &[&str]) -> Seeding {
    Seeding::Names(names.iter().map(|n| Some(n.to_string())).collect())
}

/// Seeding from names with explicit BYE holes.
pub fn seed_names_with_byes(names: &[Option<&str>]) -> Seeding {
    Seeding::Names(names.iter().map(|n| n.map(|n| n.to_string())).collect())
}
