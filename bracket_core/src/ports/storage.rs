// storage port

use crate::{Group, Id, Match, MatchGame, Participant, Round, Stage, Tournament};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage port trait. The core issues CRUD calls against the entity tables
/// and never inspects backend-specific error shapes; every failure surfaces
/// as a [`DbError`].
///
/// Inserts take records whose `id` field is ignored; storage assigns stable
/// integer ids and returns them in input order. Updates are full-record
/// replacements keyed by id. Filters are partial matches; an all-`None`
/// filter selects the whole table.
pub trait StoragePort:
    TournamentStore
    + ParticipantStore
    + StageStore
    + GroupStore
    + RoundStore
    + MatchStore
    + MatchGameStore
    + Send
    + Sync
{
}

#[async_trait]
pub trait TournamentStore: Send + Sync {
    async fn insert_tournament(&self, tournament: Tournament) -> DbResult<Id>;
    async fn select_tournament(&self, id: Id) -> DbResult<Option<Tournament>>;
    async fn delete_tournament(&self, id: Id) -> DbResult<()>;
}

#[async_trait]
pub trait ParticipantStore: Send + Sync {
    async fn insert_participants(&self, participants: Vec<Participant>) -> DbResult<Vec<Id>>;
    async fn select_participant(&self, id: Id) -> DbResult<Option<Participant>>;
    async fn select_participants(&self, filter: &ParticipantFilter) -> DbResult<Vec<Participant>>;
    async fn delete_participants(&self, filter: &ParticipantFilter) -> DbResult<()>;
}

#[async_trait]
pub trait StageStore: Send + Sync {
    async fn insert_stage(&self, stage: Stage) -> DbResult<Id>;
    async fn select_stage(&self, id: Id) -> DbResult<Option<Stage>>;
    async fn select_stages(&self, filter: &StageFilter) -> DbResult<Vec<Stage>>;
    async fn update_stage(&self, stage: &Stage) -> DbResult<()>;
    async fn delete_stage(&self, id: Id) -> DbResult<()>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn insert_groups(&self, groups: Vec<Group>) -> DbResult<Vec<Id>>;
    async fn select_groups(&self, filter: &GroupFilter) -> DbResult<Vec<Group>>;
    async fn delete_groups(&self, filter: &GroupFilter) -> DbResult<()>;
}

#[async_trait]
pub trait RoundStore: Send + Sync {
    async fn insert_rounds(&self, rounds: Vec<Round>) -> DbResult<Vec<Id>>;
    async fn select_rounds(&self, filter: &RoundFilter) -> DbResult<Vec<Round>>;
    async fn delete_rounds(&self, filter: &RoundFilter) -> DbResult<()>;
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn insert_matches(&self, matches: Vec<Match>) -> DbResult<Vec<Id>>;
    async fn select_match(&self, id: Id) -> DbResult<Option<Match>>;
    async fn select_matches(&self, filter: &MatchFilter) -> DbResult<Vec<Match>>;
    async fn update_match(&self, match_: &Match) -> DbResult<()>;
    async fn delete_matches(&self, filter: &MatchFilter) -> DbResult<()>;
}

#[async_trait]
pub trait MatchGameStore: Send + Sync {
    async fn insert_match_games(&self, games: Vec<MatchGame>) -> DbResult<Vec<Id>>;
    async fn select_match_game(&self, id: Id) -> DbResult<Option<MatchGame>>;
    async fn select_match_games(&self, filter: &MatchGameFilter) -> DbResult<Vec<MatchGame>>;
    async fn update_match_game(&self, game: &MatchGame) -> DbResult<()>;
    async fn delete_match_games(&self, filter: &MatchGameFilter) -> DbResult<()>;
}

/// Partial-match filter for participants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantFilter {
    pub tournament_id: Option<Id>,
}

/// Partial-match filter for stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFilter {
    pub tournament_id: Option<Id>,
}

/// Partial-match filter for groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFilter {
    pub stage_id: Option<Id>,
    pub number: Option<u32>,
}

/// Partial-match filter for rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundFilter {
    pub stage_id: Option<Id>,
    pub group_id: Option<Id>,
    pub number: Option<u32>,
}

/// Partial-match filter for matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFilter {
    pub stage_id: Option<Id>,
    pub group_id: Option<Id>,
    pub round_id: Option<Id>,
    pub number: Option<u32>,
}

/// Partial-match filter for match games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGameFilter {
    pub stage_id: Option<Id>,
    pub parent_id: Option<Id>,
    pub number: Option<u32>,
}

impl ParticipantFilter {
    pub fn tournament(tournament_id: Id) -> Self {
        ParticipantFilter {
            tournament_id: Some(tournament_id),
        }
    }
}

impl StageFilter {
    pub fn tournament(tournament_id: Id) -> Self {
        StageFilter {
            tournament_id: Some(tournament_id),
        }
    }
}

impl GroupFilter {
    pub fn stage(stage_id: Id) -> Self {
        GroupFilter {
            stage_id: Some(stage_id),
            number: None,
        }
    }
}

impl RoundFilter {
    pub fn stage(stage_id: Id) -> Self {
        RoundFilter {
            stage_id: Some(stage_id),
            ..Default::default()
        }
    }
}

impl MatchFilter {
    pub fn stage(stage_id: Id) -> Self {
        MatchFilter {
            stage_id: Some(stage_id),
            ..Default::default()
        }
    }
}

impl MatchGameFilter {
    pub fn stage(stage_id: Id) -> Self {
        MatchGameFilter {
            stage_id: Some(stage_id),
            ..Default::default()
        }
    }

    pub fn parent(parent_id: Id) -> Self {
        MatchGameFilter {
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    /// the id does not exist
    #[error("record not found")]
    NotFound,

    // connection, pool, or other backend errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DbResult<T> = Result<T, DbError>;
