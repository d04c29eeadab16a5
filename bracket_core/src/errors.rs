//! Definitions for error types used throughout core.

use crate::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// malformed creation options or settings
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// an opponent id does not match the participant occupying the slot
    #[error("invalid opponent: {0}")]
    InvalidOpponent(String),

    /// a score is out of range for the match
    #[error("invalid score: {0}")]
    InvalidScore(String),

    /// contradictory or impossible result combination
    #[error("invalid result: {0}")]
    InvalidResult(String),

    /// the match state does not permit the requested operation
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// a downstream match has a recorded result, reset it first
    #[error("cannot reset: a downstream match is already completed")]
    CannotResetDownstreamCompleted,

    /// scores of a best-of match are projections of its games
    #[error("match has child games, update the match games instead")]
    UseMatchGameUpdate,

    /// missing entity
    #[error("{0} not found")]
    NotFound(String),

    /// storage error
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Build a `NotFound` for an entity kind and id.
    pub fn not_found(entity: &str, id: crate::Id) -> Self {
        CoreError::NotFound(format!("{entity} {id}"))
    }
}
