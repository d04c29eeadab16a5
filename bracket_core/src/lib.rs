// contains core functionality of the bracket manager

mod errors;
mod graph;
mod group;
mod match_;
mod navigation;
mod ops;
mod participant;
mod ports;
mod progression;
mod round;
mod seeding;
mod series;
mod stage;
mod standings;
mod tournament;

pub mod layout;

pub use errors::*;
pub use group::*;
pub use match_::*;
pub use navigation::{MatchLocation, SuccessorRef, SuccessorRole, successors};
pub use ops::*;
pub use participant::*;
pub use ports::*;
pub use round::*;
pub use seeding::*;
pub use stage::*;
pub use standings::{StandingItem, Standings};
pub use tournament::*;

use std::sync::Arc;

/// Stable integer id of a stored entity, assigned by storage on insert.
pub type Id = u64;

/// The manager drives the full lifecycle of tournament brackets against a
/// storage backend:
/// - generating the match graph of a stage (single elimination, double
///   elimination, round-robin) from a seeded participant list,
/// - accepting score/result updates and propagating winners and losers
///   through the dependent matches,
/// - aggregating best-of series from match games,
/// - reporting standings and graph queries.
///
/// All public operations are grouped into behavioral namespaces obtained from
/// the manager: [`Manager::create`], [`Manager::update`], [`Manager::get`],
/// [`Manager::find`], [`Manager::reset`] and [`Manager::delete`].
///
/// The manager holds the only reference to the storage port; callers sharing
/// one backend between several managers must synchronize externally.
pub struct Manager {
    storage: Arc<dyn StoragePort>,
}

impl Manager {
    /// Create a manager on top of a storage backend.
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Manager { storage }
    }

    /// Creation operations: tournaments and stages.
    pub fn create(&self) -> Create<'_> {
        Create::new(&*self.storage)
    }

    /// Mutating operations: match/match-game updates and seeding.
    pub fn update(&self) -> Update<'_> {
        Update::new(&*self.storage)
    }

    /// Read operations: stage/tournament data, seeding, standings.
    pub fn get(&self) -> Get<'_> {
        Get::new(&*self.storage)
    }

    /// Graph queries: match lookup, location, next/previous matches.
    pub fn find(&self) -> Find<'_> {
        Find::new(&*self.storage)
    }

    /// Reversal operations: match results, match game results, seeding.
    pub fn reset(&self) -> Reset<'_> {
        Reset::new(&*self.storage)
    }

    /// Destruction operations, cascading per entity hierarchy.
    pub fn delete(&self) -> Delete<'_> {
        Delete::new(&*self.storage)
    }
}
