// participant registered at a tournament

use crate::Id;
use serde::{Deserialize, Serialize};

/// Participant of a tournament. Participants survive stage deletion and are
/// removed with the tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// id of participant, assigned by storage on insert
    pub id: Id,
    /// id of tournament
    pub tournament_id: Id,
    /// display name, unique within the tournament
    pub name: String,
}
