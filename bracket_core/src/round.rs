// round of matches in a group

use crate::Id;
use serde::{Deserialize, Serialize};

/// Round of concurrently playable matches, numbered `1..=R` within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// id of round, assigned by storage on insert
    pub id: Id,
    /// id of stage
    pub stage_id: Id,
    /// id of group
    pub group_id: Id,
    /// round number within the group
    pub number: u32,
}
