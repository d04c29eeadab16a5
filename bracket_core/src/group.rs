// group of a stage

use crate::Id;
use serde::{Deserialize, Serialize};

/// Group of a stage. The meaning of `number` depends on the stage type:
/// - round-robin: pool number `1..=group_count`
/// - single elimination: `1` main bracket, `2` consolation final
/// - double elimination: `1` winner bracket, `2` loser bracket, `3` grand final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// id of group, assigned by storage on insert
    pub id: Id,
    /// id of stage
    pub stage_id: Id,
    /// group number within the stage
    pub number: u32,
}
