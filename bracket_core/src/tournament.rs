// tournament root entity

use crate::Id;
use serde::{Deserialize, Serialize};

/// Opaque grouping root. Stages and participants hang off a tournament and
/// are removed with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    /// id of tournament, assigned by storage on insert
    pub id: Id,
    /// display name
    pub name: String,
}
