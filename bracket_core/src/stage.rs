// stage of a tournament

use crate::{CoreError, CoreResult, Id, SeedOrdering};
use displaydoc::Display;
use serde::{Deserialize, Serialize};

/// Bracket structure of a stage.
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    /// round_robin
    RoundRobin,
    /// single_elimination
    SingleElimination,
    /// double_elimination
    DoubleElimination,
}

/// Grand final variant of a double elimination stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrandFinal {
    /// no grand final, the winner bracket winner is champion
    None,
    /// one match, winner bracket winner vs loser bracket winner
    #[default]
    Simple,
    /// two matches; the second is an archived sentinel unless the loser
    /// bracket winner takes the first
    Double,
}

/// Simple or double round-robin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundRobinMode {
    #[default]
    Simple,
    /// every pairing is played twice with home/away swapped
    Double,
}

/// Option bag of a stage, validated against the stage type at creation.
///
/// `size` and `seed_ordering` are resolved (padded size, defaulted method)
/// before the stage is persisted, so stored stages always carry them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    /// elimination: pad the seeding to this size with BYEs
    pub size: Option<u32>,
    /// initial seed arrangement; defaults per stage type
    pub seed_ordering: Option<SeedOrdering>,
    /// elimination: spread BYEs over round 1 instead of packing them last
    pub balance_byes: bool,
    /// single elimination: add a 3rd-place match fed by the semifinal losers
    pub consolation_final: bool,
    /// double elimination: top half seeds start in the winner bracket, bottom
    /// half directly in loser bracket round 1
    pub skip_first_round: bool,
    /// double elimination grand final variant
    pub grand_final: GrandFinal,
    /// round-robin: number of pools
    pub group_count: Option<u32>,
    pub round_robin_mode: RoundRobinMode,
    /// best-of-N child games per match, `0` for plain matches
    pub matches_child_count: u16,
    /// per-drop-in-round override of the loser ordering permutations
    pub manual_ordering: Option<Vec<Vec<u32>>>,
    /// resolved length of the seed list; bookkeeping written at creation so
    /// the layout stays reproducible, not a caller option
    pub seed_count: Option<u32>,
}

impl StageSettings {
    /// Validate the option bag against a stage type. Options bound to another
    /// stage type are rejected rather than ignored.
    pub fn validate(&self, stage_type: StageType) -> CoreResult<()> {
        let elimination = matches!(
            stage_type,
            StageType::SingleElimination | StageType::DoubleElimination
        );

        if let Some(size) = self.size {
            if !elimination {
                return Err(CoreError::InvalidInput(
                    "size applies to elimination stages only".into(),
                ));
            }
            if size < 2 {
                return Err(CoreError::InvalidInput(format!(
                    "size must be at least 2, got {size}"
                )));
            }
        }
        if self.balance_byes && !elimination {
            return Err(CoreError::InvalidInput(
                "balance_byes applies to elimination stages only".into(),
            ));
        }
        if self.consolation_final && stage_type != StageType::SingleElimination {
            return Err(CoreError::InvalidInput(
                "consolation_final applies to single elimination only".into(),
            ));
        }
        if self.skip_first_round && stage_type != StageType::DoubleElimination {
            return Err(CoreError::InvalidInput(
                "skip_first_round applies to double elimination only".into(),
            ));
        }
        if let Some(group_count) = self.group_count {
            if stage_type != StageType::RoundRobin {
                return Err(CoreError::InvalidInput(
                    "group_count applies to round-robin only".into(),
                ));
            }
            if group_count < 1 {
                return Err(CoreError::InvalidInput(
                    "group_count must be at least 1".into(),
                ));
            }
        }
        if let Some(ordering) = self.seed_ordering {
            let needs_groups = stage_type == StageType::RoundRobin;
            if ordering.is_group_method() != needs_groups {
                return Err(CoreError::InvalidInput(format!(
                    "seed ordering {ordering} does not fit a {stage_type} stage"
                )));
            }
        }
        // draws cannot be propagated through a bracket; an even series could
        // end drawn, so the configuration is rejected up front
        if self.matches_child_count > 0 && self.matches_child_count % 2 == 0 {
            return Err(CoreError::InvalidInput(format!(
                "matches_child_count must be odd, got {}",
                self.matches_child_count
            )));
        }
        Ok(())
    }

    /// The ordering in effect, falling back to the stage type default.
    pub fn ordering_or_default(&self, stage_type: StageType) -> SeedOrdering {
        self.seed_ordering
            .unwrap_or_else(|| SeedOrdering::default_for(stage_type))
    }
}

/// Stage of a tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// id of stage, assigned by storage on insert
    pub id: Id,
    /// id of tournament
    pub tournament_id: Id,
    /// display name
    pub name: String,
    #[serde(rename = "type")]
    pub stage_type: StageType,
    /// sequential stage number within the tournament
    pub number: u32,
    pub settings: StageSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_count_rejected_outside_round_robin() {
        let settings = StageSettings {
            group_count: Some(2),
            ..Default::default()
        };
        assert!(settings.validate(StageType::SingleElimination).is_err());
        assert!(settings.validate(StageType::RoundRobin).is_ok());
    }

    #[test]
    fn even_child_count_rejected() {
        let settings = StageSettings {
            matches_child_count: 2,
            ..Default::default()
        };
        assert!(settings.validate(StageType::SingleElimination).is_err());
    }

    #[test]
    fn group_ordering_only_fits_round_robin() {
        let settings = StageSettings {
            seed_ordering: Some(SeedOrdering::GroupsSnake),
            ..Default::default()
        };
        assert!(settings.validate(StageType::SingleElimination).is_err());
        let settings = StageSettings {
            seed_ordering: Some(SeedOrdering::InnerOuter),
            ..Default::default()
        };
        assert!(settings.validate(StageType::RoundRobin).is_err());
    }

    #[test]
    fn consolation_final_is_single_elimination_only() {
        let settings = StageSettings {
            consolation_final: true,
            ..Default::default()
        };
        assert!(settings.validate(StageType::DoubleElimination).is_err());
        assert!(settings.validate(StageType::SingleElimination).is_ok());
    }
}
