//! Pure bracket layout: given a stage type, its settings and the seed count,
//! compute the full group/round/match plan over seed positions. Nothing here
//! touches storage; applying a concrete seeding to the positions happens in
//! the progression layer.

mod double_elimination;
mod round_robin;
mod single_elimination;

pub(crate) use double_elimination::drop_permutation;

use crate::{CoreError, CoreResult, StageSettings, StageType};

/// A planned opponent slot.
///
/// `Seed` holds a 1-based position into the ordered seed list and resolves to
/// a participant (or a BYE for positions beyond the list) once a seeding is
/// applied. `Feed` holds the number of the feeding match and stays a
/// placeholder until that match completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSlot {
    Seed(u32),
    Feed(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPlan {
    /// match number within the round
    pub number: u32,
    pub slots: [PlanSlot; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPlan {
    pub number: u32,
    pub matches: Vec<MatchPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub number: u32,
    pub rounds: Vec<RoundPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    pub groups: Vec<GroupPlan>,
}

impl StagePlan {
    /// Total number of matches over all groups and rounds.
    pub fn match_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| &g.rounds)
            .map(|r| r.matches.len())
            .sum()
    }
}

/// Compute the complete plan of a stage. `settings.size` must already be
/// resolved (see [`resolve_size`]).
pub fn plan_stage(
    stage_type: StageType,
    settings: &StageSettings,
    seed_count: u32,
) -> CoreResult<StagePlan> {
    match stage_type {
        StageType::SingleElimination => single_elimination::plan(settings, seed_count),
        StageType::DoubleElimination => double_elimination::plan(settings, seed_count),
        StageType::RoundRobin => round_robin::plan(settings, seed_count),
    }
}

/// Resolve the stored size of a stage: elimination pads up to the next power
/// of two of the seed count (or the explicit `size`, whichever is larger),
/// round-robin keeps the seed count as-is.
pub fn resolve_size(
    stage_type: StageType,
    settings: &StageSettings,
    seed_count: u32,
) -> CoreResult<u32> {
    match stage_type {
        StageType::RoundRobin => {
            if seed_count < 2 {
                return Err(CoreError::InvalidInput(format!(
                    "a round-robin stage needs at least 2 participants, got {seed_count}"
                )));
            }
            Ok(seed_count)
        }
        StageType::SingleElimination | StageType::DoubleElimination => {
            let wanted = seed_count.max(settings.size.unwrap_or(0)).max(2);
            let padded = wanted.next_power_of_two();
            if settings.size.is_some_and(|size| size < seed_count) {
                return Err(CoreError::InvalidInput(format!(
                    "size {} is smaller than the {} provided seeds",
                    settings.size.unwrap_or(0),
                    seed_count
                )));
            }
            if stage_type == StageType::DoubleElimination && padded < 4 {
                return Err(CoreError::InvalidInput(
                    "a double elimination stage needs at least 4 slots".into(),
                ));
            }
            Ok(padded)
        }
    }
}

/// Padded size stored in resolved settings, or an error when the caller
/// bypassed [`resolve_size`].
pub(crate) fn stored_size(settings: &StageSettings) -> CoreResult<u32> {
    settings
        .size
        .ok_or_else(|| CoreError::InvalidInput("stage settings carry no resolved size".into()))
}

/// Check one manual ordering entry: it must be a permutation of `1..=len`.
pub(crate) fn validate_manual_entry(entry: &[u32], len: u32) -> CoreResult<()> {
    let mut seen = entry.to_vec();
    seen.sort_unstable();
    let expected: Vec<u32> = (1..=len).collect();
    if seen != expected {
        return Err(CoreError::InvalidInput(format!(
            "manual ordering entry {entry:?} is not a permutation of 1..={len}"
        )));
    }
    Ok(())
}
