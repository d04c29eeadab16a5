// round-robin layout

use super::{GroupPlan, MatchPlan, PlanSlot, RoundPlan, StagePlan};
use crate::{CoreError, CoreResult, RoundRobinMode, StageSettings, StageType};

pub(super) fn plan(settings: &StageSettings, seed_count: u32) -> CoreResult<StagePlan> {
    let group_count = settings.group_count.unwrap_or(1);
    if seed_count < 2 * group_count {
        return Err(CoreError::InvalidInput(format!(
            "{seed_count} participants cannot fill {group_count} groups of at least 2"
        )));
    }

    let ordering = settings.ordering_or_default(StageType::RoundRobin);
    let positions: Vec<u32> = (1..=seed_count).collect();
    let groups = ordering
        .distribute(&positions, group_count as usize)
        .into_iter()
        .enumerate()
        .map(|(i, members)| GroupPlan {
            number: i as u32 + 1,
            rounds: schedule(&members, settings.round_robin_mode),
        })
        .collect();

    Ok(StagePlan { groups })
}

/// Classic circle-method schedule: `n-1` rounds for even `n`, `n` rounds with
/// one pausing member per round for odd `n`. Double mode appends the mirrored
/// schedule with home and away swapped.
fn schedule(members: &[u32], mode: RoundRobinMode) -> Vec<RoundPlan> {
    let mut ring: Vec<Option<u32>> = members.iter().copied().map(Some).collect();
    if ring.len() % 2 == 1 {
        // the hole marks the member pausing this round
        ring.push(None);
    }
    let n = ring.len();

    let mut rounds = Vec::new();
    for round in 0..n - 1 {
        let mut matches = Vec::new();
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (ring[i], ring[n - 1 - i]) {
                matches.push(MatchPlan {
                    number: matches.len() as u32 + 1,
                    slots: [PlanSlot::Seed(a), PlanSlot::Seed(b)],
                });
            }
        }
        rounds.push(RoundPlan {
            number: round as u32 + 1,
            matches,
        });
        // keep the first member fixed, rotate the rest
        ring[1..].rotate_right(1);
    }

    if mode == RoundRobinMode::Double {
        let mirrored: Vec<RoundPlan> = rounds
            .iter()
            .map(|r| RoundPlan {
                number: r.number + rounds.len() as u32,
                matches: r
                    .matches
                    .iter()
                    .map(|m| MatchPlan {
                        number: m.number,
                        slots: [m.slots[1], m.slots[0]],
                    })
                    .collect(),
            })
            .collect();
        rounds.extend(mirrored);
    }
    rounds
}
