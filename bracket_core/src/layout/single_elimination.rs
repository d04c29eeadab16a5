// single elimination layout

use super::{GroupPlan, MatchPlan, PlanSlot, RoundPlan, StagePlan, stored_size, validate_manual_entry};
use crate::{CoreResult, SeedOrdering, StageSettings, StageType};
use std::collections::VecDeque;

pub(super) fn plan(settings: &StageSettings, seed_count: u32) -> CoreResult<StagePlan> {
    let size = stored_size(settings)?;
    if settings.consolation_final && size < 4 {
        return Err(crate::CoreError::InvalidInput(
            "a consolation final needs a bracket of at least 4".into(),
        ));
    }
    let ordering = settings.ordering_or_default(StageType::SingleElimination);
    let slots = round1_positions(size, seed_count, ordering, settings, 0)?;

    let mut groups = vec![GroupPlan {
        number: 1,
        rounds: bracket_rounds(&slots),
    }];

    if settings.consolation_final {
        // one match between the two semifinal losers
        groups.push(GroupPlan {
            number: 2,
            rounds: vec![RoundPlan {
                number: 1,
                matches: vec![MatchPlan {
                    number: 1,
                    slots: [PlanSlot::Feed(1), PlanSlot::Feed(2)],
                }],
            }],
        });
    }

    Ok(StagePlan { groups })
}

/// Rounds of a knockout bracket whose round 1 is given as an ordered slot
/// list. Round `r` has `len/2^r` matches; every later-round slot feeds from
/// the two matches above it.
pub(super) fn bracket_rounds(round1_slots: &[PlanSlot]) -> Vec<RoundPlan> {
    let mut rounds = Vec::new();
    let mut match_count = round1_slots.len() / 2;
    let mut number = 1;

    let round1 = (0..match_count)
        .map(|i| MatchPlan {
            number: i as u32 + 1,
            slots: [round1_slots[2 * i], round1_slots[2 * i + 1]],
        })
        .collect();
    rounds.push(RoundPlan {
        number,
        matches: round1,
    });

    while match_count > 1 {
        match_count /= 2;
        number += 1;
        let matches = (1..=match_count as u32)
            .map(|m| MatchPlan {
                number: m,
                slots: [PlanSlot::Feed(2 * m - 1), PlanSlot::Feed(2 * m)],
            })
            .collect();
        rounds.push(RoundPlan { number, matches });
    }
    rounds
}

/// Ordered round-1 slot list over seed positions `1..=size`.
///
/// Without `balance_byes` the BYE positions (`seed_count+1..=size`) ride along
/// in the applied ordering. With it, BYEs are dealt one per match from match 1
/// upward while they last, participants keeping their arranged order.
///
/// `manual_index` selects the manual-ordering entry that may override the
/// arrangement of this bracket's first round.
pub(super) fn round1_positions(
    size: u32,
    seed_count: u32,
    ordering: SeedOrdering,
    settings: &StageSettings,
    manual_index: usize,
) -> CoreResult<Vec<PlanSlot>> {
    let manual = settings
        .manual_ordering
        .as_ref()
        .and_then(|entries| entries.get(manual_index));

    let positions: Vec<u32> = if let Some(entry) = manual {
        validate_manual_entry(entry, size)?;
        entry.clone()
    } else if settings.balance_byes && seed_count < size {
        let all: Vec<u32> = (1..=seed_count).collect();
        let mut participants: VecDeque<u32> = ordering.apply(&all).into();
        let mut byes: VecDeque<u32> = (seed_count + 1..=size).collect();
        let mut slots = Vec::with_capacity(size as usize);
        for _ in 0..size / 2 {
            if let Some(first) = participants.pop_front() {
                slots.push(first);
                if let Some(bye) = byes.pop_front() {
                    slots.push(bye);
                } else if let Some(second) = participants.pop_front() {
                    slots.push(second);
                }
            } else {
                // more BYEs than matches: the tail pairs BYE against BYE
                for _ in 0..2 {
                    if let Some(bye) = byes.pop_front() {
                        slots.push(bye);
                    }
                }
            }
        }
        debug_assert_eq!(slots.len(), size as usize);
        slots
    } else {
        let all: Vec<u32> = (1..=size).collect();
        ordering.apply(&all)
    };

    Ok(positions.into_iter().map(PlanSlot::Seed).collect())
}
