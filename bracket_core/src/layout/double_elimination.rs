// double elimination layout

use super::single_elimination::{bracket_rounds, round1_positions};
use super::{GroupPlan, MatchPlan, PlanSlot, RoundPlan, StagePlan, stored_size, validate_manual_entry};
use crate::{CoreResult, GrandFinal, SeedOrdering, StageSettings, StageType};

pub(super) fn plan(settings: &StageSettings, seed_count: u32) -> CoreResult<StagePlan> {
    let size = stored_size(settings)?;
    let ordering = settings.ordering_or_default(StageType::DoubleElimination);
    // conceptual bracket depth; with skip_first_round the stored winner
    // bracket is one round shorter but the loser bracket keeps full depth
    let depth = size.trailing_zeros();

    let winner_bracket = if settings.skip_first_round {
        let half = size / 2;
        let slots = round1_positions(half, seed_count.min(half), ordering, settings, 0)?;
        bracket_rounds(&slots)
    } else {
        let slots = round1_positions(size, seed_count, ordering, settings, 0)?;
        bracket_rounds(&slots)
    };

    let mut groups = vec![GroupPlan {
        number: 1,
        rounds: winner_bracket,
    }];
    groups.push(GroupPlan {
        number: 2,
        rounds: loser_rounds(size, depth, settings)?,
    });

    match settings.grand_final {
        GrandFinal::None => {}
        GrandFinal::Simple => groups.push(grand_final_group(1)),
        GrandFinal::Double => groups.push(grand_final_group(2)),
    }

    Ok(StagePlan { groups })
}

/// The loser bracket of a size-`size` double elimination: `2*(depth-1)`
/// rounds, round `l` holding `size / 2^(ceil(l/2)+1)` matches. Odd rounds
/// (except round 1) pair the previous round's winners; round 1 and the even
/// rounds receive winner-bracket losers under the drop permutation.
fn loser_rounds(size: u32, depth: u32, settings: &StageSettings) -> CoreResult<Vec<RoundPlan>> {
    let round_count = 2 * (depth - 1);
    let mut rounds = Vec::with_capacity(round_count as usize);

    for l in 1..=round_count {
        let match_count = size / 2u32.pow(l.div_ceil(2) + 1);
        let matches = if l == 1 {
            if settings.skip_first_round {
                // the bottom half of the seeding starts here directly
                let half = size / 2;
                let manual = settings
                    .manual_ordering
                    .as_ref()
                    .and_then(|entries| entries.get(1));
                let offsets: Vec<u32> = if let Some(entry) = manual {
                    validate_manual_entry(entry, half)?;
                    entry.clone()
                } else {
                    (1..=half).collect()
                };
                (1..=match_count)
                    .map(|m| MatchPlan {
                        number: m,
                        slots: [
                            PlanSlot::Seed(half + offsets[2 * m as usize - 2]),
                            PlanSlot::Seed(half + offsets[2 * m as usize - 1]),
                        ],
                    })
                    .collect()
            } else {
                let perm = drop_permutation(1, size / 2, settings)?;
                (1..=match_count)
                    .map(|m| MatchPlan {
                        number: m,
                        slots: [
                            PlanSlot::Feed(perm[2 * m as usize - 2]),
                            PlanSlot::Feed(perm[2 * m as usize - 1]),
                        ],
                    })
                    .collect()
            }
        } else if l % 2 == 0 {
            // conceptual winner-bracket round whose losers drop in here
            let source_round = l / 2 + 1;
            let perm = drop_permutation(source_round, match_count, settings)?;
            (1..=match_count)
                .map(|m| MatchPlan {
                    number: m,
                    slots: [PlanSlot::Feed(perm[m as usize - 1]), PlanSlot::Feed(m)],
                })
                .collect()
        } else {
            (1..=match_count)
                .map(|m| MatchPlan {
                    number: m,
                    slots: [PlanSlot::Feed(2 * m - 1), PlanSlot::Feed(2 * m)],
                })
                .collect()
        };
        rounds.push(RoundPlan { number: l, matches });
    }
    Ok(rounds)
}

fn grand_final_group(round_count: u32) -> GroupPlan {
    GroupPlan {
        number: 3,
        rounds: (1..=round_count)
            .map(|number| RoundPlan {
                number,
                matches: vec![MatchPlan {
                    number: 1,
                    slots: [PlanSlot::Feed(1), PlanSlot::Feed(1)],
                }],
            })
            .collect(),
    }
}

/// Order in which the losers of conceptual winner-bracket round
/// `source_round` are assigned to their loser-bracket slots.
///
/// The default alternation is the skip-1/reverse pattern: `reverse` for even
/// rounds, adjacent order otherwise. A dropped loser thereby never enters
/// against the loser-bracket chain carrying their own previous-round subtree
/// (reverse after natural and natural after reverse both keep the two-match
/// blocks apart; two reverses in a row would not). An entry of
/// `settings.manual_ordering` (indexed by `source_round`) overrides the
/// permutation.
pub(crate) fn drop_permutation(
    source_round: u32,
    count: u32,
    settings: &StageSettings,
) -> CoreResult<Vec<u32>> {
    let manual = settings
        .manual_ordering
        .as_ref()
        .and_then(|entries| entries.get(source_round as usize));
    if let Some(entry) = manual {
        validate_manual_entry(entry, count)?;
        return Ok(entry.clone());
    }

    let incoming: Vec<u32> = (1..=count).collect();
    let ordering = if source_round % 2 == 0 && count > 1 {
        SeedOrdering::Reverse
    } else {
        SeedOrdering::Natural
    };
    Ok(ordering.apply(&incoming))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(size: u32, grand_final: GrandFinal) -> StageSettings {
        StageSettings {
            size: Some(size),
            grand_final,
            ..Default::default()
        }
    }

    fn round_sizes(group: &GroupPlan) -> Vec<usize> {
        group.rounds.iter().map(|r| r.matches.len()).collect()
    }

    #[test]
    fn eight_bracket_has_classic_shape() {
        let plan = plan(&settings(8, GrandFinal::Simple), 8).unwrap();
        assert_eq!(plan.groups.len(), 3);
        assert_eq!(round_sizes(&plan.groups[0]), vec![4, 2, 1]);
        assert_eq!(round_sizes(&plan.groups[1]), vec![2, 2, 1, 1]);
        assert_eq!(round_sizes(&plan.groups[2]), vec![1]);
        assert_eq!(plan.match_count(), 4 + 2 + 1 + 2 + 2 + 1 + 1 + 1);
    }

    #[test]
    fn grand_final_variants_change_only_group_three() {
        let none = plan(&settings(8, GrandFinal::None), 8).unwrap();
        assert_eq!(none.groups.len(), 2);
        let double = plan(&settings(8, GrandFinal::Double), 8).unwrap();
        assert_eq!(round_sizes(&double.groups[2]), vec![1, 1]);
    }

    #[test]
    fn even_drop_round_is_reversed() {
        let plan = plan(&settings(16, GrandFinal::Simple), 16).unwrap();
        let lb_round2 = &plan.groups[1].rounds[1];
        // losers of winner-bracket round 2 (4 of them) arrive reversed
        let sources: Vec<PlanSlot> = lb_round2.matches.iter().map(|m| m.slots[0]).collect();
        assert_eq!(
            sources,
            vec![
                PlanSlot::Feed(4),
                PlanSlot::Feed(3),
                PlanSlot::Feed(2),
                PlanSlot::Feed(1)
            ]
        );
    }

    #[test]
    fn odd_drop_round_keeps_natural_order() {
        let plan = plan(&settings(16, GrandFinal::Simple), 16).unwrap();
        // winner-bracket round 3 drops into loser round 4 unpermuted, since
        // round 2 was already reversed
        let lb_round4 = &plan.groups[1].rounds[3];
        let sources: Vec<PlanSlot> = lb_round4.matches.iter().map(|m| m.slots[0]).collect();
        assert_eq!(sources, vec![PlanSlot::Feed(1), PlanSlot::Feed(2)]);
    }

    /// A winner-bracket loser must not enter the loser bracket against the
    /// chain that carries the losers of their own previous-round subtree.
    /// Checked algebraically over the drop permutations for every bracket
    /// size the layout supports in practice.
    #[test]
    fn drop_alternation_avoids_prior_round_rematches() {
        for exponent in 2..=6u32 {
            let size = 2u32.pow(exponent);
            let s = settings(size, GrandFinal::Simple);
            for source_round in 2..exponent {
                let count = size / 2u32.pow(source_round);
                let perm = drop_permutation(source_round, count, &s).unwrap();
                for j in 1..=count {
                    let p = perm.iter().position(|&x| x == j).unwrap() as u32 + 1;
                    // winner-bracket round r-1 matches under match j
                    let subtree = [2 * j - 1, 2 * j];
                    // round r-1 losers feeding the target's other slot
                    let feeders: Vec<u32> = if source_round == 2 {
                        vec![2 * p - 1, 2 * p]
                    } else {
                        let prior =
                            drop_permutation(source_round - 1, count * 2, &s).unwrap();
                        vec![prior[2 * p as usize - 2], prior[2 * p as usize - 1]]
                    };
                    for f in feeders {
                        assert!(
                            !subtree.contains(&f),
                            "size {size}: round {source_round} match {j} re-meets its subtree"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn skip_first_round_splits_the_field() {
        let mut s = settings(8, GrandFinal::Simple);
        s.skip_first_round = true;
        let plan = plan(&s, 8).unwrap();
        // winner bracket over the top half only
        assert_eq!(round_sizes(&plan.groups[0]), vec![2, 1]);
        // loser bracket keeps the full-depth shape
        assert_eq!(round_sizes(&plan.groups[1]), vec![2, 2, 1, 1]);
        // loser round 1 is fed by the bottom-half seeds
        let lb_round1 = &plan.groups[1].rounds[0];
        assert_eq!(
            lb_round1.matches[0].slots,
            [PlanSlot::Seed(5), PlanSlot::Seed(6)]
        );
        assert_eq!(
            lb_round1.matches[1].slots,
            [PlanSlot::Seed(7), PlanSlot::Seed(8)]
        );
    }

    #[test]
    fn four_bracket_loser_rounds() {
        let plan = plan(&settings(4, GrandFinal::Double), 4).unwrap();
        assert_eq!(round_sizes(&plan.groups[1]), vec![1, 1]);
        assert_eq!(round_sizes(&plan.groups[2]), vec![1, 1]);
    }
}
