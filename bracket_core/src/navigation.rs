// derived match graph navigation

use crate::layout::drop_permutation;
use crate::{CoreError, CoreResult, GrandFinal, Side, Stage, StageType};
use serde::{Deserialize, Serialize};

/// Positional identity of a match within its stage. The match graph is
/// derived from these coordinates alone; no edges are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchLocation {
    pub group_number: u32,
    pub round_number: u32,
    pub match_number: u32,
}

impl MatchLocation {
    pub fn new(group_number: u32, round_number: u32, match_number: u32) -> Self {
        MatchLocation {
            group_number,
            round_number,
            match_number,
        }
    }
}

/// Which outcome of the source match flows to the successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessorRole {
    Winner,
    Loser,
}

/// A downstream slot fed by a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessorRef {
    pub location: MatchLocation,
    pub side: Side,
    pub role: SuccessorRole,
}

/// Shape parameters of a stage, recoverable from its stored settings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StageShape {
    pub stage_type: StageType,
    /// padded bracket size (elimination) or participant count (round-robin)
    pub size: u32,
    /// conceptual bracket depth, `log2(size)`
    pub depth: u32,
    /// stored winner-bracket round count (one less under skip_first_round)
    pub wb_rounds: u32,
    /// stored loser-bracket round count, `0` outside double elimination
    pub lb_rounds: u32,
    pub grand_final: GrandFinal,
    pub consolation_final: bool,
}

impl StageShape {
    pub fn of(stage: &Stage) -> CoreResult<Self> {
        let size = stage.settings.size.ok_or_else(|| {
            CoreError::InvalidInput("stage settings carry no resolved size".into())
        })?;
        let depth = size.trailing_zeros().max(1);
        let (wb_rounds, lb_rounds, grand_final) = match stage.stage_type {
            StageType::RoundRobin => (0, 0, GrandFinal::None),
            StageType::SingleElimination => (depth, 0, GrandFinal::None),
            StageType::DoubleElimination => {
                let wb = if stage.settings.skip_first_round {
                    depth - 1
                } else {
                    depth
                };
                (wb, 2 * (depth - 1), stage.settings.grand_final)
            }
        };
        Ok(StageShape {
            stage_type: stage.stage_type,
            size,
            depth,
            wb_rounds,
            lb_rounds,
            grand_final,
            consolation_final: stage.settings.consolation_final,
        })
    }
}

/// Successor slots of a match: where its winner and its loser go. Round-robin
/// matches and finals have none.
pub fn successors(stage: &Stage, loc: &MatchLocation) -> CoreResult<Vec<SuccessorRef>> {
    let shape = StageShape::of(stage)?;
    match shape.stage_type {
        StageType::RoundRobin => Ok(Vec::new()),
        StageType::SingleElimination => single_elimination(&shape, loc),
        StageType::DoubleElimination => double_elimination(stage, &shape, loc),
    }
}

fn pair_target(round: u32, m: u32, group: u32, role: SuccessorRole) -> SuccessorRef {
    SuccessorRef {
        location: MatchLocation::new(group, round, m.div_ceil(2)),
        side: if m % 2 == 1 { Side::One } else { Side::Two },
        role,
    }
}

fn single_elimination(shape: &StageShape, loc: &MatchLocation) -> CoreResult<Vec<SuccessorRef>> {
    let mut out = Vec::new();
    if loc.group_number != 1 {
        // the consolation final feeds nothing
        return Ok(out);
    }
    if loc.round_number < shape.wb_rounds {
        out.push(pair_target(
            loc.round_number + 1,
            loc.match_number,
            1,
            SuccessorRole::Winner,
        ));
    }
    if shape.consolation_final && shape.wb_rounds >= 2 && loc.round_number == shape.wb_rounds - 1 {
        out.push(SuccessorRef {
            location: MatchLocation::new(2, 1, 1),
            side: if loc.match_number == 1 {
                Side::One
            } else {
                Side::Two
            },
            role: SuccessorRole::Loser,
        });
    }
    Ok(out)
}

fn double_elimination(
    stage: &Stage,
    shape: &StageShape,
    loc: &MatchLocation,
) -> CoreResult<Vec<SuccessorRef>> {
    let mut out = Vec::new();
    match loc.group_number {
        // winner bracket
        1 => {
            // conceptual round within the full-depth bracket
            let conceptual = if stage.settings.skip_first_round {
                loc.round_number + 1
            } else {
                loc.round_number
            };
            if loc.round_number < shape.wb_rounds {
                out.push(pair_target(
                    loc.round_number + 1,
                    loc.match_number,
                    1,
                    SuccessorRole::Winner,
                ));
            } else if shape.grand_final != GrandFinal::None {
                out.push(SuccessorRef {
                    location: MatchLocation::new(3, 1, 1),
                    side: Side::One,
                    role: SuccessorRole::Winner,
                });
            }

            if conceptual == 1 {
                let perm = drop_permutation(1, shape.size / 2, &stage.settings)?;
                let p = permuted_position(&perm, loc.match_number)?;
                out.push(SuccessorRef {
                    location: MatchLocation::new(2, 1, p.div_ceil(2)),
                    side: if p % 2 == 1 { Side::One } else { Side::Two },
                    role: SuccessorRole::Loser,
                });
            } else {
                let target_round = 2 * (conceptual - 1);
                let count = shape.size / 2u32.pow(conceptual);
                let perm = drop_permutation(conceptual, count, &stage.settings)?;
                let p = permuted_position(&perm, loc.match_number)?;
                out.push(SuccessorRef {
                    location: MatchLocation::new(2, target_round, p),
                    side: Side::One,
                    role: SuccessorRole::Loser,
                });
            }
        }
        // loser bracket
        2 => {
            if loc.round_number < shape.lb_rounds {
                if loc.round_number % 2 == 1 {
                    out.push(SuccessorRef {
                        location: MatchLocation::new(2, loc.round_number + 1, loc.match_number),
                        side: Side::Two,
                        role: SuccessorRole::Winner,
                    });
                } else {
                    out.push(pair_target(
                        loc.round_number + 1,
                        loc.match_number,
                        2,
                        SuccessorRole::Winner,
                    ));
                }
            } else if shape.grand_final != GrandFinal::None {
                out.push(SuccessorRef {
                    location: MatchLocation::new(3, 1, 1),
                    side: Side::Two,
                    role: SuccessorRole::Winner,
                });
            }
        }
        // grand final
        3 => {
            if shape.grand_final == GrandFinal::Double && loc.round_number == 1 {
                out.push(SuccessorRef {
                    location: MatchLocation::new(3, 2, 1),
                    side: Side::One,
                    role: SuccessorRole::Winner,
                });
                out.push(SuccessorRef {
                    location: MatchLocation::new(3, 2, 1),
                    side: Side::Two,
                    role: SuccessorRole::Loser,
                });
            }
        }
        _ => {}
    }
    Ok(out)
}

fn permuted_position(perm: &[u32], match_number: u32) -> CoreResult<u32> {
    perm.iter()
        .position(|&source| source == match_number)
        .map(|i| i as u32 + 1)
        .ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "match {match_number} is missing from drop permutation {perm:?}"
            ))
        })
}
