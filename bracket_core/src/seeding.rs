// seed ordering methods

use crate::StageType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic permutation of the initial seed list, defining the round-1
/// arrangement of a stage. The `groups.*` methods partition instead of
/// permuting and only apply to round-robin stages.
///
/// Every method is total and length-preserving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedOrdering {
    #[serde(rename = "natural")]
    Natural,
    #[serde(rename = "reverse")]
    Reverse,
    #[serde(rename = "half_shift")]
    HalfShift,
    #[serde(rename = "reverse_half_shift")]
    ReverseHalfShift,
    #[serde(rename = "pair_flip")]
    PairFlip,
    #[serde(rename = "inner_outer")]
    InnerOuter,
    #[serde(rename = "groups.effort_balanced")]
    GroupsEffortBalanced,
    #[serde(rename = "groups.snake")]
    GroupsSnake,
    #[serde(rename = "groups.bracket_optimized")]
    GroupsBracketOptimized,
}

// error messages show the wire names ("groups.snake", not "GroupsSnake")
impl fmt::Display for SeedOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeedOrdering::Natural => "natural",
            SeedOrdering::Reverse => "reverse",
            SeedOrdering::HalfShift => "half_shift",
            SeedOrdering::ReverseHalfShift => "reverse_half_shift",
            SeedOrdering::PairFlip => "pair_flip",
            SeedOrdering::InnerOuter => "inner_outer",
            SeedOrdering::GroupsEffortBalanced => "groups.effort_balanced",
            SeedOrdering::GroupsSnake => "groups.snake",
            SeedOrdering::GroupsBracketOptimized => "groups.bracket_optimized",
        };
        write!(f, "{name}")
    }
}

impl SeedOrdering {
    /// Default arrangement when the stage settings leave it open: ranked
    /// pairing for elimination (seed 1 meets seed N), balanced pools for
    /// round-robin.
    pub fn default_for(stage_type: StageType) -> SeedOrdering {
        match stage_type {
            StageType::RoundRobin => SeedOrdering::GroupsEffortBalanced,
            StageType::SingleElimination | StageType::DoubleElimination => {
                SeedOrdering::InnerOuter
            }
        }
    }

    pub fn is_group_method(&self) -> bool {
        matches!(
            self,
            SeedOrdering::GroupsEffortBalanced
                | SeedOrdering::GroupsSnake
                | SeedOrdering::GroupsBracketOptimized
        )
    }

    /// Permute a sequence. Group methods are partitions, not permutations,
    /// and leave the sequence untouched here; use [`SeedOrdering::distribute`].
    pub fn apply<T: Clone>(&self, seq: &[T]) -> Vec<T> {
        let n = seq.len();
        match self {
            SeedOrdering::Natural => seq.to_vec(),
            SeedOrdering::Reverse => seq.iter().rev().cloned().collect(),
            SeedOrdering::HalfShift => {
                let (a, b) = seq.split_at(n / 2);
                b.iter().chain(a.iter()).cloned().collect()
            }
            SeedOrdering::ReverseHalfShift => {
                let reversed: Vec<T> = seq.iter().rev().cloned().collect();
                SeedOrdering::HalfShift.apply(&reversed)
            }
            SeedOrdering::PairFlip => {
                let mut out = Vec::with_capacity(n);
                for pair in seq.chunks(2) {
                    match pair {
                        [a, b] => {
                            out.push(b.clone());
                            out.push(a.clone());
                        }
                        [a] => out.push(a.clone()),
                        _ => unreachable!(),
                    }
                }
                out
            }
            SeedOrdering::InnerOuter => inner_outer_indexes(n)
                .into_iter()
                .map(|i| seq[i].clone())
                .collect(),
            SeedOrdering::GroupsEffortBalanced
            | SeedOrdering::GroupsSnake
            | SeedOrdering::GroupsBracketOptimized => seq.to_vec(),
        }
    }

    /// Partition a sequence into `group_count` groups of balanced sizes.
    /// Non-group methods fall back to contiguous chunks.
    pub fn distribute<T: Clone>(&self, seq: &[T], group_count: usize) -> Vec<Vec<T>> {
        let group_count = group_count.max(1);
        match self {
            SeedOrdering::GroupsSnake => {
                let mut groups: Vec<Vec<T>> = vec![Vec::new(); group_count];
                for (i, item) in seq.iter().enumerate() {
                    let row = i / group_count;
                    let col = i % group_count;
                    let g = if row % 2 == 0 {
                        col
                    } else {
                        group_count - 1 - col
                    };
                    groups[g].push(item.clone());
                }
                groups
            }
            SeedOrdering::GroupsEffortBalanced => effort_balanced(seq, group_count),
            SeedOrdering::GroupsBracketOptimized => {
                let arranged = SeedOrdering::InnerOuter.apply(seq);
                chunked(&arranged, group_count)
            }
            _ => chunked(seq, group_count),
        }
    }
}

/// Slot indexes of the ranked bracket arrangement: seed 1 meets seed N,
/// seed 2 meets seed N-1, recursively, so the top seeds cannot collide
/// before the last rounds. Sequences that are not a power of two fall back
/// to plain outside-in interleaving.
fn inner_outer_indexes(n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    if n.is_power_of_two() {
        let mut indexes = vec![0usize];
        let mut len = 1;
        while len < n {
            len *= 2;
            let mut next = Vec::with_capacity(len);
            for &i in &indexes {
                next.push(i);
                next.push(len - 1 - i);
            }
            indexes = next;
        }
        indexes
    } else {
        let mut out = Vec::with_capacity(n);
        let (mut lo, mut hi) = (0, n - 1);
        while lo < hi {
            out.push(lo);
            out.push(hi);
            lo += 1;
            hi -= 1;
        }
        if lo == hi {
            out.push(lo);
        }
        out
    }
}

/// Greedy balance of seed strength: seeds are placed weakest-first into the
/// group with the lowest summed seed index that still has room, then each
/// group is restored to seed order. Ties go to the lowest group number.
fn effort_balanced<T: Clone>(seq: &[T], group_count: usize) -> Vec<Vec<T>> {
    let n = seq.len();
    let base = n / group_count;
    let extra = n % group_count;
    let capacity = |g: usize| if g < extra { base + 1 } else { base };

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); group_count];
    let mut sums = vec![0usize; group_count];
    for i in (0..n).rev() {
        let g = (0..group_count)
            .filter(|&g| members[g].len() < capacity(g))
            .min_by_key(|&g| sums[g])
            .expect("capacities sum to the sequence length");
        members[g].push(i);
        sums[g] += i + 1;
    }
    members
        .into_iter()
        .map(|mut indexes| {
            indexes.sort_unstable();
            indexes.into_iter().map(|i| seq[i].clone()).collect()
        })
        .collect()
}

/// Contiguous chunks of balanced sizes (first `n % g` chunks get the extra).
fn chunked<T: Clone>(seq: &[T], group_count: usize) -> Vec<Vec<T>> {
    let n = seq.len();
    let base = n / group_count;
    let extra = n % group_count;
    let mut out = Vec::with_capacity(group_count);
    let mut start = 0;
    for g in 0..group_count {
        let len = if g < extra { base + 1 } else { base };
        out.push(seq[start..start + len].to_vec());
        start += len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds(n: u32) -> Vec<u32> {
        (1..=n).collect()
    }

    #[test]
    fn natural_is_identity() {
        assert_eq!(SeedOrdering::Natural.apply(&seeds(5)), seeds(5));
    }

    #[test]
    fn reverse_reverses() {
        assert_eq!(SeedOrdering::Reverse.apply(&seeds(4)), vec![4, 3, 2, 1]);
    }

    #[test]
    fn half_shift_swaps_halves() {
        assert_eq!(SeedOrdering::HalfShift.apply(&seeds(4)), vec![3, 4, 1, 2]);
    }

    #[test]
    fn reverse_half_shift_composes() {
        // reverse: [4,3,2,1], then swap halves
        assert_eq!(
            SeedOrdering::ReverseHalfShift.apply(&seeds(4)),
            vec![2, 1, 4, 3]
        );
    }

    #[test]
    fn pair_flip_swaps_adjacent_pairs() {
        assert_eq!(
            SeedOrdering::PairFlip.apply(&seeds(6)),
            vec![2, 1, 4, 3, 6, 5]
        );
    }

    #[test]
    fn inner_outer_produces_ranked_bracket() {
        assert_eq!(SeedOrdering::InnerOuter.apply(&seeds(4)), vec![1, 4, 2, 3]);
        assert_eq!(
            SeedOrdering::InnerOuter.apply(&seeds(8)),
            vec![1, 8, 4, 5, 2, 7, 3, 6]
        );
    }

    #[test]
    fn all_methods_are_length_preserving_permutations() {
        let input = seeds(16);
        for ordering in [
            SeedOrdering::Natural,
            SeedOrdering::Reverse,
            SeedOrdering::HalfShift,
            SeedOrdering::ReverseHalfShift,
            SeedOrdering::PairFlip,
            SeedOrdering::InnerOuter,
        ] {
            let mut out = ordering.apply(&input);
            assert_eq!(out.len(), input.len(), "{ordering}");
            out.sort_unstable();
            assert_eq!(out, input, "{ordering} must permute, not alter");
        }
    }

    #[test]
    fn snake_serpentines_rows() {
        let groups = SeedOrdering::GroupsSnake.distribute(&seeds(8), 2);
        assert_eq!(groups, vec![vec![1, 4, 5, 8], vec![2, 3, 6, 7]]);
    }

    #[test]
    fn effort_balanced_equalizes_seed_sums() {
        let groups = SeedOrdering::GroupsEffortBalanced.distribute(&seeds(8), 2);
        let sums: Vec<u32> = groups.iter().map(|g| g.iter().sum()).collect();
        assert_eq!(sums[0], sums[1]);
        // every group keeps seed order
        for group in &groups {
            let mut sorted = group.clone();
            sorted.sort_unstable();
            assert_eq!(&sorted, group);
        }
    }

    #[test]
    fn bracket_optimized_chunks_the_ranked_arrangement() {
        let groups = SeedOrdering::GroupsBracketOptimized.distribute(&seeds(8), 2);
        assert_eq!(groups, vec![vec![1, 8, 4, 5], vec![2, 7, 3, 6]]);
    }

    #[test]
    fn distribution_covers_every_seed_once() {
        for ordering in [
            SeedOrdering::GroupsEffortBalanced,
            SeedOrdering::GroupsSnake,
            SeedOrdering::GroupsBracketOptimized,
        ] {
            for group_count in 1..=4 {
                let mut all: Vec<u32> = ordering
                    .distribute(&seeds(12), group_count)
                    .into_iter()
                    .flatten()
                    .collect();
                all.sort_unstable();
                assert_eq!(all, seeds(12), "{ordering} with {group_count} groups");
            }
        }
    }
}
