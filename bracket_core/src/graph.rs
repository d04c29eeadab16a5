// in-memory view of one stage's match graph

use crate::navigation::{self, MatchLocation, SuccessorRole};
use crate::{
    CoreError, CoreResult, Group, GroupFilter, Id, Match, MatchFilter, MatchGame, MatchGameFilter,
    Round, RoundFilter, Side, Stage, StoragePort,
};
use std::collections::HashMap;

/// Everything stored for one stage, loaded in one sweep and kept sorted in
/// topological order: groups by number, rounds by (group, number), matches by
/// (group, round, number). Propagation mutates this view; the operations
/// layer persists the diff afterwards.
pub(crate) struct StageGraph {
    pub stage: Stage,
    pub groups: Vec<Group>,
    pub rounds: Vec<Round>,
    pub matches: Vec<Match>,
    pub games: Vec<MatchGame>,
    locations: Vec<MatchLocation>,
}

impl StageGraph {
    pub async fn load(storage: &dyn StoragePort, stage_id: Id) -> CoreResult<Self> {
        let stage = storage
            .select_stage(stage_id)
            .await?
            .ok_or_else(|| CoreError::not_found("stage", stage_id))?;
        let mut groups = storage.select_groups(&GroupFilter::stage(stage_id)).await?;
        groups.sort_by_key(|g| g.number);
        let mut rounds = storage.select_rounds(&RoundFilter::stage(stage_id)).await?;
        let group_numbers: HashMap<Id, u32> = groups.iter().map(|g| (g.id, g.number)).collect();
        rounds.sort_by_key(|r| (group_numbers.get(&r.group_id).copied(), r.number));

        let round_positions: HashMap<Id, (u32, u32)> = rounds
            .iter()
            .filter_map(|r| {
                group_numbers
                    .get(&r.group_id)
                    .map(|&g| (r.id, (g, r.number)))
            })
            .collect();

        let mut matches = storage.select_matches(&MatchFilter::stage(stage_id)).await?;
        matches.sort_by_key(|m| {
            let (g, r) = round_positions.get(&m.round_id).copied().unwrap_or((0, 0));
            (g, r, m.number)
        });
        let locations = matches
            .iter()
            .map(|m| {
                let (g, r) = round_positions.get(&m.round_id).copied().unwrap_or((0, 0));
                MatchLocation::new(g, r, m.number)
            })
            .collect();

        let mut games = storage
            .select_match_games(&MatchGameFilter::stage(stage_id))
            .await?;
        games.sort_by_key(|g| (g.parent_id, g.number));

        Ok(StageGraph {
            stage,
            groups,
            rounds,
            matches,
            games,
            locations,
        })
    }

    pub fn index_by_id(&self, match_id: Id) -> CoreResult<usize> {
        self.matches
            .iter()
            .position(|m| m.id == match_id)
            .ok_or_else(|| CoreError::not_found("match", match_id))
    }

    pub fn index_at(&self, location: &MatchLocation) -> Option<usize> {
        self.locations.iter().position(|l| l == location)
    }

    pub fn location(&self, index: usize) -> MatchLocation {
        self.locations[index]
    }

    /// Successors of the match at `index`, resolved to graph indexes.
    pub fn successor_indexes(
        &self,
        index: usize,
    ) -> CoreResult<Vec<(usize, Side, SuccessorRole)>> {
        let refs = navigation::successors(&self.stage, &self.locations[index])?;
        refs.into_iter()
            .map(|s| {
                self.index_at(&s.location)
                    .map(|i| (i, s.side, s.role))
                    .ok_or_else(|| {
                        CoreError::InvalidInput(format!(
                            "stage {} has no match at {:?}",
                            self.stage.id, s.location
                        ))
                    })
            })
            .collect()
    }

    /// Predecessors of the match at `index`: every match whose winner or
    /// loser flows into it, found by scanning the derived graph.
    pub fn predecessor_indexes(
        &self,
        index: usize,
    ) -> CoreResult<Vec<(usize, SuccessorRole, Side)>> {
        let mut out = Vec::new();
        for source in 0..self.matches.len() {
            if source == index {
                continue;
            }
            for (target, side, role) in self.successor_indexes(source)? {
                if target == index {
                    out.push((source, role, side));
                }
            }
        }
        Ok(out)
    }

    /// Indexes into `games` of the child games of a match.
    pub fn game_indexes_of(&self, match_id: Id) -> Vec<usize> {
        self.games
            .iter()
            .enumerate()
            .filter(|(_, g)| g.parent_id == match_id)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn game_index_by_id(&self, game_id: Id) -> CoreResult<usize> {
        self.games
            .iter()
            .position(|g| g.id == game_id)
            .ok_or_else(|| CoreError::not_found("match game", game_id))
    }
}
