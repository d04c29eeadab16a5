// read operations

use crate::graph::StageGraph;
use crate::layout::{self, PlanSlot};
use crate::standings::{self, Standings};
use crate::{
    CoreError, CoreResult, Group, Id, Match, MatchGame, MatchGameFilter, Participant,
    ParticipantFilter, Round, Stage, StageFilter, Status, StoragePort, Tournament,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything stored for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageData {
    pub stage: Stage,
    pub groups: Vec<Group>,
    pub rounds: Vec<Round>,
    pub matches: Vec<Match>,
    pub match_games: Vec<MatchGame>,
    pub participants: Vec<Participant>,
}

/// A tournament with its participants and stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentData {
    pub tournament: Tournament,
    pub participants: Vec<Participant>,
    pub stages: Vec<Stage>,
}

/// Read namespace.
pub struct Get<'a> {
    storage: &'a dyn StoragePort,
}

impl<'a> Get<'a> {
    pub(crate) fn new(storage: &'a dyn StoragePort) -> Self {
        Get { storage }
    }

    pub async fn stage_data(&self, stage_id: Id) -> CoreResult<StageData> {
        let graph = StageGraph::load(self.storage, stage_id).await?;
        let participants = self
            .storage
            .select_participants(&ParticipantFilter::tournament(graph.stage.tournament_id))
            .await?;
        Ok(StageData {
            stage: graph.stage,
            groups: graph.groups,
            rounds: graph.rounds,
            matches: graph.matches,
            match_games: graph.games,
            participants,
        })
    }

    pub async fn tournament_data(&self, tournament_id: Id) -> CoreResult<TournamentData> {
        let tournament = self
            .storage
            .select_tournament(tournament_id)
            .await?
            .ok_or_else(|| CoreError::not_found("tournament", tournament_id))?;
        let participants = self
            .storage
            .select_participants(&ParticipantFilter::tournament(tournament_id))
            .await?;
        let mut stages = self
            .storage
            .select_stages(&StageFilter::tournament(tournament_id))
            .await?;
        stages.sort_by_key(|s| s.number);
        Ok(TournamentData {
            tournament,
            participants,
            stages,
        })
    }

    /// The seed list of a stage in seed order, `None` for BYE or still
    /// unassigned positions.
    pub async fn seeding(&self, stage_id: Id) -> CoreResult<Vec<Option<Id>>> {
        let graph = StageGraph::load(self.storage, stage_id).await?;
        seeding_of(&graph)
    }

    /// Final standings of a finished stage.
    pub async fn final_standings(&self, stage_id: Id) -> CoreResult<Standings> {
        let graph = StageGraph::load(self.storage, stage_id).await?;
        let participants = self
            .storage
            .select_participants(&ParticipantFilter::tournament(graph.stage.tournament_id))
            .await?;
        let seed_positions: HashMap<Id, u32> = seeding_of(&graph)?
            .into_iter()
            .enumerate()
            .filter_map(|(i, id)| id.map(|id| (id, i as u32 + 1)))
            .collect();
        standings::final_standings(&graph, &participants, &seed_positions)
    }

    /// The playable frontier of a stage: every ready or running match.
    pub async fn current_matches(&self, stage_id: Id) -> CoreResult<Vec<Match>> {
        let graph = StageGraph::load(self.storage, stage_id).await?;
        Ok(graph
            .matches
            .into_iter()
            .filter(|m| matches!(m.status, Status::Ready | Status::Running))
            .collect())
    }

    /// Child games of a best-of match, sorted by game number.
    pub async fn match_games(&self, match_id: Id) -> CoreResult<Vec<MatchGame>> {
        let match_ = self
            .storage
            .select_match(match_id)
            .await?
            .ok_or_else(|| CoreError::not_found("match", match_id))?;
        if match_.child_count == 0 {
            return Err(CoreError::InvalidInput(format!(
                "match {match_id} has no child games"
            )));
        }
        let mut games = self
            .storage
            .select_match_games(&MatchGameFilter::parent(match_id))
            .await?;
        games.sort_by_key(|g| g.number);
        Ok(games)
    }
}

/// Recover the seed list from the stored slots by replaying the layout.
pub(crate) fn seeding_of(graph: &StageGraph) -> CoreResult<Vec<Option<Id>>> {
    let seed_count = graph.stage.settings.seed_count.unwrap_or(0);
    let plan = layout::plan_stage(graph.stage.stage_type, &graph.stage.settings, seed_count)?;
    let flat = super::update::flatten(&plan);
    if flat.len() != graph.matches.len() {
        return Err(CoreError::InvalidTransition(
            "the stored match graph no longer matches its layout".into(),
        ));
    }

    let mut seeds: Vec<Option<Id>> = vec![None; seed_count as usize];
    for (idx, slots) in flat.iter().enumerate() {
        let m = &graph.matches[idx];
        for (plan_slot, slot) in slots.iter().zip([&m.opponent1, &m.opponent2]) {
            if let PlanSlot::Seed(position) = plan_slot
                && *position <= seed_count
                && let Some(id) = slot.participant_id()
            {
                seeds[*position as usize - 1] = Some(id);
            }
        }
    }
    Ok(seeds)
}
