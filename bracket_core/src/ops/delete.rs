// destruction operations

use crate::graph::StageGraph;
use crate::{
    CoreError, CoreResult, GroupFilter, Id, MatchFilter, MatchGameFilter, ParticipantFilter,
    RoundFilter, StageFilter, StoragePort,
};

/// Deletion namespace. Cascades follow the entity hierarchy: tournament →
/// stages → groups → rounds → matches → match games; participants are removed
/// with the tournament only.
pub struct Delete<'a> {
    storage: &'a dyn StoragePort,
}

impl<'a> Delete<'a> {
    pub(crate) fn new(storage: &'a dyn StoragePort) -> Self {
        Delete { storage }
    }

    pub async fn stage(&self, stage_id: Id) -> CoreResult<()> {
        self.storage
            .select_stage(stage_id)
            .await?
            .ok_or_else(|| CoreError::not_found("stage", stage_id))?;
        self.storage
            .delete_match_games(&MatchGameFilter::stage(stage_id))
            .await?;
        self.storage
            .delete_matches(&MatchFilter::stage(stage_id))
            .await?;
        self.storage
            .delete_rounds(&RoundFilter::stage(stage_id))
            .await?;
        self.storage
            .delete_groups(&GroupFilter::stage(stage_id))
            .await?;
        self.storage.delete_stage(stage_id).await?;
        Ok(())
    }

    pub async fn tournament(&self, tournament_id: Id) -> CoreResult<()> {
        self.storage
            .select_tournament(tournament_id)
            .await?
            .ok_or_else(|| CoreError::not_found("tournament", tournament_id))?;
        let stages = self
            .storage
            .select_stages(&StageFilter::tournament(tournament_id))
            .await?;
        for stage in stages {
            self.stage(stage.id).await?;
        }
        self.storage
            .delete_participants(&ParticipantFilter::tournament(tournament_id))
            .await?;
        self.storage.delete_tournament(tournament_id).await?;
        Ok(())
    }

    /// Delete a single match and its games. Refused while anything
    /// downstream references it.
    pub async fn match_(&self, match_id: Id) -> CoreResult<()> {
        let stored = self
            .storage
            .select_match(match_id)
            .await?
            .ok_or_else(|| CoreError::not_found("match", match_id))?;
        let graph = StageGraph::load(self.storage, stored.stage_id).await?;
        let idx = graph.index_by_id(match_id)?;

        for (succ, side, _) in graph.successor_indexes(idx)? {
            if !graph.matches[succ].slot(side).is_position() {
                return Err(CoreError::InvalidTransition(
                    "a downstream match already references this match".into(),
                ));
            }
        }

        self.storage
            .delete_match_games(&MatchGameFilter::parent(match_id))
            .await?;
        self.storage
            .delete_matches(&MatchFilter {
                round_id: Some(stored.round_id),
                number: Some(stored.number),
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}
