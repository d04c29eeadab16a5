// graph query operations

use crate::graph::StageGraph;
use crate::navigation::MatchLocation;
use crate::{CoreError, CoreResult, Id, Match, Status, StoragePort, SuccessorRole};

/// Query namespace over the derived match graph.
pub struct Find<'a> {
    storage: &'a dyn StoragePort,
}

impl<'a> Find<'a> {
    pub(crate) fn new(storage: &'a dyn StoragePort) -> Self {
        Find { storage }
    }

    /// The match at a positional location within a stage.
    pub async fn match_(
        &self,
        stage_id: Id,
        group_number: u32,
        round_number: u32,
        match_number: u32,
    ) -> CoreResult<Match> {
        let graph = StageGraph::load(self.storage, stage_id).await?;
        let location = MatchLocation::new(group_number, round_number, match_number);
        graph
            .index_at(&location)
            .map(|idx| graph.matches[idx].clone())
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "match at group {group_number}, round {round_number}, number {match_number}"
                ))
            })
    }

    /// Positional location of a match.
    pub async fn match_location(&self, match_id: Id) -> CoreResult<MatchLocation> {
        let graph = self.load_for(match_id).await?;
        let idx = graph.index_by_id(match_id)?;
        Ok(graph.location(idx))
    }

    /// Downstream matches of a match. With a participant, only the
    /// destinations that participant can still reach given the recorded
    /// outcome are returned.
    pub async fn next_matches(
        &self,
        match_id: Id,
        participant_id: Option<Id>,
    ) -> CoreResult<Vec<Match>> {
        let graph = self.load_for(match_id).await?;
        let idx = graph.index_by_id(match_id)?;
        let m = &graph.matches[idx];

        let mut out = Vec::new();
        for (succ, _, role) in graph.successor_indexes(idx)? {
            let keep = match participant_id {
                None => true,
                Some(participant) => {
                    if m.side_of(participant).is_none() {
                        return Err(CoreError::InvalidOpponent(format!(
                            "participant {participant} does not play match {match_id}"
                        )));
                    }
                    if m.status >= Status::Completed {
                        let outcome = match role {
                            SuccessorRole::Winner => m.winner_id(),
                            SuccessorRole::Loser => m.loser_id(),
                        };
                        outcome == Some(participant)
                    } else {
                        // undecided: both destinations are still possible
                        true
                    }
                }
            };
            if keep {
                out.push(graph.matches[succ].clone());
            }
        }
        Ok(out)
    }

    /// Upstream matches feeding a match, symmetric to [`Find::next_matches`].
    pub async fn previous_matches(
        &self,
        match_id: Id,
        participant_id: Option<Id>,
    ) -> CoreResult<Vec<Match>> {
        let graph = self.load_for(match_id).await?;
        let idx = graph.index_by_id(match_id)?;

        let mut out = Vec::new();
        for (pred, role, _) in graph.predecessor_indexes(idx)? {
            let m = &graph.matches[pred];
            let keep = match participant_id {
                None => true,
                Some(participant) => {
                    if m.status >= Status::Completed {
                        let outcome = match role {
                            SuccessorRole::Winner => m.winner_id(),
                            SuccessorRole::Loser => m.loser_id(),
                        };
                        outcome == Some(participant)
                    } else {
                        m.side_of(participant).is_some()
                    }
                }
            };
            if keep {
                out.push(m.clone());
            }
        }
        Ok(out)
    }

    async fn load_for(&self, match_id: Id) -> CoreResult<StageGraph> {
        let stored = self
            .storage
            .select_match(match_id)
            .await?
            .ok_or_else(|| CoreError::not_found("match", match_id))?;
        StageGraph::load(self.storage, stored.stage_id).await
    }
}
