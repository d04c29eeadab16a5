// reversal operations

use crate::graph::StageGraph;
use crate::layout::{self, PlanSlot};
use crate::progression::{self, Touched};
use crate::{CoreError, CoreResult, Id, Slot, Status, StoragePort, series};

/// Reset namespace: undo recorded results or the whole seeding.
pub struct Reset<'a> {
    storage: &'a dyn StoragePort,
}

impl<'a> Reset<'a> {
    pub(crate) fn new(storage: &'a dyn StoragePort) -> Self {
        Reset { storage }
    }

    /// Clear everything recorded on a match and restore the placeholders in
    /// its successors. Refused when a downstream match already has a result
    /// of its own.
    pub async fn match_results(&self, match_id: Id) -> CoreResult<()> {
        let stored = self
            .storage
            .select_match(match_id)
            .await?
            .ok_or_else(|| CoreError::not_found("match", match_id))?;
        let mut graph = StageGraph::load(self.storage, stored.stage_id).await?;
        let idx = graph.index_by_id(match_id)?;

        let m = &graph.matches[idx];
        if m.status == Status::Archived {
            return Err(CoreError::InvalidTransition(
                "the match is archived".into(),
            ));
        }
        if m.is_bye_decided() {
            return Err(CoreError::InvalidTransition(
                "the match was decided by a BYE".into(),
            ));
        }

        let mut touched = Touched::default();
        if graph.matches[idx].status == Status::Completed {
            progression::unwire_completion(&mut graph, idx, &mut touched)?;
        }

        let m = &mut graph.matches[idx];
        m.opponent1 = m.opponent1.cleared();
        m.opponent2 = m.opponent2.cleared();
        m.status = progression::derive_status(m);
        touched.matches.insert(idx);

        // a best-of parent owns its games' records too
        for gi in graph.game_indexes_of(match_id) {
            let game = &mut graph.games[gi];
            game.opponent1 = game.opponent1.cleared();
            game.opponent2 = game.opponent2.cleared();
            game.status = progression::derive_game_status(game);
            touched.games.insert(gi);
        }

        super::persist_touched(self.storage, &graph, &touched, Some(idx), None).await
    }

    /// Clear one game of a best-of series and re-derive the parent.
    pub async fn match_game_results(&self, game_id: Id) -> CoreResult<()> {
        let stored = self
            .storage
            .select_match_game(game_id)
            .await?
            .ok_or_else(|| CoreError::not_found("match game", game_id))?;
        let mut graph = StageGraph::load(self.storage, stored.stage_id).await?;
        let game_idx = graph.game_index_by_id(game_id)?;

        let mut touched = Touched::default();
        series::reset_game(&mut graph, game_idx, &mut touched)?;
        super::persist_touched(self.storage, &graph, &touched, None, Some(game_idx)).await
    }

    /// Restore every seed slot of an unstarted stage to its position
    /// placeholder.
    pub async fn seeding(&self, stage_id: Id) -> CoreResult<()> {
        let mut graph = StageGraph::load(self.storage, stage_id).await?;
        super::update::guard_unstarted(&graph)?;

        let seed_count = graph.stage.settings.seed_count.unwrap_or(0);
        let plan = layout::plan_stage(graph.stage.stage_type, &graph.stage.settings, seed_count)?;

        let mut touched = Touched::default();
        super::update::apply_plan_slots(&mut graph, &plan, |slot| match slot {
            PlanSlot::Seed(position) => Slot::Position(position),
            PlanSlot::Feed(source) => Slot::Position(source),
        })?;
        progression::recompute_all(&mut graph, &mut touched)?;
        super::update::mark_all_touched(&graph, &mut touched);
        super::persist_touched(self.storage, &graph, &touched, None, None).await
    }
}
