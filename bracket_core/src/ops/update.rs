// mutating operations

use crate::graph::StageGraph;
use crate::layout::{self, PlanSlot, StagePlan};
use crate::progression::{self, Touched};
use crate::{
    CoreError, CoreResult, Id, Match, MatchGame, MatchGameFilter, MatchUpdate, SideEntry, Slot,
    Status, StoragePort, series,
};
use tracing::debug;

/// Mutation namespace: match updates, match game updates and seeding.
pub struct Update<'a> {
    storage: &'a dyn StoragePort,
}

impl<'a> Update<'a> {
    pub(crate) fn new(storage: &'a dyn StoragePort) -> Self {
        Update { storage }
    }

    /// Entry point of the progression engine: merge a partial update into a
    /// match, derive its state and propagate across the completion boundary.
    /// Repeating the same call is idempotent.
    pub async fn match_(&self, match_id: Id, update: MatchUpdate) -> CoreResult<Match> {
        let stored = self
            .storage
            .select_match(match_id)
            .await?
            .ok_or_else(|| CoreError::not_found("match", match_id))?;
        let mut graph = StageGraph::load(self.storage, stored.stage_id).await?;
        let idx = graph.index_by_id(match_id)?;

        let mut touched = Touched::default();
        progression::apply_match_update(&mut graph, idx, &update, &mut touched)?;
        debug!(
            match_id,
            mutated = touched.matches.len(),
            "match update applied"
        );
        super::persist_touched(self.storage, &graph, &touched, Some(idx), None).await?;
        Ok(graph.matches[idx].clone())
    }

    /// Update one game of a best-of series and re-derive the parent match.
    pub async fn match_game(&self, game_id: Id, update: MatchUpdate) -> CoreResult<MatchGame> {
        let stored = self
            .storage
            .select_match_game(game_id)
            .await?
            .ok_or_else(|| CoreError::not_found("match game", game_id))?;
        let mut graph = StageGraph::load(self.storage, stored.stage_id).await?;
        let game_idx = graph.game_index_by_id(game_id)?;

        let mut touched = Touched::default();
        series::apply_game_update(&mut graph, game_idx, &update, &mut touched)?;
        super::persist_touched(self.storage, &graph, &touched, None, Some(game_idx)).await?;
        Ok(graph.games[game_idx].clone())
    }

    /// Replace the seeding of a stage that has not started yet. The whole
    /// slot layout is re-derived from the stored settings.
    pub async fn seeding(&self, stage_id: Id, seeding: super::Seeding) -> CoreResult<()> {
        let mut graph = StageGraph::load(self.storage, stage_id).await?;
        guard_unstarted(&graph)?;

        let (seed_ids, seed_count) =
            super::resolve_seeding(self.storage, graph.stage.tournament_id, &seeding).await?;
        let size = graph.stage.settings.size.unwrap_or(0);
        match graph.stage.stage_type {
            crate::StageType::RoundRobin => {
                if seed_count != size {
                    return Err(CoreError::InvalidInput(format!(
                        "a seeding of {seed_count} does not fit a stage of {size}"
                    )));
                }
            }
            _ => {
                if seed_count > size {
                    return Err(CoreError::InvalidInput(format!(
                        "a seeding of {seed_count} does not fit a bracket of {size}"
                    )));
                }
            }
        }

        graph.stage.settings.seed_count = Some(seed_count);
        let plan = layout::plan_stage(
            graph.stage.stage_type,
            &graph.stage.settings,
            seed_count,
        )?;

        let mut touched = Touched::default();
        apply_plan_slots(&mut graph, &plan, |slot| match (slot, &seed_ids) {
            (PlanSlot::Feed(source), _) => Slot::Position(source),
            (PlanSlot::Seed(position), None) => Slot::Position(position),
            (PlanSlot::Seed(position), Some(seeds)) => {
                match seeds.get(position as usize - 1) {
                    Some(Some(id)) => Slot::Entry(SideEntry::new(*id)),
                    _ => Slot::Bye,
                }
            }
        })?;
        progression::recompute_all(&mut graph, &mut touched)?;
        mark_all_touched(&graph, &mut touched);

        self.storage.update_stage(&graph.stage).await?;
        super::persist_touched(self.storage, &graph, &touched, None, None).await
    }

    /// Turn every still-unresolved seed position of the stage into a BYE and
    /// re-run the auto-advance pass.
    pub async fn confirm_seeding(&self, stage_id: Id) -> CoreResult<()> {
        let mut graph = StageGraph::load(self.storage, stage_id).await?;
        let seed_count = graph.stage.settings.seed_count.unwrap_or(0);
        let plan = layout::plan_stage(
            graph.stage.stage_type,
            &graph.stage.settings,
            seed_count,
        )?;

        let mut touched = Touched::default();
        let flat = flatten(&plan);
        if flat.len() != graph.matches.len() {
            return Err(CoreError::InvalidTransition(
                "the stored match graph no longer matches its layout".into(),
            ));
        }
        for (idx, slots) in flat.iter().enumerate() {
            for (side, plan_slot) in [crate::Side::One, crate::Side::Two]
                .into_iter()
                .zip(slots.iter())
            {
                if let PlanSlot::Seed(_) = plan_slot {
                    let slot = graph.matches[idx].slot_mut(side);
                    if slot.is_position() {
                        *slot = Slot::Bye;
                        touched.matches.insert(idx);
                    }
                }
            }
        }
        progression::recompute_all(&mut graph, &mut touched)?;
        super::persist_touched(self.storage, &graph, &touched, None, None).await
    }

    /// Resize the best-of series of a match before it starts. Existing games
    /// are discarded and recreated.
    pub async fn match_child_count(&self, match_id: Id, child_count: u16) -> CoreResult<()> {
        if child_count > 0 && child_count % 2 == 0 {
            return Err(CoreError::InvalidInput(format!(
                "child count must be odd, got {child_count}"
            )));
        }
        let mut stored = self
            .storage
            .select_match(match_id)
            .await?
            .ok_or_else(|| CoreError::not_found("match", match_id))?;
        if stored.status >= Status::Running {
            return Err(CoreError::InvalidTransition(
                "the series already started".into(),
            ));
        }
        if stored.child_count == child_count {
            return Ok(());
        }

        self.storage
            .delete_match_games(&MatchGameFilter::parent(match_id))
            .await?;
        if child_count > 0 {
            let mirror = |slot: &Slot| match slot.participant_id() {
                Some(id) => Slot::Entry(SideEntry::new(id)),
                None => Slot::Bye,
            };
            let games = (1..=child_count as u32)
                .map(|number| {
                    let mut game = MatchGame {
                        id: 0,
                        stage_id: stored.stage_id,
                        parent_id: match_id,
                        number,
                        status: Status::Locked,
                        opponent1: mirror(&stored.opponent1),
                        opponent2: mirror(&stored.opponent2),
                    };
                    game.status = progression::derive_game_status(&game);
                    game
                })
                .collect();
            self.storage.insert_match_games(games).await?;
        }
        stored.child_count = child_count;
        self.storage.update_match(&stored).await?;
        Ok(())
    }
}

/// Refuse seeding changes once anything was recorded.
pub(crate) fn guard_unstarted(graph: &StageGraph) -> CoreResult<()> {
    let played = graph.matches.iter().any(|m| m.has_recorded_play())
        || graph.games.iter().any(|g| {
            [&g.opponent1, &g.opponent2].iter().any(|s| {
                s.entry()
                    .is_some_and(|e| e.score.is_some() || e.result.is_some() || e.forfeit)
            })
        });
    if played {
        return Err(CoreError::InvalidTransition(
            "the stage has recorded results".into(),
        ));
    }
    Ok(())
}

/// Flattened plan slots in the graph's storage order.
pub(crate) fn flatten(plan: &StagePlan) -> Vec<[PlanSlot; 2]> {
    plan.groups
        .iter()
        .flat_map(|g| &g.rounds)
        .flat_map(|r| &r.matches)
        .map(|m| m.slots)
        .collect()
}

/// Rewrite every slot of the graph from the plan via `resolve`.
pub(crate) fn apply_plan_slots<F>(
    graph: &mut StageGraph,
    plan: &StagePlan,
    resolve: F,
) -> CoreResult<()>
where
    F: Fn(PlanSlot) -> Slot,
{
    let flat = flatten(plan);
    if flat.len() != graph.matches.len() {
        return Err(CoreError::InvalidTransition(
            "the stored match graph no longer matches its layout".into(),
        ));
    }
    for (idx, slots) in flat.iter().enumerate() {
        graph.matches[idx].opponent1 = resolve(slots[0]);
        graph.matches[idx].opponent2 = resolve(slots[1]);
        graph.matches[idx].status = progression::derive_status(&graph.matches[idx]);
    }
    Ok(())
}

/// After a wholesale rewrite every match and game must be persisted.
pub(crate) fn mark_all_touched(graph: &StageGraph, touched: &mut Touched) {
    for idx in 0..graph.matches.len() {
        touched.matches.insert(idx);
    }
    for idx in 0..graph.games.len() {
        touched.games.insert(idx);
    }
}
