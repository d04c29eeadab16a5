// best-of series aggregation

use crate::graph::StageGraph;
use crate::progression::{
    Touched, canonicalize_slots, derive_game_status, derive_status, merge_side, sync_games,
    unwire_completion, wire_completion,
};
use crate::{CoreError, CoreResult, MatchUpdate, SideResult, Status};

/// Wins needed to take a best-of series.
pub(crate) fn win_threshold(child_count: u16) -> u16 {
    child_count / 2 + 1
}

/// Apply a partial update to a match game, then re-derive the parent match
/// from its games: side scores are the games won, the series completes when a
/// side reaches the win threshold, and the remaining games are archived.
pub(crate) fn apply_game_update(
    graph: &mut StageGraph,
    game_idx: usize,
    update: &MatchUpdate,
    touched: &mut Touched,
) -> CoreResult<()> {
    let parent_idx = graph.index_by_id(graph.games[game_idx].parent_id)?;
    guard_series_open(graph, game_idx, parent_idx)?;

    let game = &mut graph.games[game_idx];
    let mut updated = game.clone();
    if let Some(side) = &update.opponent1 {
        merge_side(&mut updated.opponent1, side)?;
    }
    if let Some(side) = &update.opponent2 {
        merge_side(&mut updated.opponent2, side)?;
    }
    canonicalize_slots(&mut updated.opponent1, &mut updated.opponent2, false)?;
    updated.status = derive_game_status(&updated);
    if updated != *game {
        *game = updated;
        touched.games.insert(game_idx);
    }

    reaggregate(graph, parent_idx, touched)
}

/// Clear everything recorded on a game and re-derive the parent.
pub(crate) fn reset_game(
    graph: &mut StageGraph,
    game_idx: usize,
    touched: &mut Touched,
) -> CoreResult<()> {
    let parent_idx = graph.index_by_id(graph.games[game_idx].parent_id)?;
    if graph.matches[parent_idx].status == Status::Archived {
        return Err(CoreError::InvalidTransition(
            "the parent match is archived".into(),
        ));
    }

    let game = &mut graph.games[game_idx];
    let mut cleared = game.clone();
    cleared.opponent1 = cleared.opponent1.cleared();
    cleared.opponent2 = cleared.opponent2.cleared();
    cleared.status = derive_game_status(&cleared);
    if cleared != *game {
        *game = cleared;
        touched.games.insert(game_idx);
    }

    reaggregate(graph, parent_idx, touched)
}

fn guard_series_open(graph: &StageGraph, game_idx: usize, parent_idx: usize) -> CoreResult<()> {
    if graph.games[game_idx].status == Status::Archived {
        return Err(CoreError::InvalidTransition(
            "the match game is archived".into(),
        ));
    }
    let parent = &graph.matches[parent_idx];
    if parent.status == Status::Archived {
        return Err(CoreError::InvalidTransition(
            "the parent match is archived".into(),
        ));
    }
    let forfeited = [&parent.opponent1, &parent.opponent2]
        .iter()
        .any(|s| s.entry().is_some_and(|e| e.forfeit));
    if forfeited {
        return Err(CoreError::InvalidTransition(
            "the series was decided by forfeit".into(),
        ));
    }
    Ok(())
}

/// Project the games of a series onto the parent match and propagate any
/// completion change.
fn reaggregate(graph: &mut StageGraph, parent_idx: usize, touched: &mut Touched) -> CoreResult<()> {
    let stored = graph.matches[parent_idx].clone();
    let p1 = stored.opponent1.participant_id();
    let p2 = stored.opponent2.participant_id();

    let mut wins1 = 0u16;
    let mut wins2 = 0u16;
    let mut any_completed = false;
    for gi in graph.game_indexes_of(stored.id) {
        let game = &graph.games[gi];
        if game.status != Status::Completed {
            continue;
        }
        any_completed = true;
        let winner = game.winner_side().and_then(|s| game.slot(s).participant_id());
        if winner.is_some() && winner == p1 {
            wins1 += 1;
        } else if winner.is_some() && winner == p2 {
            wins2 += 1;
        }
    }

    let threshold = win_threshold(stored.child_count);
    if wins1 > threshold || wins2 > threshold {
        return Err(CoreError::InvalidScore(format!(
            "series score {wins1}-{wins2} exceeds the win threshold {threshold}"
        )));
    }

    let mut updated = stored.clone();
    for (slot, wins) in [(&mut updated.opponent1, wins1), (&mut updated.opponent2, wins2)] {
        if let Some(entry) = slot.entry_mut() {
            entry.score = if any_completed { Some(wins) } else { None };
        }
    }
    let results = if wins1 >= threshold {
        (Some(SideResult::Win), Some(SideResult::Loss))
    } else if wins2 >= threshold {
        (Some(SideResult::Loss), Some(SideResult::Win))
    } else {
        (None, None)
    };
    if let Some(entry) = updated.opponent1.entry_mut() {
        entry.result = results.0;
    }
    if let Some(entry) = updated.opponent2.entry_mut() {
        entry.result = results.1;
    }
    updated.status = derive_status(&updated);

    let old_completed = stored.status == Status::Completed;
    let new_completed = updated.status == Status::Completed;
    let winner_changed = stored.winner_id() != updated.winner_id();

    if old_completed && (!new_completed || winner_changed) {
        unwire_completion(graph, parent_idx, touched)?;
    }
    if updated != stored {
        graph.matches[parent_idx] = updated;
        touched.matches.insert(parent_idx);
    }
    // archives the now-dead games, or revives them after a reopen
    sync_games(graph, parent_idx, touched);
    if new_completed && (!old_completed || winner_changed) {
        wire_completion(graph, parent_idx, touched)?;
    }
    Ok(())
}
