// match progression engine

use crate::graph::StageGraph;
use crate::navigation::MatchLocation;
use crate::{
    CoreError, CoreResult, GrandFinal, Id, Match, MatchGame, MatchUpdate, Side, SideEntry,
    SideResult, SideUpdate, Slot, StageType, Status, SuccessorRole,
};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Indexes of matches and games mutated by an engine pass. The operations
/// layer persists exactly these, successors before the entry-point match.
#[derive(Debug, Default)]
pub(crate) struct Touched {
    pub matches: BTreeSet<usize>,
    pub games: BTreeSet<usize>,
}

/// Status of a match derived from its two slots. `Archived` is sticky and
/// never derived.
pub(crate) fn derive_status(m: &Match) -> Status {
    match (&m.opponent1, &m.opponent2) {
        (Slot::Position(_), Slot::Position(_)) => Status::Locked,
        (Slot::Position(_), _) | (_, Slot::Position(_)) => Status::Waiting,
        // a BYE decides the match the moment the other side is known
        (Slot::Bye, _) | (_, Slot::Bye) => Status::Completed,
        (Slot::Entry(a), Slot::Entry(b)) => {
            if a.forfeit || b.forfeit || a.result.is_some() || b.result.is_some() {
                Status::Completed
            } else if a.score.is_some() || b.score.is_some() {
                Status::Running
            } else {
                Status::Ready
            }
        }
    }
}

/// Status of a match game. Unlike a match, a BYE-shaped hole means the game
/// still waits on its parent slot.
pub(crate) fn derive_game_status(g: &MatchGame) -> Status {
    match (&g.opponent1, &g.opponent2) {
        (Slot::Entry(a), Slot::Entry(b)) => {
            if a.forfeit || b.forfeit || a.result.is_some() || b.result.is_some() {
                Status::Completed
            } else if a.score.is_some() || b.score.is_some() {
                Status::Running
            } else {
                Status::Ready
            }
        }
        _ => Status::Locked,
    }
}

/// Merge a partial side update into a slot. The slot must hold a participant
/// and, when the update names one, the ids must agree.
pub(crate) fn merge_side(slot: &mut Slot, update: &SideUpdate) -> CoreResult<()> {
    let entry = slot.entry_mut().ok_or_else(|| {
        CoreError::InvalidOpponent("the slot holds no participant yet".into())
    })?;
    if let Some(id) = update.participant_id
        && id != entry.participant_id
    {
        return Err(CoreError::InvalidOpponent(format!(
            "participant {id} does not occupy this slot"
        )));
    }
    if let Some(score) = update.score {
        let score = u16::try_from(score).map_err(|_| {
            CoreError::InvalidScore(format!("score {score} is out of range"))
        })?;
        entry.score = Some(score);
    }
    if let Some(result) = update.result {
        entry.result = Some(result);
    }
    if let Some(forfeit) = update.forfeit {
        entry.forfeit = forfeit;
    }
    Ok(())
}

/// Validate the combination of both sides and canonicalize it: implicit
/// losses, mutual draws and forfeit dominance are filled in here.
pub(crate) fn canonicalize_slots(
    opponent1: &mut Slot,
    opponent2: &mut Slot,
    allow_draw: bool,
) -> CoreResult<()> {
    let (Some(a), Some(b)) = (opponent1.entry(), opponent2.entry()) else {
        return Ok(());
    };
    let (mut a, mut b) = (*a, *b);

    if a.result == Some(SideResult::Win) && b.result == Some(SideResult::Win) {
        return Err(CoreError::InvalidResult("both sides claim a win".into()));
    }
    let draws = [a.result, b.result]
        .iter()
        .filter(|r| **r == Some(SideResult::Draw))
        .count();
    if draws == 1 && (a.result.is_some() && b.result.is_some()) {
        return Err(CoreError::InvalidResult("a draw must be mutual".into()));
    }
    if draws > 0 && !allow_draw {
        return Err(CoreError::InvalidResult(
            "draws are not allowed in this match".into(),
        ));
    }

    // forfeit dominates; the other side wins even without a score
    if a.forfeit && !b.forfeit {
        b.result = Some(SideResult::Win);
    } else if b.forfeit && !a.forfeit {
        a.result = Some(SideResult::Win);
    } else if !a.forfeit && !b.forfeit {
        match (a.result, b.result) {
            (Some(SideResult::Win), None) => b.result = Some(SideResult::Loss),
            (None, Some(SideResult::Win)) => a.result = Some(SideResult::Loss),
            (Some(SideResult::Loss), None) => b.result = Some(SideResult::Win),
            (None, Some(SideResult::Loss)) => a.result = Some(SideResult::Win),
            (Some(SideResult::Draw), None) => b.result = Some(SideResult::Draw),
            (None, Some(SideResult::Draw)) => a.result = Some(SideResult::Draw),
            _ => {}
        }
    }

    // a declared winner must not trail on points
    if !a.forfeit && !b.forfeit
        && let (Some(sa), Some(sb)) = (a.score, b.score)
    {
        if a.result == Some(SideResult::Win) && sa < sb {
            return Err(CoreError::InvalidResult(
                "score contradicts the declared winner".into(),
            ));
        }
        if b.result == Some(SideResult::Win) && sb < sa {
            return Err(CoreError::InvalidResult(
                "score contradicts the declared winner".into(),
            ));
        }
    }

    *opponent1 = Slot::Entry(a);
    *opponent2 = Slot::Entry(b);
    Ok(())
}

/// Put a propagated participant (or BYE) into a slot. Keeps recorded data
/// when the participant is already there; returns whether anything changed.
fn set_slot(slot: &mut Slot, participant: Option<Id>) -> bool {
    match participant {
        Some(id) if slot.participant_id() == Some(id) => false,
        Some(id) => {
            *slot = Slot::Entry(SideEntry::new(id));
            true
        }
        None => {
            if slot.is_bye() {
                false
            } else {
                *slot = Slot::Bye;
                true
            }
        }
    }
}

/// Mirror a parent's slots into its child games and recompute their
/// statuses. Recorded game data survives as long as the participant stays.
pub(crate) fn sync_games(graph: &mut StageGraph, parent_idx: usize, touched: &mut Touched) {
    let parent = graph.matches[parent_idx].clone();
    for gi in graph.game_indexes_of(parent.id) {
        let game = &mut graph.games[gi];
        let mut changed = false;
        for side in [Side::One, Side::Two] {
            let mirrored = parent.slot(side).participant_id();
            changed |= set_slot(game.slot_mut(side), mirrored);
        }
        let status = if parent.status >= Status::Completed {
            // the series is decided: played games stay, the rest is dead
            if game.status == Status::Completed {
                Status::Completed
            } else {
                Status::Archived
            }
        } else {
            // also revives archived games when the parent reopens
            derive_game_status(game)
        };
        if status != game.status {
            game.status = status;
            changed = true;
        }
        if changed {
            touched.games.insert(gi);
        }
    }
}

/// Write the outcome of a completed match into its successors. Returns the
/// successors that became completed themselves (BYE cascade).
fn apply_outputs(
    graph: &mut StageGraph,
    idx: usize,
    touched: &mut Touched,
) -> CoreResult<Vec<usize>> {
    let winner = graph.matches[idx].winner_id();
    let loser = graph.matches[idx].loser_id();
    let location = graph.location(idx);

    // double grand final: when the winner-bracket finalist also takes the
    // first grand final, the rematch is kept as an archived sentinel
    if graph.stage.stage_type == StageType::DoubleElimination
        && graph.stage.settings.grand_final == GrandFinal::Double
        && location == MatchLocation::new(3, 1, 1)
    {
        let wb_side = graph.matches[idx].opponent1.participant_id();
        if winner.is_some() && winner == wb_side {
            if let Some(gf2) = graph.index_at(&MatchLocation::new(3, 2, 1)) {
                let m = &mut graph.matches[gf2];
                if m.status != Status::Archived {
                    m.opponent1 = Slot::Bye;
                    m.opponent2 = Slot::Bye;
                    m.status = Status::Archived;
                    touched.matches.insert(gf2);
                    sync_games(graph, gf2, touched);
                }
            }
            return Ok(Vec::new());
        }
    }

    let mut completed = Vec::new();
    for (succ, side, role) in graph.successor_indexes(idx)? {
        let participant = match role {
            SuccessorRole::Winner => winner,
            SuccessorRole::Loser => loser,
        };
        let before = graph.matches[succ].status;
        let changed = set_slot(graph.matches[succ].slot_mut(side), participant);
        if changed {
            touched.matches.insert(succ);
        }
        if before < Status::Completed {
            let derived = derive_status(&graph.matches[succ]);
            if derived != before {
                graph.matches[succ].status = derived;
                touched.matches.insert(succ);
            }
            if derived == Status::Completed {
                completed.push(succ);
            }
        }
        sync_games(graph, succ, touched);
    }
    Ok(completed)
}

/// Propagate a completion downstream. The cascade is bounded by the stage's
/// round count; a worklist keeps it iterative.
pub(crate) fn wire_completion(
    graph: &mut StageGraph,
    start: usize,
    touched: &mut Touched,
) -> CoreResult<()> {
    let mut queue = VecDeque::from([start]);
    while let Some(idx) = queue.pop_front() {
        debug!(match_id = graph.matches[idx].id, "propagating completion");
        for next in apply_outputs(graph, idx, touched)? {
            queue.push_back(next);
        }
    }
    Ok(())
}

/// Undo a completion: restore placeholders in every successor slot this
/// match fed. Completions that were merely derived from a BYE are unwound
/// recursively; a successor with recorded play refuses the reset.
pub(crate) fn unwire_completion(
    graph: &mut StageGraph,
    idx: usize,
    touched: &mut Touched,
) -> CoreResult<()> {
    let source_number = graph.matches[idx].number;
    for (succ, side, _) in graph.successor_indexes(idx)? {
        let (status, bye_decided, recorded_play) = {
            let s = &graph.matches[succ];
            (s.status, s.is_bye_decided(), s.has_recorded_play())
        };
        if status >= Status::Completed {
            if bye_decided {
                unwire_completion(graph, succ, touched)?;
            } else {
                return Err(CoreError::CannotResetDownstreamCompleted);
            }
        } else if recorded_play {
            return Err(CoreError::CannotResetDownstreamCompleted);
        }
        let m = &mut graph.matches[succ];
        *m.slot_mut(side) = Slot::Position(source_number);
        m.status = derive_status(m);
        touched.matches.insert(succ);
        sync_games(graph, succ, touched);
    }
    Ok(())
}

/// Apply a partial update to a match and run the resulting propagation.
/// Everything happens in memory; persisting the [`Touched`] diff is the
/// caller's job, so validation failures leave storage untouched.
pub(crate) fn apply_match_update(
    graph: &mut StageGraph,
    idx: usize,
    update: &MatchUpdate,
    touched: &mut Touched,
) -> CoreResult<()> {
    let stored = graph.matches[idx].clone();
    if stored.status == Status::Archived {
        return Err(CoreError::InvalidTransition(
            "the match is archived".into(),
        ));
    }
    if stored.child_count > 0 && update_touches_play(update) {
        return Err(CoreError::UseMatchGameUpdate);
    }
    if stored.status < Status::Ready {
        return Err(CoreError::InvalidTransition(
            "the match does not have both opponents yet".into(),
        ));
    }

    let mut updated = stored.clone();
    if let Some(side) = &update.opponent1 {
        merge_side(&mut updated.opponent1, side)?;
    }
    if let Some(side) = &update.opponent2 {
        merge_side(&mut updated.opponent2, side)?;
    }
    let allow_draw = graph.stage.stage_type == StageType::RoundRobin && stored.child_count == 0;
    canonicalize_slots(&mut updated.opponent1, &mut updated.opponent2, allow_draw)?;
    updated.status = derive_status(&updated);

    let old_completed = stored.status == Status::Completed;
    let new_completed = updated.status == Status::Completed;
    let winner_changed = stored.winner_id() != updated.winner_id();

    if old_completed && (!new_completed || winner_changed) {
        unwire_completion(graph, idx, touched)?;
    }

    if updated != stored {
        graph.matches[idx] = updated;
        touched.matches.insert(idx);
    }
    sync_games(graph, idx, touched);

    if new_completed && (!old_completed || winner_changed) {
        wire_completion(graph, idx, touched)?;
    }
    Ok(())
}

/// True when an update carries anything beyond a forfeit declaration.
/// Best-of parents accept forfeits directly but route scores and results
/// through their games.
fn update_touches_play(update: &MatchUpdate) -> bool {
    [&update.opponent1, &update.opponent2]
        .into_iter()
        .flatten()
        .any(|side| side.score.is_some() || side.result.is_some())
}

/// Full forward recomputation over a freshly (re)seeded stage: derive every
/// status and run the BYE auto-advance cascade. Only valid while no play has
/// been recorded; the loop relies on the graph's topological order.
pub(crate) fn recompute_all(graph: &mut StageGraph, touched: &mut Touched) -> CoreResult<()> {
    for idx in 0..graph.matches.len() {
        if graph.matches[idx].status == Status::Archived {
            continue;
        }
        let derived = derive_status(&graph.matches[idx]);
        if derived != graph.matches[idx].status {
            graph.matches[idx].status = derived;
            touched.matches.insert(idx);
        }
        sync_games(graph, idx, touched);
        if derived == Status::Completed {
            apply_outputs(graph, idx, touched)?;
        }
    }
    Ok(())
}
