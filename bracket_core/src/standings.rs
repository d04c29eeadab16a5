// final standings per stage type

use crate::graph::StageGraph;
use crate::navigation::MatchLocation;
use crate::{
    CoreError, CoreResult, GrandFinal, Id, Match, Participant, SideResult, Slot, StageType, Status,
};
use std::collections::HashMap;

/// One row of a stage's final standings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StandingItem {
    pub participant_id: Id,
    pub name: String,
    /// 1-based rank; elimination stages share ranks within an elimination
    /// round, round-robin ranks are unique
    pub rank: u32,
}

pub type Standings = Vec<StandingItem>;

pub(crate) fn final_standings(
    graph: &StageGraph,
    participants: &[Participant],
    seed_positions: &HashMap<Id, u32>,
) -> CoreResult<Standings> {
    let names: HashMap<Id, &str> = participants
        .iter()
        .map(|p| (p.id, p.name.as_str()))
        .collect();
    match graph.stage.stage_type {
        StageType::SingleElimination => single_elimination(graph, &names),
        StageType::DoubleElimination => double_elimination(graph, &names),
        StageType::RoundRobin => round_robin(graph, &names, seed_positions),
    }
}

fn item(names: &HashMap<Id, &str>, participant_id: Id, rank: u32) -> StandingItem {
    StandingItem {
        participant_id,
        name: names
            .get(&participant_id)
            .map(|n| n.to_string())
            .unwrap_or_default(),
        rank,
    }
}

fn matches_of_group(graph: &StageGraph, group_number: u32) -> Vec<(u32, &Match)> {
    (0..graph.matches.len())
        .filter(|&i| graph.location(i).group_number == group_number)
        .map(|i| (graph.location(i).round_number, &graph.matches[i]))
        .collect()
}

fn require_decided(m: &Match, what: &str) -> CoreResult<Id> {
    if m.status < Status::Completed {
        return Err(CoreError::InvalidTransition(format!(
            "{what} is not played yet"
        )));
    }
    m.winner_id()
        .ok_or_else(|| CoreError::InvalidTransition(format!("{what} has no winner")))
}

fn single_elimination(graph: &StageGraph, names: &HashMap<Id, &str>) -> CoreResult<Standings> {
    let bracket = matches_of_group(graph, 1);
    let last_round = bracket.iter().map(|(r, _)| *r).max().unwrap_or(0);
    let size = 2u32.pow(last_round);
    let final_match = bracket
        .iter()
        .find(|(r, _)| *r == last_round)
        .map(|(_, m)| *m)
        .ok_or_else(|| CoreError::not_found("final match of stage", graph.stage.id))?;
    let champion = require_decided(final_match, "the final")?;

    let mut items = vec![item(names, champion, 1)];
    if let Some(runner_up) = final_match.loser_id() {
        items.push(item(names, runner_up, 2));
    }

    let consolation = matches_of_group(graph, 2);
    for round in (1..last_round).rev() {
        // everyone eliminated in this round shares a rank
        let rank = size / 2u32.pow(round) + 1;
        let skip_semifinals = round == last_round - 1 && !consolation.is_empty();
        if skip_semifinals {
            // the consolation final splits 3rd and 4th place
            let (_, third_place) = consolation[0];
            let winner = require_decided(third_place, "the consolation final")?;
            items.push(item(names, winner, 3));
            if let Some(fourth) = third_place.loser_id() {
                items.push(item(names, fourth, 4));
            }
            continue;
        }
        for (_, m) in bracket.iter().filter(|(r, _)| *r == round) {
            if let Some(loser) = m.loser_id() {
                items.push(item(names, loser, rank));
            }
        }
    }
    Ok(items)
}

fn double_elimination(graph: &StageGraph, names: &HashMap<Id, &str>) -> CoreResult<Standings> {
    let winner_bracket = matches_of_group(graph, 1);
    let loser_bracket = matches_of_group(graph, 2);
    let grand_final = matches_of_group(graph, 3);

    let wb_last = winner_bracket.iter().map(|(r, _)| *r).max().unwrap_or(0);
    let lb_last = loser_bracket.iter().map(|(r, _)| *r).max().unwrap_or(0);

    // champion and runner-up depend on the grand final variant
    let (champion, runner_up) = match graph.stage.settings.grand_final {
        GrandFinal::None => {
            let final_match = find_match(&winner_bracket, wb_last)?;
            let champion = require_decided(final_match, "the winner bracket final")?;
            let lb_final = find_match(&loser_bracket, lb_last)?;
            let second = require_decided(lb_final, "the loser bracket final")?;
            (champion, Some(second))
        }
        GrandFinal::Simple => {
            let gf = find_match(&grand_final, 1)?;
            let champion = require_decided(gf, "the grand final")?;
            (champion, gf.loser_id())
        }
        GrandFinal::Double => {
            let gf1 = find_match(&grand_final, 1)?;
            let gf2 = find_match(&grand_final, 2)?;
            if gf2.status == Status::Archived && gf2.opponent1.is_bye() {
                // sentinel: the winner bracket finalist took the first match
                let champion = require_decided(gf1, "the grand final")?;
                (champion, gf1.loser_id())
            } else {
                let champion = require_decided(gf2, "the grand final rematch")?;
                (champion, gf2.loser_id())
            }
        }
    };

    let mut items = vec![item(names, champion, 1)];
    if let Some(second) = runner_up {
        items.push(item(names, second, 2));
    }

    // everyone else fell out of the loser bracket: rank by its round,
    // breaking ties by how deep they got in the winner bracket
    let wb_origin: HashMap<Id, u32> = winner_bracket
        .iter()
        .filter_map(|(round, m)| m.loser_id().map(|id| (id, *round)))
        .collect();

    let mut eliminated: Vec<(u32, u32, Id)> = loser_bracket
        .iter()
        .filter_map(|(round, m)| {
            m.loser_id()
                .map(|id| (*round, wb_origin.get(&id).copied().unwrap_or(0), id))
        })
        .collect();
    eliminated.sort_by(|a, b| b.cmp(a));

    let mut rank = items.len() as u32 + 1;
    let mut previous: Option<(u32, u32)> = None;
    for (lb_round, origin, id) in eliminated {
        if previous != Some((lb_round, origin)) {
            rank = items.len() as u32 + 1;
            previous = Some((lb_round, origin));
        }
        items.push(item(names, id, rank));
    }
    Ok(items)
}

fn find_match<'a>(rounds: &[(u32, &'a Match)], round: u32) -> CoreResult<&'a Match> {
    rounds
        .iter()
        .find(|(r, _)| *r == round)
        .map(|(_, m)| *m)
        .ok_or_else(|| CoreError::NotFound("bracket round".into()))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Record {
    wins: u32,
    draws: u32,
    losses: u32,
    score_for: i32,
    score_against: i32,
    group_number: u32,
}

impl Record {
    /// wins desc, draws desc, losses asc
    fn primary_key(&self) -> (u32, u32, i64) {
        (self.wins, self.draws, -(self.losses as i64))
    }

    fn score_diff(&self) -> i32 {
        self.score_for - self.score_against
    }
}

fn round_robin(
    graph: &StageGraph,
    names: &HashMap<Id, &str>,
    seed_positions: &HashMap<Id, u32>,
) -> CoreResult<Standings> {
    let mut records: HashMap<Id, Record> = HashMap::new();
    let group_of_round: HashMap<Id, u32> = graph
        .rounds
        .iter()
        .filter_map(|r| {
            graph
                .groups
                .iter()
                .find(|g| g.id == r.group_id)
                .map(|g| (r.id, g.number))
        })
        .collect();

    // register everyone first so a participant without a completed match
    // still appears in the table
    for m in &graph.matches {
        let group = group_of_round.get(&m.round_id).copied().unwrap_or(0);
        for slot in [&m.opponent1, &m.opponent2] {
            if let Some(id) = slot.participant_id() {
                records.entry(id).or_default().group_number = group;
            }
        }
    }

    for m in graph.matches.iter().filter(|m| m.status == Status::Completed) {
        let (Slot::Entry(a), Slot::Entry(b)) = (&m.opponent1, &m.opponent2) else {
            continue;
        };
        let (sa, sb) = (a.score.unwrap_or(0) as i32, b.score.unwrap_or(0) as i32);
        if let Some(record) = records.get_mut(&a.participant_id) {
            record.score_for += sa;
            record.score_against += sb;
            match a.result {
                Some(SideResult::Win) => record.wins += 1,
                Some(SideResult::Draw) => record.draws += 1,
                _ => record.losses += 1,
            }
        }
        if let Some(record) = records.get_mut(&b.participant_id) {
            record.score_for += sb;
            record.score_against += sa;
            match b.result {
                Some(SideResult::Win) => record.wins += 1,
                Some(SideResult::Draw) => record.draws += 1,
                _ => record.losses += 1,
            }
        }
    }

    let seed_of = |id: Id| seed_positions.get(&id).copied().unwrap_or(u32::MAX);
    let mut rows: Vec<(Id, Record)> = records.into_iter().collect();
    rows.sort_by(|(id_a, a), (id_b, b)| {
        b.primary_key()
            .cmp(&a.primary_key())
            .then(b.score_diff().cmp(&a.score_diff()))
            .then(seed_of(*id_a).cmp(&seed_of(*id_b)))
    });

    // head-to-head pass: a two-way tie on the primary key inside one group
    // is decided by the mutual match when it has a unique winner
    let mut i = 0;
    while i + 1 < rows.len() {
        let (id_a, a) = rows[i];
        let (id_b, b) = rows[i + 1];
        let two_way_tie = a.primary_key() == b.primary_key()
            && a.group_number == b.group_number
            && (i == 0 || rows[i - 1].1.primary_key() != a.primary_key())
            && (i + 2 >= rows.len() || rows[i + 2].1.primary_key() != b.primary_key());
        if two_way_tie && let Some(winner) = head_to_head_winner(graph, id_a, id_b) {
            if winner == id_b {
                rows.swap(i, i + 1);
            }
            i += 2;
            continue;
        }
        i += 1;
    }

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, (id, _))| item(names, id, i as u32 + 1))
        .collect())
}

/// Winner of the mutual completed matches of two participants, if unique.
fn head_to_head_winner(graph: &StageGraph, a: Id, b: Id) -> Option<Id> {
    let mut winner: Option<Id> = None;
    for m in &graph.matches {
        if m.status != Status::Completed {
            continue;
        }
        let ids = [m.opponent1.participant_id(), m.opponent2.participant_id()];
        if !(ids.contains(&Some(a)) && ids.contains(&Some(b))) {
            continue;
        }
        match (m.winner_id(), winner) {
            (Some(w), None) => winner = Some(w),
            (Some(w), Some(prev)) if w != prev => return None,
            (None, _) => return None,
            _ => {}
        }
    }
    winner
}
