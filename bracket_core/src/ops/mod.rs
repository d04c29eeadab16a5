// public operation namespaces over the storage port

mod create;
mod delete;
mod find;
mod get;
mod reset;
mod update;

pub use create::{Create, Seeding, StageCreateOptions};
pub use delete::Delete;
pub use find::Find;
pub use get::{Get, StageData, TournamentData};
pub use reset::Reset;
pub use update::Update;

use crate::graph::StageGraph;
use crate::progression::Touched;
use crate::{CoreError, CoreResult, Id, Participant, ParticipantFilter, StoragePort};
use std::collections::HashMap;

/// Persist an engine pass. Mutations are issued downstream-first so a partial
/// failure leaves a state the same call converges from on retry; the
/// entry-point match (and game) is written last.
pub(crate) async fn persist_touched(
    storage: &dyn StoragePort,
    graph: &StageGraph,
    touched: &Touched,
    entry_match: Option<usize>,
    entry_game: Option<usize>,
) -> CoreResult<()> {
    for &gi in touched.games.iter().rev() {
        if Some(gi) != entry_game {
            storage.update_match_game(&graph.games[gi]).await?;
        }
    }
    for &mi in touched.matches.iter().rev() {
        if Some(mi) != entry_match {
            storage.update_match(&graph.matches[mi]).await?;
        }
    }
    if let Some(mi) = entry_match
        && touched.matches.contains(&mi)
    {
        storage.update_match(&graph.matches[mi]).await?;
    }
    if let Some(gi) = entry_game
        && touched.games.contains(&gi)
    {
        storage.update_match_game(&graph.games[gi]).await?;
    }
    Ok(())
}

/// Resolve a seeding declaration to participant ids. Names are looked up in
/// the tournament and inserted when missing; ids are checked for existence.
/// Returns `None` ids for a pending seeding, plus the seed count.
pub(crate) async fn resolve_seeding(
    storage: &dyn StoragePort,
    tournament_id: Id,
    seeding: &Seeding,
) -> CoreResult<(Option<Vec<Option<Id>>>, u32)> {
    match seeding {
        Seeding::Pending { size } => Ok((None, *size)),
        Seeding::Ids(ids) => {
            let known: Vec<Participant> = storage
                .select_participants(&ParticipantFilter::tournament(tournament_id))
                .await?;
            for id in ids.iter().flatten() {
                if !known.iter().any(|p| p.id == *id) {
                    return Err(CoreError::not_found("participant", *id));
                }
            }
            Ok((Some(ids.clone()), ids.len() as u32))
        }
        Seeding::Names(names) => {
            let mut unique = names.iter().flatten().collect::<Vec<_>>();
            unique.sort();
            unique.dedup();
            if unique.len() != names.iter().flatten().count() {
                return Err(CoreError::InvalidInput(
                    "seeding contains a duplicated participant name".into(),
                ));
            }

            let known = storage
                .select_participants(&ParticipantFilter::tournament(tournament_id))
                .await?;
            let mut by_name: HashMap<String, Id> =
                known.into_iter().map(|p| (p.name, p.id)).collect();

            let missing: Vec<Participant> = names
                .iter()
                .flatten()
                .filter(|name| !by_name.contains_key(*name))
                .map(|name| Participant {
                    id: 0,
                    tournament_id,
                    name: name.clone(),
                })
                .collect();
            if !missing.is_empty() {
                let inserted = storage.insert_participants(missing.clone()).await?;
                for (participant, id) in missing.into_iter().zip(inserted) {
                    by_name.insert(participant.name, id);
                }
            }

            let ids = names
                .iter()
                .map(|entry| entry.as_ref().and_then(|name| by_name.get(name).copied()))
                .collect::<Vec<_>>();
            Ok((Some(ids), names.len() as u32))
        }
    }
}
