// creation operations

use crate::graph::StageGraph;
use crate::layout::{self, PlanSlot};
use crate::progression::{self, Touched};
use crate::{
    CoreError, CoreResult, Group, Id, Match, MatchGame, Participant, SideEntry, Slot, Stage,
    StageFilter, StageSettings, StageType, Status, StoragePort, Tournament,
};

/// Seed list of a stage at creation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Seeding {
    /// participant names; unknown names are registered at the tournament,
    /// `None` entries are BYEs
    Names(Vec<Option<String>>),
    /// existing participant ids, `None` entries are BYEs
    Ids(Vec<Option<Id>>),
    /// no participants yet: every slot stays a position placeholder until
    /// `update.seeding` / `update.confirm_seeding`
    Pending { size: u32 },
}

/// Options of `create.stage`.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCreateOptions {
    pub tournament_id: Id,
    pub name: String,
    pub stage_type: StageType,
    pub seeding: Seeding,
    pub settings: StageSettings,
}

/// Creation namespace.
pub struct Create<'a> {
    storage: &'a dyn StoragePort,
}

impl<'a> Create<'a> {
    pub(crate) fn new(storage: &'a dyn StoragePort) -> Self {
        Create { storage }
    }

    /// Create a tournament and register its initial participants.
    pub async fn tournament(&self, name: &str, participant_names: &[&str]) -> CoreResult<Tournament> {
        let id = self
            .storage
            .insert_tournament(Tournament {
                id: 0,
                name: name.to_string(),
            })
            .await?;
        if !participant_names.is_empty() {
            let participants = participant_names
                .iter()
                .map(|n| Participant {
                    id: 0,
                    tournament_id: id,
                    name: n.to_string(),
                })
                .collect();
            self.storage.insert_participants(participants).await?;
        }
        Ok(Tournament {
            id,
            name: name.to_string(),
        })
    }

    /// Create a stage: validate the settings, generate the full match graph
    /// from the seeded list, insert it, and run the BYE auto-advance pass.
    pub async fn stage(&self, options: StageCreateOptions) -> CoreResult<Stage> {
        options.settings.validate(options.stage_type)?;
        self.storage
            .select_tournament(options.tournament_id)
            .await?
            .ok_or_else(|| CoreError::not_found("tournament", options.tournament_id))?;

        let (seed_ids, seed_count) =
            super::resolve_seeding(self.storage, options.tournament_id, &options.seeding).await?;

        let mut settings = options.settings.clone();
        settings.size = Some(layout::resolve_size(
            options.stage_type,
            &settings,
            seed_count,
        )?);
        settings.seed_ordering = Some(settings.ordering_or_default(options.stage_type));
        settings.seed_count = Some(seed_count);

        let plan = layout::plan_stage(options.stage_type, &settings, seed_count)?;

        let number = self
            .storage
            .select_stages(&StageFilter::tournament(options.tournament_id))
            .await?
            .len() as u32
            + 1;

        let stage_id = self
            .storage
            .insert_stage(Stage {
                id: 0,
                tournament_id: options.tournament_id,
                name: options.name.clone(),
                stage_type: options.stage_type,
                number,
                settings: settings.clone(),
            })
            .await?;

        let groups: Vec<Group> = plan
            .groups
            .iter()
            .map(|g| Group {
                id: 0,
                stage_id,
                number: g.number,
            })
            .collect();
        let group_ids = self.storage.insert_groups(groups).await?;

        let mut rounds = Vec::new();
        for (group, group_id) in plan.groups.iter().zip(&group_ids) {
            for round in &group.rounds {
                rounds.push(crate::Round {
                    id: 0,
                    stage_id,
                    group_id: *group_id,
                    number: round.number,
                });
            }
        }
        let round_ids = self.storage.insert_rounds(rounds).await?;

        let mut matches = Vec::new();
        let mut round_cursor = 0;
        for (group, group_id) in plan.groups.iter().zip(&group_ids) {
            for round in &group.rounds {
                let round_id = round_ids[round_cursor];
                round_cursor += 1;
                for m in &round.matches {
                    let opponent1 = resolve_plan_slot(m.slots[0], seed_ids.as_deref());
                    let opponent2 = resolve_plan_slot(m.slots[1], seed_ids.as_deref());
                    let mut match_ = Match {
                        id: 0,
                        stage_id,
                        group_id: *group_id,
                        round_id,
                        number: m.number,
                        status: Status::Locked,
                        child_count: settings.matches_child_count,
                        opponent1,
                        opponent2,
                    };
                    match_.status = progression::derive_status(&match_);
                    matches.push(match_);
                }
            }
        }
        let match_ids = self.storage.insert_matches(matches.clone()).await?;

        if settings.matches_child_count > 0 {
            let mut games = Vec::new();
            for (match_, match_id) in matches.iter().zip(&match_ids) {
                for number in 1..=settings.matches_child_count as u32 {
                    games.push(MatchGame {
                        id: 0,
                        stage_id,
                        parent_id: *match_id,
                        number,
                        status: Status::Locked,
                        opponent1: mirror_slot(&match_.opponent1),
                        opponent2: mirror_slot(&match_.opponent2),
                    });
                }
            }
            self.storage.insert_match_games(games).await?;
        }

        // the auto-advance pass completes BYE matches and wires successors
        let mut graph = StageGraph::load(self.storage, stage_id).await?;
        let mut touched = Touched::default();
        progression::recompute_all(&mut graph, &mut touched)?;
        super::persist_touched(self.storage, &graph, &touched, None, None).await?;

        Ok(graph.stage)
    }
}

fn resolve_plan_slot(slot: PlanSlot, seed_ids: Option<&[Option<Id>]>) -> Slot {
    match slot {
        PlanSlot::Feed(source) => Slot::Position(source),
        PlanSlot::Seed(position) => match seed_ids {
            None => Slot::Position(position),
            Some(seeds) => match seeds.get(position as usize - 1) {
                Some(Some(id)) => Slot::Entry(SideEntry::new(*id)),
                // explicit null entry or padding beyond the seed list
                _ => Slot::Bye,
            },
        },
    }
}

/// Child games start with their parent's participants and no recorded data.
fn mirror_slot(parent: &Slot) -> Slot {
    match parent.participant_id() {
        Some(id) => Slot::Entry(SideEntry::new(id)),
        None => Slot::Bye,
    }
}
