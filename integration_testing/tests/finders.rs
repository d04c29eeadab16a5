use bracket_core::{
    CoreError, Id, Manager, MatchUpdate, SideUpdate, StageCreateOptions, StageData, StageSettings,
    StageType,
};
use integration_testing::port_fakes::*;

async fn four_team_stage(manager: &Manager) -> StageData {
    let tournament = manager.create().tournament("cup", &[]).await.unwrap();
    let stage = manager
        .create()
        .stage(StageCreateOptions {
            tournament_id: tournament.id,
            name: "main".into(),
            stage_type: StageType::SingleElimination,
            seeding: seed_names(&["A", "B", "C", "D"]),
            settings: StageSettings::default(),
        })
        .await
        .unwrap();
    manager.get().stage_data(stage.id).await.unwrap()
}

fn id_of(data: &StageData, name: &str) -> Id {
    data.participants
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.id)
        .unwrap()
}

#[tokio::test]
async fn given_location_when_find_match_then_the_stored_match_returns() {
    let (manager, _storage) = make_manager();
    let data = four_team_stage(&manager).await;

    let found = manager
        .find()
        .match_(data.stage.id, 1, 2, 1)
        .await
        .unwrap();
    assert_eq!(found.id, data.matches[2].id);

    let err = manager
        .find()
        .match_(data.stage.id, 1, 3, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn given_match_id_when_locating_then_coordinates_return() {
    let (manager, _storage) = make_manager();
    let data = four_team_stage(&manager).await;

    let location = manager
        .find()
        .match_location(data.matches[1].id)
        .await
        .unwrap();
    assert_eq!(location.group_number, 1);
    assert_eq!(location.round_number, 1);
    assert_eq!(location.match_number, 2);
}

#[tokio::test]
async fn given_undecided_match_then_next_matches_lists_all_destinations() {
    let (manager, _storage) = make_manager();
    let data = four_team_stage(&manager).await;

    let next = manager
        .find()
        .next_matches(data.matches[0].id, None)
        .await
        .unwrap();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].id, data.matches[2].id);

    // the final feeds nothing
    let next = manager
        .find()
        .next_matches(data.matches[2].id, None)
        .await
        .unwrap();
    assert!(next.is_empty());
}

#[tokio::test]
async fn given_decided_match_then_next_matches_follows_the_participant() {
    let (manager, _storage) = make_manager();
    let data = four_team_stage(&manager).await;
    let (a, d) = (id_of(&data, "A"), id_of(&data, "D"));

    manager
        .update()
        .match_(
            data.matches[0].id,
            MatchUpdate {
                opponent1: Some(SideUpdate::win()),
                opponent2: None,
            },
        )
        .await
        .unwrap();

    let next = manager
        .find()
        .next_matches(data.matches[0].id, Some(a))
        .await
        .unwrap();
    assert_eq!(next.len(), 1);

    // the eliminated participant reaches nothing in single elimination
    let next = manager
        .find()
        .next_matches(data.matches[0].id, Some(d))
        .await
        .unwrap();
    assert!(next.is_empty());

    // a stranger to the match is rejected
    let err = manager
        .find()
        .next_matches(data.matches[0].id, Some(id_of(&data, "B")))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOpponent(_)));
}

#[tokio::test]
async fn given_final_when_previous_matches_then_the_feeders_return() {
    let (manager, _storage) = make_manager();
    let data = four_team_stage(&manager).await;
    let a = id_of(&data, "A");

    let previous = manager
        .find()
        .previous_matches(data.matches[2].id, None)
        .await
        .unwrap();
    assert_eq!(previous.len(), 2);

    manager
        .update()
        .match_(
            data.matches[0].id,
            MatchUpdate {
                opponent1: Some(SideUpdate::win()),
                opponent2: None,
            },
        )
        .await
        .unwrap();

    // A came through the first semifinal only
    let previous = manager
        .find()
        .previous_matches(data.matches[2].id, Some(a))
        .await
        .unwrap();
    assert_eq!(previous.len(), 1);
    assert_eq!(previous[0].id, data.matches[0].id);

    // round one has no predecessors
    let previous = manager
        .find()
        .previous_matches(data.matches[0].id, None)
        .await
        .unwrap();
    assert!(previous.is_empty());
}

#[tokio::test]
async fn given_guarded_delete_when_successor_is_wired_then_refused() {
    let (manager, _storage) = make_manager();
    let data = four_team_stage(&manager).await;

    manager
        .update()
        .match_(
            data.matches[0].id,
            MatchUpdate {
                opponent1: Some(SideUpdate::win()),
                opponent2: None,
            },
        )
        .await
        .unwrap();

    // the final now references the semifinal winner
    let err = manager
        .delete()
        .match_(data.matches[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));

    // an unwired match can go
    manager.delete().match_(data.matches[1].id).await.unwrap();
    let after = manager.get().stage_data(data.stage.id).await.unwrap();
    assert_eq!(after.matches.len(), 2);
}
