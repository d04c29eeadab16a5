use bracket_core::{
    CoreError, Manager, MatchUpdate, SideUpdate, StageCreateOptions, StageData, StageSettings,
    StageType, Status,
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

fn win_side_one() -> MatchUpdate {
    MatchUpdate {
        opponent1: Some(SideUpdate::win()),
        opponent2: None,
    }
}

/// 1) a backend failure surfaces unchanged as a storage error
#[tokio::test]
async fn given_select_failure_when_updating_then_storage_error_propagates() {
    let (manager, storage) = make_failing_manager();
    let data = four_team_stage(&manager).await;

    storage.fail_select_match_once();
    let err = manager
        .update()
        .match_(data.matches[0].id, win_side_one())
        .await
        .unwrap_err();
    match err {
        CoreError::Storage(db) => assert!(db.to_string().contains("injected")),
        other => panic!("unexpected error variant: {other:?}"),
    }
}

/// 2) a mid-propagation write failure leaves a state the same call converges
/// from: the retry completes the update
#[tokio::test]
async fn given_write_failure_when_update_retried_then_state_converges() {
    let (manager, storage) = make_failing_manager();
    let data = four_team_stage(&manager).await;

    storage.fail_update_match_once();
    let err = manager
        .update()
        .match_(data.matches[0].id, win_side_one())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));

    // the entry match was written last, so it still reads as unplayed
    let mid = manager.get().stage_data(data.stage.id).await.unwrap();
    assert_eq!(mid.matches[0].status, Status::Ready);

    // retrying the identical update converges
    manager
        .update()
        .match_(data.matches[0].id, win_side_one())
        .await
        .unwrap();
    let after = manager.get().stage_data(data.stage.id).await.unwrap();
    assert_eq!(after.matches[0].status, Status::Completed);
    assert_eq!(
        after.matches[2].opponent1.participant_id(),
        after.matches[0].opponent1.participant_id()
    );
}

/// 3) creation fails cleanly when the match insert fails
#[tokio::test]
async fn given_insert_failure_when_creating_stage_then_error_propagates() {
    let (manager, storage) = make_failing_manager();
    let tournament = manager.create().tournament("cup", &[]).await.unwrap();

    storage.fail_insert_matches_once();
    let err = manager
        .create()
        .stage(StageCreateOptions {
            tournament_id: tournament.id,
            name: "main".into(),
            stage_type: StageType::SingleElimination,
            seeding: seed_names(&["A", "B", "C", "D"]),
            settings: StageSettings::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));
}

/// 4) validation failures abort before any write
#[tokio::test]
async fn given_validation_failure_then_no_write_happens() {
    let (manager, _storage) = make_manager();
    let data = four_team_stage(&manager).await;
    let before = serde_json::to_string(&manager.get().stage_data(data.stage.id).await.unwrap())
        .unwrap();

    let err = manager
        .update()
        .match_(
            data.matches[0].id,
            MatchUpdate::sides(SideUpdate::win(), SideUpdate::win()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidResult(_)));

    let after = serde_json::to_string(&manager.get().stage_data(data.stage.id).await.unwrap())
        .unwrap();
    assert_eq!(before, after);
}
