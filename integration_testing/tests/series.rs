use bracket_core::{
    CoreError, Manager, MatchUpdate, SideUpdate, StageCreateOptions, StageData, StageSettings,
    StageType, Status,
};
use integration_testing::port_fakes::*;

async fn best_of_three_stage(manager: &Manager) -> StageData {
    let tournament = manager.create().tournament("cup", &[]).await.unwrap();
    let stage = manager
        .create()
        .stage(StageCreateOptions {
            tournament_id: tournament.id,
            name: "main".into(),
            stage_type: StageType::SingleElimination,
            seeding: seed_names(&["A", "B", "C", "D"]),
            settings: StageSettings {
                matches_child_count: 3,
                ..Default::default()
            },
        })
        .await
        .unwrap();
    manager.get().stage_data(stage.id).await.unwrap()
}

fn game_win_side_one() -> MatchUpdate {
    MatchUpdate {
        opponent1: Some(SideUpdate::win()),
        opponent2: None,
    }
}

/// 1) two game wins take a Bo3; the dead game is archived
#[tokio::test]
async fn given_bo3_when_one_side_wins_twice_then_parent_completes_and_game_three_dies() {
    let (manager, _storage) = make_manager();
    let data = best_of_three_stage(&manager).await;
    let parent = &data.matches[0];
    let games = manager.get().match_games(parent.id).await.unwrap();
    assert_eq!(games.len(), 3);
    assert_eq!(games[0].status, Status::Ready);

    manager
        .update()
        .match_game(games[0].id, game_win_side_one())
        .await
        .unwrap();
    let mid = manager.get().stage_data(data.stage.id).await.unwrap();
    assert_eq!(mid.matches[0].status, Status::Running);
    assert_eq!(mid.matches[0].opponent1.entry().unwrap().score, Some(1));
    assert_eq!(mid.matches[0].opponent2.entry().unwrap().score, Some(0));

    manager
        .update()
        .match_game(games[1].id, game_win_side_one())
        .await
        .unwrap();
    let after = manager.get().stage_data(data.stage.id).await.unwrap();
    let parent = &after.matches[0];
    assert_eq!(parent.status, Status::Completed);
    assert_eq!(parent.opponent1.entry().unwrap().score, Some(2));
    assert_eq!(parent.winner_id(), parent.opponent1.participant_id());

    let games = manager.get().match_games(parent.id).await.unwrap();
    assert_eq!(games[2].status, Status::Archived);
    // the winner moved up
    assert_eq!(
        after.matches[2].opponent1.participant_id(),
        parent.opponent1.participant_id()
    );
}

/// 2) the parent's scores are projections: direct score updates are rejected
#[tokio::test]
async fn given_bo3_parent_when_scored_directly_then_rejected() {
    let (manager, _storage) = make_manager();
    let data = best_of_three_stage(&manager).await;

    let err = manager
        .update()
        .match_(
            data.matches[0].id,
            MatchUpdate {
                opponent1: Some(SideUpdate::score(2)),
                opponent2: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::UseMatchGameUpdate));
}

/// 3) an archived game refuses updates
#[tokio::test]
async fn given_archived_game_when_updated_then_rejected() {
    let (manager, _storage) = make_manager();
    let data = best_of_three_stage(&manager).await;
    let games = manager.get().match_games(data.matches[0].id).await.unwrap();

    manager
        .update()
        .match_game(games[0].id, game_win_side_one())
        .await
        .unwrap();
    manager
        .update()
        .match_game(games[1].id, game_win_side_one())
        .await
        .unwrap();

    let err = manager
        .update()
        .match_game(games[2].id, game_win_side_one())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));
}

/// 4) resetting a decided game reopens the series and revives the dead game
#[tokio::test]
async fn given_decided_series_when_game_reset_then_series_reopens() {
    let (manager, _storage) = make_manager();
    let data = best_of_three_stage(&manager).await;
    let games = manager.get().match_games(data.matches[0].id).await.unwrap();

    manager
        .update()
        .match_game(games[0].id, game_win_side_one())
        .await
        .unwrap();
    manager
        .update()
        .match_game(games[1].id, game_win_side_one())
        .await
        .unwrap();

    manager
        .reset()
        .match_game_results(games[1].id)
        .await
        .unwrap();
    let after = manager.get().stage_data(data.stage.id).await.unwrap();
    let parent = &after.matches[0];
    assert_eq!(parent.status, Status::Running);
    assert_eq!(parent.opponent1.entry().unwrap().score, Some(1));
    assert!(parent.opponent1.entry().unwrap().result.is_none());

    let games = manager.get().match_games(parent.id).await.unwrap();
    assert_eq!(games[1].status, Status::Ready);
    assert_eq!(games[2].status, Status::Ready);
    // the successor slot is a placeholder again
    assert!(after.matches[2].opponent1.is_position());
}

/// 5) forfeiting the series completes the parent and kills pending games
#[tokio::test]
async fn given_series_forfeit_then_parent_completes_and_games_archive() {
    let (manager, _storage) = make_manager();
    let data = best_of_three_stage(&manager).await;

    let updated = manager
        .update()
        .match_(
            data.matches[0].id,
            MatchUpdate {
                opponent1: Some(SideUpdate::forfeit()),
                opponent2: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, Status::Completed);
    assert_eq!(updated.winner_id(), updated.opponent2.participant_id());

    let games = manager.get().match_games(data.matches[0].id).await.unwrap();
    assert!(games.iter().all(|g| g.status == Status::Archived));

    // the forfeit decides the series, its games are closed
    let err = manager
        .update()
        .match_game(games[0].id, game_win_side_one())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));
}

/// 6) series sizing rules
#[tokio::test]
async fn given_child_count_changes_then_validated_and_rebuilt() {
    let (manager, _storage) = make_manager();
    let data = best_of_three_stage(&manager).await;
    let match_id = data.matches[0].id;

    // an even series could end drawn
    let err = manager
        .update()
        .match_child_count(match_id, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));

    manager.update().match_child_count(match_id, 5).await.unwrap();
    let games = manager.get().match_games(match_id).await.unwrap();
    assert_eq!(games.len(), 5);

    // once the series runs, resizing is refused
    manager
        .update()
        .match_game(games[0].id, game_win_side_one())
        .await
        .unwrap();
    let err = manager
        .update()
        .match_child_count(match_id, 3)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));

    // dropping to zero turns the match back into a plain match
    let plain = data.matches[1].id;
    manager.update().match_child_count(plain, 0).await.unwrap();
    let err = manager.get().match_games(plain).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
}

/// 7) games of an undecided upstream match wait on their parent slots
#[tokio::test]
async fn given_unresolved_parent_then_its_games_are_locked() {
    let (manager, _storage) = make_manager();
    let data = best_of_three_stage(&manager).await;
    let final_games = manager.get().match_games(data.matches[2].id).await.unwrap();
    assert!(final_games.iter().all(|g| g.status == Status::Locked));

    let err = manager
        .update()
        .match_game(final_games[0].id, game_win_side_one())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOpponent(_)));
}
