use bracket_core::{
    CoreError, Id, Manager, MatchUpdate, Seeding, SideResult, SideUpdate, StageCreateOptions,
    StageData, StageSettings, StageType, Status,
};
use integration_testing::port_fakes::*;

async fn create_round_robin(
    manager: &Manager,
    names: &[&str],
    group_count: u32,
) -> StageData {
    let tournament = manager.create().tournament("league", &[]).await.unwrap();
    let stage = manager
        .create()
        .stage(StageCreateOptions {
            tournament_id: tournament.id,
            name: "groups".into(),
            stage_type: StageType::RoundRobin,
            seeding: seed_names(names),
            settings: StageSettings {
                group_count: Some(group_count),
                ..Default::default()
            },
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

/// Record a result with scores; the winner is derived from them.
fn result(score1: i32, score2: i32) -> MatchUpdate {
    let (r1, r2) = if score1 > score2 {
        (SideResult::Win, SideResult::Loss)
    } else if score1 < score2 {
        (SideResult::Loss, SideResult::Win)
    } else {
        (SideResult::Draw, SideResult::Draw)
    };
    MatchUpdate::sides(
        SideUpdate {
            score: Some(score1),
            result: Some(r1),
            ..Default::default()
        },
        SideUpdate {
            score: Some(score2),
            result: Some(r2),
            ..Default::default()
        },
    )
}

/// 1) 6 participants in 2 groups: 3 matches over 3 rounds per group
#[tokio::test]
async fn given_six_participants_in_two_groups_then_each_group_plays_three_rounds() {
    let (manager, _storage) = make_manager();
    let data = create_round_robin(
        &manager,
        &["P1", "P2", "P3", "P4", "P5", "P6"],
        2,
    )
    .await;

    assert_eq!(data.groups.len(), 2);
    assert_eq!(data.rounds.len(), 6);
    assert_eq!(data.matches.len(), 6);
    for group in &data.groups {
        let matches = data
            .matches
            .iter()
            .filter(|m| m.group_id == group.id)
            .count();
        assert_eq!(matches, 3);
    }
    // every match of a 3-member group is playable or waiting on nobody
    for m in &data.matches {
        assert_eq!(m.status, Status::Ready);
    }
}

/// 2) every pair inside a group meets exactly once (twice in double mode)
#[tokio::test]
async fn given_double_mode_then_every_pair_meets_twice() {
    let (manager, _storage) = make_manager();
    let tournament = manager.create().tournament("league", &[]).await.unwrap();
    let stage = manager
        .create()
        .stage(StageCreateOptions {
            tournament_id: tournament.id,
            name: "groups".into(),
            stage_type: StageType::RoundRobin,
            seeding: seed_names(&["A", "B", "C", "D"]),
            settings: StageSettings {
                group_count: Some(1),
                round_robin_mode: bracket_core::RoundRobinMode::Double,
                ..Default::default()
            },
        })
        .await
        .unwrap();
    let data = manager.get().stage_data(stage.id).await.unwrap();

    assert_eq!(data.matches.len(), 12);
    let mut pair_counts = std::collections::HashMap::new();
    for m in &data.matches {
        let a = m.opponent1.participant_id().unwrap();
        let b = m.opponent2.participant_id().unwrap();
        *pair_counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
    }
    assert_eq!(pair_counts.len(), 6);
    assert!(pair_counts.values().all(|&count| count == 2));
}

/// 3) standings order: wins, then head-to-head inside a two-way tie, then
/// score difference, then seed
#[tokio::test]
async fn given_finished_group_when_standings_then_head_to_head_beats_score_difference() {
    let (manager, _storage) = make_manager();
    let data = create_round_robin(&manager, &["A", "B", "C", "D"], 1).await;

    // circle schedule: (A,D),(B,C) / (A,C),(D,B) / (A,B),(C,D)
    let by_pair = |x: &str, y: &str| {
        let (xi, yi) = (id_of(&data, x), id_of(&data, y));
        data.matches
            .iter()
            .find(|m| {
                let ids = [m.opponent1.participant_id(), m.opponent2.participant_id()];
                ids.contains(&Some(xi)) && ids.contains(&Some(yi))
            })
            .map(|m| {
                let flipped = m.opponent1.participant_id() != Some(xi);
                (m.id, flipped)
            })
            .unwrap()
    };
    // tally: A and B finish 2-1, C and D finish 1-2; B piles up goals but
    // lost the direct match against A
    let script = [
        ("A", "B", 1, 0),
        ("A", "C", 1, 0),
        ("A", "D", 0, 1),
        ("B", "C", 5, 0),
        ("B", "D", 5, 0),
        ("C", "D", 1, 0),
    ];
    for (x, y, sx, sy) in script {
        let (match_id, flipped) = by_pair(x, y);
        let update = if flipped {
            result(sy, sx)
        } else {
            result(sx, sy)
        };
        manager.update().match_(match_id, update).await.unwrap();
    }

    let standings = manager.get().final_standings(data.stage.id).await.unwrap();
    let order: Vec<&str> = standings.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(order, vec!["A", "B", "C", "D"]);
    assert_eq!(standings[0].rank, 1);
    assert_eq!(standings[3].rank, 4);
}

/// 4) draws are legal in round-robin and count in the table
#[tokio::test]
async fn given_a_draw_then_both_sides_record_it() {
    let (manager, _storage) = make_manager();
    let data = create_round_robin(&manager, &["A", "B"], 1).await;
    assert_eq!(data.matches.len(), 1);

    let updated = manager
        .update()
        .match_(data.matches[0].id, result(2, 2))
        .await
        .unwrap();
    assert_eq!(updated.status, Status::Completed);
    assert_eq!(updated.winner_id(), None);
    assert_eq!(
        updated.opponent1.entry().unwrap().result,
        Some(SideResult::Draw)
    );
}

/// 5) a pending stage is locked until seeded, then confirmed
#[tokio::test]
async fn given_pending_seeding_when_seeded_then_matches_become_ready() {
    let (manager, _storage) = make_manager();
    let tournament = manager.create().tournament("league", &[]).await.unwrap();
    let stage = manager
        .create()
        .stage(StageCreateOptions {
            tournament_id: tournament.id,
            name: "groups".into(),
            stage_type: StageType::RoundRobin,
            seeding: Seeding::Pending { size: 4 },
            settings: StageSettings {
                group_count: Some(1),
                ..Default::default()
            },
        })
        .await
        .unwrap();
    let data = manager.get().stage_data(stage.id).await.unwrap();
    assert!(data.matches.iter().all(|m| m.status == Status::Locked));
    assert!(data.matches.iter().all(|m| m.opponent1.is_position()));

    manager
        .update()
        .seeding(stage.id, seed_names(&["A", "B", "C", "D"]))
        .await
        .unwrap();
    let data = manager.get().stage_data(stage.id).await.unwrap();
    assert!(data.matches.iter().all(|m| m.status == Status::Ready));

    let seeding = manager.get().seeding(stage.id).await.unwrap();
    assert_eq!(seeding.len(), 4);
    assert!(seeding.iter().all(|s| s.is_some()));
}

/// 6) reset.seeding restores the placeholders of an unstarted stage
#[tokio::test]
async fn given_seeded_stage_when_seeding_reset_then_placeholders_return() {
    let (manager, _storage) = make_manager();
    let data = create_round_robin(&manager, &["A", "B", "C", "D"], 1).await;

    manager.reset().seeding(data.stage.id).await.unwrap();
    let after = manager.get().stage_data(data.stage.id).await.unwrap();
    assert!(after.matches.iter().all(|m| m.status == Status::Locked));
    assert!(after.matches.iter().all(|m| m.opponent1.is_position()));

    // once a result is recorded the seeding is frozen
    manager
        .update()
        .seeding(data.stage.id, seed_names(&["A", "B", "C", "D"]))
        .await
        .unwrap();
    let reseeded = manager.get().stage_data(data.stage.id).await.unwrap();
    manager
        .update()
        .match_(reseeded.matches[0].id, result(1, 0))
        .await
        .unwrap();
    let err = manager.reset().seeding(data.stage.id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));
}

/// 7) confirming a partially filled elimination bracket turns the leftover
/// positions into BYEs
#[tokio::test]
async fn given_pending_elimination_when_confirmed_then_leftovers_become_byes() {
    let (manager, _storage) = make_manager();
    let tournament = manager.create().tournament("cup", &[]).await.unwrap();
    let stage = manager
        .create()
        .stage(StageCreateOptions {
            tournament_id: tournament.id,
            name: "main".into(),
            stage_type: StageType::SingleElimination,
            seeding: Seeding::Pending { size: 4 },
            settings: StageSettings::default(),
        })
        .await
        .unwrap();

    manager.update().confirm_seeding(stage.id).await.unwrap();
    let data = manager.get().stage_data(stage.id).await.unwrap();
    for m in &data.matches {
        assert_eq!(m.status, Status::Completed);
        // a BYE is never declared a winner
        assert_eq!(m.winner_id(), None);
    }
}
