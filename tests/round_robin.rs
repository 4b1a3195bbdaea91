//! Integration tests for the scheduled and self-scheduled round robin strategies.

mod common;

use common::{bye_counts, pair_counts, resolve_round_by_seed, rng, tournament_with_stage};
use std::collections::HashSet;
use tcg_tourney::{
    can_create_round_in_current_stage, create_round, register_player, report_self_scheduled_result,
    start_tournament, MatchHistory, TournamentError, TournamentStore,
};

#[test]
fn four_players_get_full_schedule_up_front() {
    let (mut store, tid, stage) = tournament_with_stage(4, "round_robin_scheduled");
    start_tournament(&mut store, tid, &mut rng()).unwrap();

    let rounds = store.stage_rounds(stage.id);
    assert_eq!(rounds.len(), 3);
    assert_eq!(rounds.iter().map(|r| r.order).collect::<Vec<_>>(), vec![1, 2, 3]);

    let records = store.stage_match_records(stage.id);
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|r| !r.game.is_bye()));

    let pairs = pair_counts(&store, stage.id);
    assert_eq!(pairs.len(), 6);
    assert!(pairs.values().all(|&c| c == 1));

    for sp in store.stage_players(stage.id) {
        let opponents: HashSet<_> = records
            .iter()
            .filter_map(|r| r.game.opponent_of(sp.id))
            .collect();
        assert_eq!(opponents.len(), 3);
    }
    assert!(!can_create_round_in_current_stage(&store, tid).unwrap());
}

#[test]
fn seven_players_each_get_one_bye() {
    let (mut store, tid, stage) = tournament_with_stage(7, "round_robin_scheduled");
    start_tournament(&mut store, tid, &mut rng()).unwrap();

    assert_eq!(store.stage_rounds(stage.id).len(), 7);
    let records = store.stage_match_records(stage.id);
    let byes: Vec<_> = records.iter().filter(|r| r.game.is_bye()).collect();
    assert_eq!(records.len() - byes.len(), 21);
    assert_eq!(byes.len(), 7);
    // byes are decided the moment they are created
    assert!(byes
        .iter()
        .all(|r| r.result.as_ref().and_then(|res| res.winner) == Some(r.game.player_one)));

    let byes = bye_counts(&store, stage.id);
    assert_eq!(byes.len(), 7);
    assert!(byes.values().all(|&c| c == 1));
    assert!(pair_counts(&store, stage.id).values().all(|&c| c == 1));

    for sp in store.stage_players(stage.id) {
        let opponents: HashSet<_> = records
            .iter()
            .filter_map(|r| r.game.opponent_of(sp.id))
            .collect();
        assert_eq!(opponents.len(), 6);
    }
}

#[test]
fn late_player_gets_remaining_pairs_packed_into_new_rounds() {
    let (mut store, tid, stage) = tournament_with_stage(4, "round_robin_scheduled");
    start_tournament(&mut store, tid, &mut rng()).unwrap();

    let mut tournament = store.get_tournament(tid).unwrap();
    tournament.is_accepting_registrations = true;
    store.update_tournament(&tournament).unwrap();
    register_player(&mut store, tid, "Latecomer").unwrap();

    // no extra rounds while the scheduled ones are still open
    assert!(!can_create_round_in_current_stage(&store, tid).unwrap());
    assert!(matches!(
        create_round(&mut store, stage.id, &mut rng()),
        Err(TournamentError::InvalidTransition(_))
    ));
    let rounds = store.stage_rounds(stage.id);
    assert_eq!(rounds.len(), 3);

    // finishing only the latest round is not enough
    resolve_round_by_seed(&mut store, rounds[2].id);
    assert!(!can_create_round_in_current_stage(&store, tid).unwrap());

    for round in &rounds[..2] {
        resolve_round_by_seed(&mut store, round.id);
    }
    assert!(can_create_round_in_current_stage(&store, tid).unwrap());
    let round = create_round(&mut store, stage.id, &mut rng()).unwrap();
    assert_eq!(round.order, 4);

    // every missing pair involves the new player, so each needs its own round
    assert_eq!(store.stage_rounds(stage.id).len(), 7);
    let pairs = pair_counts(&store, stage.id);
    assert_eq!(pairs.len(), 10);
    assert!(pairs.values().all(|&c| c == 1));
    assert!(!can_create_round_in_current_stage(&store, tid).unwrap());
}

#[test]
fn scheduled_stage_refuses_extra_rounds() {
    let (mut store, tid, stage) = tournament_with_stage(4, "round_robin_scheduled");
    start_tournament(&mut store, tid, &mut rng()).unwrap();
    assert!(matches!(
        create_round(&mut store, stage.id, &mut rng()),
        Err(TournamentError::InvalidTransition(_))
    ));
}

#[test]
fn self_scheduled_stage_takes_player_reports() {
    let (mut store, tid, stage) = tournament_with_stage(3, "round_robin");
    let round = start_tournament(&mut store, tid, &mut rng()).unwrap();
    assert!(store.round_matches(round.id).is_empty());
    // registration stays open for free-for-all play
    assert!(store.get_tournament(tid).unwrap().is_accepting_registrations);

    let players = store.stage_players(stage.id);
    let (a, b, c) = (players[0].id, players[1].id, players[2].id);
    let result = report_self_scheduled_result(&mut store, stage.id, a, b, Some(b), None).unwrap();
    assert_eq!(result.winner, Some(b));
    report_self_scheduled_result(&mut store, stage.id, a, c, Some(a), None).unwrap();
    assert_eq!(store.round_matches(round.id).len(), 2);

    assert!(matches!(
        report_self_scheduled_result(&mut store, stage.id, b, a, Some(a), None),
        Err(TournamentError::ConstraintViolation(_))
    ));
    assert!(matches!(
        create_round(&mut store, stage.id, &mut rng()),
        Err(TournamentError::InvalidTransition(_))
    ));
}

#[test]
fn self_report_rejects_tie_when_ties_disallowed() {
    let (mut store, tid, stage) = tournament_with_stage(2, "round_robin");
    start_tournament(&mut store, tid, &mut rng()).unwrap();
    let players = store.stage_players(stage.id);
    assert!(matches!(
        report_self_scheduled_result(&mut store, stage.id, players[0].id, players[1].id, None, None),
        Err(TournamentError::InvalidResult(_))
    ));
    // nothing was written
    assert!(store.stage_match_records(stage.id).is_empty());
}
