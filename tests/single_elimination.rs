//! Integration tests for single elimination brackets.

mod common;

use common::{resolve_round_by_seed, rng, seed_of, tournament_with_stage};
use tcg_tourney::{
    can_create_round_in_current_stage, create_round, get_stage_standings, report_result,
    start_tournament, MatchHistory, TournamentError, TournamentStore,
};

#[test]
fn eight_player_bracket_runs_to_a_single_champion() {
    let (mut store, tid, stage) = tournament_with_stage(8, "single_elimination");
    let mut rng = rng();
    let first = start_tournament(&mut store, tid, &mut rng).unwrap();
    assert!(!store.get_tournament(tid).unwrap().is_accepting_registrations);

    let matches = store.round_matches(first.id);
    assert_eq!(matches.len(), 4);
    assert!(matches.iter().all(|m| !m.is_bye()));
    let seeds: Vec<_> = matches
        .iter()
        .map(|m| (seed_of(&store, m.player_one), seed_of(&store, m.player_two.unwrap())))
        .collect();
    assert_eq!(seeds, vec![(1, 8), (2, 7), (3, 6), (4, 5)]);
    resolve_round_by_seed(&mut store, first.id);

    let second = create_round(&mut store, stage.id, &mut rng).unwrap();
    assert_eq!(store.round_matches(second.id).len(), 2);
    resolve_round_by_seed(&mut store, second.id);

    let last = create_round(&mut store, stage.id, &mut rng).unwrap();
    let finals = store.round_matches(last.id);
    assert_eq!(finals.len(), 1);
    assert_eq!(seed_of(&store, finals[0].player_one), 1);
    assert_eq!(seed_of(&store, finals[0].player_two.unwrap()), 2);
    resolve_round_by_seed(&mut store, last.id);

    let standings = get_stage_standings(&store, stage.id).unwrap();
    let undefeated: Vec<_> = standings.iter().filter(|s| s.losses == 0).collect();
    assert_eq!(undefeated.len(), 1);
    assert_eq!(undefeated[0].seed, 1);
    assert!(!can_create_round_in_current_stage(&store, tid).unwrap());
    assert!(matches!(
        create_round(&mut store, stage.id, &mut rng),
        Err(TournamentError::InvalidTransition(_))
    ));
}

#[test]
fn top_seeds_get_byes_when_field_is_not_a_power_of_two() {
    let (mut store, tid, stage) = tournament_with_stage(6, "single_elimination");
    let mut rng = rng();
    let first = start_tournament(&mut store, tid, &mut rng).unwrap();

    let matches = store.round_matches(first.id);
    let byes: Vec<u32> = matches
        .iter()
        .filter(|m| m.is_bye())
        .map(|m| seed_of(&store, m.player_one))
        .collect();
    assert_eq!(byes, vec![1, 2]);
    assert_eq!(matches.len(), 4);

    resolve_round_by_seed(&mut store, first.id);
    let second = create_round(&mut store, stage.id, &mut rng).unwrap();
    let seeds: Vec<_> = store
        .round_matches(second.id)
        .iter()
        .map(|m| (seed_of(&store, m.player_one), seed_of(&store, m.player_two.unwrap())))
        .collect();
    assert_eq!(seeds, vec![(1, 4), (2, 3)]);
}

#[test]
fn final_without_result_blocks_new_round() {
    let (mut store, tid, stage) = tournament_with_stage(4, "single_elimination");
    let mut rng = rng();
    let first = start_tournament(&mut store, tid, &mut rng).unwrap();
    resolve_round_by_seed(&mut store, first.id);
    let last = create_round(&mut store, stage.id, &mut rng).unwrap();
    assert!(!can_create_round_in_current_stage(&store, tid).unwrap());

    // a decided final is still a single decided match
    let final_match = store.round_matches(last.id)[0].clone();
    report_result(&mut store, final_match.id, Some(final_match.player_one), None).unwrap();
    assert!(!can_create_round_in_current_stage(&store, tid).unwrap());
}

#[test]
fn playoff_matches_reject_ties() {
    let (mut store, tid, _) = tournament_with_stage(2, "single_elimination");
    let round = start_tournament(&mut store, tid, &mut rng()).unwrap();
    let game = store.round_matches(round.id)[0].clone();
    assert!(matches!(
        report_result(&mut store, game.id, None, None),
        Err(TournamentError::InvalidResult(_))
    ));
}
