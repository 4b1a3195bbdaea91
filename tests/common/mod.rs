//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use tcg_tourney::{
    create_initial_stage, create_tournament, register_player, report_result, MatchHistory,
    MemoryStore, Player, RoundId, Stage, StageId, StagePlayerId, TournamentId,
};

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(20240601)
}

/// A tournament with players `P1..Pn` registered in order.
pub fn tournament_with_players(n: usize) -> (MemoryStore, TournamentId, Vec<Player>) {
    let mut store = MemoryStore::new();
    let tournament = create_tournament(&mut store, "League Night", Some("admin".into())).unwrap();
    let players = (1..=n)
        .map(|i| register_player(&mut store, tournament.id, &format!("P{i}")).unwrap())
        .collect();
    (store, tournament.id, players)
}

/// Like [`tournament_with_players`], plus an order-1 stage using `strategy` with every player seeded.
pub fn tournament_with_stage(n: usize, strategy: &str) -> (MemoryStore, TournamentId, Stage) {
    let (mut store, tid, _) = tournament_with_players(n);
    let stage = create_initial_stage(&mut store, tid, strategy, &mut rng()).unwrap();
    (store, tid, stage)
}

pub fn seed_of(store: &MemoryStore, id: StagePlayerId) -> u32 {
    store.get_stage_player(id).unwrap().seed
}

/// Resolve every open non-bye match of the round in favour of the better (lower) seed.
pub fn resolve_round_by_seed(store: &mut MemoryStore, round_id: RoundId) {
    for game in store.round_matches(round_id) {
        if store.match_result(game.id).is_some() {
            continue;
        }
        let Some(p2) = game.player_two else { continue };
        let winner = if seed_of(store, game.player_one) < seed_of(store, p2) {
            game.player_one
        } else {
            p2
        };
        report_result(store, game.id, Some(winner), None).unwrap();
    }
}

/// Resolve every open non-bye match of the round in favour of player one.
pub fn resolve_round_player_one(store: &mut MemoryStore, round_id: RoundId) {
    for game in store.round_matches(round_id) {
        if store.match_result(game.id).is_none() && !game.is_bye() {
            report_result(store, game.id, Some(game.player_one), None).unwrap();
        }
    }
}

/// Number of matches per unordered pair of stage players across the whole stage.
pub fn pair_counts(store: &MemoryStore, stage_id: StageId) -> HashMap<(StagePlayerId, StagePlayerId), u32> {
    let mut counts = HashMap::new();
    for record in store.stage_match_records(stage_id) {
        if let Some(p2) = record.game.player_two {
            let p1 = record.game.player_one;
            let key = if p1 < p2 { (p1, p2) } else { (p2, p1) };
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

/// Byes received per stage player.
pub fn bye_counts(store: &MemoryStore, stage_id: StageId) -> HashMap<StagePlayerId, u32> {
    let mut counts = HashMap::new();
    for record in store.stage_match_records(stage_id) {
        if record.game.is_bye() {
            *counts.entry(record.game.player_one).or_insert(0) += 1;
        }
    }
    counts
}
