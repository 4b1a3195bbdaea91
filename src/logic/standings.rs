//! Standings: per-stage ranking under the stage's criteria chain, and the tournament-wide view.
//!
//! Statistics are gathered in one pass over the stage's match history
//! ([`build_standings_cache`]); the criteria read from that cache only.

use crate::logic::criteria::RankingCriterion;
use crate::models::{
    Player, PlayerStatus, StageId, StagePlayer, StagePlayerId, TournamentError, TournamentId,
};
use crate::store::{MatchHistory, MatchRecord, TournamentStore};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Cached statistics for one stage player.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerTally {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub byes: u32,
    pub points: u32,
    pub total_matches: u32,
    pub strength_of_schedule: f64,
    pub seed: u32,
    pub player_score: u64,
    pub opponent_score: u64,
}

impl PlayerTally {
    pub fn empty(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// Per-player statistics for one stage, keyed by stage player.
#[derive(Clone, Debug, Default)]
pub struct StandingsCache {
    tallies: HashMap<StagePlayerId, PlayerTally>,
}

impl StandingsCache {
    pub fn get(&self, stage_player: StagePlayerId) -> Option<&PlayerTally> {
        self.tallies.get(&stage_player)
    }
}

/// A criterion and the value it produced for one player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriterionValue {
    pub criterion: RankingCriterion,
    pub value: f64,
}

/// One row of a stage's standings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandingRecord {
    pub stage_player: StagePlayer,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub byes: u32,
    pub points: u32,
    pub total_matches: u32,
    pub strength_of_schedule: f64,
    pub seed: u32,
    pub player_score: u64,
    pub opponent_score: u64,
    /// One entry per criterion of the chain, in chain order.
    pub criterion_values: Vec<CriterionValue>,
    pub rank: u32,
}

impl StandingRecord {
    pub fn value_of(&self, criterion: RankingCriterion) -> Option<f64> {
        self.criterion_values
            .iter()
            .find(|cv| cv.criterion == criterion)
            .map(|cv| cv.value)
    }
}

/// Build the statistics cache for every stage player in a single pass over the stage's matches.
pub fn build_standings_cache(stage_players: &[StagePlayer], records: &[MatchRecord]) -> StandingsCache {
    let mut tallies: HashMap<StagePlayerId, PlayerTally> = stage_players
        .iter()
        .map(|sp| (sp.id, PlayerTally::empty(sp.seed)))
        .collect();
    let mut opponents: HashMap<StagePlayerId, BTreeSet<StagePlayerId>> = HashMap::new();

    for record in records {
        let game = &record.game;
        let participants = std::iter::once(game.player_one).chain(game.player_two);
        for sp in participants {
            if let Some(tally) = tallies.get_mut(&sp) {
                tally.total_matches += 1;
            }
        }
        if let Some(p2) = game.player_two {
            opponents.entry(game.player_one).or_default().insert(p2);
            opponents.entry(p2).or_default().insert(game.player_one);
        }

        let Some(result) = &record.result else {
            continue;
        };
        match result.winner {
            Some(winner) => {
                if let Some(tally) = tallies.get_mut(&winner) {
                    tally.wins += 1;
                    if game.is_bye() {
                        tally.byes += 1;
                    }
                }
                if let Some(loser) = game.opponent_of(winner) {
                    if let Some(tally) = tallies.get_mut(&loser) {
                        tally.losses += 1;
                    }
                }
            }
            None => {
                for sp in std::iter::once(game.player_one).chain(game.player_two) {
                    if let Some(tally) = tallies.get_mut(&sp) {
                        tally.ties += 1;
                    }
                }
            }
        }
        let p1_score = u64::from(result.player_one_score.unwrap_or(0));
        let p2_score = u64::from(result.player_two_score.unwrap_or(0));
        if let Some(tally) = tallies.get_mut(&game.player_one) {
            tally.player_score = tally.player_score.saturating_add(p1_score);
            tally.opponent_score = tally.opponent_score.saturating_add(p2_score);
        }
        if let Some(tally) = game.player_two.and_then(|p2| tallies.get_mut(&p2)) {
            tally.player_score = tally.player_score.saturating_add(p2_score);
            tally.opponent_score = tally.opponent_score.saturating_add(p1_score);
        }
    }

    for tally in tallies.values_mut() {
        tally.points = tally.wins * 2 + tally.ties;
    }

    let points: HashMap<StagePlayerId, u32> =
        tallies.iter().map(|(id, t)| (*id, t.points)).collect();
    for (id, faced) in &opponents {
        if faced.is_empty() {
            continue;
        }
        let total: u32 = faced.iter().filter_map(|o| points.get(o)).sum();
        if let Some(tally) = tallies.get_mut(id) {
            tally.strength_of_schedule = f64::from(total) / faced.len() as f64;
        }
    }

    StandingsCache { tallies }
}

/// Standings of a stage. The Random criterion draws from a source seeded by the stage's
/// `tiebreak_seed`, so repeated calls without writes in between agree.
pub fn get_stage_standings<H>(history: &H, stage_id: StageId) -> Result<Vec<StandingRecord>, TournamentError>
where
    H: MatchHistory + ?Sized,
{
    let stage = history.get_stage(stage_id)?;
    let mut rng = StdRng::seed_from_u64(stage.tiebreak_seed);
    get_stage_standings_with_rng(history, stage_id, &mut rng)
}

/// Standings of a stage, drawing Random criterion values from `rng`.
pub fn get_stage_standings_with_rng<H>(
    history: &H,
    stage_id: StageId,
    rng: &mut dyn RngCore,
) -> Result<Vec<StandingRecord>, TournamentError>
where
    H: MatchHistory + ?Sized,
{
    let stage = history.get_stage(stage_id)?;
    let stage_players = history.stage_players(stage_id);
    if stage_players.is_empty() {
        return Ok(Vec::new());
    }
    let records = history.stage_match_records(stage_id);
    let cache = build_standings_cache(&stage_players, &records);
    let chain = stage.effective_ranking_criteria();

    let mut standings = Vec::with_capacity(stage_players.len());
    for sp in stage_players {
        let tally = cache.get(sp.id).cloned().unwrap_or_else(|| PlayerTally::empty(sp.seed));
        let mut criterion_values = Vec::with_capacity(chain.len());
        for &criterion in &chain {
            criterion_values.push(CriterionValue {
                criterion,
                value: criterion.calculate_value(&sp, &cache, &mut *rng),
            });
        }
        standings.push(StandingRecord {
            stage_player: sp,
            wins: tally.wins,
            losses: tally.losses,
            ties: tally.ties,
            byes: tally.byes,
            points: tally.points,
            total_matches: tally.total_matches,
            strength_of_schedule: tally.strength_of_schedule,
            seed: tally.seed,
            player_score: tally.player_score,
            opponent_score: tally.opponent_score,
            criterion_values,
            rank: 0,
        });
    }

    standings.sort_by(|a, b| compare_by_chain(a, b, &chain, chain.len()));
    resolve_head_to_head(&mut standings, &chain, &records);

    for (i, standing) in standings.iter_mut().enumerate() {
        standing.rank = i as u32 + 1;
    }
    Ok(standings)
}

/// Compare two records on the first `depth` criteria of the chain.
fn compare_by_chain(
    a: &StandingRecord,
    b: &StandingRecord,
    chain: &[RankingCriterion],
    depth: usize,
) -> Ordering {
    for (i, criterion) in chain.iter().take(depth).enumerate() {
        let va = a.criterion_values[i].value;
        let vb = b.criterion_values[i].value;
        let ord = if criterion.is_descending() {
            vb.total_cmp(&va)
        } else {
            va.total_cmp(&vb)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Re-sort each maximal run of players tied on every criterion before HeadToHead by
/// their wins against the other members of that run.
fn resolve_head_to_head(
    standings: &mut [StandingRecord],
    chain: &[RankingCriterion],
    records: &[MatchRecord],
) {
    let Some(h2h_index) = chain.iter().position(|c| *c == RankingCriterion::HeadToHead) else {
        return;
    };

    let mut start = 0;
    while start < standings.len() {
        let mut end = start + 1;
        while end < standings.len()
            && compare_by_chain(&standings[start], &standings[end], chain, h2h_index) == Ordering::Equal
        {
            end += 1;
        }
        if end - start > 1 {
            let group = &mut standings[start..end];
            let members: HashSet<StagePlayerId> = group.iter().map(|s| s.stage_player.id).collect();
            let wins = head_to_head_wins(&members, records);
            for standing in group.iter_mut() {
                let value = wins.get(&standing.stage_player.id).copied().unwrap_or(0);
                standing.criterion_values[h2h_index].value = f64::from(value);
            }
            // stable: players equal on head-to-head keep the order of the later criteria
            group.sort_by(|a, b| {
                b.criterion_values[h2h_index]
                    .value
                    .total_cmp(&a.criterion_values[h2h_index].value)
            });
        }
        start = end;
    }
}

fn head_to_head_wins(
    members: &HashSet<StagePlayerId>,
    records: &[MatchRecord],
) -> HashMap<StagePlayerId, u32> {
    let mut wins = HashMap::new();
    for record in records {
        let Some(winner) = record.result.as_ref().and_then(|r| r.winner) else {
            continue;
        };
        let Some(loser) = record.game.opponent_of(winner) else {
            continue;
        };
        if members.contains(&winner) && members.contains(&loser) {
            *wins.entry(winner).or_insert(0) += 1;
        }
    }
    wins
}

/// One row of the tournament-wide standings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentStanding {
    pub player: Player,
    /// The entry in the furthest stage the player reached.
    pub stage_player: StagePlayer,
    pub highest_stage_order: u32,
    pub is_in_current_stage: bool,
    /// Rank within `highest_stage_order`'s stage, if known.
    pub stage_rank: Option<u32>,
    /// Live statistics; only present for players in the current stage.
    pub stage_standing: Option<StandingRecord>,
    pub tournament_rank: u32,
}

impl TournamentStanding {
    pub fn is_active(&self) -> bool {
        self.player.status == PlayerStatus::Active
    }
}

/// Standings across all stages: current-stage players first (active before dropped, in
/// stage order), then everyone else by furthest stage reached, activity and stored rank.
pub fn get_tournament_standings<S>(
    store: &S,
    tournament_id: TournamentId,
) -> Result<Vec<TournamentStanding>, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let Some(current) = crate::logic::lifecycle::current_stage(store, tournament_id)? else {
        return Ok(Vec::new());
    };
    let players = store.tournament_players(tournament_id);
    if players.is_empty() {
        return Ok(Vec::new());
    }
    let players_by_id: HashMap<_, _> = players.iter().map(|p| (p.id, p)).collect();

    let mut active = Vec::new();
    let mut dropped = Vec::new();
    let mut seen = HashSet::new();
    for record in get_stage_standings(store, current.id)? {
        let Some(player) = players_by_id.get(&record.stage_player.player_id) else {
            continue;
        };
        seen.insert(player.id);
        let standing = TournamentStanding {
            player: (*player).clone(),
            stage_player: record.stage_player.clone(),
            highest_stage_order: current.order,
            is_in_current_stage: true,
            stage_rank: Some(record.rank),
            stage_standing: Some(record),
            tournament_rank: 0,
        };
        if player.is_active() {
            active.push(standing);
        } else {
            dropped.push(standing);
        }
    }

    let stage_orders: HashMap<StageId, u32> = store
        .tournament_stages(tournament_id)
        .into_iter()
        .map(|s| (s.id, s.order))
        .collect();
    let mut others = Vec::new();
    for player in &players {
        if seen.contains(&player.id) {
            continue;
        }
        let furthest = store
            .player_stage_entries(player.id)
            .into_iter()
            .filter_map(|sp| stage_orders.get(&sp.stage_id).map(|order| (*order, sp)))
            .max_by_key(|(order, _)| *order);
        let Some((order, stage_player)) = furthest else {
            continue;
        };
        others.push(TournamentStanding {
            player: player.clone(),
            stage_rank: stage_player.rank,
            stage_player,
            highest_stage_order: order,
            is_in_current_stage: false,
            stage_standing: None,
            tournament_rank: 0,
        });
    }
    others.sort_by_key(|s| {
        (
            std::cmp::Reverse(s.highest_stage_order),
            !s.is_active(),
            s.stage_rank.unwrap_or(u32::MAX),
        )
    });

    let mut standings: Vec<_> = active.into_iter().chain(dropped).chain(others).collect();
    for (i, standing) in standings.iter_mut().enumerate() {
        standing.tournament_rank = i as u32 + 1;
    }
    Ok(standings)
}
