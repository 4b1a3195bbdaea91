//! Round robin: a full circle-method schedule up front, or self-scheduled play.

use crate::logic::pairing::{default_can_create_new_round, record_pairings, Pairing, PairingStrategy};
use crate::models::{Round, StageId, StagePlayer, StagePlayerId, TournamentError};
use crate::store::{MatchHistory, TournamentStore};
use std::collections::HashSet;

pub(super) fn scheduled_strategy() -> PairingStrategy {
    PairingStrategy::RoundRobinScheduled
}

pub(super) fn self_scheduled_strategy() -> PairingStrategy {
    PairingStrategy::RoundRobinSelfScheduled
}

/// On a stage without matches, lay out the whole schedule starting at `round`. Otherwise
/// pack the pairs that have no match yet into as few extra rounds as possible.
pub(super) fn make_scheduled_pairings<S>(store: &mut S, round: &Round) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let players = store.active_stage_players(round.stage_id)?;
    if players.len() < 2 {
        return Ok(());
    }

    let stage_has_matches = !store.stage_match_records(round.stage_id).is_empty();
    let schedule = if stage_has_matches {
        let met = scheduled_pairs(&*store, round.stage_id);
        pack_remaining_pairs(&players, &met)
    } else {
        circle_schedule(players.len())
            .into_iter()
            .map(|round_pairs| {
                round_pairs
                    .into_iter()
                    .map(|(a, b)| (players[a].id, b.map(|b| players[b].id)))
                    .collect()
            })
            .collect()
    };

    log::info!(
        "Round robin: scheduling {} round(s) from round {}",
        schedule.len(),
        round.order
    );
    for (offset, pairings) in schedule.iter().enumerate() {
        let round_id = if offset == 0 {
            round.id
        } else {
            let extra = Round::new(
                round.stage_id,
                round.order + offset as u32,
                round.round_length_in_minutes,
            );
            let id = extra.id;
            store.insert_round(extra)?;
            id
        };
        record_pairings(store, round_id, pairings)?;
    }
    Ok(())
}

/// Circle (polygon) method over `n` seats: seat 0 stays, the others rotate. An odd field
/// gets a phantom seat, and whoever faces it has the bye.
fn circle_schedule(n: usize) -> Vec<Vec<(usize, Option<usize>)>> {
    if n < 2 {
        return Vec::new();
    }
    let mut seats: Vec<Option<usize>> = (0..n).map(Some).collect();
    if n % 2 == 1 {
        seats.push(None);
    }
    let size = seats.len();

    (0..size - 1)
        .map(|round| {
            let arrangement: Vec<Option<usize>> = std::iter::once(seats[0])
                .chain((1..size).map(|i| seats[(i + size - 2 - round % (size - 1)) % (size - 1) + 1]))
                .collect();
            (0..size / 2)
                .filter_map(|i| match (arrangement[i], arrangement[size - 1 - i]) {
                    (Some(a), Some(b)) => Some((a, Some(b))),
                    (Some(a), None) | (None, Some(a)) => Some((a, None)),
                    (None, None) => None,
                })
                .collect()
        })
        .collect()
}

/// Unordered pairs that already have a match (played or scheduled) in the stage.
fn scheduled_pairs<H>(history: &H, stage_id: StageId) -> HashSet<(StagePlayerId, StagePlayerId)>
where
    H: MatchHistory + ?Sized,
{
    history
        .stage_match_records(stage_id)
        .into_iter()
        .filter_map(|r| r.game.player_two.map(|p2| unordered(r.game.player_one, p2)))
        .collect()
}

fn unordered(a: StagePlayerId, b: StagePlayerId) -> (StagePlayerId, StagePlayerId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn missing_pairs(
    players: &[StagePlayer],
    met: &HashSet<(StagePlayerId, StagePlayerId)>,
) -> Vec<(StagePlayerId, StagePlayerId)> {
    let mut pairs = Vec::new();
    for (i, a) in players.iter().enumerate() {
        for b in &players[i + 1..] {
            if !met.contains(&unordered(a.id, b.id)) {
                pairs.push((a.id, b.id));
            }
        }
    }
    pairs
}

/// Greedy packing: each new round takes every remaining pair whose players are still free.
fn pack_remaining_pairs(
    players: &[StagePlayer],
    met: &HashSet<(StagePlayerId, StagePlayerId)>,
) -> Vec<Vec<Pairing>> {
    let mut remaining = missing_pairs(players, met);
    let mut rounds = Vec::new();
    while !remaining.is_empty() {
        let mut busy = HashSet::new();
        let mut this_round = Vec::new();
        remaining.retain(|&(a, b)| {
            if busy.contains(&a) || busy.contains(&b) {
                return true;
            }
            busy.insert(a);
            busy.insert(b);
            this_round.push((a, Some(b)));
            false
        });
        rounds.push(this_round);
    }
    rounds
}

/// Extra rounds only once every scheduled round is played out and some pair is still missing.
pub(super) fn can_create_new_round<H>(history: &H, stage_id: StageId) -> Result<bool, TournamentError>
where
    H: MatchHistory + ?Sized,
{
    let all_played = history
        .stage_rounds(stage_id)
        .iter()
        .all(|r| history.is_round_complete(r.id));
    if !default_can_create_new_round(history, stage_id) || !all_played {
        return Ok(false);
    }
    has_unscheduled_pairs(history, stage_id)
}

/// True while some pair of active players has no match in the stage.
pub(super) fn has_unscheduled_pairs<H>(history: &H, stage_id: StageId) -> Result<bool, TournamentError>
where
    H: MatchHistory + ?Sized,
{
    let players = history.active_stage_players(stage_id)?;
    let met = scheduled_pairs(history, stage_id);
    Ok(!missing_pairs(&players, &met).is_empty())
}
