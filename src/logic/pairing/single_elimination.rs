//! Single elimination: seeded bracket, only winners advance.

use crate::logic::pairing::{default_can_create_new_round, record_pairings, Pairing, PairingStrategy};
use crate::models::{Round, StageId, StagePlayer, TournamentError};
use crate::store::{MatchHistory, TournamentStore};

pub(super) fn strategy() -> PairingStrategy {
    PairingStrategy::SingleElimination
}

/// Round 1 uses every active player; later rounds the winners of the previous round.
pub(super) fn make_pairings<S>(store: &mut S, round: &Round) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let mut players = if round.order == 1 {
        store.active_stage_players(round.stage_id)?
    } else {
        previous_round_winners(&*store, round)?
    };
    players.sort_by_key(|sp| sp.seed);

    let pairings = bracket_pairings(&players);
    log::debug!(
        "Single elimination round {}: {} players, {} matches",
        round.order,
        players.len(),
        pairings.len()
    );
    record_pairings(store, round.id, &pairings)
}

fn previous_round_winners<S>(store: &S, round: &Round) -> Result<Vec<StagePlayer>, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let Some(previous) = store
        .stage_rounds(round.stage_id)
        .into_iter()
        .find(|r| r.order + 1 == round.order)
    else {
        return Ok(Vec::new());
    };
    let mut winners = Vec::new();
    for game in store.round_matches(previous.id) {
        let Some(winner) = store.match_result(game.id).and_then(|r| r.winner) else {
            continue;
        };
        let stage_player = store.get_stage_player(winner)?;
        if store.get_player(stage_player.player_id)?.is_active() {
            winners.push(stage_player);
        }
    }
    Ok(winners)
}

/// Players must be in seed order. The top `2^ceil(log2 n) - n` seeds get byes; the rest
/// play best against worst.
fn bracket_pairings(players: &[StagePlayer]) -> Vec<Pairing> {
    match players.len() {
        0 => return Vec::new(),
        1 => return vec![(players[0].id, None)],
        _ => {}
    }
    let byes = players.len().next_power_of_two() - players.len();
    let (bye_players, remainder) = players.split_at(byes);

    let mut pairings: Vec<Pairing> = bye_players.iter().map(|sp| (sp.id, None)).collect();
    let half = remainder.len() / 2;
    for i in 0..half {
        let best = &remainder[i];
        let worst = &remainder[remainder.len() - 1 - i];
        pairings.push((best.id, Some(worst.id)));
    }
    pairings
}

/// The default rule, plus: the latest round must have more than one decided match.
pub(super) fn can_create_new_round<H>(history: &H, stage_id: StageId) -> bool
where
    H: MatchHistory + ?Sized,
{
    if !default_can_create_new_round(history, stage_id) {
        return false;
    }
    match history.current_round(stage_id) {
        Some(round) => {
            let decided = history
                .round_matches(round.id)
                .iter()
                .filter(|m| history.match_result(m.id).is_some())
                .count();
            decided > 1
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn seeded(n: u32) -> Vec<StagePlayer> {
        let stage = Uuid::new_v4();
        (1..=n).map(|seed| StagePlayer::new(Uuid::new_v4(), stage, seed)).collect()
    }

    #[test]
    fn eight_players_no_byes_best_vs_worst() {
        let players = seeded(8);
        let pairings = bracket_pairings(&players);
        assert_eq!(pairings.len(), 4);
        assert_eq!(pairings[0], (players[0].id, Some(players[7].id)));
        assert_eq!(pairings[3], (players[3].id, Some(players[4].id)));
    }

    #[test]
    fn six_players_top_two_seeds_get_byes() {
        let players = seeded(6);
        let pairings = bracket_pairings(&players);
        assert_eq!(pairings[0], (players[0].id, None));
        assert_eq!(pairings[1], (players[1].id, None));
        assert_eq!(pairings[2], (players[2].id, Some(players[5].id)));
        assert_eq!(pairings[3], (players[3].id, Some(players[4].id)));
    }
}
