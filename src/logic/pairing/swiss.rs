//! Swiss pairing: random first round, then similarly-scored players who have not met.
//!
//! Later rounds minimise the summed score gap over all pairs. A rematch is never
//! forbidden outright, only penalised by [`REPEAT_PENALTY`], so a pairing always exists.
//! Search effort depends on the field size:
//!
//! - up to [`EXHAUSTIVE_LIMIT`] players: every perfect matching is scored;
//! - up to [`BACKTRACK_LIMIT`]: backtracking under widening score-gap thresholds, then a
//!   forced greedy pairing;
//! - above that: the same backtracking restricted to the nearest few candidates, then a
//!   greedy pass from several starting offsets.

use crate::logic::pairing::{record_pairings, Pairing, PairingStrategy};
use crate::logic::standings::build_standings_cache;
use crate::models::{Round, StagePlayer, StagePlayerId, TournamentError};
use crate::store::{MatchRecord, TournamentStore};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::HashSet;

const EXHAUSTIVE_LIMIT: usize = 8;
const BACKTRACK_LIMIT: usize = 14;
/// Added to a pairing's cost for every rematch in it.
const REPEAT_PENALTY: u64 = 1_000;
/// Score-gap thresholds (in match points) tried in order; `None` is unbounded.
const GAP_THRESHOLDS: [Option<u32>; 3] = [Some(2), Some(4), None];
/// Search nodes allowed per backtracking attempt.
const BACKTRACK_BUDGET: usize = 20_000;
/// Candidates considered per player in large fields.
const BUCKET_CANDIDATES: usize = 6;
const GREEDY_OFFSETS: usize = 8;

pub(super) fn strategy() -> PairingStrategy {
    PairingStrategy::Swiss
}

pub(super) fn make_pairings<S>(
    store: &mut S,
    round: &Round,
    rng: &mut dyn RngCore,
) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let mut players = store.active_stage_players(round.stage_id)?;
    if players.is_empty() {
        return Ok(());
    }

    let pairings = if round.order == 1 {
        players.shuffle(rng);
        pair_consecutively(&players)
    } else {
        let records = store.stage_match_records(round.stage_id);
        pair_by_standings(&players, &records)
    };

    log::debug!(
        "Swiss round {}: {} matches for {} players",
        round.order,
        pairings.len(),
        players.len()
    );
    record_pairings(store, round.id, &pairings)
}

/// Pair neighbours; an odd player out gets the bye.
fn pair_consecutively(players: &[StagePlayer]) -> Vec<Pairing> {
    players
        .chunks(2)
        .map(|chunk| (chunk[0].id, chunk.get(1).map(|p| p.id)))
        .collect()
}

/// A player in pairing order: best first.
#[derive(Clone, Debug)]
struct Entrant {
    id: StagePlayerId,
    score: u32,
    had_bye: bool,
}

fn pair_by_standings(players: &[StagePlayer], records: &[MatchRecord]) -> Vec<Pairing> {
    let cache = build_standings_cache(players, records);
    let mut ranked: Vec<(Entrant, u32, u32, u32)> = players
        .iter()
        .map(|sp| {
            let tally = cache.get(sp.id).cloned().unwrap_or_default();
            let had_bye = records
                .iter()
                .any(|r| r.game.is_bye() && r.game.player_one == sp.id);
            let entrant = Entrant {
                id: sp.id,
                score: tally.points,
                had_bye,
            };
            (entrant, tally.wins, tally.losses, sp.seed)
        })
        .collect();
    ranked.sort_by_key(|(_, wins, losses, seed)| (std::cmp::Reverse(*wins), *losses, *seed));
    let mut entrants: Vec<Entrant> = ranked.into_iter().map(|(e, ..)| e).collect();

    let played = played_pairs(records);
    let mut pairings = Vec::with_capacity(entrants.len() / 2 + 1);

    if entrants.len() % 2 == 1 {
        let bye_index = choose_bye(&entrants, &played);
        let bye = entrants.remove(bye_index);
        log::debug!("Swiss bye goes to {}", bye.id);
        pairings.push((bye.id, None));
    }

    let problem = PairingProblem::new(&entrants, &played);
    let pairs = problem.solve();
    let repeats = pairs.iter().filter(|&&(a, b)| problem.played[a][b]).count();
    if repeats > 0 {
        log::warn!("Swiss pairing could not avoid {} rematch(es)", repeats);
    }
    // keep matches ordered by the better-ranked player
    let mut matches: Vec<Pairing> = pairs
        .into_iter()
        .map(|(a, b)| (entrants[a].id, Some(entrants[b].id)))
        .collect();
    matches.extend(pairings);
    matches
}

/// Unordered pairs of players who already have a decided match against each other.
fn played_pairs(records: &[MatchRecord]) -> HashSet<(StagePlayerId, StagePlayerId)> {
    records
        .iter()
        .filter(|r| r.is_complete())
        .filter_map(|r| r.game.player_two.map(|p2| ordered(r.game.player_one, p2)))
        .collect()
}

fn ordered(a: StagePlayerId, b: StagePlayerId) -> (StagePlayerId, StagePlayerId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Lowest-ranked player without a bye whose removal leaves a rematch-free pairing;
/// failing that, the lowest-ranked player.
fn choose_bye(entrants: &[Entrant], played: &HashSet<(StagePlayerId, StagePlayerId)>) -> usize {
    let last = entrants.len() - 1;
    for index in (0..entrants.len()).rev().filter(|&i| !entrants[i].had_bye) {
        let rest: Vec<Entrant> = entrants
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(_, e)| e.clone())
            .collect();
        let problem = PairingProblem::new(&rest, played);
        let mut budget = BACKTRACK_BUDGET;
        if problem.backtrack(None, None, &mut budget).is_some() {
            return index;
        }
    }
    last
}

/// Index-based pairing search over players in rank order.
struct PairingProblem {
    scores: Vec<u32>,
    played: Vec<Vec<bool>>,
}

impl PairingProblem {
    fn new(entrants: &[Entrant], played: &HashSet<(StagePlayerId, StagePlayerId)>) -> Self {
        let n = entrants.len();
        let mut matrix = vec![vec![false; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                if played.contains(&ordered(entrants[i].id, entrants[j].id)) {
                    matrix[i][j] = true;
                    matrix[j][i] = true;
                }
            }
        }
        Self {
            scores: entrants.iter().map(|e| e.score).collect(),
            played: matrix,
        }
    }

    fn len(&self) -> usize {
        self.scores.len()
    }

    fn gap(&self, a: usize, b: usize) -> u32 {
        self.scores[a].abs_diff(self.scores[b])
    }

    fn pair_cost(&self, a: usize, b: usize) -> u64 {
        let penalty = if self.played[a][b] { REPEAT_PENALTY } else { 0 };
        u64::from(self.gap(a, b)) + penalty
    }

    fn cost(&self, pairs: &[(usize, usize)]) -> u64 {
        pairs.iter().map(|&(a, b)| self.pair_cost(a, b)).sum()
    }

    /// Pick the algorithm for the field size. Always returns a perfect pairing.
    fn solve(&self) -> Vec<(usize, usize)> {
        let n = self.len();
        if n < 2 {
            return Vec::new();
        }
        if n <= EXHAUSTIVE_LIMIT {
            return self.exhaustive();
        }
        let candidate_limit = if n <= BACKTRACK_LIMIT {
            None
        } else {
            Some(BUCKET_CANDIDATES)
        };
        for threshold in GAP_THRESHOLDS {
            let mut budget = BACKTRACK_BUDGET;
            if let Some(pairs) = self.backtrack(threshold, candidate_limit, &mut budget) {
                return pairs;
            }
        }
        if n <= BACKTRACK_LIMIT {
            log::debug!("Swiss backtracking failed for {} players, force-pairing", n);
            self.greedy_from(0)
        } else {
            log::debug!("Swiss backtracking failed for {} players, trying greedy offsets", n);
            self.multi_offset_greedy()
        }
    }

    /// Score every perfect matching and keep the cheapest (first found on ties).
    fn exhaustive(&self) -> Vec<(usize, usize)> {
        let mut best: Option<(u64, Vec<(usize, usize)>)> = None;
        let mut remaining: Vec<usize> = (0..self.len()).collect();
        let mut current = Vec::with_capacity(self.len() / 2);
        self.enumerate(&mut remaining, &mut current, &mut best);
        best.map(|(_, pairs)| pairs).unwrap_or_default()
    }

    fn enumerate(
        &self,
        remaining: &mut Vec<usize>,
        current: &mut Vec<(usize, usize)>,
        best: &mut Option<(u64, Vec<(usize, usize)>)>,
    ) {
        if remaining.is_empty() {
            let cost = self.cost(current);
            if best.as_ref().map_or(true, |(c, _)| cost < *c) {
                *best = Some((cost, current.clone()));
            }
            return;
        }
        let first = remaining.remove(0);
        for k in 0..remaining.len() {
            let partner = remaining.remove(k);
            current.push((first, partner));
            self.enumerate(remaining, current, best);
            current.pop();
            remaining.insert(k, partner);
        }
        remaining.insert(0, first);
    }

    /// Depth-first search for a rematch-free pairing: the best unpaired player tries
    /// partners by increasing score gap. `None` when no pairing exists within the
    /// threshold or the node budget runs out.
    fn backtrack(
        &self,
        threshold: Option<u32>,
        candidate_limit: Option<usize>,
        budget: &mut usize,
    ) -> Option<Vec<(usize, usize)>> {
        let mut unpaired = vec![true; self.len()];
        let mut pairs = Vec::with_capacity(self.len() / 2);
        if self.extend(&mut unpaired, &mut pairs, threshold, candidate_limit, budget) {
            Some(pairs)
        } else {
            None
        }
    }

    fn extend(
        &self,
        unpaired: &mut [bool],
        pairs: &mut Vec<(usize, usize)>,
        threshold: Option<u32>,
        candidate_limit: Option<usize>,
        budget: &mut usize,
    ) -> bool {
        let Some(first) = unpaired.iter().position(|&u| u) else {
            return true;
        };
        if *budget == 0 {
            return false;
        }
        *budget -= 1;

        let mut candidates: Vec<usize> = (first + 1..self.len())
            .filter(|&j| unpaired[j] && !self.played[first][j])
            .filter(|&j| threshold.map_or(true, |t| self.gap(first, j) <= t))
            .collect();
        candidates.sort_by_key(|&j| (self.gap(first, j), j));
        if let Some(limit) = candidate_limit {
            candidates.truncate(limit);
        }

        unpaired[first] = false;
        for partner in candidates {
            unpaired[partner] = false;
            pairs.push((first, partner));
            if self.extend(unpaired, pairs, threshold, candidate_limit, budget) {
                return true;
            }
            pairs.pop();
            unpaired[partner] = true;
            if *budget == 0 {
                break;
            }
        }
        unpaired[first] = true;
        false
    }

    /// Walk players starting at `offset` (wrapping); each unpaired player takes the
    /// closest-scored unpaired opponent, preferring one they have not played.
    fn greedy_from(&self, offset: usize) -> Vec<(usize, usize)> {
        let n = self.len();
        let mut unpaired = vec![true; n];
        let mut pairs = Vec::with_capacity(n / 2);
        for step in 0..n {
            let i = (offset + step) % n;
            if !unpaired[i] {
                continue;
            }
            let partner = (0..n)
                .filter(|&j| j != i && unpaired[j])
                .min_by_key(|&j| (self.played[i][j], self.gap(i, j), j.abs_diff(i)));
            if let Some(j) = partner {
                unpaired[i] = false;
                unpaired[j] = false;
                pairs.push((i.min(j), i.max(j)));
            }
        }
        pairs.sort_unstable();
        pairs
    }

    fn multi_offset_greedy(&self) -> Vec<(usize, usize)> {
        (0..GREEDY_OFFSETS.min(self.len()))
            .map(|offset| self.greedy_from(offset))
            .min_by_key(|pairs| self.cost(pairs))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(scores: &[u32], played: &[(usize, usize)]) -> PairingProblem {
        let n = scores.len();
        let mut matrix = vec![vec![false; n]; n];
        for &(a, b) in played {
            matrix[a][b] = true;
            matrix[b][a] = true;
        }
        PairingProblem {
            scores: scores.to_vec(),
            played: matrix,
        }
    }

    fn is_perfect(pairs: &[(usize, usize)], n: usize) -> bool {
        let mut seen = vec![false; n];
        for &(a, b) in pairs {
            if a == b || seen[a] || seen[b] {
                return false;
            }
            seen[a] = true;
            seen[b] = true;
        }
        seen.into_iter().all(|s| s)
    }

    fn entrants(had_bye: &[bool]) -> Vec<Entrant> {
        had_bye
            .iter()
            .enumerate()
            .map(|(i, &bye)| Entrant {
                id: uuid::Uuid::new_v4(),
                score: (had_bye.len() - i) as u32 * 2,
                had_bye: bye,
            })
            .collect()
    }

    fn played_set(entrants: &[Entrant], pairs: &[(usize, usize)]) -> HashSet<(StagePlayerId, StagePlayerId)> {
        pairs
            .iter()
            .map(|&(a, b)| ordered(entrants[a].id, entrants[b].id))
            .collect()
    }

    #[test]
    fn bye_goes_to_lowest_ranked_without_one() {
        let field = entrants(&[false, false, false, true, false]);
        assert_eq!(choose_bye(&field, &HashSet::new()), 4);

        let field = entrants(&[false, false, false, false, true]);
        assert_eq!(choose_bye(&field, &HashSet::new()), 3);
    }

    #[test]
    fn bye_skips_player_whose_removal_forces_a_rematch() {
        // giving C the bye leaves only A vs B, which already happened
        let field = entrants(&[false, false, false]);
        let played = played_set(&field, &[(0, 1)]);
        assert_eq!(choose_bye(&field, &played), 1);
    }

    #[test]
    fn bye_falls_back_to_last_place() {
        let field = entrants(&[true, true, true]);
        assert_eq!(choose_bye(&field, &HashSet::new()), 2);

        // everyone has met everyone, so no choice avoids a rematch
        let field = entrants(&[false, false, false]);
        let played = played_set(&field, &[(0, 1), (0, 2), (1, 2)]);
        assert_eq!(choose_bye(&field, &played), 2);
    }

    #[test]
    fn exhaustive_avoids_rematches() {
        let p = problem(&[4, 4, 2, 2], &[(0, 1), (2, 3)]);
        let pairs = p.exhaustive();
        assert!(is_perfect(&pairs, 4));
        assert!(pairs.iter().all(|&(a, b)| !p.played[a][b]));
        assert_eq!(p.cost(&pairs), 4);
    }

    #[test]
    fn exhaustive_accepts_rematch_when_forced() {
        // every pairing of these four repeats something
        let p = problem(&[2, 2, 2, 2], &[(0, 1), (0, 2), (0, 3)]);
        let pairs = p.exhaustive();
        assert!(is_perfect(&pairs, 4));
        assert_eq!(pairs.iter().filter(|&&(a, b)| p.played[a][b]).count(), 1);
    }

    #[test]
    fn backtracking_respects_threshold() {
        let p = problem(&[6, 6, 4, 4, 2, 2, 0, 0, 0, 0], &[(0, 1)]);
        let mut budget = BACKTRACK_BUDGET;
        let pairs = p.backtrack(Some(2), None, &mut budget).unwrap();
        assert!(is_perfect(&pairs, 10));
        assert!(pairs.iter().all(|&(a, b)| p.gap(a, b) <= 2 && !p.played[a][b]));
    }

    #[test]
    fn large_field_always_pairs() {
        let n = 40;
        let scores: Vec<u32> = (0..n).map(|i| (i as u32 % 4) * 2).collect();
        let played: Vec<(usize, usize)> = (0..n).step_by(2).map(|i| (i, i + 1)).collect();
        let p = problem(&scores, &played);
        let pairs = p.solve();
        assert!(is_perfect(&pairs, n));
        assert!(pairs.iter().all(|&(a, b)| !p.played[a][b]));
    }

    #[test]
    fn greedy_offsets_return_perfect_pairings() {
        let p = problem(&[0; 16], &[]);
        for offset in 0..GREEDY_OFFSETS {
            assert!(is_perfect(&p.greedy_from(offset), 16));
        }
        assert!(is_perfect(&p.multi_offset_greedy(), 16));
    }
}
