//! Ranking criteria: each turns a player's cached stage statistics into one sortable number.

use crate::logic::standings::{PlayerTally, StandingsCache};
use crate::models::{StagePlayer, TournamentError};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// One link of a stage's ranking chain.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingCriterion {
    Wins,
    Losses,
    Points,
    StrengthOfSchedule,
    /// Not computed per player: the standings calculator re-sorts tied groups instead.
    HeadToHead,
    Seed,
    /// Last-resort tie-break drawn from the caller's random source.
    Random,
    PlayerScore,
    OpponentScore,
    ScoreDifferential,
    GamesPlayed,
}

/// Every criterion, in the order they are offered for configuration.
pub const RANKING_CRITERIA: [RankingCriterion; 11] = [
    RankingCriterion::Wins,
    RankingCriterion::Losses,
    RankingCriterion::Points,
    RankingCriterion::StrengthOfSchedule,
    RankingCriterion::HeadToHead,
    RankingCriterion::Seed,
    RankingCriterion::Random,
    RankingCriterion::PlayerScore,
    RankingCriterion::OpponentScore,
    RankingCriterion::ScoreDifferential,
    RankingCriterion::GamesPlayed,
];

impl RankingCriterion {
    pub fn key(&self) -> &'static str {
        match self {
            RankingCriterion::Wins => "wins",
            RankingCriterion::Losses => "losses",
            RankingCriterion::Points => "points",
            RankingCriterion::StrengthOfSchedule => "strength_of_schedule",
            RankingCriterion::HeadToHead => "head_to_head",
            RankingCriterion::Seed => "seed",
            RankingCriterion::Random => "random",
            RankingCriterion::PlayerScore => "player_score",
            RankingCriterion::OpponentScore => "opponent_score",
            RankingCriterion::ScoreDifferential => "score_differential",
            RankingCriterion::GamesPlayed => "games_played",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RankingCriterion::Wins => "Wins",
            RankingCriterion::Losses => "Losses",
            RankingCriterion::Points => "Points",
            RankingCriterion::StrengthOfSchedule => "SoS",
            RankingCriterion::HeadToHead => "H2H",
            RankingCriterion::Seed => "Seed",
            RankingCriterion::Random => "Random",
            RankingCriterion::PlayerScore => "Player Score",
            RankingCriterion::OpponentScore => "Opponent Score",
            RankingCriterion::ScoreDifferential => "Score Differential",
            RankingCriterion::GamesPlayed => "Games Played",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RankingCriterion::Wins => "Number of match wins",
            RankingCriterion::Losses => "Number of match losses (fewer is better)",
            RankingCriterion::Points => "Number of points (2 for win, 1 for tie)",
            RankingCriterion::StrengthOfSchedule => "Average points of opponents faced",
            RankingCriterion::HeadToHead => "Wins against tied opponents",
            RankingCriterion::Seed => "Stage seed (lower is better)",
            RankingCriterion::Random => "Random tiebreaker",
            RankingCriterion::PlayerScore => "Sum of player scores in the stage",
            RankingCriterion::OpponentScore => "Sum of opponent scores (lower is better)",
            RankingCriterion::ScoreDifferential => "Player score minus opponent score",
            RankingCriterion::GamesPlayed => "Total number of games played",
        }
    }

    /// Higher values rank first when true.
    pub fn is_descending(&self) -> bool {
        !matches!(
            self,
            RankingCriterion::Losses
                | RankingCriterion::Seed
                | RankingCriterion::Random
                | RankingCriterion::OpponentScore
        )
    }

    /// The player's value for this criterion. Players absent from the cache get zeroed
    /// statistics and their stored seed, so an empty history never fails.
    pub fn calculate_value(
        &self,
        stage_player: &StagePlayer,
        cache: &StandingsCache,
        rng: &mut dyn RngCore,
    ) -> f64 {
        let fallback;
        let tally = match cache.get(stage_player.id) {
            Some(tally) => tally,
            None => {
                fallback = PlayerTally::empty(stage_player.seed);
                &fallback
            }
        };
        match self {
            RankingCriterion::Wins => f64::from(tally.wins),
            RankingCriterion::Losses => f64::from(tally.losses),
            RankingCriterion::Points => f64::from(tally.points),
            RankingCriterion::StrengthOfSchedule => tally.strength_of_schedule,
            RankingCriterion::HeadToHead => 0.0,
            RankingCriterion::Seed => f64::from(tally.seed),
            RankingCriterion::Random => rng.gen::<f64>(),
            RankingCriterion::PlayerScore => tally.player_score as f64,
            RankingCriterion::OpponentScore => tally.opponent_score as f64,
            RankingCriterion::ScoreDifferential => {
                tally.player_score as f64 - tally.opponent_score as f64
            }
            RankingCriterion::GamesPlayed => f64::from(tally.total_matches),
        }
    }
}

/// Look up a criterion by its key.
pub fn get_ranking_criterion(key: &str) -> Result<RankingCriterion, TournamentError> {
    RANKING_CRITERIA
        .iter()
        .copied()
        .find(|c| c.key() == key)
        .ok_or_else(|| TournamentError::UnknownStrategy(key.to_string()))
}

pub fn available_ranking_criteria() -> &'static [RankingCriterion] {
    &RANKING_CRITERIA
}

/// Chain used when a stage has no configured criteria.
pub fn default_chain_for_stage_order(order: u32) -> Vec<RankingCriterion> {
    if order == 1 {
        vec![
            RankingCriterion::Points,
            RankingCriterion::Wins,
            RankingCriterion::StrengthOfSchedule,
            RankingCriterion::Seed,
        ]
    } else {
        vec![RankingCriterion::Wins, RankingCriterion::Seed]
    }
}
