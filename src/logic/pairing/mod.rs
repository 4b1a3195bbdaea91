//! Pairing strategies: how a round's matches are produced for a stage.
//!
//! The set of strategies is closed; [`get_pairing_strategy`] resolves the stored key
//! through a static table.

mod round_robin;
mod single_elimination;
mod swiss;

use crate::models::{
    GameMatch, MatchResult, Round, RoundId, StageId, StagePlayerId, TournamentError,
};
use crate::store::{MatchHistory, TournamentStore};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// The pairing algorithm a stage uses.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum PairingStrategy {
    #[serde(rename = "swiss")]
    Swiss,
    #[serde(rename = "single_elimination")]
    SingleElimination,
    #[serde(rename = "round_robin_scheduled")]
    RoundRobinScheduled,
    #[serde(rename = "round_robin")]
    RoundRobinSelfScheduled,
}

/// Registered strategies by key.
const STRATEGY_REGISTRY: [(&str, fn() -> PairingStrategy); 4] = [
    ("swiss", swiss::strategy),
    ("single_elimination", single_elimination::strategy),
    ("round_robin_scheduled", round_robin::scheduled_strategy),
    ("round_robin", round_robin::self_scheduled_strategy),
];

/// Look up a strategy by key.
pub fn get_pairing_strategy(key: &str) -> Result<PairingStrategy, TournamentError> {
    STRATEGY_REGISTRY
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, make)| make())
        .ok_or_else(|| TournamentError::UnknownStrategy(key.to_string()))
}

/// All strategies, in registry order.
pub fn available_strategies() -> Vec<PairingStrategy> {
    STRATEGY_REGISTRY.iter().map(|(_, make)| make()).collect()
}

/// One pairing: `(player_one, None)` is a bye.
pub(crate) type Pairing = (StagePlayerId, Option<StagePlayerId>);

impl PairingStrategy {
    pub fn key(&self) -> &'static str {
        match self {
            PairingStrategy::Swiss => "swiss",
            PairingStrategy::SingleElimination => "single_elimination",
            PairingStrategy::RoundRobinScheduled => "round_robin_scheduled",
            PairingStrategy::RoundRobinSelfScheduled => "round_robin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PairingStrategy::Swiss => "Swiss",
            PairingStrategy::SingleElimination => "Single Elimination",
            PairingStrategy::RoundRobinScheduled => "Round Robin",
            PairingStrategy::RoundRobinSelfScheduled => "Free-For-All",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PairingStrategy::Swiss => "Players paired by standings after random first round",
            PairingStrategy::SingleElimination => "Players eliminated after one loss, winners advance",
            PairingStrategy::RoundRobinScheduled => {
                "All rounds and matches created in advance, each player plays every other player once"
            }
            PairingStrategy::RoundRobinSelfScheduled => "Players create matches against each other manually",
        }
    }

    /// Seeding must be confirmed before the stage starts.
    pub fn is_seeding_required(&self) -> bool {
        matches!(self, PairingStrategy::SingleElimination)
    }

    /// Players create their own matches.
    pub fn is_self_scheduled(&self) -> bool {
        matches!(self, PairingStrategy::RoundRobinSelfScheduled)
    }

    /// Eliminated players drop out of later rounds.
    pub fn is_elimination_style(&self) -> bool {
        matches!(self, PairingStrategy::SingleElimination)
    }

    /// Starting the first stage with this strategy closes registration.
    pub fn closes_registration_on_start(&self) -> bool {
        !matches!(self, PairingStrategy::RoundRobinSelfScheduled)
    }

    /// Create the matches of `round` (and, for byes, their results) in the store.
    pub fn make_pairings_for_round<S>(
        &self,
        store: &mut S,
        round: &Round,
        rng: &mut dyn RngCore,
    ) -> Result<(), TournamentError>
    where
        S: TournamentStore + ?Sized,
    {
        match self {
            PairingStrategy::Swiss => swiss::make_pairings(store, round, rng),
            PairingStrategy::SingleElimination => single_elimination::make_pairings(store, round),
            PairingStrategy::RoundRobinScheduled => round_robin::make_scheduled_pairings(store, round),
            PairingStrategy::RoundRobinSelfScheduled => Ok(()),
        }
    }

    /// Whether an admin may create another round in the stage right now.
    pub fn can_create_new_round<H>(&self, history: &H, stage_id: StageId) -> Result<bool, TournamentError>
    where
        H: MatchHistory + ?Sized,
    {
        match self {
            PairingStrategy::Swiss => Ok(default_can_create_new_round(history, stage_id)),
            PairingStrategy::SingleElimination => {
                Ok(single_elimination::can_create_new_round(history, stage_id))
            }
            PairingStrategy::RoundRobinScheduled => round_robin::can_create_new_round(history, stage_id),
            PairingStrategy::RoundRobinSelfScheduled => Ok(false),
        }
    }
}

/// No round yet, or the latest round has every result in.
pub(crate) fn default_can_create_new_round<H>(history: &H, stage_id: StageId) -> bool
where
    H: MatchHistory + ?Sized,
{
    history
        .current_round(stage_id)
        .map_or(true, |round| history.is_round_complete(round.id))
}

/// Insert the pairings as matches of `round_id`; byes are resolved for `player_one` immediately.
pub(crate) fn record_pairings<S>(
    store: &mut S,
    round_id: RoundId,
    pairings: &[Pairing],
) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    for &(player_one, player_two) in pairings {
        let game = match player_two {
            Some(p2) => GameMatch::new(round_id, player_one, Some(p2)),
            None => GameMatch::bye(round_id, player_one),
        };
        let match_id = game.id;
        let is_bye = game.is_bye();
        store.insert_match(game)?;
        if is_bye {
            store.save_result(MatchResult::new(match_id, Some(player_one)))?;
        }
    }
    Ok(())
}
